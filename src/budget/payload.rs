use crate::model::{Envelope, EnvelopeId, EnvelopeMonth, Month, MonthRecord};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// The full month set submitted for one envelope on save.
///
/// The backend replaces every stored month of the envelope with this set, so it always carries all
/// twelve months, with zeros for months that have no entry locally.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct EnvelopePayload {
    #[serde(skip)]
    envelope_id: EnvelopeId,
    months: Vec<MonthRecord>,
}

impl EnvelopePayload {
    /// Builds the twelve month records of `months` for a plan in `year`.
    pub fn new(envelope_id: EnvelopeId, months: &[EnvelopeMonth], year: i32) -> Self {
        let months = Month::all()
            .map(|month| {
                months
                    .iter()
                    .find(|m| m.month() == month)
                    .copied()
                    .unwrap_or_else(|| EnvelopeMonth::empty(month))
                    .to_record(year)
            })
            .collect();
        Self {
            envelope_id,
            months,
        }
    }

    pub fn envelope_id(&self) -> &EnvelopeId {
        &self.envelope_id
    }

    pub fn months(&self) -> &[MonthRecord] {
        &self.months
    }

    /// The envelope as it will be stored once this payload is accepted.
    pub(crate) fn apply_to(&self, envelope: &mut Envelope) -> crate::Result<()> {
        let months = self
            .months
            .iter()
            .map(EnvelopeMonth::try_from)
            .collect::<crate::Result<Vec<_>>>()?;
        envelope.set_months(months);
        Ok(())
    }
}

/// Produces one payload per dirty envelope.
///
/// A dirty id without a working copy is skipped with a warning: sending it would overwrite every
/// stored month with zeros.
pub fn build_payloads(
    dirty: &BTreeSet<EnvelopeId>,
    working: &BTreeMap<EnvelopeId, Vec<EnvelopeMonth>>,
    year: i32,
) -> Vec<EnvelopePayload> {
    dirty
        .iter()
        .filter_map(|id| match working.get(id) {
            Some(months) => Some(EnvelopePayload::new(id.clone(), months, year)),
            None => {
                warn!("Envelope {id} is marked dirty but has no working copy, not saving it");
                None
            }
        })
        .collect()
}
