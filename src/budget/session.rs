use crate::budget::{
    build_payloads, envelope_totals, merge_month, plan_totals, EnvelopePayload, EnvelopeTotals,
    PlanTotals, SaveReport,
};
use crate::model::{Amount, AmountField, BudgetPlan, Envelope, EnvelopeId, EnvelopeMonth, Month};
use crate::Result;
use anyhow::{bail, ensure};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, trace};

/// The local editing state of one budget plan.
///
/// Holds the last fetched server copy of every envelope, a working copy of each envelope's months
/// that local edits are applied to, and the set of envelopes edited since their last successful
/// save. Every dirty envelope always has a working copy.
#[derive(Debug, Clone)]
pub struct EditSession {
    plan: BudgetPlan,
    envelopes: BTreeMap<EnvelopeId, Envelope>,
    working: BTreeMap<EnvelopeId, Vec<EnvelopeMonth>>,
    dirty: BTreeSet<EnvelopeId>,
}

impl EditSession {
    /// Starts a session with working copies equal to the fetched envelopes.
    pub fn new(plan: BudgetPlan, envelopes: Vec<Envelope>) -> Self {
        let mut session = Self {
            plan,
            envelopes: BTreeMap::new(),
            working: BTreeMap::new(),
            dirty: BTreeSet::new(),
        };
        for envelope in envelopes {
            session.insert_clean(envelope);
        }
        session
    }

    pub fn plan(&self) -> &BudgetPlan {
        &self.plan
    }

    pub fn year(&self) -> i32 {
        self.plan.year()
    }

    /// The envelopes as last fetched or saved.
    pub fn envelopes(&self) -> impl Iterator<Item = &Envelope> {
        self.envelopes.values()
    }

    pub fn envelope(&self, id: &EnvelopeId) -> Option<&Envelope> {
        self.envelopes.get(id)
    }

    /// The working copy of an envelope's months. Unknown envelopes have no months.
    pub fn months(&self, id: &EnvelopeId) -> &[EnvelopeMonth] {
        self.working.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Sets one amount of one month of an envelope and marks the envelope dirty.
    ///
    /// # Errors
    /// - The plan is locked.
    /// - The envelope is not part of this session.
    /// - The amount is negative.
    pub fn set_amount(
        &mut self,
        id: &EnvelopeId,
        month: Month,
        field: AmountField,
        value: Amount,
    ) -> Result<()> {
        ensure!(
            self.plan.is_editable(),
            "Budget plan {} is locked and cannot be edited",
            self.plan.id()
        );
        ensure!(!value.is_negative(), "Amounts cannot be negative");
        let Some(current) = self.working.get(id) else {
            bail!("Envelope {id} is not part of budget plan {}", self.plan.id());
        };
        let merged = merge_month(current, month, field, value);
        trace!("Set {field} of month {month} of envelope {id} to {value}");
        self.working.insert(id.clone(), merged);
        self.dirty.insert(id.clone());
        Ok(())
    }

    /// Parses user-typed `text` and sets it like `set_amount`, returning the parsed amount.
    /// Unparseable text sets the amount to zero.
    pub fn set_amount_text(
        &mut self,
        id: &EnvelopeId,
        month: Month,
        field: AmountField,
        text: &str,
    ) -> Result<Amount> {
        let value = Amount::parse(text);
        self.set_amount(id, month, field, value)?;
        Ok(value)
    }

    pub fn envelope_totals(&self, id: &EnvelopeId) -> EnvelopeTotals {
        envelope_totals(self.months(id))
    }

    pub fn plan_totals(&self) -> PlanTotals {
        plan_totals(self.working.values().map(|months| envelope_totals(months)))
    }

    pub fn is_dirty(&self, id: &EnvelopeId) -> bool {
        self.dirty.contains(id)
    }

    pub fn dirty(&self) -> &BTreeSet<EnvelopeId> {
        &self.dirty
    }

    pub fn has_unsaved_changes(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// The payloads to submit for every dirty envelope.
    pub fn payloads(&self) -> Vec<EnvelopePayload> {
        build_payloads(&self.dirty, &self.working, self.year())
    }

    /// Clears the envelopes that were saved. Envelopes that failed stay dirty with their working
    /// copy untouched.
    pub fn apply_save_report(&mut self, report: &SaveReport) {
        for id in report.saved() {
            self.dirty.remove(id);
            if let (Some(envelope), Some(months)) =
                (self.envelopes.get_mut(id), self.working.get(id))
            {
                envelope.set_months(months.clone());
            }
        }
        debug!(
            "{} envelope(s) saved, {} still dirty",
            report.saved().len(),
            self.dirty.len()
        );
    }

    /// Drops the local edits of one envelope, restoring the last fetched months.
    pub fn discard(&mut self, id: &EnvelopeId) {
        if !self.dirty.remove(id) {
            return;
        }
        match self.envelopes.get(id) {
            Some(envelope) => {
                self.working.insert(id.clone(), envelope.months().to_vec());
            }
            None => {
                self.working.remove(id);
            }
        }
    }

    /// Takes freshly fetched server state. Clean envelopes adopt the server months; dirty
    /// envelopes keep their working copy so unsaved edits survive the refresh.
    pub fn refresh(&mut self, plan: BudgetPlan, envelopes: Vec<Envelope>) {
        self.plan = plan;
        let fetched: BTreeSet<EnvelopeId> = envelopes.iter().map(|e| e.id().clone()).collect();
        let dirty = &self.dirty;
        self.envelopes.retain(|id, _| fetched.contains(id) || dirty.contains(id));
        self.working.retain(|id, _| fetched.contains(id) || dirty.contains(id));
        for envelope in envelopes {
            let id = envelope.id().clone();
            if !self.dirty.contains(&id) {
                self.working.insert(id.clone(), envelope.months().to_vec());
            }
            self.envelopes.insert(id, envelope);
        }
    }

    fn insert_clean(&mut self, envelope: Envelope) {
        let id = envelope.id().clone();
        self.working.insert(id.clone(), envelope.months().to_vec());
        self.dirty.remove(&id);
        self.envelopes.insert(id, envelope);
    }
}
