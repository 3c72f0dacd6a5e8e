use crate::model::{Amount, EnvelopeId, Month};
use crate::Error;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// The maintenance category an envelope budgets for.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceCategory {
    Preventive,
    Corrective,
    Predictive,
    Improvement,
    Contracts,
    Parts,
    Energy,
    #[default]
    Other,
}

serde_plain::derive_display_from_serialize!(MaintenanceCategory);
serde_plain::derive_fromstr_from_deserialize!(MaintenanceCategory);

/// Selects which of the two amounts of an `EnvelopeMonth` an edit targets.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum AmountField {
    #[serde(rename = "planned_amount", alias = "planned")]
    Planned,
    #[serde(rename = "contingency_amount", alias = "contingency")]
    Contingency,
}

serde_plain::derive_display_from_serialize!(AmountField);
serde_plain::derive_fromstr_from_deserialize!(AmountField);

/// One calendar month's allocation within an envelope.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct EnvelopeMonth {
    month: Month,
    #[serde(default)]
    planned_amount: Amount,
    #[serde(default)]
    contingency_amount: Amount,
}

impl EnvelopeMonth {
    pub fn new(month: Month, planned_amount: Amount, contingency_amount: Amount) -> Self {
        Self {
            month,
            planned_amount,
            contingency_amount,
        }
    }

    /// A month with both amounts at zero.
    pub fn empty(month: Month) -> Self {
        Self::new(month, Amount::ZERO, Amount::ZERO)
    }

    pub fn month(&self) -> Month {
        self.month
    }

    pub fn planned_amount(&self) -> Amount {
        self.planned_amount
    }

    pub fn contingency_amount(&self) -> Amount {
        self.contingency_amount
    }

    pub fn get(&self, field: AmountField) -> Amount {
        match field {
            AmountField::Planned => self.planned_amount,
            AmountField::Contingency => self.contingency_amount,
        }
    }

    /// Returns a copy with `field` replaced by `value`.
    pub fn with(mut self, field: AmountField, value: Amount) -> Self {
        match field {
            AmountField::Planned => self.planned_amount = value,
            AmountField::Contingency => self.contingency_amount = value,
        }
        self
    }

    /// The wire form of this month for a plan in `year`.
    pub fn to_record(&self, year: i32) -> MonthRecord {
        MonthRecord {
            month: self.month.wire_date(year),
            planned_amount: self.planned_amount,
            contingency_amount: self.contingency_amount,
        }
    }
}

/// A month as exchanged with the backend, keyed by the first day of the month, e.g.
/// `{"month": "2025-03-01", "planned_amount": "100.00", "contingency_amount": "10.00"}`.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct MonthRecord {
    pub month: String,
    #[serde(default)]
    pub planned_amount: Amount,
    #[serde(default)]
    pub contingency_amount: Amount,
}

impl TryFrom<&MonthRecord> for EnvelopeMonth {
    type Error = Error;

    fn try_from(record: &MonthRecord) -> Result<Self, Self::Error> {
        Ok(EnvelopeMonth::new(
            Month::from_wire_date(&record.month)?,
            record.planned_amount,
            record.contingency_amount,
        ))
    }
}

/// A named budget allocation bucket within a yearly plan, scoped to a cost center and maintenance
/// category.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "EnvelopeRecord")]
pub struct Envelope {
    id: EnvelopeId,
    name: String,
    cost_center: String,
    category: MaintenanceCategory,
    months: Vec<EnvelopeMonth>,
}

impl Envelope {
    /// Creates an envelope with no months.
    pub fn new(
        id: impl Into<EnvelopeId>,
        name: impl Into<String>,
        cost_center: impl Into<String>,
        category: MaintenanceCategory,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            cost_center: cost_center.into(),
            category,
            months: Vec::new(),
        }
    }

    pub fn with_months(mut self, months: Vec<EnvelopeMonth>) -> Self {
        self.months = months;
        self
    }

    pub fn id(&self) -> &EnvelopeId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cost_center(&self) -> &str {
        &self.cost_center
    }

    pub fn category(&self) -> MaintenanceCategory {
        self.category
    }

    pub fn months(&self) -> &[EnvelopeMonth] {
        &self.months
    }

    pub(crate) fn set_months(&mut self, months: Vec<EnvelopeMonth>) {
        self.months = months;
    }
}

/// The backend representation of an envelope.
#[derive(Debug, Clone, Deserialize)]
struct EnvelopeRecord {
    id: EnvelopeId,
    #[serde(default)]
    name: String,
    #[serde(default)]
    cost_center: String,
    #[serde(default)]
    category: MaintenanceCategory,
    #[serde(default)]
    months: Vec<MonthRecord>,
}

impl TryFrom<EnvelopeRecord> for Envelope {
    type Error = Error;

    fn try_from(record: EnvelopeRecord) -> Result<Self, Self::Error> {
        let mut months: Vec<EnvelopeMonth> = Vec::with_capacity(record.months.len());
        for month_record in &record.months {
            let month = EnvelopeMonth::try_from(month_record)?;
            // at most one entry per month; the last one sent wins
            match months.iter_mut().find(|m| m.month() == month.month()) {
                Some(existing) => {
                    trace!("Duplicate month {} for envelope {}", month.month(), record.id);
                    *existing = month;
                }
                None => months.push(month),
            }
        }
        Ok(Envelope {
            id: record.id,
            name: record.name,
            cost_center: record.cost_center,
            category: record.category,
            months,
        })
    }
}

/// The fields a user provides when creating an envelope.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct NewEnvelope {
    pub name: String,
    pub cost_center: String,
    pub category: MaintenanceCategory,
}
