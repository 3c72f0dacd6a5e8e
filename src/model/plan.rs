use crate::model::PlanId;
use crate::Result;
use anyhow::{bail, ensure};
use serde::{Deserialize, Serialize};

/// The lifecycle of a budget plan. Plans only move forward: `draft -> approved -> locked`.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    #[default]
    Draft,
    Approved,
    Locked,
}

serde_plain::derive_display_from_serialize!(PlanStatus);
serde_plain::derive_fromstr_from_deserialize!(PlanStatus);

impl PlanStatus {
    /// The status that follows this one, if any.
    pub fn next(self) -> Option<PlanStatus> {
        match self {
            PlanStatus::Draft => Some(PlanStatus::Approved),
            PlanStatus::Approved => Some(PlanStatus::Locked),
            PlanStatus::Locked => None,
        }
    }

    pub fn can_transition_to(self, target: PlanStatus) -> bool {
        self.next() == Some(target)
    }
}

/// A yearly container of envelopes.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct BudgetPlan {
    id: PlanId,
    #[serde(default)]
    name: String,
    year: i32,
    currency: String,
    #[serde(default)]
    status: PlanStatus,
}

impl BudgetPlan {
    /// Creates a new plan in the `draft` status.
    pub fn new(
        id: impl Into<PlanId>,
        name: impl Into<String>,
        year: i32,
        currency: impl AsRef<str>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            year,
            currency: currency.as_ref().to_uppercase(),
            status: PlanStatus::Draft,
        }
    }

    pub fn id(&self) -> &PlanId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn status(&self) -> PlanStatus {
        self.status
    }

    /// Envelope amounts may only change while the plan is not locked.
    pub fn is_editable(&self) -> bool {
        self.status != PlanStatus::Locked
    }

    pub fn set_year(&mut self, year: i32) -> Result<()> {
        self.ensure_not_locked()?;
        self.year = year;
        Ok(())
    }

    pub fn set_currency(&mut self, currency: impl AsRef<str>) -> Result<()> {
        self.ensure_not_locked()?;
        self.currency = currency.as_ref().to_uppercase();
        Ok(())
    }

    /// Moves the plan to `target`, which must be the status directly after the current one.
    pub fn transition(&mut self, target: PlanStatus) -> Result<()> {
        if !self.status.can_transition_to(target) {
            bail!(
                "Budget plan {} cannot move from {} to {}",
                self.id,
                self.status,
                target
            );
        }
        self.status = target;
        Ok(())
    }

    pub fn approve(&mut self) -> Result<()> {
        self.transition(PlanStatus::Approved)
    }

    pub fn lock(&mut self) -> Result<()> {
        self.transition(PlanStatus::Locked)
    }

    fn ensure_not_locked(&self) -> Result<()> {
        ensure!(self.is_editable(), "Budget plan {} is locked", self.id);
        Ok(())
    }
}
