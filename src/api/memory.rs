//! Implements the `BudgetApi` trait using in-memory data for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without a backend server.

use crate::api::{BudgetApi, SaveError};
use crate::budget::EnvelopePayload;
use crate::model::{
    to_amount, BudgetPlan, Envelope, EnvelopeId, EnvelopeMonth, MaintenanceCategory, Month,
    NewEnvelope, PlanId, PlanStatus,
};
use crate::Result;
use anyhow::{bail, ensure, Context};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace};
use uuid::Uuid;

/// An implementation of the `BudgetApi` trait that does not use a server. It holds plans and
/// envelopes in memory and can simulate closed accounting periods and unreachable envelopes.
#[derive(Debug, Default)]
pub struct TestBudgetApi {
    state: Mutex<TestState>,
}

#[derive(Debug, Default)]
struct TestState {
    plans: BTreeMap<PlanId, BudgetPlan>,
    envelopes: BTreeMap<PlanId, Vec<Envelope>>,
    closed_periods: BTreeSet<(i32, Month)>,
    unreachable: BTreeSet<EnvelopeId>,
}

impl TestBudgetApi {
    /// Creates a backend holding `plans` and their `envelopes`.
    pub fn new(plans: Vec<BudgetPlan>, envelopes: Vec<(PlanId, Envelope)>) -> Self {
        let mut state = TestState::default();
        for plan in plans {
            state.plans.insert(plan.id().clone(), plan);
        }
        for (plan_id, envelope) in envelopes {
            state.envelopes.entry(plan_id).or_default().push(envelope);
        }
        Self {
            state: Mutex::new(state),
        }
    }

    /// Creates a backend loaded with the seed data from this module.
    pub fn seeded() -> Result<Self> {
        let (plans, envelopes) = seed_data()?;
        Ok(Self::new(plans, envelopes))
    }

    /// Closes the accounting period of `month` in `year`. Saves that change a closed month are
    /// answered with `SaveError::Conflict`.
    pub fn close_period(&self, year: i32, month: Month) {
        self.state().closed_periods.insert((year, month));
    }

    /// Makes every save of `envelope_id` fail as if the request never reached the server.
    pub fn set_unreachable(&self, envelope_id: &EnvelopeId) {
        self.state().unreachable.insert(envelope_id.clone());
    }

    /// Returns the stored copy of an envelope.
    pub fn envelope(&self, envelope_id: &EnvelopeId) -> Option<Envelope> {
        self.state()
            .envelopes
            .values()
            .flatten()
            .find(|e| e.id() == envelope_id)
            .cloned()
    }

    fn state(&self) -> MutexGuard<'_, TestState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait::async_trait]
impl BudgetApi for TestBudgetApi {
    async fn get_plan(&self, plan_id: &PlanId) -> Result<BudgetPlan> {
        self.state()
            .plans
            .get(plan_id)
            .cloned()
            .with_context(|| format!("Budget plan '{plan_id}' not found"))
    }

    async fn list_envelopes(&self, plan_id: &PlanId) -> Result<Vec<Envelope>> {
        let state = self.state();
        ensure!(
            state.plans.contains_key(plan_id),
            "Budget plan '{plan_id}' not found"
        );
        Ok(state.envelopes.get(plan_id).cloned().unwrap_or_default())
    }

    async fn create_envelope(&self, plan_id: &PlanId, envelope: &NewEnvelope) -> Result<Envelope> {
        let mut state = self.state();
        let plan = state
            .plans
            .get(plan_id)
            .with_context(|| format!("Budget plan '{plan_id}' not found"))?;
        if !plan.is_editable() {
            bail!("Budget plan '{plan_id}' is locked, envelopes cannot be added");
        }
        let id = Uuid::new_v4().to_string().replace('-', "");
        let created = Envelope::new(
            id,
            envelope.name.clone(),
            envelope.cost_center.clone(),
            envelope.category,
        );
        debug!("Created envelope {} in plan {plan_id}", created.id());
        state
            .envelopes
            .entry(plan_id.clone())
            .or_default()
            .push(created.clone());
        Ok(created)
    }

    async fn replace_envelope_months(
        &self,
        payload: &EnvelopePayload,
    ) -> std::result::Result<(), SaveError> {
        let envelope_id = payload.envelope_id();
        trace!("replace_envelope_months for {envelope_id}");
        let mut guard = self.state();
        let state = &mut *guard;
        if state.unreachable.contains(envelope_id) {
            return Err(SaveError::Transport(format!(
                "connection to the backend was lost while saving envelope {envelope_id}"
            )));
        }

        let (plan_id, index) = state
            .envelopes
            .iter()
            .find_map(|(plan_id, envelopes)| {
                envelopes
                    .iter()
                    .position(|e| e.id() == envelope_id)
                    .map(|ix| (plan_id.clone(), ix))
            })
            .ok_or_else(|| SaveError::Rejected {
                status: 404,
                message: format!("Envelope {envelope_id} not found"),
            })?;
        let plan = state.plans.get(&plan_id).ok_or_else(|| SaveError::Rejected {
            status: 404,
            message: format!("Budget plan {plan_id} not found"),
        })?;
        if !plan.is_editable() {
            return Err(SaveError::Conflict(format!(
                "Budget plan {plan_id} is locked"
            )));
        }
        let year = plan.year();

        let envelope = &mut state
            .envelopes
            .get_mut(&plan_id)
            .ok_or_else(|| SaveError::Rejected {
                status: 404,
                message: format!("Envelope {envelope_id} not found"),
            })?[index];

        for record in payload.months() {
            let incoming = EnvelopeMonth::try_from(record).map_err(|e| SaveError::Rejected {
                status: 400,
                message: format!("{e:#}"),
            })?;
            let month = incoming.month();
            if month.wire_date(year) != record.month {
                return Err(SaveError::Rejected {
                    status: 400,
                    message: format!("Month {} is outside of the plan year {year}", record.month),
                });
            }
            if !state.closed_periods.contains(&(year, month)) {
                continue;
            }
            let stored = envelope
                .months()
                .iter()
                .find(|m| m.month() == month)
                .copied()
                .unwrap_or_else(|| EnvelopeMonth::empty(month));
            if stored != incoming {
                return Err(SaveError::Conflict(format!(
                    "The accounting period {year}-{:02} is closed",
                    month.number()
                )));
            }
        }

        payload.apply_to(envelope).map_err(|e| SaveError::Rejected {
            status: 400,
            message: format!("{e:#}"),
        })
    }

    async fn set_plan_status(&self, plan_id: &PlanId, status: PlanStatus) -> Result<BudgetPlan> {
        let mut state = self.state();
        let plan = state
            .plans
            .get_mut(plan_id)
            .with_context(|| format!("Budget plan '{plan_id}' not found"))?;
        plan.transition(status)?;
        Ok(plan.clone())
    }
}

#[derive(Debug, Deserialize)]
struct PlanRow {
    id: String,
    name: String,
    year: i32,
    currency: String,
    status: String,
}

#[derive(Debug, Deserialize)]
struct EnvelopeRow {
    id: String,
    plan_id: String,
    name: String,
    cost_center: String,
    category: String,
}

#[derive(Debug, Deserialize)]
struct MonthRow {
    envelope_id: String,
    month: String,
    planned_amount: String,
    contingency_amount: String,
}

/// Builds the seed plans and envelopes from this module's CSV data.
fn seed_data() -> Result<(Vec<BudgetPlan>, Vec<(PlanId, Envelope)>)> {
    let mut plans = Vec::new();
    for row in load_csv::<PlanRow>(PLAN_DATA)? {
        let status = PlanStatus::from_str(&row.status)
            .with_context(|| format!("Invalid plan status '{}'", row.status))?;
        let mut plan = BudgetPlan::new(row.id, row.name, row.year, row.currency);
        while plan.status() < status {
            let next = plan.status().next().context("Plan status out of range")?;
            plan.transition(next)?;
        }
        plans.push(plan);
    }

    let mut months: BTreeMap<String, Vec<EnvelopeMonth>> = BTreeMap::new();
    for row in load_csv::<MonthRow>(MONTH_DATA)? {
        let month = EnvelopeMonth::new(
            Month::from_wire_date(&row.month)?,
            to_amount(&serde_json::Value::String(row.planned_amount)),
            to_amount(&serde_json::Value::String(row.contingency_amount)),
        );
        months.entry(row.envelope_id).or_default().push(month);
    }

    let mut envelopes = Vec::new();
    for row in load_csv::<EnvelopeRow>(ENVELOPE_DATA)? {
        let category = MaintenanceCategory::from_str(&row.category)
            .with_context(|| format!("Invalid category '{}'", row.category))?;
        let envelope_months = months.remove(&row.id).unwrap_or_default();
        let envelope =
            Envelope::new(row.id, row.name, row.cost_center, category).with_months(envelope_months);
        envelopes.push((PlanId::new(row.plan_id), envelope));
    }
    Ok((plans, envelopes))
}

/// Loads rows from a CSV-formatted string with a header row.
fn load_csv<T>(csv_data: &str) -> Result<Vec<T>>
where
    T: DeserializeOwned,
{
    let mut rdr = csv::Reader::from_reader(csv_data.as_bytes());
    rdr.deserialize::<T>()
        .map(|row| row.context("Unable to parse seed data"))
        .collect()
}

/// Seed plan data.
const PLAN_DATA: &str = r##"id,name,year,currency,status
plan-2025,Plant maintenance 2025,2025,BRL,draft
plan-2024,Plant maintenance 2024,2024,BRL,locked
"##;

/// Seed envelope data.
const ENVELOPE_DATA: &str = r##"id,plan_id,name,cost_center,category
env-hvac,plan-2025,HVAC preventive program,CC-110,preventive
env-pumps,plan-2025,Pump repairs,CC-120,corrective
env-vibration,plan-2025,Vibration analysis,CC-120,predictive
env-energy,plan-2025,Compressed air energy,CC-900,energy
env-legacy,plan-2024,Legacy service contracts,CC-110,contracts
"##;

/// Seed month data.
const MONTH_DATA: &str = r##"envelope_id,month,planned_amount,contingency_amount
env-hvac,2025-01-01,1500.00,150.00
env-hvac,2025-02-01,1500.00,150.00
env-hvac,2025-03-01,1500.00,150.00
env-pumps,2025-03-01,8000.00,
env-pumps,2025-09-01,2500.50,500.00
env-vibration,2025-06-01,1200.00,0.00
env-legacy,2024-06-01,2000.00,200.00
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Amount;

    fn month(n: u8) -> Month {
        Month::new(n).unwrap()
    }

    #[tokio::test]
    async fn test_seeded() {
        let api = TestBudgetApi::seeded().unwrap();
        let plan = api.get_plan(&PlanId::new("plan-2025")).await.unwrap();
        assert_eq!(plan.year(), 2025);
        assert_eq!(plan.status(), PlanStatus::Draft);
        let locked = api.get_plan(&PlanId::new("plan-2024")).await.unwrap();
        assert_eq!(locked.status(), PlanStatus::Locked);

        let envelopes = api.list_envelopes(plan.id()).await.unwrap();
        assert_eq!(envelopes.len(), 4);
        let pumps = envelopes
            .iter()
            .find(|e| e.id().as_str() == "env-pumps")
            .unwrap();
        assert_eq!(pumps.months().len(), 2);
        assert!(pumps.months()[0].contingency_amount().is_zero());
        let energy = envelopes
            .iter()
            .find(|e| e.id().as_str() == "env-energy")
            .unwrap();
        assert!(energy.months().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_plan() {
        let api = TestBudgetApi::seeded().unwrap();
        assert!(api.get_plan(&PlanId::new("nope")).await.is_err());
        assert!(api.list_envelopes(&PlanId::new("nope")).await.is_err());
    }

    #[tokio::test]
    async fn test_replace_months() {
        let api = TestBudgetApi::seeded().unwrap();
        let id = EnvelopeId::new("env-energy");
        let months = vec![EnvelopeMonth::new(month(5), Amount::parse("900"), Amount::ZERO)];
        let payload = EnvelopePayload::new(id.clone(), &months, 2025);
        api.replace_envelope_months(&payload).await.unwrap();
        let stored = api.envelope(&id).unwrap();
        assert_eq!(stored.months().len(), 12);
        assert_eq!(stored.months()[4].planned_amount(), Amount::parse("900"));
    }

    #[tokio::test]
    async fn test_closed_period_conflict() {
        let api = TestBudgetApi::seeded().unwrap();
        api.close_period(2025, month(1));
        let id = EnvelopeId::new("env-hvac");
        let stored = api.envelope(&id).unwrap();

        // unchanged closed month is accepted
        let mut months = stored.months().to_vec();
        months.push(EnvelopeMonth::new(month(4), Amount::parse("10"), Amount::ZERO));
        let payload = EnvelopePayload::new(id.clone(), &months, 2025);
        api.replace_envelope_months(&payload).await.unwrap();

        // changed closed month is refused
        months[0] = months[0].with(crate::model::AmountField::Planned, Amount::parse("1"));
        let payload = EnvelopePayload::new(id.clone(), &months, 2025);
        let err = api.replace_envelope_months(&payload).await.unwrap_err();
        assert!(matches!(err, SaveError::Conflict(_)));
        let stored = api.envelope(&id).unwrap();
        assert_eq!(stored.months()[0].planned_amount(), Amount::parse("1500"));
    }

    #[tokio::test]
    async fn test_locked_plan_conflict() {
        let api = TestBudgetApi::seeded().unwrap();
        let payload = EnvelopePayload::new(EnvelopeId::new("env-legacy"), &[], 2024);
        let err = api.replace_envelope_months(&payload).await.unwrap_err();
        assert!(matches!(err, SaveError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_wrong_year_rejected() {
        let api = TestBudgetApi::seeded().unwrap();
        let payload = EnvelopePayload::new(EnvelopeId::new("env-hvac"), &[], 2030);
        let err = api.replace_envelope_months(&payload).await.unwrap_err();
        assert!(matches!(err, SaveError::Rejected { status: 400, .. }));
    }

    #[tokio::test]
    async fn test_unreachable() {
        let api = TestBudgetApi::seeded().unwrap();
        let id = EnvelopeId::new("env-hvac");
        api.set_unreachable(&id);
        let payload = EnvelopePayload::new(id, &[], 2025);
        let err = api.replace_envelope_months(&payload).await.unwrap_err();
        assert!(matches!(err, SaveError::Transport(_)));
    }

    #[tokio::test]
    async fn test_create_envelope() {
        let api = TestBudgetApi::seeded().unwrap();
        let new = NewEnvelope {
            name: "Spare bearings".to_string(),
            cost_center: "CC-300".to_string(),
            category: MaintenanceCategory::Parts,
        };
        let created = api
            .create_envelope(&PlanId::new("plan-2025"), &new)
            .await
            .unwrap();
        assert!(created.months().is_empty());
        assert_eq!(created.category(), MaintenanceCategory::Parts);
        assert!(api.envelope(created.id()).is_some());

        let refused = api.create_envelope(&PlanId::new("plan-2024"), &new).await;
        assert!(refused.is_err());
    }

    #[tokio::test]
    async fn test_set_plan_status() {
        let api = TestBudgetApi::seeded().unwrap();
        let id = PlanId::new("plan-2025");
        assert!(api.set_plan_status(&id, PlanStatus::Locked).await.is_err());
        let approved = api.set_plan_status(&id, PlanStatus::Approved).await.unwrap();
        assert_eq!(approved.status(), PlanStatus::Approved);
        let locked = api.set_plan_status(&id, PlanStatus::Locked).await.unwrap();
        assert!(!locked.is_editable());
    }
}
