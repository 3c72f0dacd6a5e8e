use crate::api::{BudgetApi, SaveError};
use crate::budget::EditSession;
use crate::model::EnvelopeId;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// An envelope the backend did not store, and why.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct SaveFailure {
    envelope_id: EnvelopeId,
    #[serde(serialize_with = "serialize_error")]
    error: SaveError,
}

impl SaveFailure {
    pub fn new(envelope_id: EnvelopeId, error: SaveError) -> Self {
        Self { envelope_id, error }
    }

    pub fn envelope_id(&self) -> &EnvelopeId {
        &self.envelope_id
    }

    pub fn error(&self) -> &SaveError {
        &self.error
    }
}

fn serialize_error<S>(error: &SaveError, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_str(error)
}

/// The outcome of a save, per envelope.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize)]
pub struct SaveReport {
    saved: Vec<EnvelopeId>,
    failed: Vec<SaveFailure>,
}

impl SaveReport {
    pub fn new(saved: Vec<EnvelopeId>, failed: Vec<SaveFailure>) -> Self {
        Self { saved, failed }
    }

    pub fn saved(&self) -> &[EnvelopeId] {
        &self.saved
    }

    pub fn failed(&self) -> &[SaveFailure] {
        &self.failed
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Submits every dirty envelope of `session` and clears the ones the backend accepted.
///
/// The requests run concurrently, one task per envelope, and each outcome is recorded separately:
/// a failure only keeps its own envelope dirty. Nothing is retried.
pub async fn save_session(session: &mut EditSession, api: Arc<dyn BudgetApi>) -> SaveReport {
    let payloads = session.payloads();
    if payloads.is_empty() {
        debug!("Nothing to save for budget plan {}", session.plan().id());
        return SaveReport::default();
    }

    let tasks: Vec<_> = payloads
        .into_iter()
        .map(|payload| {
            let api = Arc::clone(&api);
            let envelope_id = payload.envelope_id().clone();
            let handle =
                tokio::spawn(async move { api.replace_envelope_months(&payload).await });
            (envelope_id, handle)
        })
        .collect();

    let mut report = SaveReport::default();
    for (envelope_id, handle) in tasks {
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(e) => Err(SaveError::transport(format!("the save task failed: {e}"))),
        };
        match outcome {
            Ok(()) => {
                debug!("Saved envelope {envelope_id}");
                report.saved.push(envelope_id);
            }
            Err(error) => {
                warn!("Envelope {envelope_id} was not saved, keeping its edits: {error}");
                report.failed.push(SaveFailure::new(envelope_id, error));
            }
        }
    }

    session.apply_save_report(&report);
    info!(
        "Saved {} of {} envelope(s)",
        report.saved.len(),
        report.saved.len() + report.failed.len()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TestBudgetApi;
    use crate::model::{Amount, AmountField, Month, PlanId};

    fn month(n: u8) -> Month {
        Month::new(n).unwrap()
    }

    async fn load(api: &TestBudgetApi, plan: &str) -> EditSession {
        let plan = api.get_plan(&PlanId::new(plan)).await.unwrap();
        let envelopes = api.list_envelopes(plan.id()).await.unwrap();
        EditSession::new(plan, envelopes)
    }

    #[tokio::test]
    async fn test_save_all() {
        let api = Arc::new(TestBudgetApi::seeded().unwrap());
        let mut session = load(&api, "plan-2025").await;
        let energy = EnvelopeId::new("env-energy");
        let hvac = EnvelopeId::new("env-hvac");
        session
            .set_amount_text(&energy, month(2), AmountField::Planned, "8.000")
            .unwrap();
        session
            .set_amount_text(&hvac, month(12), AmountField::Contingency, "99,9")
            .unwrap();

        let report = save_session(&mut session, api.clone()).await;
        assert!(report.is_complete());
        assert_eq!(report.saved().len(), 2);
        assert!(!session.has_unsaved_changes());

        let stored = api.envelope(&energy).unwrap();
        assert_eq!(stored.months().len(), 12);
        assert_eq!(stored.months()[1].planned_amount(), Amount::parse("8000"));
        let stored = api.envelope(&hvac).unwrap();
        assert_eq!(stored.months()[0].planned_amount(), Amount::parse("1500"));
        assert_eq!(
            stored.months()[11].contingency_amount(),
            Amount::parse("99.9")
        );
    }

    #[tokio::test]
    async fn test_partial_failure_isolation() {
        let api = Arc::new(TestBudgetApi::seeded().unwrap());
        api.close_period(2025, month(3));
        let mut session = load(&api, "plan-2025").await;
        let energy = EnvelopeId::new("env-energy");
        let pumps = EnvelopeId::new("env-pumps");
        session
            .set_amount_text(&energy, month(5), AmountField::Planned, "100")
            .unwrap();
        session
            .set_amount_text(&pumps, month(3), AmountField::Planned, "1")
            .unwrap();

        let report = save_session(&mut session, api.clone()).await;
        assert_eq!(report.saved(), &[energy.clone()]);
        assert_eq!(report.failed().len(), 1);
        assert_eq!(report.failed()[0].envelope_id(), &pumps);
        assert!(matches!(report.failed()[0].error(), SaveError::Conflict(_)));

        assert!(!session.is_dirty(&energy));
        assert!(session.is_dirty(&pumps));
        let march = session
            .months(&pumps)
            .iter()
            .find(|m| m.month() == month(3))
            .unwrap();
        assert_eq!(march.planned_amount(), Amount::parse("1"));

        // the stored pumps envelope is untouched
        let stored = api.envelope(&pumps).unwrap();
        assert_eq!(stored.months()[0].planned_amount(), Amount::parse("8000"));
    }

    #[tokio::test]
    async fn test_transport_failure_keeps_edits_for_retry() {
        let api = Arc::new(TestBudgetApi::seeded().unwrap());
        let mut session = load(&api, "plan-2025").await;
        let vibration = EnvelopeId::new("env-vibration");
        api.set_unreachable(&vibration);
        session
            .set_amount_text(&vibration, month(6), AmountField::Contingency, "10")
            .unwrap();

        let report = save_session(&mut session, api.clone()).await;
        assert!(!report.is_complete());
        assert!(matches!(
            report.failed()[0].error(),
            SaveError::Transport(_)
        ));
        assert!(session.is_dirty(&vibration));
        assert_eq!(session.payloads().len(), 1);
    }

    #[tokio::test]
    async fn test_nothing_to_save() {
        let api = Arc::new(TestBudgetApi::seeded().unwrap());
        let mut session = load(&api, "plan-2025").await;
        let report = save_session(&mut session, api).await;
        assert!(report.is_complete());
        assert!(report.saved().is_empty());
    }

    #[test]
    fn test_report_serialization() {
        let report = SaveReport::new(
            vec![EnvelopeId::new("a")],
            vec![SaveFailure::new(
                EnvelopeId::new("b"),
                SaveError::Forbidden("not your cost center".to_string()),
            )],
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "saved": ["a"],
                "failed": [{
                    "envelope_id": "b",
                    "error": "permission denied: not your cost center"
                }]
            })
        );
    }
}
