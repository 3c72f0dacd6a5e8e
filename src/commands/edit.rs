use crate::api::{self, BudgetApi, Mode};
use crate::args::EditArg;
use crate::budget::{save_session, SaveReport};
use crate::commands::{load_session, Out, PlanSummary};
use crate::model::PlanId;
use crate::{Config, Result};
use anyhow::bail;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// The result of an `edit`: what was saved and the plan as it stands afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct EditOut {
    report: SaveReport,
    summary: PlanSummary,
}

impl EditOut {
    pub fn report(&self) -> &SaveReport {
        &self.report
    }

    pub fn summary(&self) -> &PlanSummary {
        &self.summary
    }
}

/// Applies `edits` to the plan's envelopes in order, then saves every changed envelope.
///
/// # Errors
/// - The plan cannot be fetched, is locked, or an edit names an unknown envelope. Nothing is
///   saved in that case.
/// - One or more envelopes were not saved. Each failure is logged with its reason.
pub async fn edit(
    config: &Config,
    mode: Mode,
    plan_id: &PlanId,
    edits: &[EditArg],
) -> Result<Out<EditOut>> {
    let api = api::budget_api(config, mode).await?;
    edit_with(api, plan_id, edits).await
}

pub(super) async fn edit_with(
    api: Arc<dyn BudgetApi>,
    plan_id: &PlanId,
    edits: &[EditArg],
) -> Result<Out<EditOut>> {
    let mut session = load_session(api.as_ref(), plan_id).await?;
    for edit in edits {
        let value =
            session.set_amount_text(edit.envelope_id(), edit.month(), edit.field(), edit.text())?;
        debug!(
            "{} month {} {} = {value}",
            edit.envelope_id(),
            edit.month(),
            edit.field()
        );
    }

    let report = save_session(&mut session, api).await;
    for failure in report.failed() {
        warn!(
            "Envelope {} was not saved: {}",
            failure.envelope_id(),
            failure.error()
        );
    }
    if !report.is_complete() {
        bail!(
            "{} of {} envelope(s) could not be saved, run the edit again to retry",
            report.failed().len(),
            report.failed().len() + report.saved().len()
        );
    }

    let summary = PlanSummary::from_session(&session);
    let message = format!(
        "Saved {} envelope(s)\n{}",
        report.saved().len(),
        summary.render()
    );
    Ok(Out::new(message, EditOut { report, summary }))
}
