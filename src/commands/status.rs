use crate::api::{self, BudgetApi, Mode};
use crate::commands::Out;
use crate::model::{BudgetPlan, PlanId, PlanStatus};
use crate::{Config, Result};
use anyhow::ensure;
use tracing::info;

/// Moves a plan forward to `status`. Plans go `draft -> approved -> locked` one step at a time.
pub async fn set_status(
    config: &Config,
    mode: Mode,
    plan_id: &PlanId,
    status: PlanStatus,
) -> Result<Out<BudgetPlan>> {
    let api = api::budget_api(config, mode).await?;
    set_status_with(api.as_ref(), plan_id, status).await
}

pub(super) async fn set_status_with(
    api: &dyn BudgetApi,
    plan_id: &PlanId,
    status: PlanStatus,
) -> Result<Out<BudgetPlan>> {
    let plan = api.get_plan(plan_id).await?;
    ensure!(
        plan.status().can_transition_to(status),
        "Budget plan {plan_id} cannot move from {} to {status}",
        plan.status()
    );
    let updated = api.set_plan_status(plan_id, status).await?;
    if updated.status() == PlanStatus::Locked {
        info!("Budget plan {plan_id} is now locked, its envelopes can no longer be edited");
    }
    Ok(Out::new(
        format!("Budget plan {plan_id} is now {}", updated.status()),
        updated,
    ))
}
