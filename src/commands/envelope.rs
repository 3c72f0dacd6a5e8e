use crate::api::{self, BudgetApi, Mode};
use crate::commands::Out;
use crate::model::{Envelope, NewEnvelope, PlanId};
use crate::{Config, Result};
use anyhow::{ensure, Context};
use tracing::debug;

/// Creates an envelope with no months in `plan_id`. The plan must not be locked.
pub async fn create_envelope(
    config: &Config,
    mode: Mode,
    plan_id: &PlanId,
    envelope: NewEnvelope,
) -> Result<Out<Envelope>> {
    let api = api::budget_api(config, mode).await?;
    create_envelope_with(api.as_ref(), plan_id, envelope).await
}

pub(super) async fn create_envelope_with(
    api: &dyn BudgetApi,
    plan_id: &PlanId,
    envelope: NewEnvelope,
) -> Result<Out<Envelope>> {
    ensure!(
        !envelope.name.trim().is_empty(),
        "The envelope name cannot be empty"
    );
    let plan = api.get_plan(plan_id).await?;
    ensure!(
        plan.is_editable(),
        "Budget plan {plan_id} is locked, envelopes cannot be added"
    );
    let created = api
        .create_envelope(plan_id, &envelope)
        .await
        .with_context(|| format!("Unable to create envelope '{}'", envelope.name))?;
    debug!("{created:?}");
    Ok(Out::new(
        format!(
            "Created envelope {} '{}' in budget plan {plan_id}",
            created.id(),
            created.name()
        ),
        created,
    ))
}
