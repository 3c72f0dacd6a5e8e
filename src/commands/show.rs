use crate::api::{self, BudgetApi, Mode};
use crate::budget::{EditSession, EnvelopeTotals, PlanTotals};
use crate::commands::{load_session, Out};
use crate::model::{BudgetPlan, EnvelopeId, EnvelopeMonth, MaintenanceCategory, PlanId};
use crate::{Config, Result};
use serde::Serialize;
use std::fmt::Write;

/// A plan with every envelope's months and the totals computed from them.
#[derive(Debug, Clone, Serialize)]
pub struct PlanSummary {
    plan: BudgetPlan,
    envelopes: Vec<EnvelopeSummary>,
    totals: PlanTotals,
    /// `totals` formatted for display.
    display: DisplayTotals,
}

impl PlanSummary {
    pub fn from_session(session: &EditSession) -> Self {
        let envelopes: Vec<EnvelopeSummary> = session
            .envelopes()
            .map(|envelope| {
                let id = envelope.id();
                let totals = session.envelope_totals(id);
                EnvelopeSummary {
                    id: id.clone(),
                    name: envelope.name().to_string(),
                    cost_center: envelope.cost_center().to_string(),
                    category: envelope.category(),
                    months: session.months(id).to_vec(),
                    totals,
                    display: DisplayTotals::from_envelope(&totals),
                    unsaved: session.is_dirty(id),
                }
            })
            .collect();
        let totals = session.plan_totals();
        Self {
            plan: session.plan().clone(),
            envelopes,
            totals,
            display: DisplayTotals::from_plan(&totals),
        }
    }

    pub fn plan(&self) -> &BudgetPlan {
        &self.plan
    }

    pub fn envelopes(&self) -> &[EnvelopeSummary] {
        &self.envelopes
    }

    pub fn totals(&self) -> &PlanTotals {
        &self.totals
    }

    /// Renders the summary as a plain text table.
    pub fn render(&self) -> String {
        let mut out = format!(
            "{} ({}, {} {}, {})\n",
            self.plan.name(),
            self.plan.id(),
            self.plan.year(),
            self.plan.currency(),
            self.plan.status()
        );
        let _ = writeln!(
            out,
            "{:<16} {:<32} {:<10} {:>16} {:>16} {:>16}",
            "ID", "NAME", "COST CTR", "PLANNED", "CONTINGENCY", "TOTAL"
        );
        for e in &self.envelopes {
            let marker = if e.unsaved { "*" } else { "" };
            let _ = writeln!(
                out,
                "{:<16} {:<32} {:<10} {:>16} {:>16} {:>16}",
                format!("{}{marker}", e.id),
                e.name,
                e.cost_center,
                e.display.planned,
                e.display.contingency,
                e.display.total
            );
        }
        let _ = write!(
            out,
            "{:<60} {:>16} {:>16} {:>16}",
            "TOTAL", self.display.planned, self.display.contingency, self.display.total
        );
        out
    }
}

/// One envelope of a `PlanSummary`.
#[derive(Debug, Clone, Serialize)]
pub struct EnvelopeSummary {
    id: EnvelopeId,
    name: String,
    cost_center: String,
    category: MaintenanceCategory,
    months: Vec<EnvelopeMonth>,
    totals: EnvelopeTotals,
    display: DisplayTotals,
    unsaved: bool,
}

impl EnvelopeSummary {
    pub fn id(&self) -> &EnvelopeId {
        &self.id
    }

    pub fn totals(&self) -> &EnvelopeTotals {
        &self.totals
    }

    pub fn unsaved(&self) -> bool {
        self.unsaved
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
struct DisplayTotals {
    planned: String,
    contingency: String,
    total: String,
}

impl DisplayTotals {
    fn from_envelope(totals: &EnvelopeTotals) -> Self {
        Self {
            planned: totals.planned.to_string(),
            contingency: totals.contingency.to_string(),
            total: totals.total().to_string(),
        }
    }

    fn from_plan(totals: &PlanTotals) -> Self {
        Self {
            planned: totals.planned.to_string(),
            contingency: totals.contingency.to_string(),
            total: totals.grand_total.to_string(),
        }
    }
}

/// Fetches a plan and prints its envelopes with their totals.
pub async fn show(config: &Config, mode: Mode, plan_id: &PlanId) -> Result<Out<PlanSummary>> {
    let api = api::budget_api(config, mode).await?;
    show_with(api.as_ref(), plan_id).await
}

pub(super) async fn show_with(api: &dyn BudgetApi, plan_id: &PlanId) -> Result<Out<PlanSummary>> {
    let session = load_session(api, plan_id).await?;
    let summary = PlanSummary::from_session(&session);
    Ok(Out::new(summary.render(), summary))
}
