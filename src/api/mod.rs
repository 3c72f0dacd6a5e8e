//! The persistence layer that budget plans and envelopes are fetched from and saved to.
//!
//! `BudgetApi` is the seam: `HttpBudgetApi` talks to the REST backend and `TestBudgetApi` holds
//! everything in memory so the whole app can run without a server.

mod http;
mod memory;

use crate::budget::EnvelopePayload;
use crate::model::{BudgetPlan, Envelope, NewEnvelope, PlanId, PlanStatus};
use crate::{Config, Result};
use std::sync::Arc;

pub use http::HttpBudgetApi;
pub use memory::TestBudgetApi;

/// When this environment variable is set and non-empty, the in-memory backend is used.
const TEST_MODE_ENV: &str = "CMMS_BUDGET_IN_TEST_MODE";

/// Why the backend did not store an envelope's months. Every variant leaves the envelope's local
/// edits in place so the user can retry.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum SaveError {
    /// A month in the payload falls in a closed accounting period.
    #[error("the accounting period is closed: {0}")]
    Conflict(String),

    /// The user may not change this envelope.
    #[error("permission denied: {0}")]
    Forbidden(String),

    /// Any other refusal by the backend.
    #[error("the backend rejected the request with status {status}: {message}")]
    Rejected { status: u16, message: String },

    /// The request did not complete.
    #[error("the request could not be completed: {0}")]
    Transport(String),
}

impl SaveError {
    pub fn transport(error: impl std::fmt::Display) -> Self {
        SaveError::Transport(error.to_string())
    }
}

/// Fetches and stores budget data.
///
/// Implementations are shared between concurrent save tasks, so every method takes `&self`.
#[async_trait::async_trait]
pub trait BudgetApi: Send + Sync {
    /// Fetches one budget plan.
    async fn get_plan(&self, plan_id: &PlanId) -> Result<BudgetPlan>;

    /// Fetches every envelope of a plan, with their stored months.
    async fn list_envelopes(&self, plan_id: &PlanId) -> Result<Vec<Envelope>>;

    /// Creates an envelope with no months in a plan.
    async fn create_envelope(&self, plan_id: &PlanId, envelope: &NewEnvelope) -> Result<Envelope>;

    /// Replaces all stored months of one envelope with the twelve months in `payload`.
    async fn replace_envelope_months(
        &self,
        payload: &EnvelopePayload,
    ) -> std::result::Result<(), SaveError>;

    /// Moves a plan to `status` and returns the updated plan.
    async fn set_plan_status(&self, plan_id: &PlanId, status: PlanStatus) -> Result<BudgetPlan>;
}

/// Selects the `BudgetApi` implementation.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum Mode {
    /// Talk to the REST backend at the configured URL.
    #[default]
    Http,
    /// Use seeded in-memory data.
    Test,
}

impl Mode {
    /// `Mode::Test` when `CMMS_BUDGET_IN_TEST_MODE` is set and non-empty, otherwise `Mode::Http`.
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(value) if !value.is_empty() => Mode::Test,
            _ => Mode::Http,
        }
    }
}

/// Constructs the `BudgetApi` for `mode`.
pub async fn budget_api(config: &Config, mode: Mode) -> Result<Arc<dyn BudgetApi>> {
    match mode {
        Mode::Http => Ok(Arc::new(HttpBudgetApi::new(config).await?)),
        Mode::Test => Ok(Arc::new(TestBudgetApi::seeded()?)),
    }
}
