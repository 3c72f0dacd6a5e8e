//! Command handlers for the budget CLI.
//!
//! This module contains implementations for all CLI subcommands.

mod amount;
mod edit;
mod envelope;
mod init;
mod show;
mod status;

use crate::api::BudgetApi;
use crate::budget::EditSession;
use crate::model::PlanId;
use crate::Result;
use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, info};

pub use amount::{amount_format, amount_parse, AmountOut};
pub use edit::{edit, EditOut};
pub use envelope::create_envelope;
pub use init::init;
pub use show::{show, EnvelopeSummary, PlanSummary};
pub use status::set_status;

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

/// Fetches a plan and its envelopes into a fresh `EditSession`.
async fn load_session(api: &dyn BudgetApi, plan_id: &PlanId) -> Result<EditSession> {
    let plan = api.get_plan(plan_id).await?;
    let envelopes = api.list_envelopes(plan_id).await?;
    debug!(
        "Loaded budget plan {plan_id} with {} envelope(s)",
        envelopes.len()
    );
    Ok(EditSession::new(plan, envelopes))
}
