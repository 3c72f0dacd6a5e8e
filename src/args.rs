//! These structs provide the CLI interface for the budget CLI.

use crate::model::{AmountField, EnvelopeId, MaintenanceCategory, Month, PlanId, PlanStatus};
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// budget: A command-line tool for editing maintenance budget envelopes.
///
/// A budget plan covers one fiscal year and holds envelopes, each with twelve months of planned
/// and contingency amounts. This program fetches a plan from the CMMS backend, shows its totals,
/// applies edits and saves every changed envelope back.
///
/// Amounts are typed in the "1.234,56" style: "." groups thousands and "," separates decimals.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the home directory and initialize the configuration file.
    ///
    /// This is the first command you should run. Decide what directory you want to use and pass
    /// it as --budget-home (by default it will be $HOME/cmms-budget). If the backend requires a
    /// token, save it to $CMMS_BUDGET_HOME/.secrets/api_token.
    Init(InitArgs),
    /// Show a budget plan with its envelope and plan totals.
    Show(ShowArgs),
    /// Apply one or more amount edits to a plan and save the changed envelopes.
    Edit(EditArgs),
    /// Create an empty envelope in a plan.
    CreateEnvelope(CreateEnvelopeArgs),
    /// Move a plan to the approved or locked status.
    Status(StatusArgs),
    /// Parse or format an amount without talking to the backend.
    Amount(AmountArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where the configuration is held. Defaults to ~/cmms-budget
    #[arg(long, env = "CMMS_BUDGET_HOME", default_value_t = default_budget_home())]
    budget_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, budget_home: PathBuf) -> Self {
        Self {
            log_level,
            budget_home: budget_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn budget_home(&self) -> &DisplayPath {
        &self.budget_home
    }
}

/// (Not shown): Args for the `budget init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The base URL of the CMMS backend API, e.g. https://cmms.example.com/api/
    #[arg(long)]
    api_url: String,
}

impl InitArgs {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

/// (Not shown): Args for the `budget show` command.
#[derive(Debug, Parser, Clone)]
pub struct ShowArgs {
    /// The budget plan ID.
    #[arg(long)]
    plan: PlanId,
}

impl ShowArgs {
    pub fn new(plan: impl Into<PlanId>) -> Self {
        Self { plan: plan.into() }
    }

    pub fn plan(&self) -> &PlanId {
        &self.plan
    }
}

/// (Not shown): Args for the `budget edit` command.
#[derive(Debug, Parser, Clone)]
pub struct EditArgs {
    /// The budget plan ID.
    #[arg(long)]
    plan: PlanId,

    /// An edit in the form ENVELOPE:MONTH:FIELD=AMOUNT, where FIELD is "planned" or
    /// "contingency". For example: --edit env-hvac:3:planned=1.500,75
    ///
    /// Can be repeated. Later edits of the same cell win.
    #[arg(long = "edit", required = true)]
    edits: Vec<EditArg>,
}

impl EditArgs {
    pub fn new(plan: impl Into<PlanId>, edits: Vec<EditArg>) -> Self {
        Self {
            plan: plan.into(),
            edits,
        }
    }

    pub fn plan(&self) -> &PlanId {
        &self.plan
    }

    pub fn edits(&self) -> &[EditArg] {
        &self.edits
    }
}

/// One `ENVELOPE:MONTH:FIELD=AMOUNT` edit. The amount is kept as typed and parsed later.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct EditArg {
    envelope_id: EnvelopeId,
    month: Month,
    field: AmountField,
    text: String,
}

impl EditArg {
    pub fn new(
        envelope_id: impl Into<EnvelopeId>,
        month: Month,
        field: AmountField,
        text: impl Into<String>,
    ) -> Self {
        Self {
            envelope_id: envelope_id.into(),
            month,
            field,
            text: text.into(),
        }
    }

    pub fn envelope_id(&self) -> &EnvelopeId {
        &self.envelope_id
    }

    pub fn month(&self) -> Month {
        self.month
    }

    pub fn field(&self) -> AmountField {
        self.field
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl FromStr for EditArg {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (target, text) = s
            .split_once('=')
            .with_context(|| format!("Expected ENVELOPE:MONTH:FIELD=AMOUNT, got '{s}'"))?;
        // envelope ids may themselves contain ':'
        let mut parts = target.rsplitn(3, ':');
        let (Some(field), Some(month), Some(envelope_id)) =
            (parts.next(), parts.next(), parts.next())
        else {
            anyhow::bail!("Expected ENVELOPE:MONTH:FIELD=AMOUNT, got '{s}'");
        };
        anyhow::ensure!(!envelope_id.is_empty(), "The envelope ID is empty in '{s}'");
        let month = Month::from_str(month.trim())?;
        let field = AmountField::from_str(field.trim())
            .with_context(|| format!("Unknown field '{field}', use planned or contingency"))?;
        Ok(Self::new(envelope_id, month, field, text))
    }
}

/// (Not shown): Args for the `budget create-envelope` command.
#[derive(Debug, Parser, Clone)]
pub struct CreateEnvelopeArgs {
    /// The budget plan ID.
    #[arg(long)]
    plan: PlanId,

    /// The envelope name.
    #[arg(long)]
    name: String,

    /// The cost center the envelope is charged to.
    #[arg(long)]
    cost_center: String,

    /// One of: preventive, corrective, predictive, improvement, contracts, parts, energy, other
    #[arg(long, default_value_t = MaintenanceCategory::Other)]
    category: MaintenanceCategory,
}

impl CreateEnvelopeArgs {
    pub fn new(
        plan: impl Into<PlanId>,
        name: impl Into<String>,
        cost_center: impl Into<String>,
        category: MaintenanceCategory,
    ) -> Self {
        Self {
            plan: plan.into(),
            name: name.into(),
            cost_center: cost_center.into(),
            category,
        }
    }

    pub fn plan(&self) -> &PlanId {
        &self.plan
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
}

/// (Not shown): Args for the `budget status` command.
#[derive(Debug, Parser, Clone)]
pub struct StatusArgs {
    /// The budget plan ID.
    #[arg(long)]
    plan: PlanId,

    /// The target status: "approved" or "locked".
    status: PlanStatus,
}

impl StatusArgs {
    pub fn new(plan: impl Into<PlanId>, status: PlanStatus) -> Self {
        Self {
            plan: plan.into(),
            status,
        }
    }

    pub fn plan(&self) -> &PlanId {
        &self.plan
    }

    pub fn status(&self) -> PlanStatus {
        self.status
    }
}

/// (Not shown): Args for the `budget amount` command.
#[derive(Debug, Parser, Clone)]
pub struct AmountArgs {
    #[command(subcommand)]
    action: AmountAction,
}

impl AmountArgs {
    pub fn new(action: AmountAction) -> Self {
        Self { action }
    }

    pub fn action(&self) -> &AmountAction {
        &self.action
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum AmountAction {
    /// Parse typed text, e.g. "1.234,56", into a decimal number.
    Parse {
        /// The text to parse.
        text: String,
    },
    /// Format a decimal number, e.g. "1234.5", for display.
    Format {
        /// The number to format.
        value: String,
    },
}

fn default_budget_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("cmms-budget"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --budget-home or CMMS_BUDGET_HOME instead of relying on the \
                default home directory. If you continue using the program right now, you may \
                have problems!",
            );
            PathBuf::from("cmms-budget")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn month(n: u8) -> Month {
        Month::new(n).unwrap()
    }

    #[test]
    fn test_edit_arg_parse() {
        let edit = EditArg::from_str("env-hvac:3:planned=1.500,75").unwrap();
        assert_eq!(edit.envelope_id().as_str(), "env-hvac");
        assert_eq!(edit.month(), month(3));
        assert_eq!(edit.field(), AmountField::Planned);
        assert_eq!(edit.text(), "1.500,75");
    }

    #[test]
    fn test_edit_arg_envelope_id_with_colons() {
        let edit = EditArg::from_str("site:a:12:contingency=").unwrap();
        assert_eq!(edit.envelope_id().as_str(), "site:a");
        assert_eq!(edit.month(), month(12));
        assert_eq!(edit.field(), AmountField::Contingency);
        assert_eq!(edit.text(), "");
    }

    #[test]
    fn test_edit_arg_errors() {
        assert!(EditArg::from_str("env-hvac:3:planned").is_err());
        assert!(EditArg::from_str("3:planned=1").is_err());
        assert!(EditArg::from_str("env-hvac:13:planned=1").is_err());
        assert!(EditArg::from_str("env-hvac:3:budget=1").is_err());
        assert!(EditArg::from_str(":3:planned=1").is_err());
    }

    #[test]
    fn test_parse_command_line() {
        let args = Args::try_parse_from([
            "budget",
            "--budget-home",
            "/tmp/budget",
            "edit",
            "--plan",
            "plan-2025",
            "--edit",
            "env-hvac:1:planned=10",
            "--edit",
            "env-pumps:2:contingency=5,5",
        ])
        .unwrap();
        assert_eq!(args.common().budget_home().path(), Path::new("/tmp/budget"));
        let Command::Edit(edit) = args.command() else {
            panic!("expected the edit command");
        };
        assert_eq!(edit.plan().as_str(), "plan-2025");
        assert_eq!(edit.edits().len(), 2);
    }

    #[test]
    fn test_parse_status_command() {
        let args =
            Args::try_parse_from(["budget", "status", "--plan", "p", "approved"]).unwrap();
        let Command::Status(status) = args.command() else {
            panic!("expected the status command");
        };
        assert_eq!(status.status(), PlanStatus::Approved);
    }
}
