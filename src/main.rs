use clap::Parser;
use cmms_budget::args::{AmountAction, Args, Command};
use cmms_budget::model::NewEnvelope;
use cmms_budget::{commands, Config, Mode, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().budget_home().path();

    // When CMMS_BUDGET_IN_TEST_MODE is set and non-empty the in-memory backend is used instead of
    // the configured API.
    let mode = Mode::from_env();

    let _: () = match args.command() {
        Command::Init(init_args) => commands::init(home, init_args.api_url()).await?.print(),

        Command::Show(show_args) => {
            let config = Config::load(home).await?;
            commands::show(&config, mode, show_args.plan()).await?.print()
        }

        Command::Edit(edit_args) => {
            let config = Config::load(home).await?;
            commands::edit(&config, mode, edit_args.plan(), edit_args.edits())
                .await?
                .print()
        }

        Command::CreateEnvelope(create_args) => {
            let config = Config::load(home).await?;
            let envelope = NewEnvelope {
                name: create_args.name().to_string(),
                cost_center: create_args.cost_center().to_string(),
                category: create_args.category(),
            };
            commands::create_envelope(&config, mode, create_args.plan(), envelope)
                .await?
                .print()
        }

        Command::Status(status_args) => {
            let config = Config::load(home).await?;
            commands::set_status(&config, mode, status_args.plan(), status_args.status())
                .await?
                .print()
        }

        Command::Amount(amount_args) => match amount_args.action() {
            AmountAction::Parse { text } => commands::amount_parse(text)?.print(),
            AmountAction::Format { value } => commands::amount_format(value)?.print(),
        },
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "cmms_budget={},{}={}",
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
