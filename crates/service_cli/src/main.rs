//! mockgraph CLI - Synthetic Market Graph Generation
//!
//! # Commands
//!
//! - `mockgraph generate` - Generate a dataset and export or upload it
//! - `mockgraph plan` - Print the validated run plan
//! - `mockgraph verify <dir>` - Check an exported file set
//!
//! Settings are layered: defaults, `mockgraph.toml`, `MOCKGRAPH_*` (and
//! `NEO4J_*`) environment variables, then flags.

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use infra_config::LogLevel;
use service_cli::cli::{Cli, Command};
use service_cli::commands;
use service_cli::RunError;
use std::process::ExitCode;
use synth_core::cancel::CancelFlag;
use tracing::warn;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(level: LogLevel) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.as_filter_str()))
        .context("invalid log filter")?;
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .try_init()
        .context("failed to install tracing subscriber")?;
    Ok(())
}

/// Cancel the run on Ctrl-C; batches and files already written stay.
fn cancel_on_interrupt() -> CancelFlag {
    let cancel = CancelFlag::new();
    let flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling run");
            flag.cancel();
        }
    });
    cancel
}

async fn try_main(cli: Cli) -> anyhow::Result<()> {
    let (config_file, required) = cli.config_file();
    let today = Utc::now().date_naive();

    match cli.command {
        Command::Generate(args) => {
            let config = commands::load_config(&config_file, required, &args)?;
            init_tracing(config.log_level)?;
            let plan = config.into_plan(today).map_err(RunError::from)?;
            let cancel = cancel_on_interrupt();
            commands::generate::run(plan, &cancel).await?;
        }
        Command::Plan(args) => {
            let config = commands::load_config(&config_file, required, &args)?;
            init_tracing(config.log_level)?;
            let plan = config.clone().into_plan(today).map_err(RunError::from)?;
            println!("{}", commands::plan::run(&config, &plan)?);
        }
        Command::Verify { dir } => {
            init_tracing(LogLevel::default())?;
            let import = commands::verify::run(&dir)?;
            println!(
                "{}: {} files, {} rows, schema v{}",
                dir.display(),
                import.manifest.files.len(),
                import.manifest.total_rows(),
                import.manifest.schema_version
            );
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match try_main(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            match err.downcast_ref::<RunError>() {
                Some(run_error) => ExitCode::from(run_error.kind().exit_code()),
                None => ExitCode::FAILURE,
            }
        }
    }
}
