//! Command-line definitions.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use infra_config::{ConfigOverrides, LogLevel, RunMode, DEFAULT_CONFIG_FILE};
use std::path::PathBuf;
use std::str::FromStr;

/// Synthetic financial-market graph generator
#[derive(Debug, Parser)]
#[command(name = "mockgraph")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path (optional unless given explicitly)
    #[arg(short, long, global = true, env = "MOCKGRAPH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a dataset and write it to the configured sink
    Generate(RunArgs),

    /// Print the validated run plan without generating anything
    Plan(RunArgs),

    /// Re-read an exported file set and check its references
    Verify {
        /// Directory holding the file set
        dir: PathBuf,
    },
}

/// Overrides shared by `generate` and `plan`.
#[derive(Debug, Clone, Default, Args)]
pub struct RunArgs {
    /// Run seed
    #[arg(long, allow_negative_numbers = true)]
    pub seed: Option<i64>,

    /// Number of instruments
    #[arg(long, allow_negative_numbers = true)]
    pub n_instruments: Option<i64>,

    /// Number of issuers
    #[arg(long, allow_negative_numbers = true)]
    pub n_issuers: Option<i64>,

    /// Number of counterparties
    #[arg(long, allow_negative_numbers = true)]
    pub n_counterparties: Option<i64>,

    /// Number of trades (orders are derived from this)
    #[arg(long, allow_negative_numbers = true)]
    pub n_trades: Option<i64>,

    /// Number of signals
    #[arg(long, allow_negative_numbers = true)]
    pub n_signals: Option<i64>,

    /// Number of events
    #[arg(long, allow_negative_numbers = true)]
    pub n_events: Option<i64>,

    /// Correlation peers per instrument
    #[arg(long, allow_negative_numbers = true)]
    pub corr_top_k: Option<i64>,

    /// Average trades per order
    #[arg(long)]
    pub avg_trades_per_order: Option<f64>,

    /// Correlation window label
    #[arg(long)]
    pub corr_window: Option<String>,

    /// Anchor date for timestamps (YYYY-MM-DD, default today in UTC)
    #[arg(long)]
    pub as_of: Option<NaiveDate>,

    /// Sink: csv or direct
    #[arg(long, value_parser = parse_mode)]
    pub mode: Option<RunMode>,

    /// Output directory for csv mode
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Store URI for direct mode (http or https)
    #[arg(long)]
    pub uri: Option<String>,

    /// Store user
    #[arg(long)]
    pub user: Option<String>,

    /// Store password
    #[arg(long)]
    pub password: Option<String>,

    /// Store database
    #[arg(long)]
    pub database: Option<String>,

    /// Rows per write batch
    #[arg(long, allow_negative_numbers = true)]
    pub batch_size: Option<i64>,

    /// Batches in flight within one load stage
    #[arg(long, allow_negative_numbers = true)]
    pub max_concurrent_batches: Option<i64>,

    /// Log level: trace, debug, info, warn, error
    #[arg(long, value_parser = parse_log_level)]
    pub log_level: Option<LogLevel>,
}

impl RunArgs {
    /// Flags as the highest-precedence configuration layer.
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            seed: self.seed,
            n_instruments: self.n_instruments,
            n_issuers: self.n_issuers,
            n_counterparties: self.n_counterparties,
            n_trades: self.n_trades,
            n_signals: self.n_signals,
            n_events: self.n_events,
            corr_top_k: self.corr_top_k,
            avg_trades_per_order: self.avg_trades_per_order,
            corr_window: self.corr_window.clone(),
            as_of: self.as_of,
            mode: self.mode,
            out_dir: self.out_dir.clone(),
            uri: self.uri.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
            database: self.database.clone(),
            batch_size: self.batch_size,
            max_concurrent_batches: self.max_concurrent_batches,
            log_level: self.log_level,
        }
    }
}

impl Cli {
    /// Config file to read and whether it must exist.
    ///
    /// An explicit path is required; otherwise `mockgraph.toml` is read when
    /// present.
    pub fn config_file(&self) -> (PathBuf, bool) {
        match &self.config {
            Some(path) => (path.clone(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        }
    }
}

fn parse_mode(s: &str) -> Result<RunMode, String> {
    RunMode::from_str(s).map_err(|e| e.to_string())
}

fn parse_log_level(s: &str) -> Result<LogLevel, String> {
    LogLevel::from_str(s).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_generate_flags_become_overrides() {
        let cli = Cli::try_parse_from([
            "mockgraph",
            "generate",
            "--seed",
            "-3",
            "--n-trades",
            "40",
            "--mode",
            "direct",
            "--as-of",
            "2024-06-14",
            "--log-level",
            "debug",
        ])
        .unwrap();
        let Command::Generate(args) = cli.command else {
            panic!("Expected generate");
        };
        let overrides = args.overrides();
        assert_eq!(overrides.seed, Some(-3));
        assert_eq!(overrides.n_trades, Some(40));
        assert_eq!(overrides.mode, Some(RunMode::Direct));
        assert_eq!(overrides.as_of, NaiveDate::from_ymd_opt(2024, 6, 14));
        assert_eq!(overrides.log_level, Some(LogLevel::Debug));
        assert_eq!(overrides.n_events, None);
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        let result = Cli::try_parse_from(["mockgraph", "plan", "--mode", "bolt"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_file_requirement() {
        let cli = Cli::try_parse_from(["mockgraph", "verify", "out"]).unwrap();
        assert_eq!(cli.config_file(), (PathBuf::from("mockgraph.toml"), false));

        let cli = Cli::try_parse_from(["mockgraph", "-c", "run.toml", "verify", "out"]).unwrap();
        assert_eq!(cli.config_file(), (PathBuf::from("run.toml"), true));
    }
}
