//! Integration tests for flag and config-file layering through the CLI.

use clap::Parser;
use infra_config::{RunMode, SinkPlan};
use service_cli::cli::{Cli, Command};
use service_cli::commands;
use std::fs;

#[test]
fn test_flags_override_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("run.toml");
    fs::write(
        &file,
        "seed = 9\nn_instruments = 12\nn_trades = 30\nout_dir = \"from_file\"\n",
    )
    .unwrap();

    let cli = Cli::try_parse_from([
        "mockgraph",
        "--config",
        file.to_str().unwrap(),
        "plan",
        "--seed",
        "11",
    ])
    .unwrap();
    let (path, required) = cli.config_file();
    assert!(required);
    let Command::Plan(args) = &cli.command else {
        panic!("Expected plan");
    };

    let config = commands::load_config(&path, required, args).unwrap();
    assert_eq!(config.seed, 11);
    assert_eq!(config.n_instruments, 12);
    assert_eq!(config.n_trades, 30);
    assert_eq!(config.mode, RunMode::Csv);

    let plan = config
        .into_plan(chrono::NaiveDate::from_ymd_opt(2024, 6, 14).unwrap())
        .unwrap();
    assert_eq!(plan.params.seed, 11);
    assert!(matches!(plan.sink, SinkPlan::Csv { ref out_dir } if out_dir.ends_with("from_file")));
}

#[test]
fn test_missing_explicit_config_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");
    let cli = Cli::try_parse_from([
        "mockgraph",
        "--config",
        missing.to_str().unwrap(),
        "generate",
    ])
    .unwrap();
    let (path, required) = cli.config_file();
    let Command::Generate(args) = &cli.command else {
        panic!("Expected generate");
    };
    assert!(commands::load_config(&path, required, args).is_err());
}
