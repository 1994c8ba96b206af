//! CLI command implementations
//!
//! Each submodule implements one subcommand.

pub mod generate;
pub mod plan;
pub mod verify;

use crate::cli::RunArgs;
use crate::error::Result;
use infra_config::{ConfigLoader, RunConfig};
use std::path::Path;

/// Merge defaults, the config file, the environment and `args`.
pub fn load_config(file: &Path, required: bool, args: &RunArgs) -> Result<RunConfig> {
    let mut config = ConfigLoader::new().with_file(file, required).load()?;
    config.merge_overrides(&args.overrides());
    Ok(config)
}
