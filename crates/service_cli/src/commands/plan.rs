//! Plan command implementation
//!
//! Renders the validated plan and the merged settings without doing work.

use crate::error::Result;
use infra_config::{RunConfig, RunPlan};

/// Render the plan followed by the merged configuration, password masked.
pub fn run(config: &RunConfig, plan: &RunPlan) -> Result<String> {
    let settings = config.to_toml_redacted()?;
    Ok(format!("{}\n\n# Merged configuration\n{}", plan, settings))
}
