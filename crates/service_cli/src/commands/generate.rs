//! Generate command implementation
//!
//! Runs the full pipeline for a validated plan and logs the outcome.

use crate::error::Result;
use crate::pipeline::{Pipeline, ProgressCallback, RunOutcome, RunReport};
use crate::state::RunState;
use infra_config::RunPlan;
use std::sync::Arc;
use synth_core::cancel::CancelFlag;
use tracing::{debug, info};

/// Run the generate command
pub async fn run(plan: RunPlan, cancel: &CancelFlag) -> Result<RunReport> {
    info!("Generating mock graph...");
    info!("  Seed: {}", plan.params.seed);
    info!("  As of: {}", plan.params.as_of);

    let progress: ProgressCallback = Arc::new(|state: &RunState, fraction: f64| {
        debug!(state = state.name(), percent = (fraction * 100.0).round(), "Run progress");
    });
    let mut pipeline = Pipeline::new(plan).with_progress(progress);
    let report = pipeline.run(cancel).await?;

    match &report.outcome {
        RunOutcome::Exported(summary) => {
            info!("CSV export ready for neo4j-admin import");
            info!("  Directory: {}", summary.out_dir.display());
            info!("  Files: {}", summary.manifest.files.len());
            info!("  Manifest: {}", summary.manifest_path.display());
        }
        RunOutcome::Uploaded(summary) => {
            let totals = summary.totals();
            info!("Direct upload finished in {:.1}s", summary.elapsed.as_secs_f64());
            info!("  Batches: {}", summary.total_batches());
            info!("  Nodes created: {}", totals.nodes_created);
            info!("  Relationships created: {}", totals.relationships_created);
        }
    }
    Ok(report)
}
