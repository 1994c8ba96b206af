//! Run pipeline: validate, assemble, then write to the planned sink.
//!
//! The pipeline owns the run's [`RunState`]. Any error moves it to
//! `Failed` and is returned unchanged to the caller.

use crate::error::{Result, RunError};
use crate::state::RunState;
use adapter_bulk::{export, ExportSummary};
use infra_config::{Neo4jTarget, RunPlan, SinkPlan};
use infra_store::{
    BatchProgress, ConnectionConfig, HttpGraphSession, LoadOptions, LoadStage, Loader,
    UploadSummary,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use synth_core::cancel::CancelFlag;
use synth_core::dataset::{assemble, Dataset};
use tracing::{error, info};

/// Progress callback: current state and overall completion in [0, 1]
pub type ProgressCallback = Arc<dyn Fn(&RunState, f64) + Send + Sync>;

/// What the writing step produced.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// Bulk-import file set written
    Exported(ExportSummary),
    /// Dataset loaded into the store
    Uploaded(UploadSummary),
}

/// Summary of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Nodes in the generated dataset
    pub nodes: usize,
    /// Relationships in the generated dataset
    pub relationships: usize,
    /// Writer result
    pub outcome: RunOutcome,
    /// Wall-clock duration
    pub elapsed: Duration,
}

/// One run of the generator.
pub struct Pipeline {
    plan: RunPlan,
    state: RunState,
    progress: Option<ProgressCallback>,
}

impl Pipeline {
    /// Create a pending run for `plan`
    pub fn new(plan: RunPlan) -> Self {
        Self {
            plan,
            state: RunState::Pending,
            progress: None,
        }
    }

    /// Report state changes and load progress
    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Current state
    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// The plan being run
    pub fn plan(&self) -> &RunPlan {
        &self.plan
    }

    /// Execute the run.
    ///
    /// On error the state is `Failed` with this error recorded; otherwise it
    /// is `Completed`.
    pub async fn run(&mut self, cancel: &CancelFlag) -> Result<RunReport> {
        let started = Instant::now();
        match self.execute(cancel).await {
            Ok((dataset, outcome)) => {
                self.advance(RunState::Completed, 1.0)?;
                let report = RunReport {
                    nodes: dataset.total_nodes(),
                    relationships: dataset.total_relationships(),
                    outcome,
                    elapsed: started.elapsed(),
                };
                info!(
                    nodes = report.nodes,
                    relationships = report.relationships,
                    elapsed_ms = report.elapsed.as_millis() as u64,
                    "Run completed"
                );
                Ok(report)
            }
            Err(err) => {
                self.state.fail(&err);
                error!(kind = %err.kind(), error = %err, "Run failed");
                self.notify(0.0);
                Err(err)
            }
        }
    }

    async fn execute(&mut self, cancel: &CancelFlag) -> Result<(Arc<Dataset>, RunOutcome)> {
        self.plan.params.validate()?;

        self.advance(RunState::Generating, 0.0)?;
        let params = self.plan.params.clone();
        let dataset = off_runtime(move || assemble(&params).map_err(RunError::from)).await?;
        let dataset = Arc::new(dataset);

        self.advance(RunState::Writing, 0.0)?;
        let outcome = match self.plan.sink.clone() {
            SinkPlan::Csv { out_dir } => {
                info!(path = %out_dir.display(), "Writing bulk-import file set");
                let dataset = Arc::clone(&dataset);
                let cancel = cancel.clone();
                let summary = off_runtime(move || {
                    export(&dataset, &out_dir, &cancel).map_err(RunError::from)
                })
                .await?;
                RunOutcome::Exported(summary)
            }
            SinkPlan::Direct {
                target,
                batch_size,
                max_concurrent_batches,
            } => {
                info!(uri = %target.uri, database = %target.database, "Uploading to store");
                let session = Arc::new(HttpGraphSession::new(&connection_config(&target))?);
                let options = LoadOptions {
                    batch_size,
                    max_concurrent_batches,
                };
                let mut loader = Loader::new(session, options)?;
                if let Some(progress) = &self.progress {
                    loader = loader.with_progress(load_progress(Arc::clone(progress)));
                }
                RunOutcome::Uploaded(loader.upload(&dataset, cancel).await?)
            }
        };
        Ok((dataset, outcome))
    }

    fn advance(&mut self, next: RunState, fraction: f64) -> Result<()> {
        self.state.transition(next)?;
        info!(state = self.state.name(), "Run state changed");
        self.notify(fraction);
        Ok(())
    }

    fn notify(&self, fraction: f64) {
        if let Some(progress) = &self.progress {
            progress(&self.state, fraction);
        }
    }
}

/// Run generation or file export on the blocking pool so the async workers
/// (and the interrupt handler) keep running. A panic in `work` is re-raised.
async fn off_runtime<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(result) => result,
        Err(err) => match err.try_into_panic() {
            Ok(payload) => std::panic::resume_unwind(payload),
            Err(err) => Err(RunError::Worker(err)),
        },
    }
}

fn connection_config(target: &Neo4jTarget) -> ConnectionConfig {
    ConnectionConfig::new(
        target.uri.clone(),
        target.user.clone(),
        target.password.clone(),
        target.database.clone(),
    )
}

/// Spread per-stage batch progress evenly over the load stages.
fn load_progress(progress: ProgressCallback) -> BatchProgress {
    Arc::new(move |stage: LoadStage, done: usize, total: usize| {
        let index = LoadStage::ALL
            .iter()
            .position(|s| *s == stage)
            .unwrap_or_default();
        let within = if total == 0 {
            1.0
        } else {
            done as f64 / total as f64
        };
        let fraction = (index as f64 + within) / LoadStage::ALL.len() as f64;
        progress(&RunState::Writing, fraction);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_load_progress_is_monotonic_over_stages() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let progress: ProgressCallback = Arc::new(move |_state, fraction| {
            sink.lock().unwrap().push(fraction);
        });
        let bridge = load_progress(progress);
        bridge(LoadStage::Constraints, 1, 1);
        bridge(LoadStage::Instruments, 1, 2);
        bridge(LoadStage::Instruments, 2, 2);
        bridge(LoadStage::Correlations, 4, 4);

        let seen = seen.lock().unwrap();
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert!((seen[seen.len() - 1] - 1.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_off_runtime_returns_work_result() {
        let value = off_runtime(|| Ok(21 * 2)).await.unwrap();
        assert_eq!(value, 42);

        let err = off_runtime(|| -> Result<()> {
            Err(RunError::from(synth_core::error::SynthError::invalid_argument("no")))
        })
        .await
        .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_connection_config_from_target() {
        let target = Neo4jTarget {
            uri: "http://localhost:7474".to_string(),
            user: "neo4j".to_string(),
            password: "pw".to_string(),
            database: "market".to_string(),
        };
        let config = connection_config(&target);
        assert_eq!(config.database, "market");
        assert_eq!(config.password, "pw");
    }
}
