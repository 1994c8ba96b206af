//! Batched transactional loader.
//!
//! Writes a [`Dataset`] through a [`GraphSession`] in fixed stages:
//!
//! 1. Constraints (one unit, every label)
//! 2. Instruments, Issuers, then the Instrument -> Issuer links
//! 3. Counterparties
//! 4. Orders with PLACED_BY and ORDER_ON
//! 5. Trades with EXECUTES and EXECUTES_ON
//! 6. Signals with APPLIES_TO, Events with AFFECTS
//! 7. Correlation edges
//!
//! A stage starts only after every batch of the previous stage has
//! committed; relationship merges match on existing endpoints and silently
//! create nothing otherwise. Within a stage, up to `max_concurrent_batches`
//! units are in flight. Every write is a merge, so re-running a load, or
//! resuming after a failed batch, converges to the same graph.

use crate::error::{LoadError, StoreError};
use crate::session::{GraphSession, WriteStats};
use crate::statement::Statement;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use synth_core::cancel::CancelFlag;
use synth_core::dataset::Dataset;
use synth_core::schema::{GraphNode, Label, RelRecord, RelType};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Default rows per batch.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Default batches in flight within one stage.
pub const DEFAULT_MAX_CONCURRENT_BATCHES: usize = 4;

/// Load stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStage {
    /// Uniqueness constraints
    Constraints,
    /// Instrument nodes
    Instruments,
    /// Issuer nodes
    Issuers,
    /// ISSUED_BY relationships
    IssuerLinks,
    /// Counterparty nodes
    Counterparties,
    /// Order nodes with PLACED_BY and ORDER_ON
    Orders,
    /// Trade nodes with EXECUTES and EXECUTES_ON
    Trades,
    /// Signal nodes with APPLIES_TO
    Signals,
    /// Event nodes with AFFECTS
    Events,
    /// CORRELATED_WITH relationships
    Correlations,
}

impl LoadStage {
    /// All stages in execution order.
    pub const ALL: [LoadStage; 10] = [
        LoadStage::Constraints,
        LoadStage::Instruments,
        LoadStage::Issuers,
        LoadStage::IssuerLinks,
        LoadStage::Counterparties,
        LoadStage::Orders,
        LoadStage::Trades,
        LoadStage::Signals,
        LoadStage::Events,
        LoadStage::Correlations,
    ];

    /// Stage name for logs and errors
    pub fn name(&self) -> &'static str {
        match self {
            Self::Constraints => "constraints",
            Self::Instruments => "instruments",
            Self::Issuers => "issuers",
            Self::IssuerLinks => "issuer_links",
            Self::Counterparties => "counterparties",
            Self::Orders => "orders",
            Self::Trades => "trades",
            Self::Signals => "signals",
            Self::Events => "events",
            Self::Correlations => "correlations",
        }
    }

    fn units(&self, dataset: &Dataset, batch_size: usize) -> Vec<Vec<Statement>> {
        match self {
            Self::Constraints => vec![Label::ALL
                .iter()
                .map(|&label| Statement::CreateConstraint { label })
                .collect()],
            Self::Instruments => node_units(dataset, dataset.instruments(), &[], batch_size),
            Self::Issuers => node_units(dataset, dataset.issuers(), &[], batch_size),
            Self::IssuerLinks => relationship_units(dataset, RelType::IssuedBy, batch_size),
            Self::Counterparties => node_units(dataset, dataset.counterparties(), &[], batch_size),
            Self::Orders => node_units(
                dataset,
                dataset.orders(),
                &[RelType::PlacedBy, RelType::OrderOn],
                batch_size,
            ),
            Self::Trades => node_units(
                dataset,
                dataset.trades(),
                &[RelType::Executes, RelType::ExecutesOn],
                batch_size,
            ),
            Self::Signals => node_units(dataset, dataset.signals(), &[RelType::AppliesTo], batch_size),
            Self::Events => node_units(dataset, dataset.events(), &[RelType::Affects], batch_size),
            Self::Correlations => relationship_units(dataset, RelType::CorrelatedWith, batch_size),
        }
    }
}

impl fmt::Display for LoadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One unit per chunk of nodes. Relationships owned by those nodes ride in
/// the same unit, since `Dataset::relationships` yields one record per node
/// in node order for these types.
fn node_units<N: GraphNode>(
    dataset: &Dataset,
    nodes: &[N],
    attached: &[RelType],
    batch_size: usize,
) -> Vec<Vec<Statement>> {
    let attached: Vec<(RelType, Vec<RelRecord>)> = attached
        .iter()
        .map(|&rel| (rel, dataset.relationships(rel)))
        .collect();

    nodes
        .chunks(batch_size)
        .enumerate()
        .map(|(i, chunk)| {
            let start = i * batch_size;
            let range = start..start + chunk.len();
            let mut unit = Vec::with_capacity(1 + attached.len());
            unit.push(Statement::merge_nodes(chunk));
            for (rel, records) in &attached {
                unit.push(Statement::MergeRelationships {
                    rel: *rel,
                    rows: records[range.clone()].to_vec(),
                });
            }
            unit
        })
        .collect()
}

fn relationship_units(dataset: &Dataset, rel: RelType, batch_size: usize) -> Vec<Vec<Statement>> {
    dataset
        .relationships(rel)
        .chunks(batch_size)
        .map(|chunk| {
            vec![Statement::MergeRelationships {
                rel,
                rows: chunk.to_vec(),
            }]
        })
        .collect()
}

fn unit_rows(unit: &[Statement]) -> usize {
    match unit.first() {
        Some(Statement::CreateConstraint { .. }) => unit.len(),
        Some(first) => first.row_count(),
        None => 0,
    }
}

/// Loader options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Rows per unit of work
    pub batch_size: usize,
    /// Units in flight within one stage
    pub max_concurrent_batches: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_concurrent_batches: DEFAULT_MAX_CONCURRENT_BATCHES,
        }
    }
}

impl LoadOptions {
    /// Reject zero batch size or concurrency.
    pub fn validate(&self) -> Result<(), LoadError> {
        if self.batch_size == 0 {
            return Err(LoadError::InvalidArgument("batch_size must be positive".to_string()));
        }
        if self.max_concurrent_batches == 0 {
            return Err(LoadError::InvalidArgument(
                "max_concurrent_batches must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Outcome of one stage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageSummary {
    /// Stage
    pub stage: LoadStage,
    /// Rows written (constraints count as one row each)
    pub rows: usize,
    /// Units committed
    pub batches: usize,
    /// Store counters
    pub stats: WriteStats,
}

/// Outcome of a complete load
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadSummary {
    /// Per-stage outcome, in execution order
    pub stages: Vec<StageSummary>,
    /// Wall-clock duration
    pub elapsed: Duration,
}

impl UploadSummary {
    /// Summary of one stage
    pub fn stage(&self, stage: LoadStage) -> Option<&StageSummary> {
        self.stages.iter().find(|s| s.stage == stage)
    }

    /// Store counters summed over every stage
    pub fn totals(&self) -> WriteStats {
        let mut total = WriteStats::default();
        for stage in &self.stages {
            total += stage.stats;
        }
        total
    }

    /// Units committed over every stage
    pub fn total_batches(&self) -> usize {
        self.stages.iter().map(|s| s.batches).sum()
    }
}

/// Progress callback: stage, batches committed so far, batches in the stage
pub type BatchProgress = Arc<dyn Fn(LoadStage, usize, usize) + Send + Sync>;

/// Transactional loader bound to one session.
pub struct Loader<S> {
    session: Arc<S>,
    options: LoadOptions,
    progress: Option<BatchProgress>,
}

impl<S: GraphSession + 'static> Loader<S> {
    /// Create a loader.
    ///
    /// # Errors
    ///
    /// [`LoadError::InvalidArgument`] when the options are invalid.
    pub fn new(session: Arc<S>, options: LoadOptions) -> Result<Self, LoadError> {
        options.validate()?;
        Ok(Self {
            session,
            options,
            progress: None,
        })
    }

    /// Report each committed batch
    pub fn with_progress(mut self, progress: BatchProgress) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Load `dataset`, stage by stage.
    ///
    /// Checks connectivity first; a failure there is
    /// [`LoadError::Connection`] and nothing is written. There is no retry:
    /// a failed batch is reported as [`LoadError::Batch`], with every earlier
    /// stage and any other batch of the same stage possibly committed.
    pub async fn upload(
        &self,
        dataset: &Dataset,
        cancel: &CancelFlag,
    ) -> Result<UploadSummary, LoadError> {
        let started = Instant::now();
        self.session
            .verify_connectivity()
            .await
            .map_err(LoadError::Connection)?;

        let mut stages = Vec::with_capacity(LoadStage::ALL.len());
        for stage in LoadStage::ALL {
            if cancel.is_cancelled() {
                warn!(stage = stage.name(), "Load cancelled");
                return Err(LoadError::Cancelled { stage: stage.name() });
            }
            let units = stage.units(dataset, self.options.batch_size);
            let summary = self.run_stage(stage, units, cancel).await?;
            info!(
                stage = stage.name(),
                rows = summary.rows,
                batches = summary.batches,
                nodes_created = summary.stats.nodes_created,
                relationships_created = summary.stats.relationships_created,
                "Stage committed"
            );
            stages.push(summary);
        }

        let summary = UploadSummary {
            stages,
            elapsed: started.elapsed(),
        };
        info!(
            batches = summary.total_batches(),
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "Load complete"
        );
        Ok(summary)
    }

    async fn run_stage(
        &self,
        stage: LoadStage,
        units: Vec<Vec<Statement>>,
        cancel: &CancelFlag,
    ) -> Result<StageSummary, LoadError> {
        let total = units.len();
        let semaphore = Arc::new(Semaphore::new(self.options.max_concurrent_batches));
        let mut tasks = JoinSet::new();
        let mut batch_of_task = HashMap::new();
        let mut summary = StageSummary {
            stage,
            rows: 0,
            batches: 0,
            stats: WriteStats::default(),
        };
        let mut failure: Option<LoadError> = None;

        for (batch_index, unit) in units.into_iter().enumerate() {
            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            while let Some(joined) = tasks.try_join_next() {
                self.settle(stage, total, joined, &batch_of_task, &mut summary, &mut failure);
            }
            if failure.is_some() {
                break;
            }
            if cancel.is_cancelled() {
                warn!(stage = stage.name(), batch_index, "Load cancelled");
                failure = Some(LoadError::Cancelled { stage: stage.name() });
                break;
            }

            let session = Arc::clone(&self.session);
            let rows = unit_rows(&unit);
            debug!(stage = stage.name(), batch_index, rows, "Dispatching batch");
            let handle = tasks.spawn(async move {
                let _permit = permit;
                (batch_index, rows, session.execute(&unit).await)
            });
            batch_of_task.insert(handle.id(), batch_index);
        }

        // In-flight units may still commit; wait for all of them.
        while let Some(joined) = tasks.join_next().await {
            self.settle(stage, total, joined, &batch_of_task, &mut summary, &mut failure);
        }

        match failure {
            Some(error) => Err(error),
            None => Ok(summary),
        }
    }

    fn settle(
        &self,
        stage: LoadStage,
        total: usize,
        joined: Result<(usize, usize, Result<WriteStats, StoreError>), tokio::task::JoinError>,
        batch_of_task: &HashMap<tokio::task::Id, usize>,
        summary: &mut StageSummary,
        failure: &mut Option<LoadError>,
    ) {
        let error = match joined {
            Ok((_, rows, Ok(stats))) => {
                summary.rows += rows;
                summary.batches += 1;
                summary.stats += stats;
                if let Some(progress) = &self.progress {
                    progress(stage, summary.batches, total);
                }
                return;
            }
            Ok((batch_index, _, Err(cause))) => LoadError::Batch {
                stage: stage.name(),
                batch_index,
                cause,
            },
            Err(join_error) => LoadError::Batch {
                stage: stage.name(),
                batch_index: batch_of_task.get(&join_error.id()).copied().unwrap_or(usize::MAX),
                cause: StoreError::Protocol(format!("batch task failed: {}", join_error)),
            },
        };
        warn!(stage = stage.name(), error = %error, "Batch failed");
        if failure.is_none() {
            *failure = Some(error);
        }
    }
}

/// Load `dataset` through `session` with `options`.
///
/// Convenience wrapper over [`Loader`].
pub async fn upload<S: GraphSession + 'static>(
    dataset: &Dataset,
    session: Arc<S>,
    options: LoadOptions,
    cancel: &CancelFlag,
) -> Result<UploadSummary, LoadError> {
    Loader::new(session, options)?.upload(dataset, cancel).await
}
