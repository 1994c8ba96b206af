//! Validation of a merged [`RunConfig`] into an executable [`RunPlan`].

use crate::error::ConfigError;
use crate::settings::{LogLevel, RunConfig, RunMode};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use synth_core::dataset::{GenerationParams, GenerationRequest};
use synth_core::generators::LookbackWindows;

/// Database used when none is configured.
pub const DEFAULT_DATABASE: &str = "neo4j";

/// User used when none is configured.
pub const DEFAULT_USER: &str = "neo4j";

/// Connection target for direct mode.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Neo4jTarget {
    /// HTTP endpoint, e.g. `http://localhost:7474`
    pub uri: String,
    /// User name
    pub user: String,
    /// Password
    #[serde(skip)]
    pub password: String,
    /// Database name
    pub database: String,
}

impl fmt::Debug for Neo4jTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Neo4jTarget")
            .field("uri", &self.uri)
            .field("user", &self.user)
            .field("password", &"********")
            .field("database", &self.database)
            .finish()
    }
}

/// Validated destination of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum SinkPlan {
    /// Write the bulk-import file set
    Csv {
        /// Output directory
        out_dir: PathBuf,
    },
    /// Upload transactionally
    Direct {
        /// Store to write to
        target: Neo4jTarget,
        /// Rows per write batch
        batch_size: usize,
        /// Batches in flight within one stage
        max_concurrent_batches: usize,
    },
}

/// Everything a run needs, fully validated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunPlan {
    /// Generation parameters
    pub params: GenerationParams,
    /// Destination
    pub sink: SinkPlan,
    /// Log level
    pub log_level: LogLevel,
}

impl fmt::Display for RunPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = &self.params;
        let c = &p.counts;
        writeln!(f, "seed:            {}", p.seed)?;
        writeln!(f, "as_of:           {}", p.as_of)?;
        writeln!(
            f,
            "counts:          instruments={} issuers={} counterparties={} orders={} trades={} signals={} events={}",
            c.instruments,
            c.issuers,
            c.counterparties,
            p.order_count(),
            c.trades,
            c.signals,
            c.events
        )?;
        writeln!(f, "correlation:     top_k={} window={}", p.corr_top_k, p.corr_window)?;
        match &self.sink {
            SinkPlan::Csv { out_dir } => write!(f, "sink:            csv -> {}", out_dir.display()),
            SinkPlan::Direct {
                target,
                batch_size,
                max_concurrent_batches,
            } => write!(
                f,
                "sink:            direct -> {} (database={}, user={}, batch_size={}, concurrency={})",
                target.uri, target.database, target.user, batch_size, max_concurrent_batches
            ),
        }
    }
}

fn positive(name: &str, value: i64, errors: &mut Vec<String>) -> usize {
    if value <= 0 {
        errors.push(format!("{} must be positive, got {}", name, value));
        return 0;
    }
    value as usize
}

impl RunConfig {
    /// The generation request described by this configuration.
    pub fn generation_request(&self, today: NaiveDate) -> GenerationRequest {
        GenerationRequest {
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
            as_of: self.as_of.unwrap_or(today),
            lookbacks: LookbackWindows {
                orders: self.order_lookback_days,
                trades: self.trade_lookback_days,
                signals: self.signal_lookback_days,
                events: self.event_lookback_days,
            },
        }
    }

    /// Validate into a plan. All problems are collected and reported together.
    ///
    /// `today` is the as-of date used when none is configured.
    pub fn into_plan(self, today: NaiveDate) -> Result<RunPlan, ConfigError> {
        let mut errors = Vec::new();

        let params = match self.generation_request(today).validate() {
            Ok(params) => Some(params),
            Err(e) => {
                errors.push(e.to_string());
                None
            }
        };

        if self.corr_window.trim().is_empty() {
            errors.push("corr_window cannot be empty".to_string());
        }

        let batch_size = positive("batch_size", self.batch_size, &mut errors);
        let max_concurrent_batches =
            positive("max_concurrent_batches", self.max_concurrent_batches, &mut errors);

        let sink = match self.mode {
            RunMode::Csv => {
                let out_dir = self
                    .out_dir
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(format!("neo4j_mock_out_seed_{}", self.seed)));
                if out_dir.as_os_str().is_empty() {
                    errors.push("out_dir cannot be empty".to_string());
                }
                Some(SinkPlan::Csv { out_dir })
            }
            RunMode::Direct => {
                let uri = self.uri.clone().filter(|u| !u.is_empty());
                let password = self.password.clone().filter(|p| !p.is_empty());
                match &uri {
                    None => errors.push(
                        "direct mode requires a connection uri (MOCKGRAPH_URI or NEO4J_URI)"
                            .to_string(),
                    ),
                    Some(u) if !u.starts_with("http://") && !u.starts_with("https://") => {
                        errors.push(format!(
                            "Invalid uri '{}'. Must start with http:// or https://",
                            u
                        ))
                    }
                    Some(_) => {}
                }
                if password.is_none() {
                    errors.push(
                        "direct mode requires a password (MOCKGRAPH_PASSWORD, NEO4J_PASSWORD or NEO4J_PASS)"
                            .to_string(),
                    );
                }
                match (uri, password) {
                    (Some(uri), Some(password)) => Some(SinkPlan::Direct {
                        target: Neo4jTarget {
                            uri: uri.trim_end_matches('/').to_string(),
                            user: self.user.clone().unwrap_or_else(|| DEFAULT_USER.to_string()),
                            password,
                            database: self
                                .database
                                .clone()
                                .unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
                        },
                        batch_size,
                        max_concurrent_batches,
                    }),
                    _ => None,
                }
            }
        };

        match (params, sink) {
            (Some(params), Some(sink)) if errors.is_empty() => Ok(RunPlan {
                params,
                sink,
                log_level: self.log_level,
            }),
            _ => Err(ConfigError::Validation(errors)),
        }
    }
}
