//! # infra_config: Run Configuration
//!
//! ## Layer 2 (Infra) Role
//!
//! Merges run settings from built-in defaults, an optional `mockgraph.toml`,
//! `MOCKGRAPH_*` environment variables (with the conventional `NEO4J_*`
//! fallbacks for connection settings) and CLI overrides, then validates the
//! result into a [`RunPlan`].
//!
//! ```rust
//! use chrono::NaiveDate;
//! use infra_config::{ConfigLoader, SinkPlan};
//!
//! let today = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
//! let plan = ConfigLoader::new()
//!     .with_env([("MOCKGRAPH_SEED", "7")])
//!     .load()
//!     .unwrap()
//!     .into_plan(today)
//!     .unwrap();
//! assert_eq!(plan.params.seed, 7);
//! assert!(matches!(plan.sink, SinkPlan::Csv { .. }));
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod plan;
pub mod settings;

pub use error::ConfigError;
pub use plan::{Neo4jTarget, RunPlan, SinkPlan, DEFAULT_DATABASE, DEFAULT_USER};
pub use settings::{
    ConfigLoader, ConfigOverrides, LogLevel, RunConfig, RunMode, DEFAULT_CONFIG_FILE, ENV_PREFIX,
};
