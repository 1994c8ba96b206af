//! Run configuration management
//!
//! Handles loading configuration from built-in defaults, an optional TOML
//! file, environment variables and CLI overrides.

use crate::error::ConfigError;
use serde::de;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Prefix of the environment variables read by the loader.
pub const ENV_PREFIX: &str = "MOCKGRAPH";

/// Config file picked up from the working directory when present.
pub const DEFAULT_CONFIG_FILE: &str = "mockgraph.toml";

/// Where the generated dataset goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Bulk-import CSV file set
    #[default]
    Csv,
    /// Transactional upload into a live store
    Direct,
}

impl RunMode {
    /// Both modes
    pub const ALL: [RunMode; 2] = [RunMode::Csv, RunMode::Direct];

    /// Name used in files, variables and flags
    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Csv => "csv",
            RunMode::Direct => "direct",
        }
    }
}

/// Logging verbosity, most verbose first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Per-row detail
    Trace,
    /// Per-batch and per-file detail
    Debug,
    /// State changes and summaries
    #[default]
    Info,
    /// Recoverable problems
    Warn,
    /// Failures only
    Error,
}

impl LogLevel {
    /// Every level, most verbose first
    pub const ALL: [LogLevel; 5] = [
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
    ];

    /// Directive for `EnvFilter`
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl FromStr for RunMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RunMode::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::InvalidMode(s.to_string()))
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LogLevel::ALL
            .into_iter()
            .find(|level| level.as_filter_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::InvalidLogLevel(s.to_string()))
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_filter_str())
    }
}

/// Case-insensitive names for [`RunMode`] and [`LogLevel`].
fn deserialize_named<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr<Err = ConfigError>,
{
    let s = String::deserialize(deserializer)?;
    T::from_str(&s).map_err(de::Error::custom)
}

/// Whole numbers only. Floats and fractional strings are rejected rather
/// than rounded.
fn deserialize_whole<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64>,
{
    let value = deserializer.deserialize_any(WholeNumber)?;
    T::try_from(value).map_err(|_| de::Error::custom(format!("integer {value} is out of range")))
}

struct WholeNumber;

impl<'de> de::Visitor<'de> for WholeNumber {
    type Value = i64;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a whole number")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
        Ok(v)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
        i64::try_from(v).map_err(|_| E::custom(format!("integer {v} is out of range")))
    }

    fn visit_i128<E: de::Error>(self, v: i128) -> Result<i64, E> {
        i64::try_from(v).map_err(|_| E::custom(format!("integer {v} is out of range")))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<i64, E> {
        i64::try_from(v).map_err(|_| E::custom(format!("integer {v} is out of range")))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<i64, E> {
        v.trim()
            .parse()
            .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
    }
}

/// Merged run configuration, before validation.
///
/// Counts are signed so that negative values reach validation and are
/// reported as invalid arguments instead of parse failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Run seed
    #[serde(deserialize_with = "deserialize_whole")]
    pub seed: i64,
    /// Number of instruments
    #[serde(deserialize_with = "deserialize_whole")]
    pub n_instruments: i64,
    /// Number of issuers
    #[serde(deserialize_with = "deserialize_whole")]
    pub n_issuers: i64,
    /// Number of counterparties
    #[serde(deserialize_with = "deserialize_whole")]
    pub n_counterparties: i64,
    /// Number of trades
    #[serde(deserialize_with = "deserialize_whole")]
    pub n_trades: i64,
    /// Number of signals
    #[serde(deserialize_with = "deserialize_whole")]
    pub n_signals: i64,
    /// Number of events
    #[serde(deserialize_with = "deserialize_whole")]
    pub n_events: i64,
    /// Correlation peers per instrument
    #[serde(deserialize_with = "deserialize_whole")]
    pub corr_top_k: i64,
    /// Trades per order, on average
    pub avg_trades_per_order: f64,
    /// Correlation window label
    pub corr_window: String,
    /// Anchor date for timestamps (today, UTC, when unset)
    pub as_of: Option<chrono::NaiveDate>,
    /// Order lookback in days
    #[serde(deserialize_with = "deserialize_whole")]
    pub order_lookback_days: u32,
    /// Trade lookback in days
    #[serde(deserialize_with = "deserialize_whole")]
    pub trade_lookback_days: u32,
    /// Signal lookback in days
    #[serde(deserialize_with = "deserialize_whole")]
    pub signal_lookback_days: u32,
    /// Event lookback in days
    #[serde(deserialize_with = "deserialize_whole")]
    pub event_lookback_days: u32,
    /// Output mode
    #[serde(deserialize_with = "deserialize_named")]
    pub mode: RunMode,
    /// CSV output directory
    pub out_dir: Option<PathBuf>,
    /// Store endpoint
    pub uri: Option<String>,
    /// Store user
    pub user: Option<String>,
    /// Store password
    pub password: Option<String>,
    /// Store database name
    pub database: Option<String>,
    /// Rows per write batch
    #[serde(deserialize_with = "deserialize_whole")]
    pub batch_size: i64,
    /// Batches in flight within one stage
    #[serde(deserialize_with = "deserialize_whole")]
    pub max_concurrent_batches: i64,
    /// Log level
    #[serde(deserialize_with = "deserialize_named")]
    pub log_level: LogLevel,
}

impl Default for RunConfig {
    fn default() -> Self {
        let lookbacks = synth_core::generators::LookbackWindows::default();
        Self {
            seed: 42,
            n_instruments: 500,
            n_issuers: 100,
            n_counterparties: 200,
            n_trades: 5000,
            n_signals: 1000,
            n_events: 500,
            corr_top_k: 5,
            avg_trades_per_order: synth_core::dataset::DEFAULT_AVG_TRADES_PER_ORDER,
            corr_window: synth_core::linker::DEFAULT_CORRELATION_WINDOW.to_string(),
            as_of: None,
            order_lookback_days: lookbacks.orders,
            trade_lookback_days: lookbacks.trades,
            signal_lookback_days: lookbacks.signals,
            event_lookback_days: lookbacks.events,
            mode: RunMode::Csv,
            out_dir: None,
            uri: None,
            user: None,
            password: None,
            database: None,
            batch_size: 1000,
            max_concurrent_batches: 4,
            log_level: LogLevel::Info,
        }
    }
}

/// Per-field overrides, typically from CLI flags. `None` keeps the merged value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Run seed
    pub seed: Option<i64>,
    /// Number of instruments
    pub n_instruments: Option<i64>,
    /// Number of issuers
    pub n_issuers: Option<i64>,
    /// Number of counterparties
    pub n_counterparties: Option<i64>,
    /// Number of trades
    pub n_trades: Option<i64>,
    /// Number of signals
    pub n_signals: Option<i64>,
    /// Number of events
    pub n_events: Option<i64>,
    /// Correlation peers per instrument
    pub corr_top_k: Option<i64>,
    /// Trades per order, on average
    pub avg_trades_per_order: Option<f64>,
    /// Correlation window label
    pub corr_window: Option<String>,
    /// Anchor date
    pub as_of: Option<chrono::NaiveDate>,
    /// Output mode
    pub mode: Option<RunMode>,
    /// CSV output directory
    pub out_dir: Option<PathBuf>,
    /// Store endpoint
    pub uri: Option<String>,
    /// Store user
    pub user: Option<String>,
    /// Store password
    pub password: Option<String>,
    /// Store database name
    pub database: Option<String>,
    /// Rows per write batch
    pub batch_size: Option<i64>,
    /// Batches in flight within one stage
    pub max_concurrent_batches: Option<i64>,
    /// Log level
    pub log_level: Option<LogLevel>,
}

macro_rules! override_fields {
    ($target:expr, $source:expr, [$($field:ident),* $(,)?]) => {
        $(
            if let Some(value) = &$source.$field {
                $target.$field = value.clone();
            }
        )*
    };
}

macro_rules! override_optional_fields {
    ($target:expr, $source:expr, [$($field:ident),* $(,)?]) => {
        $(
            if let Some(value) = &$source.$field {
                $target.$field = Some(value.clone());
            }
        )*
    };
}

impl RunConfig {
    /// Merge with CLI overrides (overrides take precedence)
    pub fn merge_overrides(&mut self, overrides: &ConfigOverrides) {
        override_fields!(
            self,
            overrides,
            [
                seed,
                n_instruments,
                n_issuers,
                n_counterparties,
                n_trades,
                n_signals,
                n_events,
                corr_top_k,
                avg_trades_per_order,
                corr_window,
                mode,
                batch_size,
                max_concurrent_batches,
                log_level,
            ]
        );
        override_optional_fields!(
            self,
            overrides,
            [as_of, out_dir, uri, user, password, database]
        );
    }

    /// Fill connection settings and the output directory from the
    /// conventional `NEO4J_*` variables when nothing else set them.
    pub fn apply_neo4j_fallbacks(&mut self, env: &HashMap<String, String>) {
        let lookup = |name: &str| env.get(name).filter(|v| !v.is_empty()).cloned();

        if self.uri.is_none() {
            self.uri = lookup("NEO4J_URI");
        }
        if self.user.is_none() {
            self.user = lookup("NEO4J_USER");
        }
        if self.password.is_none() {
            self.password = lookup("NEO4J_PASSWORD").or_else(|| lookup("NEO4J_PASS"));
        }
        if self.database.is_none() {
            self.database = lookup("NEO4J_DATABASE");
        }
        if self.out_dir.is_none() {
            self.out_dir = lookup("NEO4J_MOCK_OUT_DIR").map(PathBuf::from);
        }
    }

    /// Render as TOML, with the password masked.
    pub fn to_toml_redacted(&self) -> Result<String, ConfigError> {
        let mut shown = self.clone();
        if shown.password.is_some() {
            shown.password = Some("********".to_string());
        }
        Ok(toml::to_string_pretty(&shown)?)
    }
}

/// Layered loader.
///
/// Priority (highest to lowest):
/// 1. CLI overrides (applied by the caller via [`RunConfig::merge_overrides`])
/// 2. `MOCKGRAPH_*` environment variables
/// 3. Config file
/// 4. Default values
///
/// `NEO4J_*` variables fill connection settings last, only where still unset.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    file: Option<(PathBuf, bool)>,
    env: HashMap<String, String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Loader reading the process environment, with no config file.
    pub fn new() -> Self {
        Self {
            file: None,
            env: std::env::vars().collect(),
        }
    }

    /// Read a TOML file; a missing file is an error only when `required`.
    pub fn with_file(mut self, path: impl AsRef<Path>, required: bool) -> Self {
        self.file = Some((path.as_ref().to_path_buf(), required));
        self
    }

    /// Replace the environment snapshot.
    pub fn with_env<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env = vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self
    }

    /// Merge every source into a [`RunConfig`].
    pub fn load(&self) -> Result<RunConfig, ConfigError> {
        let defaults = config::Config::try_from(&RunConfig::default())?;
        let mut builder = config::Config::builder().add_source(defaults);

        if let Some((path, required)) = &self.file {
            debug!(path = %path.display(), required, "Reading config file");
            builder = builder.add_source(
                config::File::from(path.as_path())
                    .format(config::FileFormat::Toml)
                    .required(*required),
            );
        }

        let prefix = format!("{}_", ENV_PREFIX);
        let prefixed: config::Map<String, String> = self
            .env
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .source(Some(prefixed)),
        );

        let mut merged: RunConfig = builder.build()?.try_deserialize()?;
        merged.apply_neo4j_fallbacks(&self.env);
        Ok(merged)
    }
}
