//! Configuration error types.

use thiserror::Error;

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source (file or environment) could not be read or parsed
    #[error("Configuration source error: {0}")]
    Source(#[source] config::ConfigError),

    /// A file or environment value has the wrong type or content
    #[error("Invalid configuration value: {0}")]
    Value(#[source] config::ConfigError),

    /// Unknown log level
    #[error("Unknown log level '{0}' (expected trace, debug, info, warn or error)")]
    InvalidLogLevel(String),

    /// Unknown output mode
    #[error("Unknown mode '{0}' (expected csv or direct)")]
    InvalidMode(String),

    /// The merged configuration failed validation
    #[error("Validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// The plan could not be rendered
    #[error("Render error: {0}")]
    Render(#[from] toml::ser::Error),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        // Type mismatches and custom deserialisation failures come from the
        // values themselves; everything else is about reaching the source.
        match err {
            config::ConfigError::Type { .. } | config::ConfigError::Message(_) => Self::Value(err),
            other => Self::Source(other),
        }
    }
}

impl ConfigError {
    /// Whether the error was caused by caller-supplied values rather than
    /// an unreadable source.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            Self::Value(_)
                | Self::InvalidLogLevel(_)
                | Self::InvalidMode(_)
                | Self::Validation(_)
        )
    }
}
