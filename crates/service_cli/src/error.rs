//! Run error types.
//!
//! Every failure of a run maps onto one [`ErrorKind`], which also decides
//! the process exit code.

use adapter_bulk::ExportError;
use infra_config::ConfigError;
use infra_store::{LoadError, StoreError};
use std::fmt;
use synth_core::error::SynthError;
use thiserror::Error;

/// Failure category of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad counts, top-k, batch size or settings; nothing was written
    InvalidArgument,
    /// The store could not be reached or rejected the credentials
    ConnectionError,
    /// A batch failed mid-run; replaying the run is safe
    LoadError,
    /// A file could not be written or read
    IoError,
    /// The caller cancelled the run
    Cancelled,
}

impl ErrorKind {
    /// Process exit code
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::InvalidArgument => 2,
            ErrorKind::ConnectionError => 3,
            ErrorKind::LoadError => 4,
            ErrorKind::IoError => 5,
            ErrorKind::Cancelled => 130,
        }
    }

    /// Category name
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "InvalidArgument",
            ErrorKind::ConnectionError => "ConnectionError",
            ErrorKind::LoadError => "LoadError",
            ErrorKind::IoError => "IOError",
            ErrorKind::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Run error type
#[derive(Debug, Error)]
pub enum RunError {
    /// Configuration could not be loaded or validated
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Dataset generation failed
    #[error("Generation error: {0}")]
    Generation(#[from] SynthError),

    /// The store session could not be created
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Transactional load failed
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    /// Bulk export or re-parse failed
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// A blocking worker was stopped before finishing
    #[error("Worker stopped: {0}")]
    Worker(#[source] tokio::task::JoinError),

    /// A state change that the run lifecycle does not allow
    #[error("Invalid run transition: {from} -> {to}")]
    InvalidTransition {
        /// State the run was in
        from: &'static str,
        /// State requested
        to: &'static str,
    },
}

impl RunError {
    /// Failure category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RunError::Config(e) if e.is_invalid_argument() => ErrorKind::InvalidArgument,
            RunError::Config(_) => ErrorKind::IoError,
            RunError::Generation(_) | RunError::InvalidTransition { .. } => {
                ErrorKind::InvalidArgument
            }
            RunError::Store(_) => ErrorKind::ConnectionError,
            RunError::Load(LoadError::InvalidArgument(_)) => ErrorKind::InvalidArgument,
            RunError::Load(LoadError::Connection(_)) => ErrorKind::ConnectionError,
            RunError::Load(LoadError::Batch { .. }) => ErrorKind::LoadError,
            RunError::Load(LoadError::Cancelled { .. }) => ErrorKind::Cancelled,
            RunError::Export(e) if e.is_cancelled() => ErrorKind::Cancelled,
            RunError::Export(_) => ErrorKind::IoError,
            RunError::Worker(_) => ErrorKind::Cancelled,
        }
    }
}

/// Result type alias for run operations
pub type Result<T> = std::result::Result<T, RunError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        let err = RunError::from(LoadError::Batch {
            stage: "trades",
            batch_index: 3,
            cause: StoreError::Injected(9),
        });
        assert_eq!(err.kind(), ErrorKind::LoadError);
        assert!(err.to_string().contains("trades"));

        let err = RunError::from(LoadError::Connection(StoreError::Connection(
            "refused".to_string(),
        )));
        assert_eq!(err.kind(), ErrorKind::ConnectionError);

        let err = RunError::from(SynthError::invalid_argument("top-k needs two instruments"));
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err = RunError::from(ExportError::Cancelled { file: "orders.csv" });
        assert_eq!(err.kind(), ErrorKind::Cancelled);

        let err = RunError::from(ConfigError::Validation(vec!["batch_size".to_string()]));
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_exit_codes_are_distinct() {
        let kinds = [
            ErrorKind::InvalidArgument,
            ErrorKind::ConnectionError,
            ErrorKind::LoadError,
            ErrorKind::IoError,
            ErrorKind::Cancelled,
        ];
        let codes: std::collections::HashSet<u8> = kinds.iter().map(|k| k.exit_code()).collect();
        assert_eq!(codes.len(), kinds.len());
        assert!(!codes.contains(&0));
        assert_eq!(ErrorKind::IoError.to_string(), "IOError");
    }
}
