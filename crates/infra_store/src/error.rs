//! Store and loader error types.

use thiserror::Error;

/// Error type for session operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The store rejected the credentials.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// A statement in the unit failed; the unit was rolled back.
    #[error("Statement failed [{code}]: {message}")]
    Statement {
        /// Store error code, e.g. `Neo.ClientError.Schema.ConstraintValidationFailed`
        code: String,
        /// Store error message
        message: String,
    },

    /// The store answered with something that is not a valid response.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Injected failure (in-memory store only).
    #[error("Injected failure on unit {0}")]
    Injected(usize),
}

impl StoreError {
    /// Creates a statement error.
    #[must_use]
    pub fn statement(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Statement {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Whether the error means the store is unusable rather than one unit failing.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Authentication(_))
    }
}

/// Error type for [`crate::loader::upload`].
#[derive(Debug, Error)]
pub enum LoadError {
    /// Options rejected before any write.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Connectivity check failed before any write.
    #[error("Store unreachable: {0}")]
    Connection(#[source] StoreError),

    /// One batch failed. Earlier batches and stages are already committed.
    #[error("Stage {stage} batch {batch_index} failed: {cause}")]
    Batch {
        /// Stage name
        stage: &'static str,
        /// Zero-based batch index within the stage
        batch_index: usize,
        /// Underlying store error
        #[source]
        cause: StoreError,
    },

    /// Cancelled before the named stage or one of its batches started.
    #[error("Cancelled during stage {stage}")]
    Cancelled {
        /// Stage name
        stage: &'static str,
    },
}
