//! Error types for dataset generation.
//!
//! This module provides structured error types for generation and
//! reference checking using `thiserror` for derivation.

use thiserror::Error;

/// Errors that can occur while building or checking a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SynthError {
    /// Caller supplied an unusable count, top-k or ratio.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A foreign key does not resolve to a primary key in the dataset.
    #[error("Dangling reference: {entity} {id} references missing {target} {target_id}")]
    DanglingReference {
        /// Referencing entity label.
        entity: &'static str,
        /// Referencing primary key.
        id: String,
        /// Referenced entity label.
        target: &'static str,
        /// Missing foreign key value.
        target_id: String,
    },

    /// A generated value breaks a dataset invariant.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

impl SynthError {
    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create an invariant violation error
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }
}

/// Result alias for generation operations.
pub type SynthResult<T> = Result<T, SynthError>;

/// Convert a signed caller-facing count into a collection size.
///
/// Counts arrive as signed integers from configuration and query
/// parameters; negative values are rejected here, before any work starts.
pub fn checked_count(name: &str, value: i64) -> SynthResult<usize> {
    usize::try_from(value).map_err(|_| {
        SynthError::invalid_argument(format!("{name} must be non-negative, got {value}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_argument() {
        let err = SynthError::invalid_argument("corr_top_k must be non-negative");
        assert_eq!(
            format!("{}", err),
            "Invalid argument: corr_top_k must be non-negative"
        );
    }

    #[test]
    fn test_error_display_dangling() {
        let err = SynthError::DanglingReference {
            entity: "Trade",
            id: "T-000000001".to_string(),
            target: "Order",
            target_id: "O-00000099".to_string(),
        };
        assert!(err.to_string().contains("T-000000001"));
        assert!(err.to_string().contains("O-00000099"));
    }

    #[test]
    fn test_checked_count() {
        assert_eq!(checked_count("n_trades", 0), Ok(0));
        assert_eq!(checked_count("n_trades", 20), Ok(20));
        assert!(matches!(
            checked_count("n_trades", -1),
            Err(SynthError::InvalidArgument(msg)) if msg.contains("n_trades")
        ));
    }
}
