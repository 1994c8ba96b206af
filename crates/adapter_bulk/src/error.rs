//! Error types for bulk export and re-parsing.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while writing or reading a bulk-import file set.
///
/// Every variant except [`ExportError::Cancelled`] names the file involved.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Filesystem failure.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying cause
        #[source]
        source: io::Error,
    },

    /// CSV encoding or decoding failure.
    #[error("CSV error at {path}: {source}")]
    Csv {
        /// File involved
        path: PathBuf,
        /// Underlying cause
        #[source]
        source: csv::Error,
    },

    /// Manifest could not be encoded or decoded.
    #[error("Manifest error at {path}: {source}")]
    Manifest {
        /// Manifest path
        path: PathBuf,
        /// Underlying cause
        #[source]
        source: serde_json::Error,
    },

    /// The directory holds no manifest, so the file set is incomplete.
    #[error("No manifest in {0}; the file set is incomplete")]
    MissingManifest(PathBuf),

    /// A file does not have the expected shape.
    #[error("Malformed file {path}: {message}")]
    Malformed {
        /// File involved
        path: PathBuf,
        /// What is wrong
        message: String,
    },

    /// Cancellation was requested before `file` was written.
    #[error("Export cancelled before {file}")]
    Cancelled {
        /// First file not written
        file: &'static str,
    },
}

impl ExportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether the export stopped because cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Result alias for bulk operations.
pub type ExportResult<T> = Result<T, ExportError>;
