//! Error types for index loading and stretch retrieval

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for ferrous-ref operations
pub type Result<T> = std::result::Result<T, IndexError>;

/// Errors raised while opening or querying a reference index.
///
/// Every construction-time variant is fatal: a failed `open` never yields a
/// partially usable index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The small-index files required for the given prefix are absent
    #[error("No usable index files with prefix \"{}\": {detail}", .prefix.display())]
    MissingIndexFormat {
        /// Index prefix as supplied by the caller
        prefix: PathBuf,
        /// What was missing (or what was found instead)
        detail: String,
    },

    /// An index file disagrees with itself or with its siblings
    #[error("Corrupt index file {}: {reason}", .path.display())]
    CorruptIndex {
        /// File in which the inconsistency was detected
        path: PathBuf,
        /// Human-readable description of the inconsistency
        reason: String,
    },

    /// A query named a reference that the index does not contain
    #[error("Unknown reference name: {0}")]
    UnknownReference(String),

    /// A query that cannot be answered, such as a stretch too long to hold
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IndexError {
    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        IndexError::CorruptIndex {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
