//! Error types for morph-core.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using MorphError.
pub type Result<T> = std::result::Result<T, MorphError>;

/// Errors that can occur while building, scoring or analyzing.
///
/// Most of these are unit-level: the batch passes log them and move on to the
/// next item, record or file. Only `NoEligibleItems` and `Cancelled` abort a pass.
#[derive(Debug, Error)]
pub enum MorphError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed record in {path} at line {line}: {reason}")]
    MalformedRecord {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("unknown morphemizer: {0}")]
    UnknownMorphemizer(String),

    #[error("no item in the collection is eligible for processing; check the item filters")]
    NoEligibleItems,

    #[error("pass cancelled")]
    Cancelled,

    #[error("item store error: {0}")]
    Store(String),
}

impl MorphError {
    /// Wrap an i/o error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
