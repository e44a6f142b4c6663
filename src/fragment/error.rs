//! Fragment error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors reading, converting, or writing fragments
#[derive(Debug, Error)]
pub enum FragmentError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed fragment {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed log line {line}: {reason}")]
    LogLine { line: usize, reason: String },

    #[error("invalid input pattern '{0}': {1}")]
    Pattern(String, String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FragmentError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for fragment operations
pub type FragmentResult<T> = Result<T, FragmentError>;
