//! Per-task comparison errors

use crate::record::RecordId;
use crate::sink::SinkError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading a partition artifact
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed partition {path}: {reason}")]
    Format { path: PathBuf, reason: String },

    #[error("no shard files given")]
    Empty,
}

/// Why a single comparison task failed.
///
/// A task error never aborts sibling tasks; the scheduler records it and
/// moves on.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("invalid shard pattern '{pattern}': {reason}")]
    Pattern { pattern: String, reason: String },

    #[error("unreadable artifact for clustering {clustering}: {source}")]
    Unreadable {
        clustering: RecordId,
        #[source]
        source: ReadError,
    },

    #[error("could not store result: {0}")]
    Sink(#[from] SinkError),

    #[error("worker panicked: {0}")]
    Panicked(String),

    #[error("task cancelled before it started")]
    Cancelled,
}

/// Result type for comparison tasks
pub type TaskResult<T> = Result<T, TaskError>;
