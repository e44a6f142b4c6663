//! ResultSink trait and emission types

use crate::fragment::{Fragment, FragmentError};
use crate::record::{ClusteringComparison, RecordId, RecordType};
use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

/// Errors storing a result
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("result already stored at {0}")]
    AlreadyExists(PathBuf),

    #[error(transparent)]
    Fragment(#[from] FragmentError),

    #[error("sink error: {0}")]
    Internal(String),
}

/// Where an emitted comparison ended up
#[derive(Debug, Clone, PartialEq)]
pub struct EmitResult {
    /// Id of the comparison record inside the fragment
    pub record_id: RecordId,
    /// File written, for sinks that write files
    pub location: Option<PathBuf>,
}

/// Self-contained fragment holding one comparison record.
pub fn comparison_fragment(comparison: &ClusteringComparison) -> Fragment {
    let mut fragment = Fragment::new();
    fragment.insert(
        RecordType::ClusteringComparison.as_str(),
        comparison.record_id(),
        comparison.to_fields(),
    );
    fragment
}

/// Receives results from concurrently running workers.
///
/// Implementations must not need coordination between calls for distinct
/// pairs: each pair maps to its own output.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn emit(&self, comparison: &ClusteringComparison) -> Result<EmitResult, SinkError>;
}
