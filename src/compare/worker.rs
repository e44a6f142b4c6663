//! SimilarityWorker: scores one pair of clusterings

use super::artifact::{ArtifactRef, Resolved};
use super::capability::{PartitionReader, SimilarityMeasure};
use super::error::{TaskError, TaskResult};
use crate::record::{ClusteringComparison, RecordId};
use crate::view::ClusteringPair;
use std::sync::Arc;

/// One dispatched unit of work.
///
/// An artifact of `None` means the clustering record has no path at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonTask {
    pub pair: ClusteringPair,
    pub base: Option<ArtifactRef>,
    pub compare: Option<ArtifactRef>,
}

/// What scoring a pair produced
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreOutcome {
    /// Both artifacts were read and scored
    Scored(ClusteringComparison),
    /// An artifact is missing; scores are `None`, never zero
    NotComputed {
        comparison: ClusteringComparison,
        missing: RecordId,
    },
}

impl ScoreOutcome {
    pub fn comparison(&self) -> &ClusteringComparison {
        match self {
            Self::Scored(c) => c,
            Self::NotComputed { comparison, .. } => comparison,
        }
    }
}

/// Loads both artifacts and scores them through the injected capabilities.
#[derive(Clone)]
pub struct SimilarityWorker {
    reader: Arc<dyn PartitionReader>,
    measure: Arc<dyn SimilarityMeasure>,
}

impl SimilarityWorker {
    pub fn new(reader: Arc<dyn PartitionReader>, measure: Arc<dyn SimilarityMeasure>) -> Self {
        Self { reader, measure }
    }

    /// Score one pair. Blocks on file I/O and computation.
    ///
    /// Similarities are `1 - dissimilarity`, so identical partitions score
    /// 1.0; results can go below zero.
    pub fn score(&self, task: &ComparisonTask) -> TaskResult<ScoreOutcome> {
        let pair = &task.pair;
        let not_computed = |missing: &RecordId| ScoreOutcome::NotComputed {
            comparison: ClusteringComparison {
                base: pair.base.clone(),
                compare: pair.compare.clone(),
                nmi: None,
                ari: None,
            },
            missing: missing.clone(),
        };

        let Some(base_files) = resolve(task.base.as_ref())? else {
            return Ok(not_computed(&pair.base));
        };
        let Some(compare_files) = resolve(task.compare.as_ref())? else {
            return Ok(not_computed(&pair.compare));
        };

        let a = self
            .reader
            .read_partition(&base_files)
            .map_err(|source| TaskError::Unreadable {
                clustering: pair.base.clone(),
                source,
            })?;
        let b = self
            .reader
            .read_partition(&compare_files)
            .map_err(|source| TaskError::Unreadable {
                clustering: pair.compare.clone(),
                source,
            })?;

        let reference_size = a.element_count().max(b.element_count());
        let nmi = 1.0 - self.measure.nmi_dissimilarity(reference_size, &a, &b);
        let ari = 1.0 - self.measure.ari_dissimilarity(reference_size, &a, &b);

        Ok(ScoreOutcome::Scored(ClusteringComparison {
            base: pair.base.clone(),
            compare: pair.compare.clone(),
            nmi: Some(nmi),
            ari: Some(ari),
        }))
    }
}

fn resolve(artifact: Option<&ArtifactRef>) -> TaskResult<Option<Vec<std::path::PathBuf>>> {
    match artifact {
        None => Ok(None),
        Some(a) => match a.resolve()? {
            Resolved::Files(files) => Ok(Some(files)),
            Resolved::Missing => Ok(None),
        },
    }
}
