//! Pairwise clustering comparison
//!
//! Planning (join, enumeration, dedup) happens up front on one thread.
//! Scoring then fans out over a bounded pool of workers whose only shared
//! state is the result sink.

mod artifact;
mod capability;
mod dedup;
mod error;
mod measure;
mod partition;
mod plan;
mod scheduler;
mod worker;

pub use artifact::{ArtifactRef, Resolved, LEGACY_SHARD_TOKEN};
pub use capability::{element_count, Partition, PartitionReader, SimilarityMeasure, UNASSIGNED};
pub use dedup::{already_scored, DedupGate};
pub use error::{ReadError, TaskError, TaskResult};
pub use measure::ContingencyMeasure;
pub use partition::{encode_binary, AutoPartitionReader, BinaryPartitionReader, TextPartitionReader};
pub use plan::{plan_comparisons, ComparisonPlan, PlanOptions};
pub use scheduler::{default_concurrency, BatchReport, ComparisonScheduler, NotComputed, TaskFailure};
pub use worker::{ComparisonTask, ScoreOutcome, SimilarityWorker};
