//! Cluster Ledger: experiment-record aggregation and clustering comparison
//!
//! Benchmark runs of clustering algorithms emit small JSON fragments
//! describing program runs, algorithm runs and the clusterings they
//! produced. This crate merges those fragments into one store, joins
//! clusterings to the runs that made them, and scores every not-yet-scored
//! pair of clusterings of the same graph in parallel. Scores are written
//! back as fragments, so the next pass picks them up and skips the pair.
//!
//! # Core Concepts
//!
//! - **Fragments**: `type -> id -> fields` JSON, merged field by field
//! - **Views**: inner joins along foreign keys, grouped into comparable pairs
//! - **Capabilities**: partition reading and similarity measures behind traits
//! - **Sinks**: where scored comparisons go, one output per unordered pair
//!
//! # Example
//!
//! ```
//! use cluster_ledger::{plan_comparisons, PlanOptions, RecordStore};
//!
//! let store = RecordStore::new();
//! let plan = plan_comparisons(&store, &PlanOptions::default());
//! assert!(plan.is_empty());
//! ```

pub mod compare;
pub mod config;
pub mod fragment;
pub mod pipeline;
pub mod record;
pub mod repair;
pub mod sink;
pub mod view;

pub use compare::{
    plan_comparisons, AutoPartitionReader, BatchReport, ComparisonPlan, ComparisonScheduler,
    ComparisonTask, ContingencyMeasure, DedupGate, PartitionReader, PlanOptions, ScoreOutcome,
    SimilarityMeasure, SimilarityWorker, TaskError,
};
pub use config::{ConfigError, LedgerConfig};
pub use fragment::{Fragment, FragmentError, FragmentResult, LogConverter};
pub use pipeline::{ComparisonPipeline, PassReport};
pub use record::{
    ClusteringComparison, DisplayNames, FieldValue, MergeError, MergePolicy, RecordId, RecordStore,
    RecordType,
};
pub use repair::{link_orphan_algorithm_run, repair_file, RepairError};
pub use sink::{EmitResult, FragmentSink, MemorySink, ResultSink, SinkError};
pub use view::{ClusteringPair, ColumnRef, JoinChain, JoinView, PairKey};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
