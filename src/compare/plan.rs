//! Planning a comparison pass
//!
//! Planning is synchronous and single-threaded: the join, the pair
//! enumeration and the dedup gate all run before any worker starts.

use super::artifact::ArtifactRef;
use super::dedup::DedupGate;
use super::worker::ComparisonTask;
use crate::record::{FieldValue, RecordId, RecordStore, RecordType};
use crate::view::{enumerate, ground_truth_pairs, ClusteringPair, ColumnRef, JoinChain};
use std::path::PathBuf;
use tracing::{debug, info};

/// Knobs for [`plan_comparisons`]
#[derive(Debug, Clone, PartialEq)]
pub struct PlanOptions {
    /// Column whose value makes clusterings comparable
    pub group_by: ColumnRef,
    /// Field on ground-truth clusterings naming their graph
    pub ground_truth_graph_field: String,
    /// Root for relative artifact paths
    pub artifact_root: Option<PathBuf>,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            group_by: ColumnRef::new(RecordType::ProgramRun.as_str(), "graph"),
            ground_truth_graph_field: "graph".to_string(),
            artifact_root: None,
        }
    }
}

/// Work for one pass
#[derive(Debug, Clone, Default)]
pub struct ComparisonPlan {
    pub tasks: Vec<ComparisonTask>,
    /// Pairs enumerated before dedup
    pub candidates: usize,
    /// Candidates skipped because the store already holds their comparison
    pub already_scored: usize,
    /// Clusterings left out of the join because of dangling keys
    pub dropped_rows: usize,
}

impl ComparisonPlan {
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Enumerate and dedup the comparisons still missing from `store`.
pub fn plan_comparisons(store: &RecordStore, options: &PlanOptions) -> ComparisonPlan {
    let view = JoinChain::clusterings().execute(store);
    let computed = enumerate(&view, &options.group_by);
    let truths = ground_truth_pairs(store, &view, &options.group_by, &options.ground_truth_graph_field);

    let mut gate = DedupGate::from_store(store);
    let mut plan = ComparisonPlan {
        dropped_rows: view.dropped,
        ..Default::default()
    };

    for (group, pairs) in computed.iter().chain(truths.iter()) {
        debug!(group = %group, pairs = pairs.len(), "enumerated group");
        for pair in pairs {
            plan.candidates += 1;
            if gate.already_scored(&pair.base, &pair.compare) {
                plan.already_scored += 1;
                continue;
            }
            if gate.admit(pair) {
                plan.tasks.push(task_for(store, pair, options));
            }
        }
    }

    info!(
        candidates = plan.candidates,
        already_scored = plan.already_scored,
        tasks = plan.tasks.len(),
        "planned comparisons"
    );
    plan
}

fn task_for(store: &RecordStore, pair: &ClusteringPair, options: &PlanOptions) -> ComparisonTask {
    ComparisonTask {
        pair: pair.clone(),
        base: artifact_of(store, &pair.base, options),
        compare: artifact_of(store, &pair.compare, options),
    }
}

fn artifact_of(store: &RecordStore, id: &RecordId, options: &PlanOptions) -> Option<ArtifactRef> {
    store
        .get(RecordType::Clustering.as_str(), id)
        .and_then(|fields| fields.get("path"))
        .and_then(FieldValue::as_str)
        .map(|path| ArtifactRef::parse(path, options.artifact_root.as_deref()))
}
