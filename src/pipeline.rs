//! One aggregation-and-comparison pass
//!
//! Steps:
//! 1. Merge every fragment into a record store (sorted input order)
//! 2. Apply display-name remapping, if configured
//! 3. Join, enumerate and dedup candidate pairs
//! 4. Score admitted pairs in parallel, emitting through the sink
//!
//! Re-running a pass after merging its output back in plans no task for
//! a pair already scored.

use crate::compare::{
    plan_comparisons, BatchReport, ComparisonPlan, ComparisonScheduler, SimilarityWorker,
};
use crate::config::LedgerConfig;
use crate::record::{MergeResult, RecordStore};
use crate::sink::ResultSink;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Summary of a completed pass
#[derive(Debug, Default)]
pub struct PassReport {
    pub fragments: usize,
    pub records: usize,
    pub candidates: usize,
    pub already_scored: usize,
    pub dropped_rows: usize,
    pub batch: BatchReport,
}

/// Merge, plan and compare with one configuration.
pub struct ComparisonPipeline {
    config: LedgerConfig,
    scheduler: ComparisonScheduler,
}

impl ComparisonPipeline {
    pub fn new(config: LedgerConfig, worker: SimilarityWorker, sink: Arc<dyn ResultSink>) -> Self {
        let scheduler = ComparisonScheduler::new(worker, sink).with_concurrency(config.worker_count());
        Self { config, scheduler }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Merge fragments under the configured policy and remap names.
    ///
    /// Any malformed fragment or conflict fails the whole pass.
    pub fn aggregate(&self, paths: &[PathBuf]) -> MergeResult<RecordStore> {
        let mut store = RecordStore::load(paths, self.config.merge_policy)?;
        if let Some(display) = &self.config.display {
            let touched = display.apply(&mut store);
            info!(touched, "applied display names");
        }
        Ok(store)
    }

    pub fn plan(&self, store: &RecordStore) -> ComparisonPlan {
        plan_comparisons(store, &self.config.plan_options())
    }

    /// Run a full pass over `paths`.
    pub async fn run(&self, paths: &[PathBuf]) -> MergeResult<PassReport> {
        let store = self.aggregate(paths)?;
        let plan = self.plan(&store);

        let mut report = PassReport {
            fragments: store.fragments_merged(),
            records: store.record_count(),
            candidates: plan.candidates,
            already_scored: plan.already_scored,
            dropped_rows: plan.dropped_rows,
            batch: BatchReport::default(),
        };
        report.batch = self.scheduler.run(plan.tasks).await;
        Ok(report)
    }
}
