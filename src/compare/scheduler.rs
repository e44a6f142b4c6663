//! Bounded-concurrency dispatch of comparison tasks
//!
//! Each task takes a semaphore permit, scores its pair on the blocking
//! pool and hands a scored result to the sink. Failures stay with their
//! task; the batch always runs to the end.

use super::error::TaskError;
use super::worker::{ComparisonTask, ScoreOutcome, SimilarityWorker};
use crate::record::{ClusteringComparison, RecordId};
use crate::sink::ResultSink;
use crate::view::ClusteringPair;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Default worker count: one per available core
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// A pair whose artifact was missing
#[derive(Debug, Clone, PartialEq)]
pub struct NotComputed {
    pub pair: ClusteringPair,
    pub missing: RecordId,
}

/// A task that failed
#[derive(Debug)]
pub struct TaskFailure {
    /// `None` when the task died without reporting its pair
    pub pair: Option<ClusteringPair>,
    pub error: TaskError,
}

/// Everything a batch produced
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Scored and stored, ordered by pair
    pub scored: Vec<ClusteringComparison>,
    pub not_computed: Vec<NotComputed>,
    pub failed: Vec<TaskFailure>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.scored.len() + self.not_computed.len() + self.failed.len()
    }

    /// No task failed. Missing artifacts do not count as failures.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

enum Finished {
    Stored(ClusteringComparison),
    Missing(NotComputed),
}

/// Runs tasks through a [`SimilarityWorker`] into a [`ResultSink`].
pub struct ComparisonScheduler {
    worker: Arc<SimilarityWorker>,
    sink: Arc<dyn ResultSink>,
    concurrency: usize,
}

impl ComparisonScheduler {
    pub fn new(worker: SimilarityWorker, sink: Arc<dyn ResultSink>) -> Self {
        Self {
            worker: Arc::new(worker),
            sink,
            concurrency: default_concurrency(),
        }
    }

    /// Cap on tasks in flight; zero is treated as one.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Run every task and collect the outcomes.
    pub async fn run(&self, tasks: Vec<ComparisonTask>) -> BatchReport {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut join_set: JoinSet<(ClusteringPair, Result<Finished, TaskError>)> = JoinSet::new();
        info!(tasks = tasks.len(), concurrency = self.concurrency, "dispatching comparisons");

        for task in tasks {
            let sem = semaphore.clone();
            let worker = self.worker.clone();
            let sink = self.sink.clone();
            join_set.spawn(async move {
                let pair = task.pair.clone();
                let Ok(_permit) = sem.acquire_owned().await else {
                    return (pair, Err(TaskError::Cancelled));
                };
                let result = run_one(worker, sink, task).await;
                (pair, result)
            });
        }

        let mut report = BatchReport::default();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((pair, Ok(Finished::Stored(comparison)))) => {
                    debug!(pair = %pair, nmi = ?comparison.nmi, ari = ?comparison.ari, "scored");
                    report.scored.push(comparison);
                }
                Ok((pair, Ok(Finished::Missing(missing)))) => {
                    warn!(pair = %pair, missing = %missing.missing, "artifact missing, not computed");
                    report.not_computed.push(missing);
                }
                Ok((pair, Err(e))) => {
                    error!(pair = %pair, error = %e, "comparison failed");
                    report.failed.push(TaskFailure {
                        pair: Some(pair),
                        error: e,
                    });
                }
                Err(e) => {
                    error!(error = %e, "comparison task aborted");
                    report.failed.push(TaskFailure {
                        pair: None,
                        error: TaskError::Panicked(e.to_string()),
                    });
                }
            }
        }

        report
            .scored
            .sort_by(|a, b| (&a.base, &a.compare).cmp(&(&b.base, &b.compare)));
        report
            .not_computed
            .sort_by(|a, b| a.pair.key().cmp(&b.pair.key()));
        info!(
            scored = report.scored.len(),
            not_computed = report.not_computed.len(),
            failed = report.failed.len(),
            "batch finished"
        );
        report
    }
}

async fn run_one(
    worker: Arc<SimilarityWorker>,
    sink: Arc<dyn ResultSink>,
    task: ComparisonTask,
) -> Result<Finished, TaskError> {
    let outcome = tokio::task::spawn_blocking(move || worker.score(&task))
        .await
        .map_err(|e| TaskError::Panicked(e.to_string()))??;

    match outcome {
        ScoreOutcome::Scored(comparison) => {
            sink.emit(&comparison).await?;
            Ok(Finished::Stored(comparison))
        }
        ScoreOutcome::NotComputed { comparison, missing } => Ok(Finished::Missing(NotComputed {
            pair: ClusteringPair::new(comparison.base, comparison.compare),
            missing,
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::artifact::ArtifactRef;
    use crate::compare::capability::{Partition, PartitionReader, SimilarityMeasure};
    use crate::compare::error::ReadError;
    use crate::sink::MemorySink;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Reads nothing from disk; tracks how many reads overlap.
    struct OverlapReader {
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    impl PartitionReader for OverlapReader {
        fn read_partition(&self, paths: &[PathBuf]) -> Result<Partition, ReadError> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(10));
            self.active.fetch_sub(1, Ordering::SeqCst);
            if paths.iter().any(|p| p.to_string_lossy().contains("panic")) {
                panic!("reader blew up");
            }
            Ok(Partition::from_assignment(vec![0, 0, 1]))
        }
    }

    struct Constant;

    impl SimilarityMeasure for Constant {
        fn nmi_dissimilarity(&self, _: usize, _: &Partition, _: &Partition) -> f64 {
            0.25
        }
        fn ari_dissimilarity(&self, _: usize, _: &Partition, _: &Partition) -> f64 {
            0.5
        }
    }

    fn overlap_reader() -> Arc<OverlapReader> {
        Arc::new(OverlapReader {
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        })
    }

    fn existing_file(dir: &tempfile::TempDir, name: &str) -> ArtifactRef {
        std::fs::write(dir.path().join(name), b"").unwrap();
        ArtifactRef::parse(name, Some(dir.path()))
    }

    fn task(base: &str, compare: &str, a: ArtifactRef, b: ArtifactRef) -> ComparisonTask {
        ComparisonTask {
            pair: ClusteringPair::new(base.into(), compare.into()),
            base: Some(a),
            compare: Some(b),
        }
    }

    #[tokio::test]
    async fn respects_concurrency_cap() {
        let dir = tempfile::TempDir::new().unwrap();
        let art = existing_file(&dir, "p.bin");
        let reader = overlap_reader();
        let worker = SimilarityWorker::new(reader.clone(), Arc::new(Constant));
        let sink = Arc::new(MemorySink::new());
        let scheduler = ComparisonScheduler::new(worker, sink.clone()).with_concurrency(2);

        let tasks: Vec<_> = (0..8)
            .map(|i| task(&format!("a{i}"), &format!("b{i}"), art.clone(), art.clone()))
            .collect();
        let report = scheduler.run(tasks).await;

        assert_eq!(report.scored.len(), 8);
        assert_eq!(sink.len(), 8);
        assert!(reader.peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(report.scored[0].nmi, Some(0.75));
        assert_eq!(report.scored[0].ari, Some(0.5));
    }

    // === Scenario: one panicking and one missing task do not stop the rest ===
    #[tokio::test]
    async fn failures_are_isolated() {
        let dir = tempfile::TempDir::new().unwrap();
        let ok = existing_file(&dir, "ok.bin");
        let boom = existing_file(&dir, "panic.bin");
        let gone = ArtifactRef::parse("gone.bin", Some(dir.path()));

        let worker = SimilarityWorker::new(overlap_reader(), Arc::new(Constant));
        let sink = Arc::new(MemorySink::new());
        let scheduler = ComparisonScheduler::new(worker, sink.clone()).with_concurrency(3);

        let report = scheduler
            .run(vec![
                task("a", "b", ok.clone(), ok.clone()),
                task("c", "d", ok.clone(), boom),
                task("e", "f", ok.clone(), gone),
                task("g", "h", ok.clone(), ok),
            ])
            .await;

        assert_eq!(report.total(), 4);
        assert_eq!(report.scored.len(), 2);
        assert_eq!(report.not_computed.len(), 1);
        assert_eq!(report.not_computed[0].missing.as_str(), "f");
        assert_eq!(report.failed.len(), 1);
        assert!(matches!(report.failed[0].error, TaskError::Panicked(_)));
        assert_eq!(report.failed[0].pair.as_ref().unwrap().base.as_str(), "c");
        assert!(!report.is_clean());
        // Not-computed pairs are never stored.
        assert_eq!(sink.len(), 2);
    }

    #[tokio::test]
    async fn sink_errors_fail_only_their_task() {
        let dir = tempfile::TempDir::new().unwrap();
        let ok = existing_file(&dir, "ok.bin");
        let worker = SimilarityWorker::new(overlap_reader(), Arc::new(Constant));
        let sink = Arc::new(MemorySink::new());
        let scheduler = ComparisonScheduler::new(worker, sink).with_concurrency(1);

        // Same unordered pair twice: the second emission is rejected.
        let report = scheduler
            .run(vec![
                task("a", "b", ok.clone(), ok.clone()),
                task("b", "a", ok.clone(), ok),
            ])
            .await;
        assert_eq!(report.scored.len(), 1);
        assert_eq!(report.failed.len(), 1);
        assert!(matches!(report.failed[0].error, TaskError::Sink(_)));
    }

    #[tokio::test]
    async fn empty_batch_is_clean() {
        let worker = SimilarityWorker::new(overlap_reader(), Arc::new(Constant));
        let scheduler = ComparisonScheduler::new(worker, Arc::new(MemorySink::new())).with_concurrency(0);
        assert_eq!(scheduler.concurrency(), 1);
        let report = scheduler.run(Vec::new()).await;
        assert!(report.is_clean());
        assert_eq!(report.total(), 0);
    }
}
