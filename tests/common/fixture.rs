//! On-disk experiment fixtures

use cluster_ledger::{Fragment, LedgerConfig, RecordId};
use serde_json::json;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary results directory.
///
/// Layout:
/// - `fragments/` run fragments written by [`ExperimentFixture::add_run`]
/// - `partitions/` one text partition per clustering
/// - `comparisons/` output of comparison passes
pub struct ExperimentFixture {
    dir: TempDir,
    runs: usize,
}

impl ExperimentFixture {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        for sub in ["fragments", "partitions", "comparisons"] {
            std::fs::create_dir_all(dir.path().join(sub)).expect("mkdir");
        }
        Self { dir, runs: 0 }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn fragments_dir(&self) -> PathBuf {
        self.root().join("fragments")
    }

    pub fn comparisons_dir(&self) -> PathBuf {
        self.root().join("comparisons")
    }

    /// Config pointing relative artifact paths at this fixture
    pub fn config(&self) -> LedgerConfig {
        LedgerConfig {
            artifact_root: Some(self.root().to_path_buf()),
            concurrency: Some(4),
            ..Default::default()
        }
    }

    /// Write one run of `algorithm` on `graph` producing the given
    /// clusterings. A clustering with `None` gets a path but no file.
    pub fn add_run(&mut self, graph: &str, algorithm: &str, clusterings: &[(&str, Option<&[u64]>)]) {
        self.runs += 1;
        let program_run = format!("program-{}", self.runs);
        let algorithm_run = format!("algorithm-{}", self.runs);

        let mut records = serde_json::Map::new();
        for (id, partition) in clusterings {
            let path = format!("partitions/{}.txt", id);
            if let Some(clusters) = partition {
                self.write_partition(&path, clusters);
            }
            records.insert(
                id.to_string(),
                json!({"algorithm_run_id": algorithm_run, "path": path, "source": "computation"}),
            );
        }

        let fragment = json!({
            "program_run": {program_run.clone(): {"graph": graph, "hosts": 1}},
            "algorithm_run": {algorithm_run: {"program_run_id": program_run, "algorithm": algorithm}},
            "clustering": records,
        });
        self.write_fragment(&format!("run-{:03}.json", self.runs), &fragment.to_string());
    }

    /// Write a ground-truth clustering for `graph`
    pub fn add_ground_truth(&mut self, id: &str, graph: &str, clusters: &[u64]) {
        let path = format!("partitions/{}.txt", id);
        self.write_partition(&path, clusters);
        let fragment = json!({
            "clustering": {id: {"source": "ground_truth", "graph": graph, "path": path}}
        });
        self.write_fragment(&format!("truth-{}.json", id), &fragment.to_string());
    }

    pub fn write_fragment(&self, name: &str, text: &str) -> PathBuf {
        let path = self.fragments_dir().join(name);
        std::fs::write(&path, text).expect("write fragment");
        path
    }

    pub fn write_partition(&self, relative: &str, clusters: &[u64]) {
        let lines: Vec<String> = clusters.iter().map(u64::to_string).collect();
        std::fs::write(self.root().join(relative), lines.join("\n")).expect("write partition");
    }

    /// Every fragment currently on disk, run fragments and results alike
    pub fn inputs(&self) -> Vec<PathBuf> {
        let dirs = [
            self.fragments_dir().to_string_lossy().into_owned(),
            self.comparisons_dir().to_string_lossy().into_owned(),
        ];
        cluster_ledger::fragment::discover(&dirs).expect("discover")
    }

    /// Comparison fragments written so far
    pub fn comparison_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(self.comparisons_dir())
            .expect("read comparisons")
            .filter_map(|e| e.ok().map(|e| e.path()))
            .collect();
        files.sort();
        files
    }

    pub fn read_comparison(&self, path: &Path) -> (RecordId, Fragment) {
        let fragment = Fragment::from_path(path).expect("comparison fragment");
        let id = fragment
            .table("clustering_comparison")
            .and_then(|t| t.keys().next().cloned())
            .expect("one comparison record");
        (id, fragment)
    }
}
