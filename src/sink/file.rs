//! Sink writing one fragment file per comparison

use super::traits::{comparison_fragment, EmitResult, ResultSink, SinkError};
use crate::fragment::{write_new, FragmentError};
use crate::record::ClusteringComparison;
use crate::view::PairKey;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writes `clustering_comparison_{low}_{high}.json` into a directory.
///
/// The name depends only on the unordered pair and distinct pairs never
/// share a name, so two workers can only collide when they score the same
/// pair; the second write then fails instead of clobbering the first.
#[derive(Debug, Clone)]
pub struct FragmentSink {
    dir: PathBuf,
}

impl FragmentSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Output file for a pair
    pub fn path_for(&self, key: &PairKey) -> PathBuf {
        self.dir.join(format!(
            "clustering_comparison_{}_{}.json",
            encode_id(key.low().as_str()),
            encode_id(key.high().as_str())
        ))
    }
}

/// Percent-encode every byte except ASCII alphanumerics and `-`.
///
/// The output never contains `_`, which keeps the separator unambiguous.
fn encode_id(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for byte in id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("%{:02X}", byte));
        }
    }
    out
}

#[async_trait]
impl ResultSink for FragmentSink {
    async fn emit(&self, comparison: &ClusteringComparison) -> Result<EmitResult, SinkError> {
        let key = PairKey::new(&comparison.base, &comparison.compare);
        let path = self.path_for(&key);
        let fragment = comparison_fragment(comparison);

        let target = path.clone();
        let written = tokio::task::spawn_blocking(move || write_new(&target, &fragment))
            .await
            .map_err(|e| SinkError::Internal(e.to_string()))?;
        match written {
            Ok(()) => {}
            Err(FragmentError::Io { source, .. }) if source.kind() == ErrorKind::AlreadyExists => {
                return Err(SinkError::AlreadyExists(path));
            }
            Err(e) => return Err(e.into()),
        }

        debug!(path = %path.display(), "wrote comparison");
        Ok(EmitResult {
            record_id: comparison.record_id(),
            location: Some(path),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::Fragment;
    use tempfile::TempDir;

    fn comparison(base: &str, compare: &str) -> ClusteringComparison {
        ClusteringComparison {
            base: base.into(),
            compare: compare.into(),
            nmi: Some(0.75),
            ari: Some(0.5),
        }
    }

    #[tokio::test]
    async fn writes_one_file_per_pair() {
        let dir = TempDir::new().unwrap();
        let sink = FragmentSink::new(dir.path());

        let result = sink.emit(&comparison("b", "a")).await.unwrap();
        let path = result.location.unwrap();
        assert!(path.ends_with("clustering_comparison_a_b.json"));

        let f = Fragment::from_path(&path).unwrap();
        assert_eq!(f.record_count(), 1);
    }

    #[tokio::test]
    async fn same_pair_in_either_orientation_collides() {
        let dir = TempDir::new().unwrap();
        let sink = FragmentSink::new(dir.path());

        sink.emit(&comparison("a", "b")).await.unwrap();
        let err = sink.emit(&comparison("b", "a")).await.unwrap_err();
        assert!(matches!(err, SinkError::AlreadyExists(_)));
    }

    #[test]
    fn file_names_escape_separators() {
        let sink = FragmentSink::new("/out");
        let key = PairKey::new(&"x/y".into(), &"z_1".into());
        assert_eq!(
            sink.path_for(&key),
            PathBuf::from("/out/clustering_comparison_x%2Fy_z%5F1.json")
        );
    }

    // === Scenario: ids sharing the separator still get distinct files ===
    #[tokio::test]
    async fn distinct_pairs_never_share_a_file() {
        let dir = TempDir::new().unwrap();
        let sink = FragmentSink::new(dir.path());

        let first = sink.emit(&comparison("a_b", "c")).await.unwrap();
        let second = sink.emit(&comparison("a", "b_c")).await.unwrap();
        assert_ne!(first.location, second.location);

        let third = sink.emit(&comparison("x/y", "q")).await.unwrap();
        let fourth = sink.emit(&comparison("x_y", "q")).await.unwrap();
        assert_ne!(third.location, fourth.location);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 4);
    }
}
