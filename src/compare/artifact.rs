//! Partition artifact references
//!
//! A clustering's `path` is either a single file or a shard pattern. Shard
//! order encodes element ranges, so patterns always resolve to a
//! lexicographically sorted list: both sides of a comparison must line up.

use super::error::{TaskError, TaskResult};
use std::path::{Path, PathBuf};

/// Placeholder written by older runs in place of the shard glob
pub const LEGACY_SHARD_TOKEN: &str = "@@@@-#####";

/// Where a partition lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactRef {
    /// One file
    Single(PathBuf),
    /// Shard files matching a glob pattern
    Sharded { pattern: String },
}

/// Outcome of resolving an artifact on the filesystem
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// Files to hand to the reader, in order
    Files(Vec<PathBuf>),
    /// Nothing on disk
    Missing,
}

impl ArtifactRef {
    /// Interpret a stored path. Relative paths are taken against `root`.
    pub fn parse(path: &str, root: Option<&Path>) -> Self {
        let path = path.replace(LEGACY_SHARD_TOKEN, "*");
        let full = match root {
            Some(root) if Path::new(&path).is_relative() => root.join(&path),
            _ => PathBuf::from(&path),
        };
        if path.contains('*') {
            Self::Sharded {
                pattern: full.to_string_lossy().into_owned(),
            }
        } else {
            Self::Single(full)
        }
    }

    /// Expand to an ordered file list.
    ///
    /// A missing file or a pattern without matches is `Missing`, not an
    /// error; an invalid pattern is.
    pub fn resolve(&self) -> TaskResult<Resolved> {
        match self {
            Self::Single(path) => {
                if path.is_file() {
                    Ok(Resolved::Files(vec![path.clone()]))
                } else {
                    Ok(Resolved::Missing)
                }
            }
            Self::Sharded { pattern } => {
                let entries = glob::glob(pattern).map_err(|e| TaskError::Pattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })?;
                let mut files: Vec<PathBuf> = entries.filter_map(Result::ok).collect();
                if files.is_empty() {
                    return Ok(Resolved::Missing);
                }
                files.sort();
                Ok(Resolved::Files(files))
            }
        }
    }
}

impl std::fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single(path) => write!(f, "{}", path.display()),
            Self::Sharded { pattern } => f.write_str(pattern),
        }
    }
}
