//! Pass configuration
//!
//! Loaded from an optional YAML file. Every field has a default, so an
//! empty file (or no file) is a valid configuration.

use crate::compare::{default_concurrency, PlanOptions};
use crate::record::{DisplayNames, MergePolicy, RecordType};
use crate::view::ColumnRef;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors loading a configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// How conflicting field values are resolved while merging
    pub merge_policy: MergePolicy,
    /// Worker count; `None` uses one per available core
    pub concurrency: Option<usize>,
    /// Column whose value makes clusterings comparable
    pub group_by: ColumnRef,
    pub ground_truth_graph_field: String,
    /// Root for relative artifact paths
    pub artifact_root: Option<PathBuf>,
    /// Name remapping applied after merging
    pub display: Option<DisplayNames>,
    /// Binary path to algorithm name, used by link repair
    pub binaries: BTreeMap<String, String>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            merge_policy: MergePolicy::default(),
            concurrency: None,
            group_by: ColumnRef::new(RecordType::ProgramRun.as_str(), "graph"),
            ground_truth_graph_field: "graph".to_string(),
            artifact_root: None,
            display: None,
            binaries: BTreeMap::new(),
        }
    }
}

impl LedgerConfig {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text, path)
    }

    /// Parse YAML; `origin` only names the source in errors.
    pub fn from_yaml_str(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|source| ConfigError::Yaml {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Load `path` if given, defaults otherwise
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_path(path),
            None => Ok(Self::default()),
        }
    }

    pub fn worker_count(&self) -> usize {
        self.concurrency.unwrap_or_else(default_concurrency).max(1)
    }

    pub fn plan_options(&self) -> PlanOptions {
        PlanOptions {
            group_by: self.group_by.clone(),
            ground_truth_graph_field: self.ground_truth_graph_field.clone(),
            artifact_root: self.artifact_root.clone(),
        }
    }
}
