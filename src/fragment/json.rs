//! JSON aggregate format: `type -> id -> field map`

use super::error::{FragmentError, FragmentResult};
use crate::record::{FieldValue, Fields, RecordId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Records of one type, keyed by id
pub type Table = BTreeMap<RecordId, Fields>;

/// One self-contained unit of experiment output.
///
/// The same shape is used for single-run fragments, for result fragments
/// written by the sink, and for the merged aggregate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fragment {
    pub tables: BTreeMap<String, Table>,
}

impl Fragment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a fragment from JSON text. `origin` only labels errors.
    pub fn from_json(text: &str, origin: impl Into<PathBuf>) -> FragmentResult<Self> {
        serde_json::from_str(text).map_err(|source| FragmentError::Json {
            path: origin.into(),
            source,
        })
    }

    /// Read and parse a fragment file
    pub fn from_path(path: impl AsRef<Path>) -> FragmentResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| FragmentError::io(path, e))?;
        Self::from_json(&text, path)
    }

    pub fn to_json(&self) -> FragmentResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.values().all(|t| t.is_empty())
    }

    /// Insert or replace a whole record
    pub fn insert(&mut self, record_type: &str, id: RecordId, fields: Fields) {
        self.tables
            .entry(record_type.to_string())
            .or_default()
            .insert(id, fields);
    }

    /// Set one field, creating the record if needed
    pub fn set_field(
        &mut self,
        record_type: &str,
        id: &RecordId,
        field: impl Into<String>,
        value: FieldValue,
    ) {
        self.tables
            .entry(record_type.to_string())
            .or_default()
            .entry(id.clone())
            .or_default()
            .insert(field.into(), value);
    }

    pub fn table(&self, record_type: &str) -> Option<&Table> {
        self.tables.get(record_type)
    }

    pub fn table_mut(&mut self, record_type: &str) -> Option<&mut Table> {
        self.tables.get_mut(record_type)
    }

    pub fn record_count(&self) -> usize {
        self.tables.values().map(|t| t.len()).sum()
    }

    /// Render as `type/instance/field: value` log lines.
    ///
    /// Instance ids are small integers scoped to this rendering. Reference
    /// fields (`*_id`, except `job_id`) pointing at a record of this fragment
    /// use that record's instance id; other references keep their id.
    pub fn to_log_lines(&self) -> Vec<String> {
        let mut local: HashMap<&RecordId, usize> = HashMap::new();
        for table in self.tables.values() {
            for id in table.keys() {
                let next = local.len();
                local.entry(id).or_insert(next);
            }
        }

        let mut lines = Vec::new();
        for (record_type, table) in &self.tables {
            for (id, fields) in table {
                let instance = local[id];
                for (field, value) in fields {
                    let rendered = match value.as_str() {
                        Some(target) if is_reference_field(field) => {
                            match local.get(&RecordId::from(target)) {
                                Some(n) => n.to_string(),
                                None => target.to_string(),
                            }
                        }
                        _ => value.to_log_string(),
                    };
                    lines.push(format!("{}/{}/{}: {}", record_type, instance, field, rendered));
                }
            }
        }
        lines
    }
}

/// Fields holding the id of another record
pub fn is_reference_field(field: &str) -> bool {
    field.ends_with("_id") && field != "job_id"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aggregate_shape() {
        let f = Fragment::from_json(
            r#"{"clustering": {"c1": {"path": "p1", "graph": "g"}}}"#,
            "inline",
        )
        .unwrap();
        let table = f.table("clustering").unwrap();
        assert_eq!(table[&RecordId::from("c1")]["path"], FieldValue::from("p1"));
        assert_eq!(f.record_count(), 1);
    }

    #[test]
    fn malformed_json_names_its_origin() {
        let err = Fragment::from_json("{not json", "bad.json").unwrap_err();
        assert!(err.to_string().contains("bad.json"));
    }

    #[test]
    fn log_lines_use_local_instances_for_internal_references() {
        let mut f = Fragment::new();
        let run = RecordId::from("run-uuid");
        let algo = RecordId::from("algo-uuid");
        f.set_field("program_run", &run, "job_id", FieldValue::Int(42));
        f.set_field("algorithm_run", &algo, "program_run_id", "run-uuid".into());
        f.set_field("algorithm_run", &algo, "base_clustering_id", "elsewhere".into());

        let lines = f.to_log_lines();
        assert!(lines.contains(&"algorithm_run/0/program_run_id: 1".to_string()));
        assert!(lines.contains(&"algorithm_run/0/base_clustering_id: elsewhere".to_string()));
        assert!(lines.contains(&"program_run/1/job_id: 42".to_string()));
    }
}
