//! RecordStore: the merged tables of one aggregation pass
//!
//! Built once per pass from a closed set of fragments and discarded
//! afterwards. Merging is field-level: a record seen in several fragments
//! ends up with the union of their fields, and `MergePolicy` decides what
//! happens when two fragments set the same field.

use super::schema::RecordType;
use super::value::{Fields, RecordId};
use crate::fragment::{Fragment, FragmentError, Table};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// How to resolve a field set to different values by two fragments
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// The later fragment in processing order wins (default)
    #[default]
    LastWins,
    /// The first fragment to set a field keeps it
    FirstWins,
    /// Differing values abort the pass
    ConflictIsError,
}

/// Errors that abort an aggregation pass
#[derive(Debug, Error)]
pub enum MergeError {
    #[error(transparent)]
    Fragment(#[from] FragmentError),

    #[error("conflicting values for {record_type}/{id}/{field} in {source_name}")]
    Conflict {
        record_type: String,
        id: RecordId,
        field: String,
        source_name: String,
    },
}

/// Result type for merge operations
pub type MergeResult<T> = Result<T, MergeError>;

/// Unified tables: record type -> record id -> fields
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    tables: BTreeMap<String, Table>,
    policy: MergePolicy,
    fragments_merged: usize,
}

impl RecordStore {
    /// Create an empty store with the default policy
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store with a specific policy
    pub fn with_policy(policy: MergePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Merge fragments in the given order into a fresh store.
    pub fn merge<I>(fragments: I, policy: MergePolicy) -> MergeResult<Self>
    where
        I: IntoIterator<Item = Fragment>,
    {
        let mut store = Self::with_policy(policy);
        for (index, fragment) in fragments.into_iter().enumerate() {
            store.merge_fragment(fragment, &format!("fragment #{}", index))?;
        }
        Ok(store)
    }

    /// Read and merge fragment files.
    ///
    /// Paths are processed in lexicographic order regardless of the order
    /// given, so repeated passes over the same files agree. The first
    /// unreadable or malformed file fails the whole pass.
    pub fn load(paths: &[PathBuf], policy: MergePolicy) -> MergeResult<Self> {
        let mut sorted: Vec<&Path> = paths.iter().map(PathBuf::as_path).collect();
        sorted.sort();
        sorted.dedup();

        let mut store = Self::with_policy(policy);
        for path in sorted {
            let fragment = Fragment::from_path(path)?;
            store.merge_fragment(fragment, &path.display().to_string())?;
        }
        info!(
            fragments = store.fragments_merged,
            records = store.record_count(),
            "merged fragments"
        );
        Ok(store)
    }

    /// Merge one fragment. On a conflict nothing from this fragment is applied.
    pub fn merge_fragment(&mut self, fragment: Fragment, source_name: &str) -> MergeResult<()> {
        if self.policy == MergePolicy::ConflictIsError {
            self.check_conflicts(&fragment, source_name)?;
        }

        for (record_type, records) in fragment.tables {
            if RecordType::from_name(&record_type).is_none() {
                debug!(record_type = %record_type, source = source_name, "uninterpreted record type");
            }
            let table = self.tables.entry(record_type).or_default();
            for (id, fields) in records {
                match table.get_mut(&id) {
                    None => {
                        table.insert(id, fields);
                    }
                    Some(existing) => merge_fields(existing, fields, self.policy),
                }
            }
        }

        self.fragments_merged += 1;
        debug!(source = source_name, "merged fragment");
        Ok(())
    }

    fn check_conflicts(&self, fragment: &Fragment, source_name: &str) -> MergeResult<()> {
        for (record_type, records) in &fragment.tables {
            let Some(table) = self.tables.get(record_type) else {
                continue;
            };
            for (id, fields) in records {
                let Some(existing) = table.get(id) else {
                    continue;
                };
                for (field, value) in fields {
                    if existing.get(field).is_some_and(|old| old != value) {
                        return Err(MergeError::Conflict {
                            record_type: record_type.clone(),
                            id: id.clone(),
                            field: field.clone(),
                            source_name: source_name.to_string(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    pub fn policy(&self) -> MergePolicy {
        self.policy
    }

    pub fn fragments_merged(&self) -> usize {
        self.fragments_merged
    }

    /// Records of one type
    pub fn table(&self, record_type: &str) -> Option<&Table> {
        self.tables.get(record_type)
    }

    pub(crate) fn table_mut(&mut self, record_type: &str) -> Option<&mut Table> {
        self.tables.get_mut(record_type)
    }

    /// Look up a single record
    pub fn get(&self, record_type: &str, id: &RecordId) -> Option<&Fields> {
        self.tables.get(record_type).and_then(|t| t.get(id))
    }

    /// Type names present in the store
    pub fn record_types(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn record_count(&self) -> usize {
        self.tables.values().map(|t| t.len()).sum()
    }

    /// Export the merged tables as one aggregate fragment
    pub fn to_fragment(&self) -> Fragment {
        Fragment {
            tables: self.tables.clone(),
        }
    }
}

/// Field-level union of `incoming` into `existing`.
fn merge_fields(existing: &mut Fields, incoming: Fields, policy: MergePolicy) {
    for (field, value) in incoming {
        match policy {
            MergePolicy::LastWins | MergePolicy::ConflictIsError => {
                existing.insert(field, value);
            }
            MergePolicy::FirstWins => {
                existing.entry(field).or_insert(value);
            }
        }
    }
}
