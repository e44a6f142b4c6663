//! Joined views across record tables
//!
//! A join starts at a leaf table and follows a chain of foreign-key fields
//! up to its ancestors, producing one denormalized row per leaf record.

use crate::record::{FieldValue, RecordId, RecordStore, RecordType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// A column of a specific table, e.g. `program_run.graph`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    pub table: String,
    pub field: String,
}

impl ColumnRef {
    pub fn new(table: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            field: field.into(),
        }
    }
}

impl std::fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.table, self.field)
    }
}

/// One hop of a join: follow `field` of the previous table into `table`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinEdge {
    pub field: String,
    pub table: String,
}

/// A leaf table and the foreign-key chain to its ancestors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinChain {
    pub leaf: String,
    pub edges: Vec<JoinEdge>,
}

impl JoinChain {
    pub fn new(leaf: impl Into<String>) -> Self {
        Self {
            leaf: leaf.into(),
            edges: Vec::new(),
        }
    }

    /// Follow `field` into `table`
    pub fn via(mut self, field: impl Into<String>, table: impl Into<String>) -> Self {
        self.edges.push(JoinEdge {
            field: field.into(),
            table: table.into(),
        });
        self
    }

    /// clustering -> algorithm_run -> program_run
    pub fn clusterings() -> Self {
        Self::new(RecordType::Clustering.as_str())
            .via("algorithm_run_id", RecordType::AlgorithmRun.as_str())
            .via("program_run_id", RecordType::ProgramRun.as_str())
    }

    /// cluster_size_distribution -> algorithm_level -> algorithm_run -> program_run
    pub fn cluster_size_distributions() -> Self {
        Self::new(RecordType::ClusterSizeDistribution.as_str())
            .via("algorithm_level_id", RecordType::AlgorithmLevel.as_str())
            .via("algorithm_run_id", RecordType::AlgorithmRun.as_str())
            .via("program_run_id", RecordType::ProgramRun.as_str())
    }

    /// Inner join against the store.
    ///
    /// Leaves whose chain is incomplete (missing key, or a key pointing at a
    /// record that is not in the store) are dropped and only counted.
    pub fn execute(&self, store: &RecordStore) -> JoinView {
        let mut view = JoinView::default();
        let Some(leaves) = store.table(&self.leaf) else {
            return view;
        };

        'leaves: for (leaf_id, leaf_fields) in leaves {
            let mut row = Row::new(leaf_id.clone(), &self.leaf);
            for (field, value) in leaf_fields {
                row.push(&self.leaf, field, value.clone());
            }

            let mut current = leaf_fields;
            for edge in &self.edges {
                let parent = current
                    .get(&edge.field)
                    .and_then(FieldValue::as_str)
                    .map(RecordId::from)
                    .and_then(|id| store.get(&edge.table, &id).map(|f| (id, f)));
                let Some((parent_id, parent_fields)) = parent else {
                    view.dropped += 1;
                    continue 'leaves;
                };

                row.ids.insert(edge.table.clone(), parent_id);
                for (field, value) in parent_fields {
                    row.push(&edge.table, field, value.clone());
                }
                current = parent_fields;
            }

            view.rows.push(row);
        }

        if view.dropped > 0 {
            debug!(leaf = %self.leaf, dropped = view.dropped, "dropped rows with dangling keys");
        }
        view
    }
}

/// Shorthand for `chain.execute(store)`
pub fn join(store: &RecordStore, chain: &JoinChain) -> JoinView {
    chain.execute(store)
}

/// Result of a join
#[derive(Debug, Clone, Default)]
pub struct JoinView {
    /// Rows in leaf id order
    pub rows: Vec<Row>,
    /// Leaves dropped because their ancestor chain was incomplete
    pub dropped: usize,
}

impl JoinView {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A leaf record combined with its ancestors.
///
/// Leaf fields keep their bare names. An ancestor field whose name is
/// already taken is stored as `table.field`, so nothing is overwritten.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Id of the leaf record
    pub id: RecordId,
    /// Record id per joined table, leaf included
    pub ids: BTreeMap<String, RecordId>,
    pub columns: BTreeMap<String, FieldValue>,
    origins: BTreeMap<String, String>,
}

impl Row {
    fn new(id: RecordId, leaf: &str) -> Self {
        let mut ids = BTreeMap::new();
        ids.insert(leaf.to_string(), id.clone());
        Self {
            id,
            ids,
            columns: BTreeMap::new(),
            origins: BTreeMap::new(),
        }
    }

    fn push(&mut self, table: &str, field: &str, value: FieldValue) {
        let name = if self.columns.contains_key(field) {
            format!("{}.{}", table, field)
        } else {
            field.to_string()
        };
        self.origins.insert(name.clone(), table.to_string());
        self.columns.insert(name, value);
    }

    /// Column by its name in this row
    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.columns.get(column)
    }

    /// Value of `field` as contributed by `table`, whatever its column name.
    pub fn get_from(&self, table: &str, field: &str) -> Option<&FieldValue> {
        if let Some(v) = self.columns.get(&format!("{}.{}", table, field)) {
            return Some(v);
        }
        match self.origins.get(field) {
            Some(origin) if origin == table => self.columns.get(field),
            _ => None,
        }
    }

    pub fn column(&self, column: &ColumnRef) -> Option<&FieldValue> {
        self.get_from(&column.table, &column.field)
    }

    /// Id of the joined record from `table`
    pub fn id_of(&self, table: &str) -> Option<&RecordId> {
        self.ids.get(table)
    }
}
