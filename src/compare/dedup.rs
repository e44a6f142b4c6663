//! Dedup gate: at most one comparison per unordered pair
//!
//! The gate is built from the comparisons already in the store and is
//! consulted single-threaded before any work is dispatched. Together with
//! pair-derived output names this makes repeated passes idempotent.

use crate::fragment::Table;
use crate::record::{ClusteringComparison, RecordId, RecordStore, RecordType};
use crate::view::{ClusteringPair, PairKey};
use std::collections::HashSet;

/// True if `existing` holds a comparison of `a` and `b` in either orientation.
pub fn already_scored(existing: &Table, a: &RecordId, b: &RecordId) -> bool {
    existing
        .values()
        .filter_map(ClusteringComparison::from_fields)
        .any(|c| (c.base == *a && c.compare == *b) || (c.base == *b && c.compare == *a))
}

/// Indexed form of [`already_scored`] for a whole planning pass
#[derive(Debug, Clone, Default)]
pub struct DedupGate {
    scored: HashSet<PairKey>,
    admitted: HashSet<PairKey>,
}

impl DedupGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gate over the `clustering_comparison` table of a store
    pub fn from_store(store: &RecordStore) -> Self {
        let mut gate = Self::new();
        if let Some(table) = store.table(RecordType::ClusteringComparison.as_str()) {
            for c in table.values().filter_map(ClusteringComparison::from_fields) {
                gate.scored.insert(PairKey::new(&c.base, &c.compare));
            }
        }
        gate
    }

    pub fn already_scored(&self, a: &RecordId, b: &RecordId) -> bool {
        self.scored.contains(&PairKey::new(a, b))
    }

    /// Admit a pair for dispatch.
    ///
    /// Returns false for self-pairs, pairs already scored, and pairs already
    /// admitted earlier in this pass.
    pub fn admit(&mut self, pair: &ClusteringPair) -> bool {
        if pair.is_self_pair() {
            return false;
        }
        let key = pair.key();
        if self.scored.contains(&key) {
            return false;
        }
        self.admitted.insert(key)
    }

    pub fn scored_count(&self) -> usize {
        self.scored.len()
    }
}
