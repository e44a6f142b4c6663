//! Pair enumeration within groups of comparable clusterings
//!
//! Similarity only makes sense between clusterings of the same graph, so
//! rows are grouped first and pairs are formed inside each group.

use super::join::{ColumnRef, JoinView};
use crate::record::{ClusteringSource, FieldValue, RecordId, RecordStore, RecordType};
use std::collections::{BTreeMap, BTreeSet};

/// Orientation-free identity of a pair: the two ids in sorted order
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PairKey(RecordId, RecordId);

impl PairKey {
    pub fn new(a: &RecordId, b: &RecordId) -> Self {
        if a <= b {
            Self(a.clone(), b.clone())
        } else {
            Self(b.clone(), a.clone())
        }
    }

    pub fn low(&self) -> &RecordId {
        &self.0
    }

    pub fn high(&self) -> &RecordId {
        &self.1
    }
}

/// A unit of comparison work. `base` and `compare` only fix the orientation
/// of the emitted record; identity is the [`PairKey`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusteringPair {
    pub base: RecordId,
    pub compare: RecordId,
}

impl ClusteringPair {
    pub fn new(base: RecordId, compare: RecordId) -> Self {
        Self { base, compare }
    }

    pub fn key(&self) -> PairKey {
        PairKey::new(&self.base, &self.compare)
    }

    pub fn is_self_pair(&self) -> bool {
        self.base == self.compare
    }
}

impl std::fmt::Display for ClusteringPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <-> {}", self.base, self.compare)
    }
}

/// Render a group value as a map key
fn group_label(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::Null => None,
        other => Some(other.to_log_string()),
    }
}

/// Distinct row ids per group value. Rows without a value for the group
/// column are not comparable and are left out.
pub fn group_ids(view: &JoinView, group_key: &ColumnRef) -> BTreeMap<String, BTreeSet<RecordId>> {
    let mut groups: BTreeMap<String, BTreeSet<RecordId>> = BTreeMap::new();
    for row in &view.rows {
        if let Some(label) = row.column(group_key).and_then(group_label) {
            groups.entry(label).or_default().insert(row.id.clone());
        }
    }
    groups
}

/// All unordered pairs `{x, y}, x != y` within each group.
///
/// A group of `n` distinct ids yields exactly `n(n-1)/2` pairs, each once,
/// with `base < compare`.
pub fn enumerate(view: &JoinView, group_key: &ColumnRef) -> BTreeMap<String, Vec<ClusteringPair>> {
    group_ids(view, group_key)
        .into_iter()
        .map(|(label, ids)| {
            let ids: Vec<RecordId> = ids.into_iter().collect();
            let mut pairs = Vec::with_capacity(ids.len() * ids.len().saturating_sub(1) / 2);
            for (i, base) in ids.iter().enumerate() {
                for compare in &ids[i + 1..] {
                    pairs.push(ClusteringPair::new(base.clone(), compare.clone()));
                }
            }
            (label, pairs)
        })
        .collect()
}

/// Ground-truth clusterings against every clustering of the same graph.
///
/// Ground truths are matched to groups through their own `graph_field`.
/// The ground truth is always the `base` of the pair; ground truths are
/// not paired with each other.
pub fn ground_truth_pairs(
    store: &RecordStore,
    view: &JoinView,
    group_key: &ColumnRef,
    graph_field: &str,
) -> BTreeMap<String, Vec<ClusteringPair>> {
    let mut truths: BTreeMap<String, Vec<RecordId>> = BTreeMap::new();
    if let Some(clusterings) = store.table(RecordType::Clustering.as_str()) {
        for (id, fields) in clusterings {
            if ClusteringSource::of(fields) != ClusteringSource::GroundTruth {
                continue;
            }
            if let Some(label) = fields.get(graph_field).and_then(group_label) {
                truths.entry(label).or_default().push(id.clone());
            }
        }
    }

    let groups = group_ids(view, group_key);
    let mut result = BTreeMap::new();
    for (label, truth_ids) in truths {
        let Some(members) = groups.get(&label) else {
            continue;
        };
        let pairs: Vec<ClusteringPair> = truth_ids
            .iter()
            .flat_map(|truth| {
                members
                    .iter()
                    .filter(move |m| *m != truth)
                    .map(move |m| ClusteringPair::new(truth.clone(), m.clone()))
            })
            .collect();
        if !pairs.is_empty() {
            result.insert(label, pairs);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::Fragment;
    use crate::record::MergePolicy;
    use crate::view::JoinChain;
    use std::collections::HashSet;

    fn store(json: &str) -> RecordStore {
        RecordStore::merge(vec![Fragment::from_json(json, "test").unwrap()], MergePolicy::LastWins)
            .unwrap()
    }

    fn graph_key() -> ColumnRef {
        ColumnRef::new("program_run", "graph")
    }

    fn corpus(n: usize) -> RecordStore {
        let mut clusterings = Vec::new();
        for i in 0..n {
            clusterings.push(format!(r#""c{i}": {{"path": "p{i}", "algorithm_run_id": "a1"}}"#));
        }
        clusterings.push(r#""x": {"path": "px", "algorithm_run_id": "a2"}"#.to_string());
        clusterings.push(r#""gt": {"path": "pgt", "source": "ground_truth", "graph": "g"}"#.to_string());
        store(&format!(
            r#"{{
                "program_run": {{"r1": {{"graph": "g"}}, "r2": {{"graph": "h"}}}},
                "algorithm_run": {{"a1": {{"program_run_id": "r1"}}, "a2": {{"program_run_id": "r2"}}}},
                "clustering": {{ {} }}
            }}"#,
            clusterings.join(",")
        ))
    }

    // === Scenario: group g with {c1, c2, c3} yields exactly three pairs ===
    #[test]
    fn three_clusterings_three_pairs() {
        let store = store(
            r#"{
                "program_run": {"r1": {"graph": "g"}},
                "algorithm_run": {"a1": {"program_run_id": "r1"}},
                "clustering": {
                    "c1": {"algorithm_run_id": "a1"},
                    "c2": {"algorithm_run_id": "a1"},
                    "c3": {"algorithm_run_id": "a1"}
                }
            }"#,
        );
        let view = JoinChain::clusterings().execute(&store);
        let groups = enumerate(&view, &graph_key());

        let keys: Vec<PairKey> = groups["g"].iter().map(ClusteringPair::key).collect();
        assert_eq!(
            keys,
            vec![
                PairKey::new(&"c1".into(), &"c2".into()),
                PairKey::new(&"c1".into(), &"c3".into()),
                PairKey::new(&"c2".into(), &"c3".into()),
            ]
        );
    }

    #[test]
    fn pair_count_is_n_choose_two_without_duplicates() {
        for n in [0usize, 1, 2, 5, 9] {
            let view = JoinChain::clusterings().execute(&corpus(n));
            let groups = enumerate(&view, &graph_key());
            let pairs = groups.get("g").cloned().unwrap_or_default();

            assert_eq!(pairs.len(), n * n.saturating_sub(1) / 2);
            let unique: HashSet<PairKey> = pairs.iter().map(ClusteringPair::key).collect();
            assert_eq!(unique.len(), pairs.len());
            assert!(pairs.iter().all(|p| !p.is_self_pair()));
        }
    }

    #[test]
    fn groups_do_not_mix() {
        let view = JoinChain::clusterings().execute(&corpus(3));
        let groups = enumerate(&view, &graph_key());
        // Graph h has a single clustering and therefore no pairs.
        assert!(groups["h"].is_empty());
        assert!(groups["g"].iter().all(|p| p.base != RecordId::from("x") && p.compare != RecordId::from("x")));
    }

    #[test]
    fn ground_truth_is_paired_one_sided() {
        let store = corpus(3);
        let view = JoinChain::clusterings().execute(&store);
        let pairs = ground_truth_pairs(&store, &view, &graph_key(), "graph");

        let g = &pairs["g"];
        assert_eq!(g.len(), 3);
        assert!(g.iter().all(|p| p.base == RecordId::from("gt")));
        assert!(!pairs.contains_key("h"));
    }

    #[test]
    fn pair_key_ignores_orientation() {
        let a = RecordId::from("a");
        let b = RecordId::from("b");
        assert_eq!(PairKey::new(&a, &b), PairKey::new(&b, &a));
        assert_eq!(PairKey::new(&b, &a).low(), &a);
    }
}
