//! In-process sink collecting fragments

use super::traits::{comparison_fragment, EmitResult, ResultSink, SinkError};
use crate::fragment::Fragment;
use crate::record::ClusteringComparison;
use crate::view::PairKey;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Keeps emitted fragments in memory, keyed by pair.
///
/// Useful for feeding results straight back into a record store.
#[derive(Debug, Default)]
pub struct MemorySink {
    fragments: DashMap<PairKey, Fragment>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Drain collected fragments in pair order
    pub fn take_fragments(&self) -> Vec<Fragment> {
        let mut keys: Vec<PairKey> = self.fragments.iter().map(|r| r.key().clone()).collect();
        keys.sort();
        keys.into_iter()
            .filter_map(|k| self.fragments.remove(&k).map(|(_, f)| f))
            .collect()
    }
}

#[async_trait]
impl ResultSink for MemorySink {
    async fn emit(&self, comparison: &ClusteringComparison) -> Result<EmitResult, SinkError> {
        let key = PairKey::new(&comparison.base, &comparison.compare);
        match self.fragments.entry(key) {
            Entry::Occupied(taken) => {
                return Err(SinkError::Internal(format!(
                    "pair {} / {} emitted twice",
                    taken.key().low(),
                    taken.key().high()
                )));
            }
            Entry::Vacant(slot) => {
                slot.insert(comparison_fragment(comparison));
            }
        }
        Ok(EmitResult {
            record_id: comparison.record_id(),
            location: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn collects_and_drains_in_pair_order() {
        let sink = MemorySink::new();
        for (a, b) in [("c", "d"), ("b", "a")] {
            sink.emit(&ClusteringComparison {
                base: a.into(),
                compare: b.into(),
                nmi: Some(1.0),
                ari: Some(1.0),
            })
            .await
            .unwrap();
        }
        assert_eq!(sink.len(), 2);

        let fragments = sink.take_fragments();
        assert_eq!(fragments.len(), 2);
        assert!(sink.is_empty());
        let first = ClusteringComparison::from_fields(
            fragments[0].table("clustering_comparison").unwrap().values().next().unwrap(),
        )
        .unwrap();
        assert_eq!(first.base.as_str(), "b");
    }

    // === Scenario: racing emits of one pair keep a single fragment ===
    #[tokio::test]
    async fn concurrent_duplicates_are_rejected() {
        let sink = std::sync::Arc::new(MemorySink::new());
        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..16 {
            let sink = sink.clone();
            tasks.spawn(async move {
                sink.emit(&ClusteringComparison {
                    base: "x".into(),
                    compare: "y".into(),
                    nmi: Some(0.5),
                    ari: None,
                })
                .await
                .is_ok()
            });
        }
        let mut accepted = 0;
        while let Some(ok) = tasks.join_next().await {
            if ok.unwrap() {
                accepted += 1;
            }
        }
        assert_eq!(accepted, 1);
        assert_eq!(sink.len(), 1);
    }
}
