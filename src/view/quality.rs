//! Clusterings still waiting for quality enrichment

use crate::record::{FieldValue, RecordId, RecordStore, RecordType};

/// Quality fields filled in lazily by an external analyser
pub const QUALITY_FIELDS: [&str; 3] = ["modularity", "map_equation", "cluster_count"];

/// Ids of clusterings missing any quality field (absent or null), in id order.
pub fn missing_quality(store: &RecordStore) -> Vec<RecordId> {
    let Some(clusterings) = store.table(RecordType::Clustering.as_str()) else {
        return Vec::new();
    };
    clusterings
        .iter()
        .filter(|(_, fields)| {
            QUALITY_FIELDS
                .iter()
                .any(|f| fields.get(*f).map_or(true, FieldValue::is_null))
        })
        .map(|(id, _)| id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::Fragment;
    use crate::record::MergePolicy;

    #[test]
    fn lists_incomplete_clusterings() {
        let f = Fragment::from_json(
            r#"{"clustering": {
                "done": {"modularity": 0.4, "map_equation": 7.1, "cluster_count": 12},
                "partial": {"modularity": 0.4, "map_equation": null, "cluster_count": 12},
                "fresh": {"path": "p"}
            }}"#,
            "test",
        )
        .unwrap();
        let store = RecordStore::merge(vec![f], MergePolicy::LastWins).unwrap();

        assert_eq!(
            missing_quality(&store),
            vec![RecordId::from("fresh"), RecordId::from("partial")]
        );
    }
}
