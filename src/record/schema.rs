//! Record types and the fields each type is expected to carry
//!
//! Tables are keyed by their type name as it appears in fragments. The
//! schema names the fields the pipeline interprets; anything else is kept
//! untouched.

use super::value::{FieldValue, Fields, RecordId};

/// Known record types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    ProgramRun,
    AlgorithmRun,
    AlgorithmLevel,
    ClusterSizeDistribution,
    Clustering,
    ClusteringComparison,
}

impl RecordType {
    pub const ALL: [RecordType; 6] = [
        Self::ProgramRun,
        Self::AlgorithmRun,
        Self::AlgorithmLevel,
        Self::ClusterSizeDistribution,
        Self::Clustering,
        Self::ClusteringComparison,
    ];

    /// Table name used in fragments
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProgramRun => "program_run",
            Self::AlgorithmRun => "algorithm_run",
            Self::AlgorithmLevel => "algorithm_level",
            Self::ClusterSizeDistribution => "cluster_size_distribution",
            Self::Clustering => "clustering",
            Self::ClusteringComparison => "clustering_comparison",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }

    /// Fields the pipeline reads for this type.
    pub fn expected_fields(&self) -> &'static [&'static str] {
        match self {
            Self::ProgramRun => &[
                "graph",
                "graph_path",
                "hosts",
                "workers_per_host",
                "node_count",
                "edge_count",
                "job_id",
                "binary",
                "contraction",
                "switch_to_seq",
                "timestamp",
                "commit",
            ],
            Self::AlgorithmRun => &["algorithm", "program_run_id", "runtime"],
            Self::AlgorithmLevel => &["algorithm_run_id", "node_count", "cluster_count"],
            // Histogram buckets are keyed by cluster size and not enumerable.
            Self::ClusterSizeDistribution => &["algorithm_level_id"],
            Self::Clustering => &[
                "path",
                "source",
                "graph",
                "algorithm_run_id",
                "modularity",
                "map_equation",
                "cluster_count",
            ],
            Self::ClusteringComparison => &["base_clustering_id", "compare_clustering_id", "NMI", "ARI"],
        }
    }

    /// Foreign keys as (field, referenced type)
    pub fn foreign_keys(&self) -> &'static [(&'static str, RecordType)] {
        match self {
            Self::ProgramRun => &[],
            Self::AlgorithmRun => &[("program_run_id", Self::ProgramRun)],
            Self::AlgorithmLevel => &[("algorithm_run_id", Self::AlgorithmRun)],
            Self::ClusterSizeDistribution => &[("algorithm_level_id", Self::AlgorithmLevel)],
            Self::Clustering => &[("algorithm_run_id", Self::AlgorithmRun)],
            Self::ClusteringComparison => &[
                ("base_clustering_id", Self::Clustering),
                ("compare_clustering_id", Self::Clustering),
            ],
        }
    }

    /// Fields present on a record that this type does not interpret.
    pub fn unknown_fields<'a>(&self, fields: &'a Fields) -> Vec<&'a str> {
        let expected = self.expected_fields();
        fields
            .keys()
            .map(String::as_str)
            .filter(|k| *k != "id" && !expected.contains(k))
            .collect()
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a clustering came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusteringSource {
    Computation,
    GroundTruth,
}

impl ClusteringSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Computation => "computation",
            Self::GroundTruth => "ground_truth",
        }
    }

    /// Reads the `source` field; records without one count as computations.
    pub fn of(fields: &Fields) -> Self {
        match fields.get("source").and_then(FieldValue::as_str) {
            Some("ground_truth") => Self::GroundTruth,
            _ => Self::Computation,
        }
    }
}

/// A scored pair of clusterings.
///
/// `nmi` and `ari` are `None` when the pair could not be scored; that is
/// never the same as a score of zero.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusteringComparison {
    pub base: RecordId,
    pub compare: RecordId,
    pub nmi: Option<f64>,
    pub ari: Option<f64>,
}

impl ClusteringComparison {
    /// Record id derived from the unordered pair, so that re-emitting the
    /// same result lands on the same record.
    pub fn record_id(&self) -> RecordId {
        let (lo, hi) = if self.base <= self.compare {
            (&self.base, &self.compare)
        } else {
            (&self.compare, &self.base)
        };
        RecordId::derived(&format!("clustering_comparison:{}:{}", lo, hi))
    }

    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert(
            "base_clustering_id".to_string(),
            FieldValue::String(self.base.to_string()),
        );
        fields.insert(
            "compare_clustering_id".to_string(),
            FieldValue::String(self.compare.to_string()),
        );
        fields.insert("NMI".to_string(), self.nmi.into());
        fields.insert("ARI".to_string(), self.ari.into());
        fields
    }

    /// Reads a comparison record; `None` if either clustering id is missing.
    pub fn from_fields(fields: &Fields) -> Option<Self> {
        let base = fields.get("base_clustering_id")?.as_str()?;
        let compare = fields.get("compare_clustering_id")?.as_str()?;
        Some(Self {
            base: RecordId::from(base),
            compare: RecordId::from(compare),
            nmi: fields.get("NMI").and_then(FieldValue::as_f64),
            ari: fields.get("ARI").and_then(FieldValue::as_f64),
        })
    }
}
