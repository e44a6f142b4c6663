//! Capabilities the similarity worker consumes
//!
//! Reading partition files and computing NMI/ARI are external concerns;
//! the worker only sees these traits. Default implementations live in
//! `partition` and `measure`.

use super::error::ReadError;
use std::path::PathBuf;

/// Cluster id of an element with no assignment
pub const UNASSIGNED: u64 = u64::MAX;

/// Assignment of elements (graph nodes) to cluster ids
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    assignment: Vec<u64>,
}

impl Partition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a dense assignment, index = element id
    pub fn from_assignment(assignment: Vec<u64>) -> Self {
        Self { assignment }
    }

    /// Assign `element` to `cluster`, growing the partition as needed
    pub fn assign(&mut self, element: usize, cluster: u64) {
        if element >= self.assignment.len() {
            self.assignment.resize(element + 1, UNASSIGNED);
        }
        self.assignment[element] = cluster;
    }

    /// Cluster of `element`, `None` if unassigned or out of range
    pub fn cluster_of(&self, element: usize) -> Option<u64> {
        match self.assignment.get(element) {
            Some(&c) if c != UNASSIGNED => Some(c),
            _ => None,
        }
    }

    /// Number of elements, including unassigned ones below the highest id
    pub fn element_count(&self) -> usize {
        self.assignment.len()
    }
}

/// `element_count(Partition)` as a free function
pub fn element_count(partition: &Partition) -> usize {
    partition.element_count()
}

/// Reads one logical partition from an ordered sequence of shard files.
pub trait PartitionReader: Send + Sync {
    fn read_partition(&self, paths: &[PathBuf]) -> Result<Partition, ReadError>;
}

/// Dissimilarity measures between two partitions of the same element set.
///
/// Both return `0.0` for identical partitions. Values may exceed `1.0`.
pub trait SimilarityMeasure: Send + Sync {
    fn nmi_dissimilarity(&self, reference_size: usize, a: &Partition, b: &Partition) -> f64;

    fn ari_dissimilarity(&self, reference_size: usize, a: &Partition, b: &Partition) -> f64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assign_grows_with_gaps() {
        let mut p = Partition::new();
        p.assign(3, 7);
        assert_eq!(element_count(&p), 4);
        assert_eq!(p.cluster_of(3), Some(7));
        assert_eq!(p.cluster_of(1), None);
        assert_eq!(p.cluster_of(10), None);
    }
}
