//! Contingency-table similarity measures
//!
//! NMI uses arithmetic-mean normalization, `2 I(A;B) / (H(A) + H(B))`.
//! Elements unassigned in either partition are ignored.

use super::capability::{Partition, SimilarityMeasure};
use std::collections::HashMap;

/// Joint and marginal cluster counts over the first `reference_size` elements
struct Contingency {
    n: u64,
    joint: HashMap<(u64, u64), u64>,
    left: HashMap<u64, u64>,
    right: HashMap<u64, u64>,
}

impl Contingency {
    fn build(reference_size: usize, a: &Partition, b: &Partition) -> Self {
        let mut table = Self {
            n: 0,
            joint: HashMap::new(),
            left: HashMap::new(),
            right: HashMap::new(),
        };
        for element in 0..reference_size {
            let (Some(ca), Some(cb)) = (a.cluster_of(element), b.cluster_of(element)) else {
                continue;
            };
            table.n += 1;
            *table.joint.entry((ca, cb)).or_default() += 1;
            *table.left.entry(ca).or_default() += 1;
            *table.right.entry(cb).or_default() += 1;
        }
        table
    }

    /// Same clusters up to relabeling
    fn is_bijection(&self) -> bool {
        self.joint.len() == self.left.len() && self.joint.len() == self.right.len()
    }
}

fn entropy(counts: &HashMap<u64, u64>, n: f64) -> f64 {
    counts
        .values()
        .map(|&c| {
            let p = c as f64 / n;
            -p * p.ln()
        })
        .sum()
}

fn pairs(k: u64) -> f64 {
    let k = k as f64;
    k * (k - 1.0) / 2.0
}

/// Default [`SimilarityMeasure`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ContingencyMeasure;

impl SimilarityMeasure for ContingencyMeasure {
    fn nmi_dissimilarity(&self, reference_size: usize, a: &Partition, b: &Partition) -> f64 {
        let t = Contingency::build(reference_size, a, b);
        if t.n == 0 || t.is_bijection() {
            return 0.0;
        }
        let n = t.n as f64;
        let h = entropy(&t.left, n) + entropy(&t.right, n);
        if h == 0.0 {
            return 0.0;
        }
        let mutual: f64 = t
            .joint
            .iter()
            .map(|(&(ca, cb), &c)| {
                let c = c as f64;
                let expected = t.left[&ca] as f64 * t.right[&cb] as f64;
                (c / n) * (n * c / expected).ln()
            })
            .sum();
        (1.0 - 2.0 * mutual / h).max(0.0)
    }

    fn ari_dissimilarity(&self, reference_size: usize, a: &Partition, b: &Partition) -> f64 {
        let t = Contingency::build(reference_size, a, b);
        if t.n == 0 || t.is_bijection() {
            return 0.0;
        }
        let index: f64 = t.joint.values().map(|&c| pairs(c)).sum();
        let sum_left: f64 = t.left.values().map(|&c| pairs(c)).sum();
        let sum_right: f64 = t.right.values().map(|&c| pairs(c)).sum();
        let total = pairs(t.n);
        let expected = sum_left * sum_right / total;
        let max = (sum_left + sum_right) / 2.0;
        if max == expected {
            // No pair structure to compare against.
            return 1.0;
        }
        1.0 - (index - expected) / (max - expected)
    }
}
