//! Read-only views over a merged record store
//!
//! Joins follow foreign keys from a leaf table to its ancestors; pair
//! enumeration groups joined rows and forms the comparison candidates.

mod join;
mod pairs;
mod quality;

pub use join::{join, ColumnRef, JoinChain, JoinEdge, JoinView, Row};
pub use pairs::{enumerate, ground_truth_pairs, group_ids, ClusteringPair, PairKey};
pub use quality::{missing_quality, QUALITY_FIELDS};
