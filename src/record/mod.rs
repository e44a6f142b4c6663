//! Experiment records and the store that merges them

mod display;
mod schema;
mod store;
mod value;

pub use display::DisplayNames;
pub use schema::{ClusteringComparison, ClusteringSource, RecordType};
pub use store::{MergeError, MergePolicy, MergeResult, RecordStore};
pub use value::{FieldValue, Fields, RecordId};
