//! Result sinks
//!
//! Scored comparisons leave the pipeline as fragments in the same
//! `type/id/field` shape the record store reads, so the next pass merges
//! them like any other run output.

mod file;
mod memory;
mod traits;

pub use file::FragmentSink;
pub use memory::MemorySink;
pub use traits::{comparison_fragment, EmitResult, ResultSink, SinkError};
