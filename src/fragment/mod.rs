//! Fragment formats
//!
//! A fragment is the durable form of experiment records: runs write log
//! lines, the converter turns them into JSON keyed by record id, and the
//! record store merges any number of JSON fragments.

mod error;
mod json;
mod log;
mod writer;

pub use error::{FragmentError, FragmentResult};
pub use json::{is_reference_field, Fragment, Table};
pub use log::{typify, LogConverter, LOG_PREFIX};
pub use writer::{discover, write_new, write_replace, write_report};
