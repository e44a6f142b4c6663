//! Repair of fragments whose algorithm run lost its program run link

use crate::fragment::{write_replace, Fragment, FragmentError};
use crate::record::{FieldValue, RecordId, RecordType};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum RepairError {
    #[error("expected exactly one {record_type} record, found {count}")]
    NotExactlyOne { record_type: &'static str, count: usize },

    #[error("no algorithm known for binary '{0}'")]
    UnknownBinary(String),

    #[error(transparent)]
    Fragment(#[from] FragmentError),
}

fn only_record(fragment: &Fragment, record_type: RecordType) -> Result<RecordId, RepairError> {
    let table = fragment.table(record_type.as_str());
    let count = table.map_or(0, |t| t.len());
    match table.and_then(|t| t.keys().next()) {
        Some(id) if count == 1 => Ok(id.clone()),
        _ => Err(RepairError::NotExactlyOne {
            record_type: record_type.as_str(),
            count,
        }),
    }
}

/// Link the single algorithm run of `fragment` to its single program run.
///
/// When the link is missing it is filled in and `algorithm` is set from
/// the program run's `binary` through `binaries`. Returns whether the
/// fragment changed.
pub fn link_orphan_algorithm_run(
    fragment: &mut Fragment,
    binaries: &BTreeMap<String, String>,
) -> Result<bool, RepairError> {
    let program_run = only_record(fragment, RecordType::ProgramRun)?;
    let algorithm_run = only_record(fragment, RecordType::AlgorithmRun)?;

    let linked = fragment
        .table(RecordType::AlgorithmRun.as_str())
        .and_then(|t| t.get(&algorithm_run))
        .is_some_and(|fields| fields.contains_key("program_run_id"));
    if linked {
        return Ok(false);
    }

    let binary = fragment
        .table(RecordType::ProgramRun.as_str())
        .and_then(|t| t.get(&program_run))
        .and_then(|fields| fields.get("binary"))
        .and_then(FieldValue::as_str)
        .unwrap_or_default()
        .to_string();
    let algorithm = binaries
        .get(&binary)
        .ok_or_else(|| RepairError::UnknownBinary(binary.clone()))?;

    let run_type = RecordType::AlgorithmRun.as_str();
    fragment.set_field(
        run_type,
        &algorithm_run,
        "program_run_id",
        FieldValue::String(program_run.to_string()),
    );
    fragment.set_field(run_type, &algorithm_run, "algorithm", FieldValue::from(algorithm.as_str()));
    debug!(algorithm_run = %algorithm_run, program_run = %program_run, "linked orphan run");
    Ok(true)
}

/// Repair one fragment file in place. Unchanged files are not rewritten.
pub fn repair_file(path: &Path, binaries: &BTreeMap<String, String>) -> Result<bool, RepairError> {
    let mut fragment = Fragment::from_path(path)?;
    if !link_orphan_algorithm_run(&mut fragment, binaries)? {
        return Ok(false);
    }
    write_replace(path, &fragment)?;
    info!(path = %path.display(), "repaired algorithm run link");
    Ok(true)
}
