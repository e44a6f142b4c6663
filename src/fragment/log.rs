//! Converter from run logs to JSON fragments
//!
//! Runs print record fields as lines of the form
//! `#LOG# type/instance/field: value`. Instance ids are small integers
//! scoped to one log; the converter replaces them with fresh UUIDs and
//! rewrites reference fields through the same mapping.

use super::error::{FragmentError, FragmentResult};
use super::json::{is_reference_field, Fragment};
use crate::record::{FieldValue, RecordId, RecordType};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Marker that prefixes record lines in mixed program output
pub const LOG_PREFIX: &str = "#LOG# ";

/// Converts log lines into a UUID-keyed fragment.
#[derive(Debug, Clone)]
pub struct LogConverter {
    /// Only lines starting with [`LOG_PREFIX`] are records; others are ignored.
    /// When false, every non-empty line must be a record line.
    pub require_prefix: bool,
    /// Commit hash stamped onto program runs
    pub commit: Option<String>,
    /// Timestamp stamped onto program runs; defaults to now
    pub timestamp: Option<DateTime<Utc>>,
}

impl Default for LogConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl LogConverter {
    pub fn new() -> Self {
        Self {
            require_prefix: true,
            commit: None,
            timestamp: None,
        }
    }

    pub fn with_commit(mut self, commit: impl Into<String>) -> Self {
        self.commit = Some(commit.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn without_prefix(mut self) -> Self {
        self.require_prefix = false;
        self
    }

    /// Convert the text of one log. Instance ids are scoped to this call.
    pub fn convert(&self, text: &str) -> FragmentResult<Fragment> {
        let mut ids = LocalIds::default();
        let mut fragment = Fragment::new();

        for (index, raw) in text.lines().enumerate() {
            let line_no = index + 1;
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            let line = match line.strip_prefix(LOG_PREFIX.trim_end()) {
                Some(rest) => rest.trim_start(),
                None if self.require_prefix => continue,
                None => line,
            };

            let (key, value) = line.split_once(':').ok_or_else(|| FragmentError::LogLine {
                line: line_no,
                reason: "missing ':' separator".to_string(),
            })?;
            let mut parts = key.trim().split('/');
            let (Some(record_type), Some(instance), Some(field), None) =
                (parts.next(), parts.next(), parts.next(), parts.next())
            else {
                return Err(FragmentError::LogLine {
                    line: line_no,
                    reason: format!("expected type/instance/field, got '{}'", key.trim()),
                });
            };
            if record_type.is_empty() || instance.is_empty() || field.is_empty() {
                return Err(FragmentError::LogLine {
                    line: line_no,
                    reason: format!("empty key segment in '{}'", key.trim()),
                });
            }

            let value = value.trim();
            let id = ids.resolve(instance);
            let value = if is_reference_field(field) {
                FieldValue::String(ids.resolve(value).to_string())
            } else {
                typify(value)
            };
            fragment.set_field(record_type, &id, field, value);
        }

        self.stamp_program_runs(&mut fragment);
        Ok(fragment)
    }

    fn stamp_program_runs(&self, fragment: &mut Fragment) {
        let Some(runs) = fragment.table_mut(RecordType::ProgramRun.as_str()) else {
            return;
        };
        let timestamp = self.timestamp.unwrap_or_else(Utc::now).to_rfc3339();
        for fields in runs.values_mut() {
            fields.insert("timestamp".to_string(), FieldValue::String(timestamp.clone()));
            if let Some(ref commit) = self.commit {
                fields.insert("commit".to_string(), FieldValue::String(commit.clone()));
            }
        }
    }
}

/// Maps instance ids of one log to record ids.
#[derive(Default)]
struct LocalIds {
    map: HashMap<String, RecordId>,
}

impl LocalIds {
    /// Integer instances get a fresh UUID; anything else, including an
    /// empty value, is already global.
    fn resolve(&mut self, key: &str) -> RecordId {
        if key.is_empty() || !key.chars().all(|c| c.is_ascii_digit()) {
            return RecordId::from(key);
        }
        self.map
            .entry(key.to_string())
            .or_insert_with(RecordId::new)
            .clone()
    }
}

/// Parse a raw log value into the narrowest matching type.
pub fn typify(value: &str) -> FieldValue {
    match value {
        "true" => return FieldValue::Bool(true),
        "false" => return FieldValue::Bool(false),
        _ => {}
    }
    if let Some(inner) = value.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
        return FieldValue::Array(
            inner
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(typify)
                .collect(),
        );
    }
    if let Ok(i) = value.parse::<i64>() {
        return FieldValue::Int(i);
    }
    if let Ok(f) = value.parse::<f64>() {
        if f.is_finite() {
            return FieldValue::Float(f);
        }
    }
    FieldValue::String(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn converter() -> LogConverter {
        LogConverter::new()
            .with_commit("abc123")
            .with_timestamp(Utc.with_ymd_and_hms(2017, 1, 10, 12, 0, 0).unwrap())
    }

    #[test]
    fn typify_matches_log_conventions() {
        assert_eq!(typify("true"), FieldValue::Bool(true));
        assert_eq!(typify("42"), FieldValue::Int(42));
        assert_eq!(typify("0.75"), FieldValue::Float(0.75));
        assert_eq!(typify("graph.bin"), FieldValue::from("graph.bin"));
        assert_eq!(
            typify("[1, 2, ]"),
            FieldValue::Array(vec![FieldValue::Int(1), FieldValue::Int(2)])
        );
        assert_eq!(typify("inf"), FieldValue::from("inf"));
    }

    #[test]
    fn instances_become_uuids_and_references_follow() {
        let log = "\
noise from the program
#LOG# program_run/0/job_id: 14169048
#LOG# program_run/0/graph: graphs/amazon-*.bin
#LOG# algorithm_run/1/program_run_id: 0
#LOG# algorithm_run/1/runtime: 12.5
";
        let f = converter().convert(log).unwrap();

        let runs = f.table("program_run").unwrap();
        assert_eq!(runs.len(), 1);
        let (run_id, run) = runs.iter().next().unwrap();
        assert_eq!(run["job_id"], FieldValue::Int(14169048));
        assert_eq!(run["commit"], FieldValue::from("abc123"));
        assert!(run.contains_key("timestamp"));

        let algos = f.table("algorithm_run").unwrap();
        let algo = algos.values().next().unwrap();
        assert_eq!(algo["program_run_id"], FieldValue::String(run_id.to_string()));
        assert_ne!(run_id.as_str(), "0");
    }

    #[test]
    fn non_integer_references_are_kept_verbatim() {
        let log = "\
#LOG# clustering_comparison/0/base_clustering_id: 5b1f-aa
#LOG# clustering_comparison/0/NMI: 0.9
";
        let f = converter().convert(log).unwrap();
        let cmp = f.table("clustering_comparison").unwrap().values().next().unwrap();
        assert_eq!(cmp["base_clustering_id"], FieldValue::from("5b1f-aa"));
    }

    #[test]
    fn empty_references_stay_empty() {
        let log = "\
#LOG# algorithm_run/1/program_run_id:
#LOG# algorithm_run/1/runtime: 3
";
        let f = converter().convert(log).unwrap();
        let algo = f.table("algorithm_run").unwrap().values().next().unwrap();
        assert_eq!(algo["program_run_id"], FieldValue::from(""));
    }

    #[test]
    fn malformed_key_reports_line_number() {
        let log = "#LOG# program_run/0/graph: g\n#LOG# program_run/graph: g\n";
        match converter().convert(log) {
            Err(FragmentError::LogLine { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected LogLine error, got {:?}", other),
        }
    }

    #[test]
    fn unprefixed_mode_reads_bare_lines() {
        let f = converter()
            .without_prefix()
            .convert("clustering/0/path: p1\n")
            .unwrap();
        assert_eq!(f.record_count(), 1);
    }

    #[test]
    fn empty_log_gives_empty_fragment() {
        let f = converter().convert("nothing to see\n").unwrap();
        assert!(f.is_empty());
    }
}
