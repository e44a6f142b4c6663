//! Display-name remapping applied once after merging

use super::schema::RecordType;
use super::store::RecordStore;
use super::value::{FieldValue, Fields, RecordId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Short names for algorithms and graphs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayNames {
    /// Algorithm name -> display name
    pub algorithms: BTreeMap<String, String>,
    /// Graph path -> display name; the path is kept under `graph_path`
    pub graphs: BTreeMap<String, String>,
    /// Appended when the owning program run switched to sequential mode
    pub sequential_suffix: Option<String>,
    /// Appended when the owning program run ran without contraction
    pub no_contraction_suffix: Option<String>,
}

impl DisplayNames {
    /// Rewrite algorithm and graph names in place. Returns the number of
    /// records touched.
    pub fn apply(&self, store: &mut RecordStore) -> usize {
        let mut touched = 0;

        // Flags are read from program runs before their graph names change.
        let flags: HashMap<RecordId, (Option<bool>, Option<bool>)> = store
            .table(RecordType::ProgramRun.as_str())
            .map(|runs| {
                runs.iter()
                    .map(|(id, f)| {
                        let seq = f.get("switch_to_seq").and_then(FieldValue::as_bool);
                        let contraction = f.get("contraction").and_then(FieldValue::as_bool);
                        (id.clone(), (seq, contraction))
                    })
                    .collect()
            })
            .unwrap_or_default();

        if let Some(algos) = store.table_mut(RecordType::AlgorithmRun.as_str()) {
            for fields in algos.values_mut() {
                let Some(name) = fields.get("algorithm").and_then(FieldValue::as_str) else {
                    continue;
                };
                let mut display = self
                    .algorithms
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| name.to_string());

                let run_flags = fields
                    .get("program_run_id")
                    .and_then(FieldValue::as_str)
                    .and_then(|run| flags.get(&RecordId::from(run)));
                if let Some((seq, contraction)) = run_flags {
                    if let (Some(true), Some(suffix)) = (seq, &self.sequential_suffix) {
                        push_suffix(&mut display, suffix);
                    }
                    if let (Some(false), Some(suffix)) = (contraction, &self.no_contraction_suffix) {
                        push_suffix(&mut display, suffix);
                    }
                }

                if name != display {
                    fields.insert("algorithm".to_string(), FieldValue::String(display));
                    touched += 1;
                }
            }
        }

        // Ground truths name their graph directly and must stay matched to
        // the program runs of that graph.
        for record_type in [RecordType::ProgramRun, RecordType::Clustering] {
            if let Some(table) = store.table_mut(record_type.as_str()) {
                for fields in table.values_mut() {
                    if self.rename_graph(fields) {
                        touched += 1;
                    }
                }
            }
        }

        touched
    }

    fn rename_graph(&self, fields: &mut Fields) -> bool {
        let Some(path) = fields.get("graph").and_then(FieldValue::as_str) else {
            return false;
        };
        let Some(short) = self.graphs.get(path) else {
            return false;
        };
        let path = path.to_string();
        fields.insert("graph".to_string(), FieldValue::String(short.clone()));
        fields
            .entry("graph_path".to_string())
            .or_insert(FieldValue::String(path));
        true
    }
}

/// Append `suffix` unless a previous remapping already did.
fn push_suffix(display: &mut String, suffix: &str) {
    if !display.ends_with(suffix) {
        display.push_str(suffix);
    }
}
