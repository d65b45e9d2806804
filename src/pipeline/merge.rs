//! Final record assembly for the persistence stage.
//!
//! Combines extraction output with classification labels. When the
//! classification stage failed, safe defaults are filled in instead: a
//! document with good extraction but no classification is saved degraded,
//! never dropped. Extractor-provided values are kept where the classifier
//! did not supply a better one.

use serde_json::Value;

use super::types::{FieldMap, TaskRecord};

/// Defaults applied when classification is missing or incomplete.
pub const DEFAULT_HSN_CODE: &str = "unclassified";
pub const DEFAULT_LEDGER_NAME: &str = "Purchase A/c";
pub const DEFAULT_GROUP_NAME: &str = "Purchase Accounts";
/// Confidence marker for degraded records, distinct from any classifier tier.
pub const DEFAULT_CONFIDENCE: &str = "unverified";

/// Build the merged record committed by the persistence stage.
pub fn merge_results(task: &TaskRecord) -> FieldMap {
    let mut merged = task.extraction.clone().unwrap_or_default();

    match &task.classification {
        Some(labels) => {
            merged.insert("hsn_code".into(), Value::String(labels.hsn_code.clone()));
            merged.insert("ledger_name".into(), Value::String(labels.ledger_name.clone()));
            merged.insert("group_name".into(), Value::String(labels.group_name.clone()));
            merged.insert(
                "ai_confidence".into(),
                Value::String(labels.confidence.as_str().to_string()),
            );
        }
        None => {
            fill_default(&mut merged, "hsn_code", DEFAULT_HSN_CODE);
            fill_default(&mut merged, "ledger_name", DEFAULT_LEDGER_NAME);
            fill_default(&mut merged, "group_name", DEFAULT_GROUP_NAME);
            merged.insert(
                "ai_confidence".into(),
                Value::String(DEFAULT_CONFIDENCE.to_string()),
            );
        }
    }

    // Submission metadata travels with the record.
    merged.insert("task_id".into(), Value::String(task.task_id.clone()));
    merged.insert("filename".into(), Value::String(task.file_name.clone()));
    merged.insert("doc_type".into(), Value::String(task.doc_type.clone()));
    merged.insert(
        "client_id".into(),
        task.client_id.map_or(Value::Null, Value::from),
    );
    if let Some(entered_by) = &task.entered_by {
        merged.insert("entered_by".into(), Value::String(entered_by.clone()));
    }

    merged
}

/// Insert a default only when the extractor left the field absent or empty.
fn fill_default(map: &mut FieldMap, key: &str, default: &str) {
    let usable = map
        .get(key)
        .and_then(Value::as_str)
        .is_some_and(|s| !s.trim().is_empty());
    if !usable {
        map.insert(key.to_string(), Value::String(default.to_string()));
    }
}
