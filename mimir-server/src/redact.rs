//! Redactor
//!
//! Structure-preserving deep copy that removes every blocklisted key at any
//! depth. The pipeline's one safety invariant lives here: the oracle must
//! never receive a payload that has not passed through `redact`.

use serde_json::Value;
use std::collections::HashSet;

/// Keys that would give the answer away. Removed recursively from every
/// mapping in the payload. The group keys are included because a shared
/// group id identifies alerts as one synthetic batch.
pub const DEFAULT_BLOCKLIST: [&str; 7] = [
    "test_case",
    "variant",
    "ground_truth",
    "label",
    "is_truth",
    "alert_group_id",
    "group_id",
];

/// Build the redaction set: the fixed defaults plus configured extras.
pub fn blocklist(extra_keys: &[String]) -> HashSet<String> {
    DEFAULT_BLOCKLIST
        .iter()
        .map(|k| (*k).to_string())
        .chain(extra_keys.iter().cloned())
        .collect()
}

/// Remove every key in `blocklist` from `value`, at any nesting depth.
///
/// Sequences keep their length and order; non-mapping, non-sequence leaves
/// pass through unchanged. Total and idempotent.
pub fn redact(value: &Value, blocklist: &HashSet<String>) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(key, _)| !blocklist.contains(key.as_str()))
                .map(|(key, val)| (key.clone(), redact(val, blocklist)))
                .collect(),
        ),
        Value::Array(items) => {
            Value::Array(items.iter().map(|v| redact(v, blocklist)).collect())
        }
        leaf => leaf.clone(),
    }
}

/// True when `value` contains `key` in any mapping at any depth.
/// Used by tests and by the persistence-side sanity checks.
pub fn contains_key_anywhere(value: &Value, key: &str) -> bool {
    match value {
        Value::Object(map) => {
            map.contains_key(key) || map.values().any(|v| contains_key_anywhere(v, key))
        }
        Value::Array(items) => items.iter().any(|v| contains_key_anywhere(v, key)),
        _ => false,
    }
}
