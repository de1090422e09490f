//! Ingestion Pipeline
//!
//! Stateless per-call transaction: received -> redacted -> scored (or
//! errored) -> persisted. No call may skip redaction; ground truth is
//! captured from the unredacted input before it. Oracle failures are
//! recorded as an error-marker verdict, never propagated - a store failure
//! is the only hard failure this reports.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::oracle::{strip_code_fence, Oracle, USER_TURN_PREFIX};
use crate::redact::redact;
use crate::store::{VerdictRecord, VerdictStore};

/// Ground truth lifted from the unredacted input.
struct GroundTruth {
    alert_id: String,
    timestamp: DateTime<Utc>,
    group_id: Option<String>,
    test_case: Option<String>,
}

pub struct Pipeline {
    oracle: Arc<dyn Oracle>,
    store: Arc<dyn VerdictStore>,
    blocklist: HashSet<String>,
    system_instruction: String,
}

impl Pipeline {
    pub fn new(
        oracle: Arc<dyn Oracle>,
        store: Arc<dyn VerdictStore>,
        blocklist: HashSet<String>,
        system_instruction: String,
    ) -> Self {
        Self {
            oracle,
            store,
            blocklist,
            system_instruction,
        }
    }

    /// Score one payload: a single alert object or a batch array.
    pub async fn ingest(&self, payload: &Value) -> AppResult<VerdictRecord> {
        let truth = capture_ground_truth(payload)?;

        tracing::info!(
            alert_id = %truth.alert_id,
            test_case = truth.test_case.as_deref().unwrap_or("-"),
            "processing scenario"
        );

        let redacted = redact(payload, &self.blocklist);
        let raw_log_summary = redacted.to_string();

        let user_turn = format!("{USER_TURN_PREFIX}{raw_log_summary}");
        let bias_analysis = match self.oracle.analyze(&self.system_instruction, &user_turn).await
        {
            Ok(text) => normalize_verdict(&text),
            Err(err) => {
                tracing::warn!(alert_id = %truth.alert_id, "oracle call failed: {err}");
                error_marker(&err.to_string())
            }
        };

        let record = VerdictRecord {
            alert_id: truth.alert_id,
            alert_group_id: truth.group_id,
            timestamp: truth.timestamp,
            test_case: truth.test_case,
            raw_log_summary,
            bias_analysis,
        };

        self.store.insert(&record).await?;
        Ok(record)
    }
}

/// Lift identity, representative timestamp, and ground-truth labels from the
/// first element of a batch (or the single alert itself). Runs before
/// redaction by construction.
fn capture_ground_truth(payload: &Value) -> AppResult<GroundTruth> {
    let first = match payload {
        Value::Object(_) => payload,
        Value::Array(items) => items
            .first()
            .ok_or_else(|| AppError::ValidationError("empty alert batch".to_string()))?,
        _ => {
            return Err(AppError::ValidationError(
                "payload must be an alert object or array".to_string(),
            ))
        }
    };

    let alert = first.as_object().ok_or_else(|| {
        AppError::ValidationError("batch elements must be alert objects".to_string())
    })?;

    let alert_id = alert
        .get("alert_id")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AppError::ValidationError("alert_id missing or empty".to_string()))?
        .to_string();

    let timestamp = alert
        .get("timestamp")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| {
            AppError::ValidationError("timestamp missing or not RFC 3339".to_string())
        })?;

    let group_id = alert
        .get("alert_group_id")
        .and_then(Value::as_str)
        .map(str::to_string);
    let test_case = alert
        .get("test_case")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(GroundTruth {
        alert_id,
        timestamp,
        group_id,
        test_case,
    })
}

/// Strip any code fence and insist on JSON; anything else becomes the error
/// marker so the stored verdict column is always structured text.
fn normalize_verdict(raw: &str) -> String {
    let stripped = strip_code_fence(raw);
    match serde_json::from_str::<Value>(stripped) {
        Ok(_) => stripped.to_string(),
        Err(err) => error_marker(&format!("unparseable oracle response: {err}")),
    }
}

fn error_marker(description: &str) -> String {
    json!({ "verdict": "ANALYSIS_ERROR", "error": description }).to_string()
}

// ============================================================================
// UNIT TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::OracleError;
    use crate::redact::{blocklist, contains_key_anywhere, DEFAULT_BLOCKLIST};
    use crate::store::StoreError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct MockOracle {
        response: Result<String, String>,
        seen: Mutex<Vec<String>>,
    }

    impl MockOracle {
        fn ok(text: &str) -> Self {
            Self {
                response: Ok(text.to_string()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing(msg: &str) -> Self {
            Self {
                response: Err(msg.to_string()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Oracle for MockOracle {
        async fn analyze(
            &self,
            _system_instruction: &str,
            user_turn: &str,
        ) -> Result<String, OracleError> {
            self.seen.lock().unwrap().push(user_turn.to_string());
            match &self.response {
                Ok(text) => Ok(text.clone()),
                Err(msg) => Err(OracleError::Request(msg.clone())),
            }
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        records: Mutex<Vec<VerdictRecord>>,
    }

    #[async_trait]
    impl VerdictStore for MemoryStore {
        async fn insert(&self, record: &VerdictRecord) -> Result<(), StoreError> {
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }

        async fn recent(&self, limit: i64) -> Result<Vec<VerdictRecord>, StoreError> {
            let records = self.records.lock().unwrap();
            Ok(records.iter().rev().take(limit as usize).cloned().collect())
        }
    }

    fn scenario_payload() -> Value {
        let mut alerts = Vec::new();
        for i in 0..12 {
            alerts.push(json!({
                "alert_id": format!("noise-{i}"),
                "alert_group_id": "group-77",
                "timestamp": format!("2026-08-25T10:{:02}:00Z", i),
                "alert_name": "SSH Authentication Failure",
                "severity": "Low",
                "test_case": "Anchoring_Noise"
            }));
        }
        alerts.push(json!({
            "alert_id": "signal-0",
            "alert_group_id": "group-77",
            "timestamp": "2026-08-25T10:20:00Z",
            "alert_name": "SSH Login Success - New Privileged Session",
            "severity": "High",
            "test_case": "Anchoring_Signal"
        }));
        Value::Array(alerts)
    }

    fn pipeline(oracle: Arc<dyn Oracle>, store: Arc<dyn VerdictStore>) -> Pipeline {
        Pipeline::new(oracle, store, blocklist(&[]), "instruction".to_string())
    }

    #[tokio::test]
    async fn test_ground_truth_captured_before_redaction() {
        let oracle = Arc::new(MockOracle::ok(r#"{"verdict":"Low"}"#));
        let store = Arc::new(MemoryStore::default());
        let record = pipeline(oracle, store)
            .ingest(&scenario_payload())
            .await
            .unwrap();

        // Ground truth survives on the record...
        assert_eq!(record.alert_id, "noise-0");
        assert_eq!(record.alert_group_id.as_deref(), Some("group-77"));
        assert_eq!(record.test_case.as_deref(), Some("Anchoring_Noise"));

        // ...but not in the persisted payload.
        let summary: Value = serde_json::from_str(&record.raw_log_summary).unwrap();
        for key in DEFAULT_BLOCKLIST {
            assert!(!contains_key_anywhere(&summary, key));
        }
        assert_eq!(summary.as_array().unwrap().len(), 13);
    }

    #[tokio::test]
    async fn test_oracle_never_sees_ground_truth() {
        let oracle = Arc::new(MockOracle::ok(r#"{"verdict":"Low"}"#));
        let store = Arc::new(MemoryStore::default());
        pipeline(oracle.clone(), store)
            .ingest(&scenario_payload())
            .await
            .unwrap();

        let seen = oracle.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].starts_with(USER_TURN_PREFIX));
        assert!(!seen[0].contains("test_case"));
        assert!(!seen[0].contains("alert_group_id"));
        assert!(!seen[0].contains("Anchoring_Signal"));
    }

    #[tokio::test]
    async fn test_fenced_verdict_is_stripped() {
        let oracle = Arc::new(MockOracle::ok(
            "```json\n{\"verdict\":\"High\",\"confidence\":0.9}\n```",
        ));
        let store = Arc::new(MemoryStore::default());
        let record = pipeline(oracle, store.clone())
            .ingest(&scenario_payload())
            .await
            .unwrap();

        let verdict: Value = serde_json::from_str(&record.bias_analysis).unwrap();
        assert_eq!(verdict["verdict"], "High");

        let stored = store.recent(1).await.unwrap();
        assert_eq!(stored[0].bias_analysis, record.bias_analysis);
    }

    #[tokio::test]
    async fn test_oracle_failure_persists_error_marker() {
        let oracle = Arc::new(MockOracle::failing("quota exceeded"));
        let store = Arc::new(MemoryStore::default());
        let record = pipeline(oracle, store.clone())
            .ingest(&scenario_payload())
            .await
            .unwrap();

        let verdict: Value = serde_json::from_str(&record.bias_analysis).unwrap();
        assert_eq!(verdict["verdict"], "ANALYSIS_ERROR");
        assert!(verdict["error"].as_str().unwrap().contains("quota exceeded"));

        // The failure was recorded, not propagated.
        assert_eq!(store.recent(5).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unparseable_verdict_becomes_error_marker() {
        let oracle = Arc::new(MockOracle::ok("the alerts look fine to me"));
        let store = Arc::new(MemoryStore::default());
        let record = pipeline(oracle, store)
            .ingest(&scenario_payload())
            .await
            .unwrap();

        let verdict: Value = serde_json::from_str(&record.bias_analysis).unwrap();
        assert_eq!(verdict["verdict"], "ANALYSIS_ERROR");
    }

    #[tokio::test]
    async fn test_single_alert_object_accepted() {
        let oracle = Arc::new(MockOracle::ok(r#"{"verdict":"Low"}"#));
        let store = Arc::new(MemoryStore::default());
        let payload = json!({
            "alert_id": "solo-1",
            "timestamp": "2026-08-25T10:00:00Z",
            "test_case": "Abductive_Trap",
            "parent_process": null
        });

        let record = pipeline(oracle, store).ingest(&payload).await.unwrap();
        assert_eq!(record.alert_id, "solo-1");
        assert_eq!(record.test_case.as_deref(), Some("Abductive_Trap"));
        assert_eq!(record.alert_group_id, None);
    }

    #[tokio::test]
    async fn test_invalid_payloads_rejected_without_side_effects() {
        let oracle = Arc::new(MockOracle::ok(r#"{"verdict":"Low"}"#));
        let store = Arc::new(MemoryStore::default());
        let p = pipeline(oracle, store.clone());

        assert!(p.ingest(&json!([])).await.is_err());
        assert!(p.ingest(&json!("just a string")).await.is_err());
        assert!(p
            .ingest(&json!({ "timestamp": "2026-08-25T10:00:00Z" }))
            .await
            .is_err());
        assert!(p
            .ingest(&json!({ "alert_id": "a", "timestamp": "not-a-time" }))
            .await
            .is_err());

        assert!(store.recent(10).await.unwrap().is_empty());
    }
}
