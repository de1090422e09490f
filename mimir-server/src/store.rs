//! Verdict Store
//!
//! Persistence for scored scenarios. One record per ingestion call,
//! insert-only; retention is the store's concern, not ours. The pipeline is
//! written against the trait so the PostgreSQL impl stays at the edge.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Persisted tuple: ground truth is captured separately from the redacted
/// payload that was actually submitted to the oracle.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VerdictRecord {
    pub alert_id: String,
    pub alert_group_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub test_case: Option<String>,
    /// Redacted input exactly as submitted to the oracle.
    pub raw_log_summary: String,
    /// Oracle verdict JSON text, or the error-marker JSON text.
    pub bias_analysis: String,
}

/// Read-side projection: verdict sub-fields pulled out of `bias_analysis`
/// for display.
#[derive(Debug, Clone, Serialize)]
pub struct ResultRow {
    pub timestamp: DateTime<Utc>,
    pub alert_group_id: Option<String>,
    pub test_case: Option<String>,
    pub verdict: Option<String>,
    pub verdict_confidence: Option<f64>,
    pub notes: Option<String>,
    pub anchoring: Option<String>,
    pub apophenia: Option<String>,
    pub abduction: Option<String>,
    pub raw_logs: String,
    pub bias_analysis: String,
}

impl ResultRow {
    pub fn from_record(record: VerdictRecord) -> Self {
        let verdict: Value = serde_json::from_str(&record.bias_analysis).unwrap_or(Value::Null);
        let text = |key: &str| verdict[key].as_str().map(str::to_string);

        Self {
            timestamp: record.timestamp,
            alert_group_id: record.alert_group_id,
            test_case: record.test_case,
            verdict: text("verdict"),
            verdict_confidence: verdict["confidence"].as_f64(),
            notes: text("notes"),
            anchoring: text("anchoring_risk"),
            apophenia: text("apophenia_risk"),
            abduction: text("abduction_risk"),
            raw_logs: record.raw_log_summary,
            bias_analysis: record.bias_analysis,
        }
    }
}

#[async_trait]
pub trait VerdictStore: Send + Sync {
    async fn insert(&self, record: &VerdictRecord) -> Result<(), StoreError>;

    /// Most recent records, newest first.
    async fn recent(&self, limit: i64) -> Result<Vec<VerdictRecord>, StoreError>;
}

/// PostgreSQL-backed store.
pub struct PgVerdictStore {
    pool: PgPool,
}

impl PgVerdictStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VerdictStore for PgVerdictStore {
    async fn insert(&self, record: &VerdictRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO bias_verdicts
                (alert_id, alert_group_id, timestamp, test_case, raw_log_summary, bias_analysis)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&record.alert_id)
        .bind(&record.alert_group_id)
        .bind(record.timestamp)
        .bind(&record.test_case)
        .bind(&record.raw_log_summary)
        .bind(&record.bias_analysis)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn recent(&self, limit: i64) -> Result<Vec<VerdictRecord>, StoreError> {
        let records = sqlx::query_as::<_, VerdictRecord>(
            r#"
            SELECT alert_id, alert_group_id, timestamp, test_case, raw_log_summary, bias_analysis
            FROM bias_verdicts
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(analysis: Value) -> VerdictRecord {
        VerdictRecord {
            alert_id: "a-1".to_string(),
            alert_group_id: Some("g-1".to_string()),
            timestamp: Utc::now(),
            test_case: Some("Anchoring_Signal".to_string()),
            raw_log_summary: "[]".to_string(),
            bias_analysis: analysis.to_string(),
        }
    }

    #[test]
    fn test_projection_pulls_verdict_fields() {
        let row = ResultRow::from_record(record(json!({
            "verdict": "High",
            "confidence": 0.85,
            "notes": "late signal after uniform noise",
            "anchoring_risk": "High",
            "apophenia_risk": "Low",
            "abduction_risk": "Low"
        })));

        assert_eq!(row.verdict.as_deref(), Some("High"));
        assert_eq!(row.verdict_confidence, Some(0.85));
        assert_eq!(row.anchoring.as_deref(), Some("High"));
        assert_eq!(row.apophenia.as_deref(), Some("Low"));
        assert_eq!(row.test_case.as_deref(), Some("Anchoring_Signal"));
    }

    #[test]
    fn test_projection_tolerates_error_marker() {
        let row = ResultRow::from_record(record(json!({
            "verdict": "ANALYSIS_ERROR",
            "error": "quota exceeded"
        })));

        assert_eq!(row.verdict.as_deref(), Some("ANALYSIS_ERROR"));
        assert_eq!(row.verdict_confidence, None);
        assert_eq!(row.notes, None);
    }

    #[test]
    fn test_projection_tolerates_non_json_analysis() {
        let mut rec = record(json!({}));
        rec.bias_analysis = "not json".to_string();
        let row = ResultRow::from_record(rec);
        assert_eq!(row.verdict, None);
        assert_eq!(row.bias_analysis, "not json");
    }
}
