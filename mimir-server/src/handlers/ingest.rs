//! Ingestion handler
//!
//! Receives push-transport envelopes, unwraps the scenario payload, and
//! hands it to the pipeline. Returns success whenever persistence succeeds,
//! even if the oracle call failed - the error is recorded, not propagated.

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::envelope::unwrap_payload;
use crate::{AppResult, AppState};

pub async fn push(State(state): State<AppState>, Json(envelope): Json<Value>) -> AppResult<Json<Value>> {
    let payload = unwrap_payload(&envelope)?;
    let record = state.pipeline.ingest(&payload).await?;

    Ok(Json(json!({
        "status": "processed",
        "alert_id": record.alert_id
    })))
}
