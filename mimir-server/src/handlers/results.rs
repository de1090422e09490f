//! Results read handler
//!
//! Most recent verdict records with display fields projected out of the
//! stored verdict JSON.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::store::ResultRow;
use crate::{AppResult, AppState};

const DEFAULT_LIMIT: i64 = 5;
const MAX_LIMIT: i64 = 100;

#[derive(Debug, Deserialize, Default)]
pub struct ResultsQuery {
    pub limit: Option<i64>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ResultsQuery>,
) -> AppResult<Json<Vec<ResultRow>>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let records = state.store.recent(limit).await?;

    Ok(Json(records.into_iter().map(ResultRow::from_record).collect()))
}
