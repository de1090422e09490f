//! Error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    // Transport errors - rejected before any side effect
    BadEnvelope(String),
    BadPayload(String),

    // Payload schema errors
    ValidationError(String),

    // Store errors - the only hard failure the pipeline reports
    DatabaseError(String),

    // Generic errors
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::BadEnvelope(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            AppError::BadPayload(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            AppError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error occurred")
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<crate::store::StoreError> for AppError {
    fn from(err: crate::store::StoreError) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

impl From<crate::envelope::EnvelopeError> for AppError {
    fn from(err: crate::envelope::EnvelopeError) -> Self {
        use crate::envelope::EnvelopeError;
        match &err {
            EnvelopeError::MissingMessage | EnvelopeError::MissingData => {
                AppError::BadEnvelope(err.to_string())
            }
            EnvelopeError::InvalidBase64(_)
            | EnvelopeError::InvalidUtf8(_)
            | EnvelopeError::InvalidJson(_) => AppError::BadPayload(err.to_string()),
        }
    }
}
