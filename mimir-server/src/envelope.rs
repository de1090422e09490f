//! Push transport envelope
//!
//! Inbound messages arrive as a push envelope wrapping a base64-encoded
//! UTF-8 JSON payload: either one alert object or an array of them.
//! Malformed envelopes are rejected before any side effect.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("no push message received")]
    MissingMessage,
    #[error("message data missing")]
    MissingData,
    #[error("invalid base64 payload: {0}")]
    InvalidBase64(String),
    #[error("payload is not valid UTF-8: {0}")]
    InvalidUtf8(String),
    #[error("payload is not valid JSON: {0}")]
    InvalidJson(String),
}

/// Unwrap a push envelope down to the alert payload.
///
/// Distinguishes a malformed envelope (missing `message`/`data`) from a
/// malformed payload (bad base64, bad UTF-8, bad JSON) so the caller can
/// report them separately.
pub fn unwrap_payload(envelope: &Value) -> Result<Value, EnvelopeError> {
    let message = envelope
        .as_object()
        .and_then(|o| o.get("message"))
        .ok_or(EnvelopeError::MissingMessage)?;

    let data = message
        .as_object()
        .and_then(|o| o.get("data"))
        .and_then(Value::as_str)
        .ok_or(EnvelopeError::MissingData)?;

    let bytes = BASE64
        .decode(data)
        .map_err(|e| EnvelopeError::InvalidBase64(e.to_string()))?;
    let text =
        String::from_utf8(bytes).map_err(|e| EnvelopeError::InvalidUtf8(e.to_string()))?;
    serde_json::from_str(&text).map_err(|e| EnvelopeError::InvalidJson(e.to_string()))
}
