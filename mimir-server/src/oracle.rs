//! Reasoning Oracle
//!
//! The system under test, treated as an opaque text-in / text-out
//! collaborator. The pipeline core is written against the trait; the HTTP
//! implementation talks to an OpenAI-compatible chat-completion endpoint.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::config::Config;

/// Fallback instruction when no system prompt document is available.
pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are a security analyst reviewing alert data. \
Assess the alerts and respond with JSON containing: verdict (Low/Medium/High risk), \
confidence (0-1), notes, anchoring_risk, apophenia_risk, abduction_risk.";

/// Prefix of the user turn wrapping the redacted payload.
pub const USER_TURN_PREFIX: &str = "ANALYZE THIS DATA:\n";

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle request failed: {0}")]
    Request(String),
    #[error("oracle returned status {0}")]
    Status(u16),
    #[error("oracle response malformed: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait Oracle: Send + Sync {
    /// One bounded synchronous call: instruction + user turn in, raw verdict
    /// text out. No retries here or anywhere above.
    async fn analyze(&self, system_instruction: &str, user_turn: &str)
        -> Result<String, OracleError>;
}

/// Load the system instruction document once at process start.
/// Falls back to the built-in default when the path is unset or unreadable.
pub fn load_system_instruction(path: Option<&str>) -> String {
    match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                tracing::warn!("system prompt {} is empty, using default", p);
                DEFAULT_SYSTEM_INSTRUCTION.to_string()
            }
            Err(err) => {
                tracing::warn!("failed to read system prompt {}: {}, using default", p, err);
                DEFAULT_SYSTEM_INSTRUCTION.to_string()
            }
        },
        None => DEFAULT_SYSTEM_INSTRUCTION.to_string(),
    }
}

/// Strip a markdown code fence from a verdict, if present.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    body.strip_suffix("```").unwrap_or(body).trim()
}

// ============================================================================
// HTTP IMPLEMENTATION
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: Value,
}

/// Oracle client for an OpenAI-compatible chat endpoint.
pub struct HttpOracle {
    url: String,
    model: String,
    api_key: String,
    http_client: reqwest::Client,
}

impl HttpOracle {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.oracle_timeout_secs))
            .build()?;

        Ok(Self {
            url: config.oracle_url.clone(),
            model: config.oracle_model.clone(),
            api_key: config.oracle_api_key.clone(),
            http_client,
        })
    }
}

#[async_trait]
impl Oracle for HttpOracle {
    async fn analyze(
        &self,
        system_instruction: &str,
        user_turn: &str,
    ) -> Result<String, OracleError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_instruction,
                },
                ChatMessage {
                    role: "user",
                    content: user_turn,
                },
            ],
            response_format: serde_json::json!({ "type": "json_object" }),
        };

        let mut builder = self.http_client.post(&self.url).json(&request);
        if !self.api_key.is_empty() {
            builder = builder.bearer_auth(&self.api_key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| OracleError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(OracleError::Status(status.as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| OracleError::Malformed(e.to_string()))?;

        body["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| OracleError::Malformed("no message content in response".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_strip_fenced_json() {
        let fenced = "```json\n{\"verdict\":\"Low\"}\n```";
        assert_eq!(strip_code_fence(fenced), "{\"verdict\":\"Low\"}");
    }

    #[test]
    fn test_strip_plain_fence() {
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
    }

    #[test]
    fn test_unfenced_passes_through() {
        assert_eq!(strip_code_fence("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fence("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[test]
    fn test_instruction_fallback_when_path_missing() {
        let loaded = load_system_instruction(Some("/nonexistent/prompt.txt"));
        assert_eq!(loaded, DEFAULT_SYSTEM_INSTRUCTION);
        assert_eq!(load_system_instruction(None), DEFAULT_SYSTEM_INSTRUCTION);
    }

    #[test]
    fn test_instruction_loaded_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "You are Mimir.").unwrap();
        let loaded = load_system_instruction(file.path().to_str());
        assert_eq!(loaded.trim(), "You are Mimir.");
    }
}
