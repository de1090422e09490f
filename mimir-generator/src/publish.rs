//! Transport Publisher
//!
//! Pushes generated scenarios to the ingestion pipeline as a push-message
//! envelope: base64-encoded UTF-8 JSON inside `message.data`. Publishing is
//! best-effort from the harness's perspective: failures are logged, never
//! raised.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

use crate::alert::Scenario;

/// Default push target when no override is given.
pub const DEFAULT_PUSH_TARGET: &str = "http://localhost:8080/";

/// Get push target from environment or use default.
pub fn default_push_target() -> String {
    std::env::var("MIMIR_PUSH_TARGET").unwrap_or_else(|_| DEFAULT_PUSH_TARGET.to_string())
}

#[derive(Debug, Serialize)]
struct PushMessage {
    data: String,
    message_id: String,
    publish_time: String,
}

#[derive(Debug, Serialize)]
struct PushEnvelope {
    message: PushMessage,
    subscription: String,
}

/// Push client for the scenario generator.
pub struct Publisher {
    target: String,
    http_client: reqwest::blocking::Client,
}

impl Publisher {
    pub fn new(target: String) -> anyhow::Result<Self> {
        let http_client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            target,
            http_client,
        })
    }

    /// Publish one scenario as a single batch message.
    ///
    /// Returns whether the push was accepted. Failures are reported as
    /// console diagnostics only - the harness keeps going.
    pub fn publish(&self, scenario: &Scenario) -> bool {
        let payload = match serde_json::to_string(&scenario.to_value()) {
            Ok(json) => json,
            Err(err) => {
                log::error!("failed to serialize scenario {}: {err}", scenario.group_id);
                return false;
            }
        };

        let envelope = PushEnvelope {
            message: PushMessage {
                data: BASE64.encode(payload.as_bytes()),
                message_id: Uuid::new_v4().to_string(),
                publish_time: chrono::Utc::now().to_rfc3339(),
            },
            subscription: "projects/mimir/subscriptions/scenario-push".to_string(),
        };

        match self.http_client.post(&self.target).json(&envelope).send() {
            Ok(resp) if resp.status().is_success() => {
                log::info!(
                    "published scenario {} ({} alerts) to {}",
                    scenario.group_id,
                    scenario.alerts.len(),
                    self.target
                );
                true
            }
            Ok(resp) => {
                log::error!(
                    "push target {} rejected scenario {}: {}",
                    self.target,
                    scenario.group_id,
                    resp.status()
                );
                false
            }
            Err(err) => {
                log::error!("publish to {} failed: {err}", self.target);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_target_fallback() {
        // Avoid racing other tests on the env var: only assert the fallback
        // when the override is not set in this environment.
        if std::env::var("MIMIR_PUSH_TARGET").is_err() {
            assert_eq!(default_push_target(), DEFAULT_PUSH_TARGET);
        }
    }

    #[test]
    fn test_envelope_shape_round_trips() {
        let payload = r#"[{"alert_id":"a","timestamp":"t"}]"#;
        let envelope = PushEnvelope {
            message: PushMessage {
                data: BASE64.encode(payload.as_bytes()),
                message_id: "m-1".to_string(),
                publish_time: chrono::Utc::now().to_rfc3339(),
            },
            subscription: "s".to_string(),
        };

        let wire = serde_json::to_value(&envelope).unwrap();
        let decoded = BASE64
            .decode(wire["message"]["data"].as_str().unwrap())
            .unwrap();
        assert_eq!(String::from_utf8(decoded).unwrap(), payload);
    }
}
