//! Alert Builder
//!
//! Stamps a raw template into a fully-formed alert record. The base time is
//! captured once per scenario instance so every alert in one scenario shares
//! a consistent reference clock.

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::alert::{
    Alert, Severity, TestCase, DEFAULT_PRODUCT, KEY_ALERT_ID, KEY_GROUP_ID, KEY_PRODUCT,
    KEY_SEVERITY, KEY_TEST_CASE, KEY_TIMESTAMP,
};

/// Per-scenario builder. Holds the shared base time and group id.
#[derive(Debug, Clone)]
pub struct ScenarioBuilder {
    base_time: DateTime<Utc>,
    group_id: Uuid,
}

impl ScenarioBuilder {
    /// New builder with a freshly minted group id and `now` as base time.
    pub fn new() -> Self {
        Self::with_group(Uuid::new_v4())
    }

    /// New builder attached to an externally supplied group id.
    pub fn with_group(group_id: Uuid) -> Self {
        Self {
            base_time: Utc::now(),
            group_id,
        }
    }

    pub fn group_id(&self) -> Uuid {
        self.group_id
    }

    pub fn base_time(&self) -> DateTime<Utc> {
        self.base_time
    }

    /// Stamp a template into a full alert.
    ///
    /// The template is copied, never mutated. Defaults (`severity`,
    /// `product`) apply only when absent; `overrides` are applied last and
    /// always win. Identity and timestamp are always freshly stamped.
    pub fn build(&self, template: &Alert, offset_seconds: i64, overrides: Alert) -> Alert {
        let mut event = template.clone();

        event.insert(
            KEY_ALERT_ID.to_string(),
            Value::String(Uuid::new_v4().to_string()),
        );
        let event_time = self.base_time + Duration::seconds(offset_seconds);
        event.insert(
            KEY_TIMESTAMP.to_string(),
            Value::String(event_time.to_rfc3339()),
        );
        event.insert(
            KEY_GROUP_ID.to_string(),
            Value::String(self.group_id.to_string()),
        );

        if !event.contains_key(KEY_SEVERITY) {
            event.insert(
                KEY_SEVERITY.to_string(),
                Value::String(Severity::Low.as_str().to_string()),
            );
        }
        if !event.contains_key(KEY_PRODUCT) {
            event.insert(
                KEY_PRODUCT.to_string(),
                Value::String(DEFAULT_PRODUCT.to_string()),
            );
        }

        for (key, value) in overrides {
            event.insert(key, value);
        }

        event
    }

    /// `build` with the ground-truth label stamped in. All scenario
    /// generators go through this so no alert leaves without a label.
    pub fn build_labeled(
        &self,
        template: &Alert,
        offset_seconds: i64,
        test_case: TestCase,
        mut overrides: Alert,
    ) -> Alert {
        overrides.insert(
            KEY_TEST_CASE.to_string(),
            Value::String(test_case.as_str().to_string()),
        );
        self.build(template, offset_seconds, overrides)
    }
}

impl Default for ScenarioBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// UNIT TESTS
// ============================================================================
