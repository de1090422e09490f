//! Alert Types
//!
//! Core types for synthetic alerts.
//! No generation logic here - just data structures and labels.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// WIRE KEYS
// ============================================================================

/// Unique per-alert identifier key.
pub const KEY_ALERT_ID: &str = "alert_id";

/// Shared per-scenario group key.
pub const KEY_GROUP_ID: &str = "alert_group_id";

/// Event time key (RFC 3339, UTC).
pub const KEY_TIMESTAMP: &str = "timestamp";

/// Ground-truth label key. Never leaves the trusted boundary unredacted.
pub const KEY_TEST_CASE: &str = "test_case";

pub const KEY_SEVERITY: &str = "severity";
pub const KEY_PRODUCT: &str = "product";

/// Default product stamped on every alert that does not override it.
pub const DEFAULT_PRODUCT: &str = "Mimir";

/// An alert on the wire is a flat-ish JSON object. Scenario fields vary per
/// family, so the map form is the canonical one; typed enums below are
/// written into it as strings.
pub type Alert = Map<String, Value>;

// ============================================================================
// SEVERITY
// ============================================================================

/// Alert severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// GROUND-TRUTH LABELS
// ============================================================================

/// Closed set of ground-truth labels: bias family + sub-role.
///
/// Each alert carries exactly one, so a mixed batch still has per-alert
/// ground truth. The label is stripped by the pipeline before the oracle
/// ever sees the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestCase {
    AnchoringNoise,
    AnchoringSignal,
    ApopheniaTrap,
    ApopheniaTruth,
    ApopheniaDnsTrap,
    ApopheniaDnsTruth,
    ApopheniaUncertainSignal,
    ApopheniaUncertainNoise,
    AbductiveTrap,
    AbductiveTruth,
}

impl TestCase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestCase::AnchoringNoise => "Anchoring_Noise",
            TestCase::AnchoringSignal => "Anchoring_Signal",
            TestCase::ApopheniaTrap => "Apophenia_Trap",
            TestCase::ApopheniaTruth => "Apophenia_Truth",
            TestCase::ApopheniaDnsTrap => "Apophenia_DNS_Trap",
            TestCase::ApopheniaDnsTruth => "Apophenia_DNS_Truth",
            TestCase::ApopheniaUncertainSignal => "Apophenia_Uncertain_Signal",
            TestCase::ApopheniaUncertainNoise => "Apophenia_Uncertain_Noise",
            TestCase::AbductiveTrap => "Abductive_Trap",
            TestCase::AbductiveTruth => "Abductive_Truth",
        }
    }
}

impl std::fmt::Display for TestCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// SCENARIO
// ============================================================================

/// One generated bias-test instance: an ordered alert sequence sharing one
/// group id. Produced by exactly one generator call with one variant.
#[derive(Debug, Clone, Serialize)]
pub struct Scenario {
    pub group_id: uuid::Uuid,
    pub alerts: Vec<Alert>,
}

impl Scenario {
    /// Scenario as the wire payload: a bare JSON array of alert objects.
    pub fn to_value(&self) -> Value {
        Value::Array(self.alerts.iter().cloned().map(Value::Object).collect())
    }

    /// Indented JSON for console output.
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(&self.to_value()).unwrap_or_else(|_| "[]".to_string())
    }
}

/// Convenience for building templates from `json!` literals.
/// Non-object input yields an empty template (callers are internal).
pub fn template(value: Value) -> Alert {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
