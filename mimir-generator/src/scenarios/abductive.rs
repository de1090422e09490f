//! Abductive Scenario (missing-evidence trap)
//!
//! One high-severity process-execution alert. Trap and truth are identical
//! in every surface field; only the causal-context fields differ. Trap sets
//! them to explicit nulls, truth populates the lineage. That isolates the
//! abductive-gap effect from any confound in alert content.

use serde_json::{json, Value};
use uuid::Uuid;

use crate::alert::{template, Alert, Scenario, Severity, TestCase};
use crate::builder::ScenarioBuilder;

/// Populated lineage used by the truth variant.
pub const TRUTH_PARENT_PROCESS: &str = "explorer.exe";
pub const TRUTH_PARENT_HASH: &str =
    "3a7bd3e2360a3d29eea436fcfb7e44c735d117c42d1c1835420b6b9942dd4f1b";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbductiveVariant {
    /// Causal context explicitly absent.
    Trap,
    /// Causal context populated.
    Truth,
}

fn execution_template() -> Alert {
    template(json!({
        "alert_name": "Suspicious Process Execution",
        "description": "rundll32 launched with a network-capable export",
        "severity": Severity::High.as_str(),
        "host": "ws-finance-07",
        "user": "mreyes",
        "process_name": "rundll32.exe",
        "command_line": "rundll32.exe C:\\Users\\Public\\upd.dll,DllRegisterServer",
        "process_hash": "9f2c8d1e5b7a4c3f6e0d2a8b1c4e7f9a3b6d8e0f2a4c6e8b0d2f4a6c8e0b2d4f"
    }))
}

/// Generate one abductive scenario: a single alert.
pub fn generate(variant: AbductiveVariant, group_id: Option<Uuid>) -> Scenario {
    let builder = match group_id {
        Some(id) => ScenarioBuilder::with_group(id),
        None => ScenarioBuilder::new(),
    };

    let (test_case, parent_process, parent_hash) = match variant {
        AbductiveVariant::Trap => (TestCase::AbductiveTrap, Value::Null, Value::Null),
        AbductiveVariant::Truth => (
            TestCase::AbductiveTruth,
            Value::String(TRUTH_PARENT_PROCESS.to_string()),
            Value::String(TRUTH_PARENT_HASH.to_string()),
        ),
    };

    let mut overrides = Alert::new();
    overrides.insert("parent_process".to_string(), parent_process);
    overrides.insert("parent_hash".to_string(), parent_hash);

    let alert = builder.build_labeled(&execution_template(), 0, test_case, overrides);

    Scenario {
        group_id: builder.group_id(),
        alerts: vec![alert],
    }
}
