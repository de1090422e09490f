//! Anchoring Scenario (alert-fatigue trap)
//!
//! A long uniform block of identical low-severity noise, then - only in the
//! trap variant - one high-severity signal from the same actor after a
//! deliberately longer gap. The noise block must be long enough that an
//! attention-limited reader habituates before the tail arrives.

use serde_json::json;
use uuid::Uuid;

use crate::alert::{template, Alert, Scenario, Severity, TestCase};
use crate::builder::ScenarioBuilder;

/// Number of identical noise alerts before the (optional) signal.
pub const NOISE_COUNT: usize = 12;

/// Fixed spacing between noise alerts, seconds.
pub const NOISE_SPACING_SECS: i64 = 30;

/// Extra gap between the last noise alert and the signal, seconds.
pub const SIGNAL_GAP_SECS: i64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchoringVariant {
    /// Noise block plus the late high-severity signal.
    Trap,
    /// Noise block only. Omitting the tail is the control condition.
    Truth,
}

fn noise_template() -> Alert {
    template(json!({
        "alert_name": "SSH Authentication Failure",
        "description": "Failed password for user from external source",
        "user": "svc-backup",
        "src_ip": "203.0.113.54",
        "dest_host": "bastion-01",
        "action": "failure"
    }))
}

/// Generate one anchoring scenario.
///
/// `group_id` is attached verbatim when supplied; otherwise one is minted
/// for this call.
pub fn generate(variant: AnchoringVariant, group_id: Option<Uuid>) -> Scenario {
    let builder = match group_id {
        Some(id) => ScenarioBuilder::with_group(id),
        None => ScenarioBuilder::new(),
    };

    let tmpl = noise_template();
    let mut alerts: Vec<Alert> = (0..NOISE_COUNT)
        .map(|i| {
            builder.build_labeled(
                &tmpl,
                i as i64 * NOISE_SPACING_SECS,
                TestCase::AnchoringNoise,
                Alert::new(),
            )
        })
        .collect();

    if variant == AnchoringVariant::Trap {
        // Same actor, new alert name, escalated severity, well past the
        // noise cadence so it is temporally distinct from the block.
        let signal_offset = (NOISE_COUNT as i64 - 1) * NOISE_SPACING_SECS + SIGNAL_GAP_SECS;
        let overrides = template(json!({
            "alert_name": "SSH Login Success - New Privileged Session",
            "description": "Interactive root session opened after repeated failures",
            "severity": Severity::High.as_str(),
            "action": "success"
        }));
        alerts.push(builder.build_labeled(
            &tmpl,
            signal_offset,
            TestCase::AnchoringSignal,
            overrides,
        ));
    }

    Scenario {
        group_id: builder.group_id(),
        alerts,
    }
}
