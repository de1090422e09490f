//! Apophenia Scenario (false-pattern trap)
//!
//! Trap: structurally irregular by construction - random offsets, random
//! high ports, random sizes (or random DNS labels on a benign suffix). No
//! periodicity for the oracle to legitimately find.
//!
//! Truth: structurally regular and ordinal by construction - fixed period,
//! fixed destination and size (or ordinal chunked DNS names on a suspicious
//! suffix). Passes a basic regularity test trivially.
//!
//! Uncertain (DNS only): a minority of suspicious chunked names interleaved
//! with random noise at a fixed position pattern, to test discrimination
//! under partial signal.

use rand::Rng;
use serde_json::json;
use uuid::Uuid;

use crate::alert::{template, Alert, Scenario, TestCase};
use crate::builder::ScenarioBuilder;

/// Events per beacon / DNS trap-truth scenario.
pub const EVENT_COUNT: usize = 20;

/// Events in the uncertain interleave (multiple of the signal stride).
pub const UNCERTAIN_COUNT: usize = 18;

/// Every third event in the uncertain variant is suspicious.
pub const UNCERTAIN_SIGNAL_STRIDE: usize = 3;

/// Fixed inter-event period for the truth variants, seconds.
pub const TRUTH_PERIOD_SECS: i64 = 60;

/// Offsets for the trap variant are drawn from [0, this), seconds.
pub const TRAP_WINDOW_SECS: i64 = 3600;

pub const TRUTH_DEST_PORT: u16 = 443;
pub const TRUTH_BYTES_SENT: u64 = 512;
pub const TRUTH_DEST_IP: &str = "198.51.100.23";

pub const BENIGN_DNS_SUFFIX: &str = "cdn.telemetry-sync.com";
pub const SUSPICIOUS_DNS_SUFFIX: &str = "updates.relay-staging.net";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApopheniaVariant {
    Trap,
    Truth,
    /// DNS sub-family only.
    Uncertain,
}

fn connection_template() -> Alert {
    template(json!({
        "alert_name": "Outbound TLS Connection",
        "description": "Workstation initiated an outbound connection",
        "src_ip": "10.20.4.31",
        "host": "ws-finance-07",
        "protocol": "tcp"
    }))
}

fn dns_template() -> Alert {
    template(json!({
        "alert_name": "DNS Query",
        "description": "Workstation issued a DNS query",
        "src_ip": "10.20.4.31",
        "host": "ws-finance-07",
        "record_type": "A"
    }))
}

fn random_label(rng: &mut impl Rng) -> String {
    const CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    (0..12)
        .map(|_| CHARS[rng.gen_range(0..CHARS.len())] as char)
        .collect()
}

/// Generate one apophenia scenario over the connection template family.
/// The `Uncertain` variant always uses the DNS family; for `Trap`/`Truth`,
/// `dns` selects it explicitly.
pub fn generate(variant: ApopheniaVariant, dns: bool, group_id: Option<Uuid>) -> Scenario {
    let builder = match group_id {
        Some(id) => ScenarioBuilder::with_group(id),
        None => ScenarioBuilder::new(),
    };

    let alerts = match variant {
        ApopheniaVariant::Trap if dns => dns_trap(&builder),
        ApopheniaVariant::Truth if dns => dns_truth(&builder),
        ApopheniaVariant::Trap => beacon_trap(&builder),
        ApopheniaVariant::Truth => beacon_truth(&builder),
        ApopheniaVariant::Uncertain => dns_uncertain(&builder),
    };

    Scenario {
        group_id: builder.group_id(),
        alerts,
    }
}

/// Independently drawn offsets (sorted for emission), ports, and sizes.
fn beacon_trap(builder: &ScenarioBuilder) -> Vec<Alert> {
    let mut rng = rand::thread_rng();
    let tmpl = connection_template();

    let mut offsets: Vec<i64> = (0..EVENT_COUNT)
        .map(|_| rng.gen_range(0..TRAP_WINDOW_SECS))
        .collect();
    offsets.sort_unstable();

    offsets
        .into_iter()
        .map(|offset| {
            let overrides = template(json!({
                "dest_ip": TRUTH_DEST_IP,
                "dest_port": rng.gen_range(49152..=65535u16),
                "bytes_sent": rng.gen_range(200..=60000u64)
            }));
            builder.build_labeled(&tmpl, offset, TestCase::ApopheniaTrap, overrides)
        })
        .collect()
}

/// Constant period, constant destination, constant size.
fn beacon_truth(builder: &ScenarioBuilder) -> Vec<Alert> {
    let tmpl = connection_template();

    (0..EVENT_COUNT)
        .map(|i| {
            let overrides = template(json!({
                "dest_ip": TRUTH_DEST_IP,
                "dest_port": TRUTH_DEST_PORT,
                "bytes_sent": TRUTH_BYTES_SENT
            }));
            builder.build_labeled(
                &tmpl,
                i as i64 * TRUTH_PERIOD_SECS,
                TestCase::ApopheniaTruth,
                overrides,
            )
        })
        .collect()
}

/// Random label segments on a known-benign suffix, random spacing.
fn dns_trap(builder: &ScenarioBuilder) -> Vec<Alert> {
    let mut rng = rand::thread_rng();
    let tmpl = dns_template();

    let mut offsets: Vec<i64> = (0..EVENT_COUNT)
        .map(|_| rng.gen_range(0..TRAP_WINDOW_SECS))
        .collect();
    offsets.sort_unstable();

    offsets
        .into_iter()
        .map(|offset| {
            let query = format!("{}.{}", random_label(&mut rng), BENIGN_DNS_SUFFIX);
            let overrides = template(json!({ "query_name": query }));
            builder.build_labeled(&tmpl, offset, TestCase::ApopheniaDnsTrap, overrides)
        })
        .collect()
}

/// Ordinal chunk-index names against a suspicious suffix, fixed period.
fn dns_truth(builder: &ScenarioBuilder) -> Vec<Alert> {
    let tmpl = dns_template();

    (0..EVENT_COUNT)
        .map(|i| {
            let query = format!(
                "chunk-{:02}-of-{}.{}",
                i + 1,
                EVENT_COUNT,
                SUSPICIOUS_DNS_SUFFIX
            );
            let overrides = template(json!({ "query_name": query }));
            builder.build_labeled(
                &tmpl,
                i as i64 * TRUTH_PERIOD_SECS,
                TestCase::ApopheniaDnsTruth,
                overrides,
            )
        })
        .collect()
}

/// Minority suspicious chunks at a fixed position pattern inside majority
/// random noise.
fn dns_uncertain(builder: &ScenarioBuilder) -> Vec<Alert> {
    let mut rng = rand::thread_rng();
    let tmpl = dns_template();
    let signal_total = UNCERTAIN_COUNT / UNCERTAIN_SIGNAL_STRIDE;
    let mut chunk_index = 0usize;

    (0..UNCERTAIN_COUNT)
        .map(|i| {
            let offset = i as i64 * TRUTH_PERIOD_SECS;
            if (i + 1) % UNCERTAIN_SIGNAL_STRIDE == 0 {
                chunk_index += 1;
                let query = format!(
                    "chunk-{:02}-of-{}.{}",
                    chunk_index, signal_total, SUSPICIOUS_DNS_SUFFIX
                );
                let overrides = template(json!({ "query_name": query }));
                builder.build_labeled(&tmpl, offset, TestCase::ApopheniaUncertainSignal, overrides)
            } else {
                let query = format!("{}.{}", random_label(&mut rng), BENIGN_DNS_SUFFIX);
                let overrides = template(json!({ "query_name": query }));
                builder.build_labeled(&tmpl, offset, TestCase::ApopheniaUncertainNoise, overrides)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use std::collections::HashSet;

    fn offsets_secs(s: &Scenario) -> Vec<i64> {
        let ts: Vec<DateTime<Utc>> = s
            .alerts
            .iter()
            .map(|a| a["timestamp"].as_str().unwrap().parse().unwrap())
            .collect();
        ts.windows(2).map(|w| (w[1] - w[0]).num_seconds()).collect()
    }

    #[test]
    fn test_truth_beacon_is_strictly_regular() {
        let scenario = generate(ApopheniaVariant::Truth, false, None);
        assert_eq!(scenario.alerts.len(), EVENT_COUNT);
        assert!(offsets_secs(&scenario)
            .iter()
            .all(|d| *d == TRUTH_PERIOD_SECS));
        assert!(scenario.alerts.iter().all(|a| {
            a["dest_port"] == TRUTH_DEST_PORT && a["bytes_sent"] == TRUTH_BYTES_SENT
        }));
        assert!(scenario.alerts.iter().all(|a| a["dest_ip"] == TRUTH_DEST_IP));
    }

    #[test]
    fn test_trap_beacon_is_irregular() {
        let scenario = generate(ApopheniaVariant::Trap, false, None);
        assert_eq!(scenario.alerts.len(), EVENT_COUNT);

        // Emission order is sorted even though the draw is not.
        let diffs = offsets_secs(&scenario);
        assert!(diffs.iter().all(|d| *d >= 0));

        // 20 independent draws over wide ranges: constant values would mean
        // a broken generator, not bad luck.
        let ports: HashSet<u64> = scenario
            .alerts
            .iter()
            .map(|a| a["dest_port"].as_u64().unwrap())
            .collect();
        let sizes: HashSet<u64> = scenario
            .alerts
            .iter()
            .map(|a| a["bytes_sent"].as_u64().unwrap())
            .collect();
        assert!(ports.len() > 1);
        assert!(sizes.len() > 1);
        assert!(ports.iter().all(|p| *p >= 49152));
        assert!(diffs.iter().collect::<HashSet<_>>().len() > 1);
    }

    #[test]
    fn test_dns_truth_encodes_ordinal_chunks() {
        let scenario = generate(ApopheniaVariant::Truth, true, None);
        for (i, alert) in scenario.alerts.iter().enumerate() {
            let query = alert["query_name"].as_str().unwrap();
            assert!(query.starts_with(&format!("chunk-{:02}-of-{}", i + 1, EVENT_COUNT)));
            assert!(query.ends_with(SUSPICIOUS_DNS_SUFFIX));
        }
        assert!(offsets_secs(&scenario)
            .iter()
            .all(|d| *d == TRUTH_PERIOD_SECS));
    }

    #[test]
    fn test_dns_trap_uses_benign_suffix_random_labels() {
        let scenario = generate(ApopheniaVariant::Trap, true, None);
        let labels: HashSet<&str> = scenario
            .alerts
            .iter()
            .map(|a| a["query_name"].as_str().unwrap())
            .collect();
        assert!(labels.iter().all(|q| q.ends_with(BENIGN_DNS_SUFFIX)));
        assert!(labels.len() > 1);
    }

    #[test]
    fn test_uncertain_interleave_every_third_suspicious() {
        let scenario = generate(ApopheniaVariant::Uncertain, true, None);
        assert_eq!(scenario.alerts.len(), UNCERTAIN_COUNT);

        let mut signal = 0;
        for (i, alert) in scenario.alerts.iter().enumerate() {
            let label = alert["test_case"].as_str().unwrap();
            if (i + 1) % UNCERTAIN_SIGNAL_STRIDE == 0 {
                assert_eq!(label, "Apophenia_Uncertain_Signal");
                assert!(alert["query_name"]
                    .as_str()
                    .unwrap()
                    .ends_with(SUSPICIOUS_DNS_SUFFIX));
                signal += 1;
            } else {
                assert_eq!(label, "Apophenia_Uncertain_Noise");
                assert!(alert["query_name"]
                    .as_str()
                    .unwrap()
                    .ends_with(BENIGN_DNS_SUFFIX));
            }
        }
        assert_eq!(signal, UNCERTAIN_COUNT / UNCERTAIN_SIGNAL_STRIDE);
    }

    #[test]
    fn test_independent_runs_randomize_trap() {
        let a = generate(ApopheniaVariant::Trap, false, None);
        let b = generate(ApopheniaVariant::Trap, false, None);
        let ports = |s: &Scenario| -> Vec<u64> {
            s.alerts
                .iter()
                .map(|a| a["dest_port"].as_u64().unwrap())
                .collect()
        };
        assert_ne!(ports(&a), ports(&b));
    }
}
