//! Mimir Generator
//!
//! Synthesizes alert sequences deliberately engineered to trigger or avoid
//! specific cognitive-bias failures in an automated reasoning oracle. Each
//! scenario family builds a "trap" and a "truth" variant with the same
//! structural shape; ground-truth labels ride along on every alert and are
//! stripped by the ingestion pipeline before the oracle sees anything.
//!
//! This crate has no dependency on the pipeline - only on the wire shape
//! of a scenario (a JSON array of alert objects).

pub mod alert;
pub mod builder;
pub mod publish;
pub mod scenarios;

pub use alert::{Alert, Scenario, Severity, TestCase};
pub use builder::ScenarioBuilder;
