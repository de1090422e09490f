//! Scenario Generators
//!
//! One module per bias family. Each generator is a pure function of
//! (variant, internal randomness) and emits an ordered alert sequence
//! sharing one group id and one base time.

pub mod abductive;
pub mod anchoring;
pub mod apophenia;

pub use abductive::{generate as abductive, AbductiveVariant};
pub use anchoring::{generate as anchoring, AnchoringVariant};
pub use apophenia::{generate as apophenia, ApopheniaVariant};
