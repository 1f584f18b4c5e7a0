//! Trade-outcome simulation.
//!
//! All randomness lives behind the `OutcomeSource` trait so the engine and
//! the performance core stay deterministic and replayable. Swap in a
//! `ReplaySource` to drive the arena from a scripted outcome sequence.

pub mod arena;
pub mod source;

pub use source::{OutcomeSource, RandomWalkSource, ReplaySource};
