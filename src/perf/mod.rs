//! Bot performance aggregation.
//!
//! One `PerformanceRecord` per bot, owned exclusively by the engine task.
//! `ingest` is the sole mutator and runs strictly sequentially per record;
//! every derived metric (win rate, profit factor, overall score) is
//! recomputed synchronously after each ingest from the raw counters alone.

pub mod leaderboard;
pub mod record;
pub mod score;

pub use record::{PerformanceRecord, RecordParts, TradeDirection, TradeOutcome};
