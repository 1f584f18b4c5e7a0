/// Metric recalculation and overall score composition.
///
/// score = 0.30 * win_rate
///       + 0.25 * min(profit_factor / 3.0, 1)
///       + 0.15 * min(total_trades / 100, 1)
///       + 0.20 * max(1 - max_consecutive_losses / max(total_trades, 10), 0)
///       + 0.10 * min(average_win / largest_loss, 1)
///
/// Every division is guarded; no counter set can produce a NaN or push the
/// final score outside [0, 1]. Pure functions over the record's counters.
use crate::perf::record::PerformanceRecord;

/// Score assigned to a record before any trades have been ingested.
pub const NEUTRAL_SCORE: f64 = 0.5;

/// Finite stand-in for an infinite profit factor when there are wins but
/// no losses. The normalization below assumes a finite sentinel; do not
/// substitute `f64::INFINITY`.
pub const PROFIT_FACTOR_NO_LOSSES: f64 = 999.0;

/// Profit factor of a record with no profits and no losses.
pub const PROFIT_FACTOR_NEUTRAL: f64 = 1.0;

const WIN_RATE_WEIGHT: f64 = 0.30;
const PROFIT_FACTOR_WEIGHT: f64 = 0.25;
const FREQUENCY_WEIGHT: f64 = 0.15;
const CONSISTENCY_WEIGHT: f64 = 0.20;
const RISK_WEIGHT: f64 = 0.10;

/// A profit factor at or above this earns the full profit-factor weight.
const PROFIT_FACTOR_TARGET: f64 = 3.0;
/// Trade count at which the frequency term saturates.
const FREQUENCY_TARGET: f64 = 100.0;
/// Floor denominator for the consistency term at low trade counts.
const CONSISTENCY_FLOOR: f64 = 10.0;

/// Recompute every derived field from the raw counters. Runs synchronously
/// after each ingest.
pub fn recalculate(record: &mut PerformanceRecord) {
    record.win_rate = if record.total_trades == 0 {
        0.0
    } else {
        record.winning_trades as f64 / record.total_trades as f64
    };

    record.average_win = if record.winning_trades == 0 {
        0.0
    } else {
        record.total_profit / record.winning_trades as f64
    };

    record.average_loss = if record.losing_trades == 0 {
        0.0
    } else {
        record.total_loss / record.losing_trades as f64
    };

    record.profit_factor = profit_factor(record.total_profit, record.total_loss);
    record.overall_score = overall_score(record);
}

/// Gross profits over gross losses, with defined values for the
/// zero-denominator cases.
#[inline]
pub fn profit_factor(total_profit: f64, total_loss: f64) -> f64 {
    if total_loss > 0.0 {
        total_profit / total_loss
    } else if total_profit > 0.0 {
        PROFIT_FACTOR_NO_LOSSES
    } else {
        PROFIT_FACTOR_NEUTRAL
    }
}

/// Compose the bounded [0, 1] score from the five weighted terms.
#[inline]
pub fn overall_score(record: &PerformanceRecord) -> f64 {
    let win_rate_term = record.win_rate * WIN_RATE_WEIGHT;

    let profit_factor_term =
        (record.profit_factor / PROFIT_FACTOR_TARGET).min(1.0) * PROFIT_FACTOR_WEIGHT;

    let frequency_term =
        (record.total_trades as f64 / FREQUENCY_TARGET).min(1.0) * FREQUENCY_WEIGHT;

    let consistency_denominator = (record.total_trades as f64).max(CONSISTENCY_FLOOR);
    let consistency_term = (1.0
        - record.max_consecutive_losses as f64 / consistency_denominator)
        .max(0.0)
        * CONSISTENCY_WEIGHT;

    let risk_term = if record.largest_loss > 0.0 {
        (record.average_win / record.largest_loss).min(1.0) * RISK_WEIGHT
    } else {
        RISK_WEIGHT
    };

    (win_rate_term + profit_factor_term + frequency_term + consistency_term + risk_term)
        .clamp(0.0, 1.0)
}
