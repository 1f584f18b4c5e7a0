use crate::errors::{ArenaError, ArenaResult};
use crate::perf::score;
use chrono::{DateTime, Utc};

/// Direction of a simulated position. Informational only -- aggregation
/// depends solely on the sign of `profit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeDirection {
    Long,
    Short,
}

impl std::fmt::Display for TradeDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Long => write!(f, "long"),
            Self::Short => write!(f, "short"),
        }
    }
}

/// A single closed simulated trade. Immutable, consumed exactly once.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TradeOutcome {
    pub id: String,
    pub bot_id: String,
    pub symbol: String,
    pub direction: TradeDirection,
    pub size: f64,
    /// Signed result. `> 0` is a win; anything else, including exactly
    /// zero, is a loss.
    pub profit: f64,
    pub closed_at: DateTime<Utc>,
}

/// Running aggregate of one bot's trade outcomes.
///
/// Raw counters are updated by `ingest`; derived fields (`average_*`,
/// `win_rate`, `profit_factor`, `overall_score`) are recomputed from the
/// counters after every ingest and never written directly.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PerformanceRecord {
    pub total_trades: u64,
    pub winning_trades: u64,
    pub losing_trades: u64,
    /// Sum of winning profits.
    pub total_profit: f64,
    /// Sum of loss magnitudes (stored positive).
    pub total_loss: f64,
    pub average_win: f64,
    pub average_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    /// At most one of the two live streaks is non-zero.
    pub consecutive_wins: u64,
    pub consecutive_losses: u64,
    pub max_consecutive_wins: u64,
    pub max_consecutive_losses: u64,
    pub profit_factor: f64,
    pub win_rate: f64,
    pub overall_score: f64,
    pub last_updated: DateTime<Utc>,
}

/// Raw counters for restoring a persisted record. Must pass the
/// `from_parts` invariant checks before becoming a `PerformanceRecord`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordParts {
    pub total_trades: u64,
    pub winning_trades: u64,
    pub losing_trades: u64,
    pub total_profit: f64,
    pub total_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub consecutive_wins: u64,
    pub consecutive_losses: u64,
    pub max_consecutive_wins: u64,
    pub max_consecutive_losses: u64,
}

impl PerformanceRecord {
    /// Zeroed record with the neutral-prior score. Created when a bot is
    /// instantiated, before any outcome has been seen.
    pub fn empty() -> Self {
        Self {
            total_trades: 0,
            winning_trades: 0,
            losing_trades: 0,
            total_profit: 0.0,
            total_loss: 0.0,
            average_win: 0.0,
            average_loss: 0.0,
            largest_win: 0.0,
            largest_loss: 0.0,
            consecutive_wins: 0,
            consecutive_losses: 0,
            max_consecutive_wins: 0,
            max_consecutive_losses: 0,
            profit_factor: score::PROFIT_FACTOR_NEUTRAL,
            win_rate: 0.0,
            overall_score: score::NEUTRAL_SCORE,
            last_updated: Utc::now(),
        }
    }

    /// Apply one trade outcome: classify, update counters and streaks,
    /// then recompute every derived metric. Outcomes must arrive in event
    /// order -- streak maxima are order-dependent.
    pub fn ingest(&mut self, outcome: &TradeOutcome) {
        self.total_trades += 1;

        if outcome.profit > 0.0 {
            self.winning_trades += 1;
            self.consecutive_wins += 1;
            self.consecutive_losses = 0;
            self.total_profit += outcome.profit;
            self.max_consecutive_wins = self.max_consecutive_wins.max(self.consecutive_wins);
            self.largest_win = self.largest_win.max(outcome.profit);
        } else {
            // Exactly-zero profit counts as a loss, not a separate
            // breakeven state. Kept as-is for compatibility.
            let magnitude = outcome.profit.abs();
            self.losing_trades += 1;
            self.consecutive_losses += 1;
            self.consecutive_wins = 0;
            self.total_loss += magnitude;
            self.max_consecutive_losses =
                self.max_consecutive_losses.max(self.consecutive_losses);
            self.largest_loss = self.largest_loss.max(magnitude);
        }

        self.last_updated = Utc::now();
        score::recalculate(self);
    }

    /// Discard all history and return to the empty state.
    pub fn reset(&mut self) {
        *self = Self::empty();
    }

    /// Validated construction from raw counters (the restore path).
    /// Counter sets that could not have been produced by a sequence of
    /// `ingest` calls are rejected, never silently repaired.
    pub fn from_parts(parts: RecordParts, last_updated: DateTime<Utc>) -> ArenaResult<Self> {
        if parts.winning_trades + parts.losing_trades != parts.total_trades {
            return Err(ArenaError::InvariantViolation(format!(
                "wins ({}) + losses ({}) != total trades ({})",
                parts.winning_trades, parts.losing_trades, parts.total_trades
            )));
        }
        if parts.consecutive_wins > 0 && parts.consecutive_losses > 0 {
            return Err(ArenaError::InvariantViolation(
                "both win and loss streaks are live".into(),
            ));
        }
        if parts.consecutive_wins > parts.max_consecutive_wins
            || parts.consecutive_losses > parts.max_consecutive_losses
        {
            return Err(ArenaError::InvariantViolation(
                "live streak exceeds recorded maximum".into(),
            ));
        }
        if parts.max_consecutive_wins > parts.winning_trades
            || parts.max_consecutive_losses > parts.losing_trades
        {
            return Err(ArenaError::InvariantViolation(
                "streak maximum exceeds trade count".into(),
            ));
        }
        let sums = [
            parts.total_profit,
            parts.total_loss,
            parts.largest_win,
            parts.largest_loss,
        ];
        if sums.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(ArenaError::InvariantViolation(
                "negative or non-finite profit/loss sums".into(),
            ));
        }
        if parts.largest_win > parts.total_profit + 1e-9
            || parts.largest_loss > parts.total_loss + 1e-9
        {
            return Err(ArenaError::InvariantViolation(
                "largest win/loss exceeds cumulative sum".into(),
            ));
        }

        let mut record = Self {
            total_trades: parts.total_trades,
            winning_trades: parts.winning_trades,
            losing_trades: parts.losing_trades,
            total_profit: parts.total_profit,
            total_loss: parts.total_loss,
            average_win: 0.0,
            average_loss: 0.0,
            largest_win: parts.largest_win,
            largest_loss: parts.largest_loss,
            consecutive_wins: parts.consecutive_wins,
            consecutive_losses: parts.consecutive_losses,
            max_consecutive_wins: parts.max_consecutive_wins,
            max_consecutive_losses: parts.max_consecutive_losses,
            profit_factor: score::PROFIT_FACTOR_NEUTRAL,
            win_rate: 0.0,
            overall_score: score::NEUTRAL_SCORE,
            last_updated,
        };
        if record.total_trades > 0 {
            score::recalculate(&mut record);
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(profit: f64) -> TradeOutcome {
        TradeOutcome {
            id: "t".into(),
            bot_id: "b".into(),
            symbol: "BTC-USD".into(),
            direction: TradeDirection::Long,
            size: 1.0,
            profit,
            closed_at: Utc::now(),
        }
    }

    fn ingest_all(record: &mut PerformanceRecord, profits: &[f64]) {
        for &p in profits {
            record.ingest(&outcome(p));
        }
    }

    #[test]
    fn test_counters_conserved_after_every_ingest() {
        let mut record = PerformanceRecord::empty();
        for &p in &[5.0, -3.0, 0.0, 12.5, -0.01, 7.0, -7.0, 0.0, 100.0] {
            record.ingest(&outcome(p));
            assert_eq!(
                record.winning_trades + record.losing_trades,
                record.total_trades
            );
            assert!((0.0..=1.0).contains(&record.win_rate));
            assert!((0.0..=1.0).contains(&record.overall_score));
        }
    }

    #[test]
    fn test_zero_profit_is_a_loss() {
        let mut record = PerformanceRecord::empty();
        record.ingest(&outcome(0.0));
        assert_eq!(record.losing_trades, 1);
        assert_eq!(record.winning_trades, 0);
        assert_eq!(record.consecutive_losses, 1);
        assert_eq!(record.total_loss, 0.0);
        assert_eq!(record.largest_loss, 0.0);
    }

    #[test]
    fn test_streaks_reset_each_other() {
        let mut record = PerformanceRecord::empty();
        ingest_all(&mut record, &[10.0, 10.0, -5.0]);
        assert_eq!(record.consecutive_wins, 0);
        assert_eq!(record.consecutive_losses, 1);
        assert_eq!(record.max_consecutive_wins, 2);

        record.ingest(&outcome(3.0));
        assert_eq!(record.consecutive_wins, 1);
        assert_eq!(record.consecutive_losses, 0);
    }

    #[test]
    fn test_streak_maxima_never_decrease() {
        let mut record = PerformanceRecord::empty();
        let mut prev_max_wins = 0;
        let mut prev_max_losses = 0;
        for &p in &[1.0, 1.0, 1.0, -1.0, -1.0, 1.0, -1.0, -1.0, -1.0, 1.0] {
            record.ingest(&outcome(p));
            assert!(record.max_consecutive_wins >= prev_max_wins);
            assert!(record.max_consecutive_losses >= prev_max_losses);
            prev_max_wins = record.max_consecutive_wins;
            prev_max_losses = record.max_consecutive_losses;
        }
        assert_eq!(record.max_consecutive_wins, 3);
        assert_eq!(record.max_consecutive_losses, 3);
    }

    #[test]
    fn test_order_changes_streak_maxima() {
        // Same multiset of outcomes, different order: final counters and
        // rates match, but streak maxima diverge.
        let mut grouped = PerformanceRecord::empty();
        ingest_all(&mut grouped, &[-5.0, -5.0, 10.0]);

        let mut interleaved = PerformanceRecord::empty();
        ingest_all(&mut interleaved, &[-5.0, 10.0, -5.0]);

        assert_eq!(grouped.total_trades, interleaved.total_trades);
        assert_eq!(grouped.winning_trades, interleaved.winning_trades);
        assert_eq!(grouped.total_loss, interleaved.total_loss);
        assert_eq!(grouped.win_rate, interleaved.win_rate);

        assert_eq!(grouped.max_consecutive_losses, 2);
        assert_eq!(interleaved.max_consecutive_losses, 1);
    }

    #[test]
    fn test_win_streak_order_insensitive_pair() {
        let mut a = PerformanceRecord::empty();
        ingest_all(&mut a, &[10.0, 10.0, -5.0]);
        let mut b = PerformanceRecord::empty();
        ingest_all(&mut b, &[-5.0, 10.0, 10.0]);

        assert_eq!(a.max_consecutive_wins, 2);
        assert_eq!(b.max_consecutive_wins, 2);
        assert_eq!(a.win_rate, b.win_rate);
        assert_eq!(a.total_profit, b.total_profit);
    }

    #[test]
    fn test_end_to_end_scenario() {
        let mut record = PerformanceRecord::empty();
        ingest_all(&mut record, &[100.0, 50.0, -30.0, 20.0, -10.0]);

        assert_eq!(record.total_trades, 5);
        assert_eq!(record.winning_trades, 3);
        assert_eq!(record.losing_trades, 2);
        assert_eq!(record.total_profit, 170.0);
        assert_eq!(record.total_loss, 40.0);
        assert_eq!(record.largest_win, 100.0);
        assert_eq!(record.largest_loss, 30.0);
        assert!((record.win_rate - 0.6).abs() < 1e-12);
        assert!((record.average_win - 170.0 / 3.0).abs() < 1e-9);
        assert!((record.average_loss - 20.0).abs() < 1e-12);
        assert!((record.profit_factor - 4.25).abs() < 1e-12);
        assert!((0.0..=1.0).contains(&record.overall_score));
    }

    #[test]
    fn test_reset_matches_empty_except_timestamp() {
        let mut record = PerformanceRecord::empty();
        ingest_all(&mut record, &[42.0, -13.0, 0.0, 7.0]);
        record.reset();

        let empty = PerformanceRecord::empty();
        assert_eq!(record.total_trades, empty.total_trades);
        assert_eq!(record.winning_trades, empty.winning_trades);
        assert_eq!(record.losing_trades, empty.losing_trades);
        assert_eq!(record.total_profit, empty.total_profit);
        assert_eq!(record.total_loss, empty.total_loss);
        assert_eq!(record.max_consecutive_wins, empty.max_consecutive_wins);
        assert_eq!(record.max_consecutive_losses, empty.max_consecutive_losses);
        assert_eq!(record.profit_factor, empty.profit_factor);
        assert_eq!(record.overall_score, empty.overall_score);
    }

    #[test]
    fn test_from_parts_roundtrip() {
        let mut record = PerformanceRecord::empty();
        ingest_all(&mut record, &[100.0, 50.0, -30.0, 20.0, -10.0]);

        let parts = RecordParts {
            total_trades: record.total_trades,
            winning_trades: record.winning_trades,
            losing_trades: record.losing_trades,
            total_profit: record.total_profit,
            total_loss: record.total_loss,
            largest_win: record.largest_win,
            largest_loss: record.largest_loss,
            consecutive_wins: record.consecutive_wins,
            consecutive_losses: record.consecutive_losses,
            max_consecutive_wins: record.max_consecutive_wins,
            max_consecutive_losses: record.max_consecutive_losses,
        };
        let restored =
            PerformanceRecord::from_parts(parts, record.last_updated).expect("valid parts");
        assert_eq!(restored, record);
    }

    #[test]
    fn test_from_parts_rejects_bad_counters() {
        let bad = RecordParts {
            total_trades: 5,
            winning_trades: 3,
            losing_trades: 1,
            ..Default::default()
        };
        assert!(PerformanceRecord::from_parts(bad, Utc::now()).is_err());
    }

    #[test]
    fn test_from_parts_rejects_double_live_streak() {
        let bad = RecordParts {
            total_trades: 4,
            winning_trades: 2,
            losing_trades: 2,
            total_profit: 10.0,
            total_loss: 10.0,
            largest_win: 8.0,
            largest_loss: 8.0,
            consecutive_wins: 1,
            consecutive_losses: 1,
            max_consecutive_wins: 2,
            max_consecutive_losses: 2,
        };
        assert!(PerformanceRecord::from_parts(bad, Utc::now()).is_err());
    }

    #[test]
    fn test_from_parts_rejects_negative_sums() {
        let bad = RecordParts {
            total_trades: 1,
            winning_trades: 0,
            losing_trades: 1,
            total_loss: -5.0,
            ..Default::default()
        };
        assert!(PerformanceRecord::from_parts(bad, Utc::now()).is_err());
    }

    #[test]
    fn test_from_parts_empty_keeps_neutral_prior() {
        let restored = PerformanceRecord::from_parts(RecordParts::default(), Utc::now())
            .expect("empty parts are valid");
        assert_eq!(restored.overall_score, score::NEUTRAL_SCORE);
        assert_eq!(restored.profit_factor, score::PROFIT_FACTOR_NEUTRAL);
    }
}
