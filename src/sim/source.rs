use crate::bots::BotProfile;
use crate::perf::record::{TradeDirection, TradeOutcome};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// Supplies closed-trade outcomes to the engine.
///
/// Implementations decide whether a bot closed a trade this tick and what
/// it looked like; the engine only ingests what comes out. Keeping this a
/// trait is what makes deterministic replay possible -- business logic
/// never touches an RNG directly.
pub trait OutcomeSource: Send {
    fn next_outcome(&mut self, profile: &BotProfile, tick: u64) -> Option<TradeOutcome>;
}

/// Random simulation source backed by a seeded RNG.
/// Same seed + same call order produces an identical outcome stream.
pub struct RandomWalkSource {
    rng: StdRng,
}

impl RandomWalkSource {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }
}

impl OutcomeSource for RandomWalkSource {
    fn next_outcome(&mut self, profile: &BotProfile, _tick: u64) -> Option<TradeOutcome> {
        if self.rng.gen::<f64>() >= profile.trade_probability {
            return None;
        }

        let is_win = self.rng.gen::<f64>() < profile.win_bias;
        // Magnitude jitter: 0.5x .. 1.5x of the profile mean
        let jitter = 0.5 + self.rng.gen::<f64>();
        let profit = if is_win {
            profile.avg_win_size * jitter
        } else {
            -(profile.avg_loss_size * jitter)
        };

        let size = self.rng.gen_range(profile.min_size..=profile.max_size);
        let direction = if self.rng.gen::<bool>() {
            TradeDirection::Long
        } else {
            TradeDirection::Short
        };
        let symbol = profile.symbols[self.rng.gen_range(0..profile.symbols.len())].clone();

        Some(TradeOutcome {
            id: uuid::Uuid::new_v4().to_string(),
            bot_id: profile.id.clone(),
            symbol,
            direction,
            size,
            profit,
            closed_at: Utc::now(),
        })
    }
}

/// Scripted outcome sequence for tests and deterministic demos.
/// Yields queued outcomes in order, but only to the bot they belong to.
pub struct ReplaySource {
    queue: VecDeque<TradeOutcome>,
}

impl ReplaySource {
    pub fn new(outcomes: impl IntoIterator<Item = TradeOutcome>) -> Self {
        Self {
            queue: outcomes.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl OutcomeSource for ReplaySource {
    fn next_outcome(&mut self, profile: &BotProfile, _tick: u64) -> Option<TradeOutcome> {
        let front_matches = self
            .queue
            .front()
            .map(|o| o.bot_id == profile.id)
            .unwrap_or(false);
        if front_matches {
            self.queue.pop_front()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(source: &mut RandomWalkSource, profile: &BotProfile, ticks: u64) -> Vec<(f64, f64)> {
        (0..ticks)
            .filter_map(|tick| source.next_outcome(profile, tick))
            .map(|o| (o.profit, o.size))
            .collect()
    }

    #[test]
    fn test_same_seed_same_stream() {
        let profile = BotProfile::momentum();
        let mut a = RandomWalkSource::new(Some(7));
        let mut b = RandomWalkSource::new(Some(7));
        let stream_a = drain(&mut a, &profile, 500);
        let stream_b = drain(&mut b, &profile, 500);
        assert!(!stream_a.is_empty());
        assert_eq!(stream_a, stream_b);
    }

    #[test]
    fn test_outcome_fields_respect_profile() {
        let profile = BotProfile::quant();
        let mut source = RandomWalkSource::new(Some(42));
        let mut produced = 0;
        for tick in 0..1000 {
            let Some(outcome) = source.next_outcome(&profile, tick) else {
                continue;
            };
            produced += 1;
            assert_eq!(outcome.bot_id, profile.id);
            assert!(profile.symbols.contains(&outcome.symbol));
            assert!(outcome.size >= profile.min_size && outcome.size <= profile.max_size);
            assert!(outcome.profit != 0.0 && outcome.profit.is_finite());
        }
        assert!(produced > 0);
    }

    #[test]
    fn test_replay_yields_in_order_per_bot() {
        let steady = BotProfile::steady();
        let quant = BotProfile::quant();
        let mk = |bot_id: &str, profit: f64| TradeOutcome {
            id: format!("{bot_id}-{profit}"),
            bot_id: bot_id.into(),
            symbol: "BTC-USD".into(),
            direction: TradeDirection::Long,
            size: 1.0,
            profit,
            closed_at: Utc::now(),
        };

        let mut source = ReplaySource::new(vec![
            mk("steady", 10.0),
            mk("quant", -5.0),
            mk("steady", 20.0),
        ]);

        // Front belongs to steady, so quant gets nothing yet.
        assert!(source.next_outcome(&quant, 0).is_none());
        assert_eq!(source.next_outcome(&steady, 0).map(|o| o.profit), Some(10.0));
        assert_eq!(source.next_outcome(&quant, 1).map(|o| o.profit), Some(-5.0));
        assert_eq!(source.next_outcome(&steady, 2).map(|o| o.profit), Some(20.0));
        assert_eq!(source.remaining(), 0);
    }
}
