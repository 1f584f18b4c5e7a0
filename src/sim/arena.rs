use crate::perf::leaderboard;
use crate::sim::source::OutcomeSource;
use crate::state::{BotState, DbCommand, EngineAction, WsMessage};
use smallvec::SmallVec;

/// Refresh the leaderboard broadcast every this many ticks.
const LEADERBOARD_EVERY: u64 = 5;

/// Run one arena tick.
///
/// Draws at most one outcome per bot from the source and ingests it into
/// that bot's record immediately, so outcomes are applied strictly in the
/// order they occur. Each record is owned by its bot; nothing here is
/// shared or locked. Pure apart from the source.
pub fn run_tick(
    bots: &mut [BotState],
    source: &mut dyn OutcomeSource,
    tick: u64,
    timestamp: &str,
) -> SmallVec<[EngineAction; 16]> {
    let mut actions: SmallVec<[EngineAction; 16]> = SmallVec::new();

    for bot in bots.iter_mut() {
        let Some(outcome) = source.next_outcome(&bot.profile, tick) else {
            continue;
        };

        bot.record.ingest(&outcome);
        bot.balance += outcome.profit;

        actions.push(EngineAction::OutcomeIngested {
            bot_id: bot.profile.id.clone(),
            profit: outcome.profit,
        });

        actions.push(EngineAction::DbWrite(DbCommand::InsertOutcome {
            id: outcome.id.clone(),
            bot_id: outcome.bot_id.clone(),
            symbol: outcome.symbol.clone(),
            direction: outcome.direction.to_string(),
            size: outcome.size,
            profit: outcome.profit,
            closed_at: outcome.closed_at.to_rfc3339(),
        }));

        actions.push(EngineAction::DbWrite(DbCommand::UpsertPerformance {
            bot_id: bot.profile.id.clone(),
            record: bot.record.clone(),
        }));

        actions.push(EngineAction::BroadcastUpdate(WsMessage::OutcomeClosed {
            bot_id: bot.profile.id.clone(),
            bot_name: bot.profile.name.clone(),
            symbol: outcome.symbol,
            direction: outcome.direction,
            size: outcome.size,
            profit: outcome.profit,
            timestamp: timestamp.to_string(),
        }));

        actions.push(EngineAction::BroadcastUpdate(WsMessage::BotUpdate {
            bot_id: bot.profile.id.clone(),
            name: bot.profile.name.clone(),
            overall_score: bot.record.overall_score,
            win_rate: bot.record.win_rate,
            profit_factor: bot.record.profit_factor,
            total_trades: bot.record.total_trades,
            winning_trades: bot.record.winning_trades,
            losing_trades: bot.record.losing_trades,
            consecutive_wins: bot.record.consecutive_wins,
            consecutive_losses: bot.record.consecutive_losses,
            balance: bot.balance,
            timestamp: timestamp.to_string(),
        }));
    }

    if tick % LEADERBOARD_EVERY == 0 {
        actions.push(EngineAction::BroadcastUpdate(WsMessage::Leaderboard {
            entries: leaderboard::compute_leaderboard(bots),
        }));
    }

    actions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bots::BotProfile;
    use crate::perf::record::{TradeDirection, TradeOutcome};
    use crate::sim::source::ReplaySource;
    use chrono::Utc;

    fn mk_outcome(bot_id: &str, profit: f64) -> TradeOutcome {
        TradeOutcome {
            id: uuid::Uuid::new_v4().to_string(),
            bot_id: bot_id.into(),
            symbol: "BTC-USD".into(),
            direction: TradeDirection::Long,
            size: 2.0,
            profit,
            closed_at: Utc::now(),
        }
    }

    #[test]
    fn test_tick_ingests_and_emits_actions() {
        let mut bots = vec![
            BotState::new(BotProfile::steady(), 1_000.0),
            BotState::new(BotProfile::quant(), 1_000.0),
        ];
        let mut source = ReplaySource::new(vec![mk_outcome("steady", 25.0)]);

        let actions = run_tick(&mut bots, &mut source, 1, "2026-08-29T00:00:00Z");

        assert_eq!(bots[0].record.total_trades, 1);
        assert_eq!(bots[0].record.winning_trades, 1);
        assert_eq!(bots[0].balance, 1_025.0);
        assert_eq!(bots[1].record.total_trades, 0);
        assert_eq!(bots[1].balance, 1_000.0);

        let db_writes = actions
            .iter()
            .filter(|a| matches!(a, EngineAction::DbWrite(_)))
            .count();
        assert_eq!(db_writes, 2);
        assert!(actions
            .iter()
            .any(|a| matches!(a, EngineAction::OutcomeIngested { profit, .. } if *profit == 25.0)));
        assert!(actions.iter().any(|a| matches!(
            a,
            EngineAction::BroadcastUpdate(WsMessage::BotUpdate { total_trades: 1, .. })
        )));
    }

    #[test]
    fn test_leaderboard_broadcast_cadence() {
        let mut bots = vec![BotState::new(BotProfile::steady(), 1_000.0)];
        let mut source = ReplaySource::new(Vec::<TradeOutcome>::new());

        let on_cadence = run_tick(&mut bots, &mut source, 5, "2026-08-29T00:00:00Z");
        assert!(on_cadence.iter().any(|a| matches!(
            a,
            EngineAction::BroadcastUpdate(WsMessage::Leaderboard { .. })
        )));

        let off_cadence = run_tick(&mut bots, &mut source, 6, "2026-08-29T00:00:01Z");
        assert!(off_cadence.is_empty());
    }

    #[test]
    fn test_loss_reduces_balance() {
        let mut bots = vec![BotState::new(BotProfile::momentum(), 500.0)];
        let mut source = ReplaySource::new(vec![mk_outcome("momentum", -120.0)]);

        run_tick(&mut bots, &mut source, 2, "2026-08-29T00:00:00Z");

        assert_eq!(bots[0].balance, 380.0);
        assert_eq!(bots[0].record.losing_trades, 1);
        assert_eq!(bots[0].record.total_loss, 120.0);
    }
}
