use crate::bots::BotPersonality;
use crate::state::BotState;
use std::cmp::Ordering;

/// One row of the arena leaderboard. Serialized for REST and WS clients.
#[derive(Debug, Clone, serde::Serialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub bot_id: String,
    pub name: String,
    pub personality: BotPersonality,
    pub overall_score: f64,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub total_trades: u64,
    pub net_profit: f64,
    pub balance: f64,
}

/// Rank bots by overall score descending, ties broken by net profit.
/// Pure function of the bot states.
pub fn compute_leaderboard(bots: &[BotState]) -> Vec<LeaderboardEntry> {
    let mut entries: Vec<LeaderboardEntry> = bots
        .iter()
        .map(|bot| LeaderboardEntry {
            rank: 0,
            bot_id: bot.profile.id.clone(),
            name: bot.profile.name.clone(),
            personality: bot.profile.personality,
            overall_score: bot.record.overall_score,
            win_rate: bot.record.win_rate,
            profit_factor: bot.record.profit_factor,
            total_trades: bot.record.total_trades,
            net_profit: bot.record.total_profit - bot.record.total_loss,
            balance: bot.balance,
        })
        .collect();

    entries.sort_by(|a, b| {
        b.overall_score
            .partial_cmp(&a.overall_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                b.net_profit
                    .partial_cmp(&a.net_profit)
                    .unwrap_or(Ordering::Equal)
            })
    });

    for (i, entry) in entries.iter_mut().enumerate() {
        entry.rank = i + 1;
    }
    entries
}
