use crate::db;
use crate::perf::leaderboard;
use crate::state::{AppState, EngineSnapshot};
use axum::extract::{Query, State};
use axum::response::Json;
use std::sync::Arc;

#[derive(serde::Deserialize)]
pub struct OutcomesQuery {
    pub bot: Option<String>,
    pub limit: Option<usize>,
}

/// GET /api/state -- current engine snapshot (from watch channel, no lock)
pub async fn get_state(State(state): State<Arc<AppState>>) -> Json<EngineSnapshot> {
    let snapshot = state.snapshot_rx.borrow().clone();
    Json(snapshot)
}

/// GET /api/leaderboard -- bots ranked by overall score
pub async fn get_leaderboard(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let snapshot = state.snapshot_rx.borrow().clone();
    let entries = leaderboard::compute_leaderboard(&snapshot.bots);
    Json(serde_json::json!({ "entries": entries }))
}

/// GET /api/outcomes -- recent closed trades from DB (cold path)
pub async fn get_outcomes(
    State(state): State<Arc<AppState>>,
    Query(params): Query<OutcomesQuery>,
) -> Json<serde_json::Value> {
    let limit = params.limit.unwrap_or(50).min(200);
    match db::get_recent_outcomes(&state.db, params.bot.as_deref(), limit) {
        Ok(outcomes) => Json(serde_json::json!({ "outcomes": outcomes })),
        Err(e) => Json(serde_json::json!({ "error": e.to_string() })),
    }
}

/// GET /api/performance -- persisted per-bot performance rows
pub async fn get_performance(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    match db::get_performance_rows(&state.db) {
        Ok(rows) => Json(serde_json::json!({ "performance": rows })),
        Err(e) => Json(serde_json::json!({ "error": e.to_string() })),
    }
}

/// GET /api/counters -- engine counters (lock-free reads)
pub async fn get_counters(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    use portable_atomic::Ordering::Relaxed;
    Json(serde_json::json!({
        "ticks_processed": state.counters.ticks_processed.load(Relaxed),
        "outcomes_ingested": state.counters.outcomes_ingested.load(Relaxed),
        "ws_messages_sent": state.counters.ws_messages_sent.load(Relaxed),
        "db_commands_sent": state.counters.db_commands_sent.load(Relaxed),
    }))
}
