mod bots;
mod config;
mod db;
mod errors;
mod perf;
mod server;
mod sim;
mod state;

use crate::sim::{OutcomeSource, RandomWalkSource};
use crate::state::*;
use portable_atomic::Ordering;
use std::sync::Arc;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    tracing::info!("bot arena starting");

    let cfg = match config::AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("config error: {e}");
            std::process::exit(1);
        }
    };

    let db_pool = match db::init_db(&cfg.data_dir) {
        Ok(d) => d,
        Err(e) => {
            tracing::error!("database init error: {e}");
            std::process::exit(1);
        }
    };

    // Bounded channels
    let (engine_tx, engine_rx) = mpsc::channel::<EngineEvent>(256);
    let (db_tx, db_rx) = mpsc::channel::<DbCommand>(1024);

    let app_state = AppState::new(cfg.clone(), db_pool.clone(), engine_tx.clone(), db_tx.clone());

    // ── Spawn tasks ──

    // 1. DB writer task (owns all database writes)
    let db_pool_writer = db_pool.clone();
    tokio::spawn(async move {
        db::run_db_writer(db_pool_writer, db_rx).await;
    });

    // 2. Tick generator
    let tick_tx = engine_tx.clone();
    let tick_ms = cfg.tick_interval_ms;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tokio::time::Duration::from_millis(tick_ms));
        loop {
            interval.tick().await;
            if tick_tx.send(EngineEvent::Tick).await.is_err() {
                break;
            }
        }
    });

    // 3. Shutdown on ctrl-c
    let shutdown_tx = engine_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(EngineEvent::Shutdown).await;
        }
    });

    // 4. Engine task (the hot path)
    let engine_state = app_state.clone();
    let engine_cfg = cfg.clone();
    tokio::spawn(async move {
        run_engine(engine_state, engine_cfg, engine_rx).await;
    });

    // 5. Axum HTTP + WS server
    let server_state = app_state.clone();
    let port = cfg.server_port;

    let app = axum::Router::new()
        .route("/api/state", axum::routing::get(server::routes::get_state))
        .route(
            "/api/leaderboard",
            axum::routing::get(server::routes::get_leaderboard),
        )
        .route(
            "/api/outcomes",
            axum::routing::get(server::routes::get_outcomes),
        )
        .route(
            "/api/performance",
            axum::routing::get(server::routes::get_performance),
        )
        .route(
            "/api/counters",
            axum::routing::get(server::routes::get_counters),
        )
        .route("/ws", axum::routing::get(server::ws::ws_handler))
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .with_state(server_state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!("server listening on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("bind error: {e}");
            std::process::exit(1);
        });

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("server error: {e}");
    }
}

/// Core engine loop. Owns every bot's record; ingests outcomes strictly in
/// order, one tick at a time. No locks, no IO in the decision logic.
async fn run_engine(
    state: Arc<AppState>,
    config: config::AppConfig,
    mut rx: mpsc::Receiver<EngineEvent>,
) {
    tracing::info!("engine task started");

    let mut bot_states: Vec<BotState> = bots::default_roster()
        .into_iter()
        .map(|profile| BotState::new(profile, config.starting_balance))
        .collect();

    restore_records(&state, &mut bot_states);

    let mut source: Box<dyn OutcomeSource> = Box::new(RandomWalkSource::new(config.sim_seed));
    if let Some(seed) = config.sim_seed {
        tracing::info!(seed, "simulation seeded for deterministic replay");
    }

    let mut engine_state = EngineState::Running;
    let mut tick: u64 = 0;

    while let Some(event) = rx.recv().await {
        match event {
            EngineEvent::Tick => {
                if engine_state != EngineState::Running {
                    continue;
                }
                tick += 1;
                state.counters.ticks_processed.fetch_add(1, Ordering::Relaxed);

                let now = chrono::Utc::now().to_rfc3339();
                let actions = sim::arena::run_tick(&mut bot_states, source.as_mut(), tick, &now);
                execute_actions(actions, &state).await;

                // Refresh the dashboard snapshot (watch channel -- cheap)
                if tick % 2 == 0 {
                    let snapshot = EngineSnapshot {
                        engine_state,
                        tick,
                        timestamp: now,
                        bots: bot_states.clone(),
                    };
                    let _ = state.snapshot_tx.send(snapshot);
                }
            }

            EngineEvent::Shutdown => {
                tracing::info!("shutdown event received");
                engine_state = EngineState::Halted;
                state.broadcast(WsMessage::EngineStateMsg {
                    state: engine_state.to_string(),
                    reason: "shutdown requested".into(),
                });
                break;
            }
        }
    }

    tracing::info!("engine task shutting down");
}

/// Resume persisted performance records. Rows that fail invariant
/// validation are discarded; the bot restarts from an empty record.
fn restore_records(state: &Arc<AppState>, bot_states: &mut [BotState]) {
    let rows = match db::get_performance_rows(&state.db) {
        Ok(rows) => rows,
        Err(e) => {
            tracing::warn!("could not load persisted performance: {e}");
            return;
        }
    };

    for row in rows {
        let bot_id = row.bot_id.clone();
        let Some(bot) = bot_states.iter_mut().find(|b| b.profile.id == bot_id) else {
            continue;
        };
        match row.into_record() {
            Ok(record) => {
                bot.balance += record.total_profit - record.total_loss;
                tracing::info!(
                    bot = %bot_id,
                    trades = record.total_trades,
                    score = record.overall_score,
                    "restored performance record"
                );
                bot.record = record;
            }
            Err(e) => {
                tracing::warn!(bot = %bot_id, "discarding corrupt performance row: {e}");
            }
        }
    }
}

/// Execute engine actions (cold path -- channel sends and logging)
async fn execute_actions(
    actions: smallvec::SmallVec<[EngineAction; 16]>,
    state: &Arc<AppState>,
) {
    for action in actions {
        match action {
            EngineAction::OutcomeIngested { bot_id, profit } => {
                state
                    .counters
                    .outcomes_ingested
                    .fetch_add(1, Ordering::Relaxed);
                tracing::debug!(bot = %bot_id, profit, "outcome ingested");
            }
            EngineAction::BroadcastUpdate(msg) => {
                state.broadcast(msg);
            }
            EngineAction::DbWrite(cmd) => {
                state.counters.db_commands_sent.fetch_add(1, Ordering::Relaxed);
                let _ = state.db_tx.send(cmd).await;
            }
        }
    }
}
