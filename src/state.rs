use crate::bots::BotProfile;
use crate::config::AppConfig;
use crate::db::DbPool;
use crate::perf::leaderboard::LeaderboardEntry;
use crate::perf::record::{PerformanceRecord, TradeDirection};
use portable_atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};

// ── Engine State Machine ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    Running,
    Halted,
}

impl std::fmt::Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Halted => write!(f, "halted"),
        }
    }
}

// ── Messages INTO the engine (bounded channel) ──

#[derive(Debug, Clone)]
pub enum EngineEvent {
    Tick,
    Shutdown,
}

// ── Actions OUT of the arena tick (executed by the engine task) ──

#[derive(Debug)]
pub enum EngineAction {
    OutcomeIngested { bot_id: String, profit: f64 },
    BroadcastUpdate(WsMessage),
    DbWrite(DbCommand),
}

// ── Messages OUT to WebSocket clients ──

#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "type")]
pub enum WsMessage {
    #[serde(rename = "outcome_closed")]
    OutcomeClosed {
        bot_id: String,
        bot_name: String,
        symbol: String,
        direction: TradeDirection,
        size: f64,
        profit: f64,
        timestamp: String,
    },

    #[serde(rename = "bot_update")]
    BotUpdate {
        bot_id: String,
        name: String,
        overall_score: f64,
        win_rate: f64,
        profit_factor: f64,
        total_trades: u64,
        winning_trades: u64,
        losing_trades: u64,
        consecutive_wins: u64,
        consecutive_losses: u64,
        balance: f64,
        timestamp: String,
    },

    #[serde(rename = "leaderboard")]
    Leaderboard { entries: Vec<LeaderboardEntry> },

    #[serde(rename = "engine_state")]
    EngineStateMsg { state: String, reason: String },
}

// ── DB Commands (sent to the writer task via bounded channel) ──

#[derive(Debug)]
pub enum DbCommand {
    InsertOutcome {
        id: String,
        bot_id: String,
        symbol: String,
        direction: String,
        size: f64,
        profit: f64,
        closed_at: String,
    },
    UpsertPerformance {
        bot_id: String,
        record: PerformanceRecord,
    },
}

// ── Per-Bot State ──

/// One simulated bot: static profile, live balance, and its exclusively
/// owned performance record. Never shared across bots or tasks.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BotState {
    pub profile: BotProfile,
    pub balance: f64,
    pub record: PerformanceRecord,
}

impl BotState {
    pub fn new(profile: BotProfile, starting_balance: f64) -> Self {
        Self {
            profile,
            balance: starting_balance,
            record: PerformanceRecord::empty(),
        }
    }
}

// ── Engine snapshot for the dashboard (sent via watch channel) ──

#[derive(Debug, Clone, serde::Serialize)]
pub struct EngineSnapshot {
    pub engine_state: EngineState,
    pub tick: u64,
    pub timestamp: String,
    pub bots: Vec<BotState>,
}

impl Default for EngineSnapshot {
    fn default() -> Self {
        Self {
            engine_state: EngineState::Running,
            tick: 0,
            timestamp: String::new(),
            bots: Vec::new(),
        }
    }
}

// ── Performance Counters (lock-free) ──

pub struct PerfCounters {
    pub ticks_processed: AtomicU64,
    pub outcomes_ingested: AtomicU64,
    pub ws_messages_sent: AtomicU64,
    pub db_commands_sent: AtomicU64,
}

impl PerfCounters {
    pub fn new() -> Self {
        Self {
            ticks_processed: AtomicU64::new(0),
            outcomes_ingested: AtomicU64::new(0),
            ws_messages_sent: AtomicU64::new(0),
            db_commands_sent: AtomicU64::new(0),
        }
    }
}

// ── Application shared state (channels, not locks) ──

pub struct AppState {
    pub config: AppConfig,
    pub db: DbPool,

    // Engine -> Dashboard: latest snapshot (single producer, multi consumer)
    pub snapshot_tx: watch::Sender<EngineSnapshot>,
    pub snapshot_rx: watch::Receiver<EngineSnapshot>,

    // Engine -> Dashboard: event stream for WS clients
    pub ws_tx: broadcast::Sender<WsMessage>,

    // Tick generator -> Engine: bounded event channel
    pub engine_tx: mpsc::Sender<EngineEvent>,

    // Engine -> DB Writer: bounded command channel
    pub db_tx: mpsc::Sender<DbCommand>,

    pub counters: PerfCounters,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        db: DbPool,
        engine_tx: mpsc::Sender<EngineEvent>,
        db_tx: mpsc::Sender<DbCommand>,
    ) -> Arc<Self> {
        let (ws_tx, _) = broadcast::channel(1024);
        let (snapshot_tx, snapshot_rx) = watch::channel(EngineSnapshot::default());

        Arc::new(Self {
            config,
            db,
            snapshot_tx,
            snapshot_rx,
            ws_tx,
            engine_tx,
            db_tx,
            counters: PerfCounters::new(),
        })
    }

    #[inline]
    pub fn broadcast(&self, msg: WsMessage) {
        self.counters.ws_messages_sent.fetch_add(1, Ordering::Relaxed);
        let _ = self.ws_tx.send(msg);
    }
}
