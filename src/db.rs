use crate::errors::{ArenaError, ArenaResult};
use crate::perf::record::{PerformanceRecord, RecordParts};
use crate::state::DbCommand;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

pub type DbPool = Arc<Mutex<Connection>>;

pub fn init_db(data_dir: &Path) -> ArenaResult<DbPool> {
    std::fs::create_dir_all(data_dir)
        .map_err(|e| ArenaError::Database(format!("create dir: {e}")))?;
    let db_path = data_dir.join("bot_arena.db");
    let conn = Connection::open(&db_path)?;

    conn.execute_batch(
        "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA cache_size=-64000;",
    )?;

    let schema = include_str!("../migrations/001_init.sql");
    conn.execute_batch(schema)?;

    tracing::info!("database initialized at {}", db_path.display());
    Ok(Arc::new(Mutex::new(conn)))
}

/// Dedicated DB writer task. Reads commands from a bounded channel and is
/// the only task that writes to the connection.
pub async fn run_db_writer(db: DbPool, mut rx: mpsc::Receiver<DbCommand>) {
    tracing::info!("db writer task started");

    while let Some(cmd) = rx.recv().await {
        if let Err(e) = execute_command(&db, cmd) {
            tracing::error!("db write error: {e}");
        }
    }

    tracing::info!("db writer task shutting down");
}

fn execute_command(db: &DbPool, cmd: DbCommand) -> ArenaResult<()> {
    let conn = db
        .lock()
        .map_err(|e| ArenaError::Database(format!("lock poisoned: {e}")))?;

    match cmd {
        DbCommand::InsertOutcome {
            id,
            bot_id,
            symbol,
            direction,
            size,
            profit,
            closed_at,
        } => {
            conn.execute(
                "INSERT INTO outcomes (id, bot_id, symbol, direction, size, profit, closed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![id, bot_id, symbol, direction, size, profit, closed_at],
            )?;
        }
        DbCommand::UpsertPerformance { bot_id, record } => {
            conn.execute(
                "INSERT OR REPLACE INTO performance
                 (bot_id, total_trades, winning_trades, losing_trades, total_profit, total_loss,
                  largest_win, largest_loss, consecutive_wins, consecutive_losses,
                  max_consecutive_wins, max_consecutive_losses, overall_score, last_updated)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                rusqlite::params![
                    bot_id,
                    record.total_trades as i64,
                    record.winning_trades as i64,
                    record.losing_trades as i64,
                    record.total_profit,
                    record.total_loss,
                    record.largest_win,
                    record.largest_loss,
                    record.consecutive_wins as i64,
                    record.consecutive_losses as i64,
                    record.max_consecutive_wins as i64,
                    record.max_consecutive_losses as i64,
                    record.overall_score,
                    record.last_updated.to_rfc3339(),
                ],
            )?;
        }
    }
    Ok(())
}

// ── Query helpers (server REST reads + engine restore -- cold path only) ──

pub fn get_recent_outcomes(
    db: &DbPool,
    bot_id: Option<&str>,
    limit: usize,
) -> ArenaResult<Vec<OutcomeRow>> {
    let conn = db
        .lock()
        .map_err(|e| ArenaError::Database(format!("lock: {e}")))?;
    let (sql, params): (String, Vec<Box<dyn rusqlite::types::ToSql>>) = match bot_id {
        Some(id) => (
            "SELECT id, bot_id, symbol, direction, size, profit, closed_at FROM outcomes
             WHERE bot_id = ?1 ORDER BY closed_at DESC LIMIT ?2"
                .into(),
            vec![Box::new(id.to_string()), Box::new(limit as i64)],
        ),
        None => (
            "SELECT id, bot_id, symbol, direction, size, profit, closed_at FROM outcomes
             ORDER BY closed_at DESC LIMIT ?1"
                .into(),
            vec![Box::new(limit as i64)],
        ),
    };
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(params.iter()), |row| {
        Ok(OutcomeRow {
            id: row.get(0)?,
            bot_id: row.get(1)?,
            symbol: row.get(2)?,
            direction: row.get(3)?,
            size: row.get(4)?,
            profit: row.get(5)?,
            closed_at: row.get(6)?,
        })
    })?;
    Ok(rows.filter_map(|r| r.ok()).collect())
}

pub fn get_performance_rows(db: &DbPool) -> ArenaResult<Vec<PerformanceRow>> {
    let conn = db
        .lock()
        .map_err(|e| ArenaError::Database(format!("lock: {e}")))?;
    let mut stmt = conn.prepare(
        "SELECT bot_id, total_trades, winning_trades, losing_trades, total_profit, total_loss,
                largest_win, largest_loss, consecutive_wins, consecutive_losses,
                max_consecutive_wins, max_consecutive_losses, overall_score, last_updated
         FROM performance",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(PerformanceRow {
            bot_id: row.get(0)?,
            total_trades: row.get(1)?,
            winning_trades: row.get(2)?,
            losing_trades: row.get(3)?,
            total_profit: row.get(4)?,
            total_loss: row.get(5)?,
            largest_win: row.get(6)?,
            largest_loss: row.get(7)?,
            consecutive_wins: row.get(8)?,
            consecutive_losses: row.get(9)?,
            max_consecutive_wins: row.get(10)?,
            max_consecutive_losses: row.get(11)?,
            overall_score: row.get(12)?,
            last_updated: row.get(13)?,
        })
    })?;
    Ok(rows.filter_map(|r| r.ok()).collect())
}

// ── Row types ──

#[derive(Debug, Clone, serde::Serialize)]
pub struct OutcomeRow {
    pub id: String,
    pub bot_id: String,
    pub symbol: String,
    pub direction: String,
    pub size: f64,
    pub profit: f64,
    pub closed_at: String,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct PerformanceRow {
    pub bot_id: String,
    pub total_trades: i64,
    pub winning_trades: i64,
    pub losing_trades: i64,
    pub total_profit: f64,
    pub total_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub consecutive_wins: i64,
    pub consecutive_losses: i64,
    pub max_consecutive_wins: i64,
    pub max_consecutive_losses: i64,
    pub overall_score: f64,
    pub last_updated: String,
}

impl PerformanceRow {
    /// Rebuild the in-memory record, re-validating invariants and
    /// recomputing derived metrics. Rows with negative counters or
    /// inconsistent totals are rejected here, not repaired.
    pub fn into_record(self) -> ArenaResult<PerformanceRecord> {
        let counters = [
            self.total_trades,
            self.winning_trades,
            self.losing_trades,
            self.consecutive_wins,
            self.consecutive_losses,
            self.max_consecutive_wins,
            self.max_consecutive_losses,
        ];
        if counters.iter().any(|c| *c < 0) {
            return Err(ArenaError::InvariantViolation(format!(
                "negative counter in persisted row for bot {}",
                self.bot_id
            )));
        }

        let last_updated: DateTime<Utc> = DateTime::parse_from_rfc3339(&self.last_updated)
            .map_err(|e| ArenaError::Database(format!("bad last_updated: {e}")))?
            .with_timezone(&Utc);

        PerformanceRecord::from_parts(
            RecordParts {
                total_trades: self.total_trades as u64,
                winning_trades: self.winning_trades as u64,
                losing_trades: self.losing_trades as u64,
                total_profit: self.total_profit,
                total_loss: self.total_loss,
                largest_win: self.largest_win,
                largest_loss: self.largest_loss,
                consecutive_wins: self.consecutive_wins as u64,
                consecutive_losses: self.consecutive_losses as u64,
                max_consecutive_wins: self.max_consecutive_wins as u64,
                max_consecutive_losses: self.max_consecutive_losses as u64,
            },
            last_updated,
        )
    }
}
