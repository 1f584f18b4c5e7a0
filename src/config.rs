use crate::errors::{ArenaError, ArenaResult};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_port: u16,
    pub tick_interval_ms: u64,
    pub starting_balance: f64,
    /// Seed for the outcome simulation. Set for deterministic replay;
    /// leave unset for a fresh run every start.
    pub sim_seed: Option<u64>,
    pub data_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> ArenaResult<Self> {
        dotenvy::dotenv().ok();

        let server_port = env_var_or("SERVER_PORT", "3001")
            .parse::<u16>()
            .map_err(|e| ArenaError::Config(format!("SERVER_PORT: {e}")))?;

        let tick_interval_ms = env_var_or("TICK_INTERVAL_MS", "1000")
            .parse::<u64>()
            .map_err(|e| ArenaError::Config(format!("TICK_INTERVAL_MS: {e}")))?;
        if tick_interval_ms == 0 {
            return Err(ArenaError::Config("TICK_INTERVAL_MS must be > 0".into()));
        }

        let starting_balance = env_var_or("STARTING_BALANCE", "100000.0")
            .parse::<f64>()
            .map_err(|e| ArenaError::Config(format!("STARTING_BALANCE: {e}")))?;

        let sim_seed = match std::env::var("SIM_SEED") {
            Ok(raw) => Some(
                raw.parse::<u64>()
                    .map_err(|e| ArenaError::Config(format!("SIM_SEED: {e}")))?,
            ),
            Err(_) => None,
        };

        Ok(Self {
            server_port,
            tick_interval_ms,
            starting_balance,
            sim_seed,
            data_dir: PathBuf::from(env_var_or("DATA_DIR", "data")),
        })
    }
}

fn env_var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
