/// Domain-specific error types for the arena engine.
/// The performance core itself cannot fail at runtime -- every division is
/// guarded -- so the only hard error it produces is a construction-time
/// invariant violation when restoring a persisted record.
#[derive(Debug, thiserror::Error)]
pub enum ArenaError {
    #[error("config error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("performance record invariant violated: {0}")]
    InvariantViolation(String),
}

impl From<rusqlite::Error> for ArenaError {
    fn from(e: rusqlite::Error) -> Self {
        ArenaError::Database(e.to_string())
    }
}

impl From<std::io::Error> for ArenaError {
    fn from(e: std::io::Error) -> Self {
        ArenaError::Database(e.to_string())
    }
}

pub type ArenaResult<T> = Result<T, ArenaError>;
