//! Ledger error types

use fleetwatch_dispatch::StoreError;
use thiserror::Error;

/// Errors that can occur in ledger operations
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Connection lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

impl From<LedgerError> for StoreError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Serialization(e) => StoreError::Serialization(e),
            LedgerError::InvalidRecord(msg) => StoreError::InvalidRecord(msg),
            other => StoreError::Database(other.to_string()),
        }
    }
}
