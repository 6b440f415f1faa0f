//! Shared SQLite connection and schema
//!
//! Positions and geofence events are append-only: no statement in this crate
//! updates or deletes rows in `asset_positions` or `geofence_events`. The
//! `vehicles` and `loads` tables belong to the dispatch system; they are
//! created here only when absent so a standalone deployment (and the tests)
//! have somewhere to read from.

use crate::error::{LedgerError, Result};
use crate::event_log::SqliteEventLog;
use crate::load_repository::SqliteLoadRepository;
use crate::position_log::SqlitePositionLog;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

/// Handle to the monitor database, cloned into each store
#[derive(Clone)]
pub struct FleetLedger {
    conn: Arc<Mutex<Connection>>,
}

impl FleetLedger {
    /// Create or open the database at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        info!(path = %path.display(), "Opening fleet ledger");

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        Self::from_connection(conn)
    }

    /// Private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS asset_positions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                asset_id TEXT NOT NULL,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL,
                timestamp_ms INTEGER NOT NULL,
                created_at_ms INTEGER NOT NULL DEFAULT (strftime('%s', 'now') * 1000)
            );

            CREATE INDEX IF NOT EXISTS idx_positions_asset_ts
                ON asset_positions(asset_id, timestamp_ms);

            CREATE TABLE IF NOT EXISTS geofence_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                load_id TEXT NOT NULL,
                asset_id TEXT NOT NULL,
                geofence_id TEXT NOT NULL,
                geofence_name TEXT NOT NULL,
                event_type TEXT NOT NULL CHECK (event_type IN ('entry', 'exit')),
                timestamp_ms INTEGER NOT NULL,
                metadata TEXT NOT NULL DEFAULT '{}',
                created_at_ms INTEGER NOT NULL DEFAULT (strftime('%s', 'now') * 1000)
            );

            CREATE INDEX IF NOT EXISTS idx_events_load ON geofence_events(load_id);

            CREATE TABLE IF NOT EXISTS vehicles (
                id TEXT PRIMARY KEY,
                external_asset_id TEXT
            );

            CREATE TABLE IF NOT EXISTS loads (
                id TEXT PRIMARY KEY,
                load_id TEXT NOT NULL,
                origin TEXT NOT NULL DEFAULT '',
                destination TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL,
                vehicle_id TEXT REFERENCES vehicles(id),
                updated_at_ms INTEGER
            );

            CREATE INDEX IF NOT EXISTS idx_loads_status ON loads(status);
            "#,
        )?;

        Ok(())
    }

    pub(crate) fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| LedgerError::LockPoisoned(e.to_string()))
    }

    pub fn positions(&self) -> SqlitePositionLog {
        SqlitePositionLog::new(self.clone())
    }

    pub fn events(&self) -> SqliteEventLog {
        SqliteEventLog::new(self.clone())
    }

    pub fn loads(&self) -> SqliteLoadRepository {
        SqliteLoadRepository::new(self.clone())
    }
}
