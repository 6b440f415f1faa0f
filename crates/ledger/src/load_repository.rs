//! Load reads and conditional status updates
//!
//! The `loads` and `vehicles` tables are owned by the dispatch system. The
//! monitor only reads trackable rows and advances `status`/`updated_at`.

use crate::error::Result;
use crate::store::FleetLedger;
use chrono::{DateTime, Utc};
use fleetwatch_dispatch::{LoadRepository, LoadStatus, StoreResult, TrackedLoad};
use rusqlite::{params, params_from_iter};
use tracing::debug;

pub struct SqliteLoadRepository {
    ledger: FleetLedger,
}

impl SqliteLoadRepository {
    pub(crate) fn new(ledger: FleetLedger) -> Self {
        Self { ledger }
    }

    pub fn trackable(&self, statuses: &[LoadStatus]) -> Result<Vec<TrackedLoad>> {
        if statuses.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; statuses.len()].join(", ");
        let sql = format!(
            r#"
            SELECT l.id, l.load_id, l.origin, l.destination, l.status, v.id, v.external_asset_id
            FROM loads l
            JOIN vehicles v ON v.id = l.vehicle_id
            WHERE l.status IN ({})
              AND v.external_asset_id IS NOT NULL
            ORDER BY l.id
            "#,
            placeholders
        );

        let conn = self.ledger.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let loads = stmt
            .query_map(params_from_iter(statuses.iter().map(|s| s.as_str())), |row| {
                Ok(TrackedLoad {
                    id: row.get(0)?,
                    load_id: row.get(1)?,
                    origin: row.get(2)?,
                    destination: row.get(3)?,
                    status: LoadStatus::from(row.get::<_, String>(4)?.as_str()),
                    vehicle_id: row.get(5)?,
                    asset_ref: row.get(6)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(loads)
    }

    /// Compare-and-set on status
    pub fn set_status_if(
        &self,
        id: &str,
        expected: &LoadStatus,
        next: &LoadStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<bool> {
        let conn = self.ledger.conn()?;
        let changed = conn.execute(
            "UPDATE loads SET status = ?1, updated_at_ms = ?2 WHERE id = ?3 AND status = ?4",
            params![
                next.as_str(),
                updated_at.timestamp_millis(),
                id,
                expected.as_str()
            ],
        )?;

        debug!(load = %id, from = %expected, to = %next, changed, "Load status update");

        Ok(changed == 1)
    }

    /// Current status of a load
    pub fn status_of(&self, id: &str) -> Result<Option<LoadStatus>> {
        use rusqlite::OptionalExtension;

        let conn = self.ledger.conn()?;
        let status: Option<String> = conn
            .query_row("SELECT status FROM loads WHERE id = ?1", params![id], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(status.map(|s| LoadStatus::from(s.as_str())))
    }

    /// Insert or replace a vehicle row (standalone deployments and fixtures)
    pub fn upsert_vehicle(&self, id: &str, external_asset_id: Option<&str>) -> Result<()> {
        let conn = self.ledger.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO vehicles (id, external_asset_id) VALUES (?1, ?2)",
            params![id, external_asset_id],
        )?;
        Ok(())
    }

    /// Insert or replace a load row (standalone deployments and fixtures)
    pub fn upsert_load(
        &self,
        id: &str,
        load_id: &str,
        origin: &str,
        destination: &str,
        status: &LoadStatus,
        vehicle_id: &str,
    ) -> Result<()> {
        let conn = self.ledger.conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO loads (id, load_id, origin, destination, status, vehicle_id)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![id, load_id, origin, destination, status.as_str(), vehicle_id],
        )?;
        Ok(())
    }
}

impl LoadRepository for SqliteLoadRepository {
    fn list_trackable(&self, statuses: &[LoadStatus]) -> StoreResult<Vec<TrackedLoad>> {
        Ok(self.trackable(statuses)?)
    }

    fn advance_status(
        &self,
        id: &str,
        expected: &LoadStatus,
        next: &LoadStatus,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        Ok(self.set_status_if(id, expected, next, updated_at)?)
    }
}
