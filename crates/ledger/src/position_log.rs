//! Append-only asset position log

use crate::error::{LedgerError, Result};
use crate::store::FleetLedger;
use chrono::{DateTime, Utc};
use fleetwatch_core::GeoCoordinate;
use fleetwatch_dispatch::{AssetId, AssetPosition, PositionStore, StoreResult};
use rusqlite::{params, OptionalExtension};
use tracing::debug;

pub struct SqlitePositionLog {
    ledger: FleetLedger,
}

impl SqlitePositionLog {
    pub(crate) fn new(ledger: FleetLedger) -> Self {
        Self { ledger }
    }

    /// Most recent sample; ties on timestamp go to the later insert.
    pub fn latest(&self, asset_id: AssetId) -> Result<Option<AssetPosition>> {
        let conn = self.ledger.conn()?;
        let row = conn
            .query_row(
                r#"
                SELECT latitude, longitude, timestamp_ms
                FROM asset_positions
                WHERE asset_id = ?1
                ORDER BY timestamp_ms DESC, id DESC
                LIMIT 1
                "#,
                params![asset_id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, f64>(0)?,
                        row.get::<_, f64>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(lat, lon, ts)| -> Result<AssetPosition> {
            let coordinate = GeoCoordinate::new(lat, lon)
                .map_err(|e| LedgerError::InvalidRecord(e.to_string()))?;
            let timestamp = DateTime::<Utc>::from_timestamp_millis(ts).ok_or_else(|| {
                LedgerError::InvalidRecord(format!("timestamp out of range: {}", ts))
            })?;
            Ok(AssetPosition::new(asset_id, coordinate, timestamp))
        })
        .transpose()
    }

    pub fn append(&self, position: &AssetPosition) -> Result<()> {
        let conn = self.ledger.conn()?;
        conn.execute(
            r#"
            INSERT INTO asset_positions (asset_id, latitude, longitude, timestamp_ms)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                position.asset_id.to_string(),
                position.coordinate.latitude,
                position.coordinate.longitude,
                position.timestamp.timestamp_millis(),
            ],
        )?;

        debug!(
            asset_id = %position.asset_id,
            latitude = position.coordinate.latitude,
            longitude = position.coordinate.longitude,
            "Position recorded"
        );

        Ok(())
    }

    /// Number of samples stored for an asset
    pub fn count(&self, asset_id: AssetId) -> Result<u64> {
        let conn = self.ledger.conn()?;
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM asset_positions WHERE asset_id = ?1",
            params![asset_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(n as u64)
    }
}

impl PositionStore for SqlitePositionLog {
    fn last_position(&self, asset_id: AssetId) -> StoreResult<Option<AssetPosition>> {
        Ok(self.latest(asset_id)?)
    }

    fn record_position(&self, position: &AssetPosition) -> StoreResult<()> {
        Ok(self.append(position)?)
    }
}
