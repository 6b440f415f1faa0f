//! Append-only geofence event log

use crate::error::{LedgerError, Result};
use crate::store::FleetLedger;
use chrono::{DateTime, Utc};
use fleetwatch_dispatch::{EventRecorder, GeofenceEvent, GeofenceEventType, StoreResult};
use rusqlite::params;
use tracing::debug;

pub struct SqliteEventLog {
    ledger: FleetLedger,
}

impl SqliteEventLog {
    pub(crate) fn new(ledger: FleetLedger) -> Self {
        Self { ledger }
    }

    pub fn append(&self, event: &GeofenceEvent) -> Result<i64> {
        let metadata = serde_json::to_string(&event.metadata)?;
        let conn = self.ledger.conn()?;
        conn.execute(
            r#"
            INSERT INTO geofence_events (
                load_id, asset_id, geofence_id, geofence_name,
                event_type, timestamp_ms, metadata
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                event.load_id,
                event.asset_id.to_string(),
                event.geofence_id,
                event.geofence_name,
                event.event_type.as_str(),
                event.timestamp.timestamp_millis(),
                metadata,
            ],
        )?;
        let id = conn.last_insert_rowid();

        debug!(
            event_row = id,
            load_id = %event.load_id,
            asset_id = %event.asset_id,
            geofence = %event.geofence_name,
            event_type = %event.event_type,
            "Geofence event recorded"
        );

        Ok(id)
    }

    /// Events recorded for a load, oldest first
    pub fn for_load(&self, load_id: &str) -> Result<Vec<GeofenceEvent>> {
        let conn = self.ledger.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT load_id, asset_id, geofence_id, geofence_name,
                   event_type, timestamp_ms, metadata
            FROM geofence_events
            WHERE load_id = ?1
            ORDER BY id ASC
            "#,
        )?;

        let rows = stmt
            .query_map(params![load_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, i64>(5)?,
                    row.get::<_, String>(6)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(
                |(load_id, asset_id, geofence_id, geofence_name, event_type, ts, metadata)|
                 -> Result<GeofenceEvent> {
                    Ok(GeofenceEvent {
                        load_id,
                        asset_id: asset_id
                            .parse()
                            .map_err(|e| LedgerError::InvalidRecord(format!("{}", e)))?,
                        geofence_id,
                        geofence_name,
                        event_type: event_type
                            .parse::<GeofenceEventType>()
                            .map_err(LedgerError::InvalidRecord)?,
                        timestamp: DateTime::<Utc>::from_timestamp_millis(ts).ok_or_else(
                            || LedgerError::InvalidRecord(format!("timestamp out of range: {}", ts)),
                        )?,
                        metadata: serde_json::from_str(&metadata)?,
                    })
                },
            )
            .collect()
    }

    /// Total number of events in the log
    pub fn count(&self) -> Result<u64> {
        let conn = self.ledger.conn()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM geofence_events", [], |row| row.get(0))?;
        Ok(n as u64)
    }
}

impl EventRecorder for SqliteEventLog {
    fn record(&self, event: &GeofenceEvent) -> StoreResult<()> {
        self.append(event)?;
        Ok(())
    }
}
