//! Provider payload normalisation
//!
//! The provider is inconsistent about field naming across endpoints
//! (`Latitude` vs `latitude` vs `lat`, `ExpiresIn` vs `expires_in`, ...).
//! Every response passes through this module once and comes out as a strict
//! internal type; nothing downstream looks at raw JSON.

use crate::error::{TelematicsError, TelematicsResult};
use crate::token::{IssuedToken, MAX_TOKEN_TTL_SECS};
use chrono::{DateTime, Utc};
use fleetwatch_core::GeoCoordinate;
use fleetwatch_dispatch::{AssetId, AssetPosition, GeofenceDefinition};
use serde_json::{Map, Value};
use tracing::warn;

const ENVELOPE_KEYS: &[&str] = &["data", "result", "results", "items", "value"];

const LATITUDE: &[&str] = &["latitude", "lat", "centerlatitude", "centrelatitude"];
const LONGITUDE: &[&str] = &[
    "longitude",
    "lon",
    "lng",
    "long",
    "centerlongitude",
    "centrelongitude",
];
const TIMESTAMP: &[&str] = &[
    "timestamp",
    "gpstime",
    "datetime",
    "time",
    "lastupdated",
    "recordedat",
];
const NESTED_POINT: &[&str] = &["center", "centre", "point", "location", "position"];

/// Canonical form of a key: lowercase with `_`, `-` and spaces removed.
fn canonical(key: &str) -> String {
    key.chars()
        .filter(|c| !matches!(*c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// First field whose canonical key is one of `aliases` (given in canonical form).
fn field<'a>(obj: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases.iter().find_map(|alias| {
        obj.iter()
            .find(|(k, v)| !v.is_null() && canonical(k) == *alias)
            .map(|(_, v)| v)
    })
}

fn as_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| s.trim().parse::<i64>().ok().and_then(epoch_to_datetime)),
        Value::Number(n) => n.as_i64().and_then(epoch_to_datetime),
        _ => None,
    }
}

/// Epoch seconds or milliseconds, told apart by magnitude.
fn epoch_to_datetime(raw: i64) -> Option<DateTime<Utc>> {
    if raw.abs() >= 100_000_000_000 {
        DateTime::<Utc>::from_timestamp_millis(raw)
    } else {
        DateTime::<Utc>::from_timestamp(raw, 0)
    }
}

/// Strip `{ "data": ... }` style wrappers.
fn unwrap_envelope(mut value: &Value) -> &Value {
    while let Value::Object(obj) = value {
        match field(obj, ENVELOPE_KEYS) {
            Some(inner) if inner.is_object() || inner.is_array() => value = inner,
            _ => break,
        }
    }
    value
}

fn coordinate_of(obj: &Map<String, Value>) -> Option<GeoCoordinate> {
    let lat = field(obj, LATITUDE).and_then(as_f64);
    let lon = field(obj, LONGITUDE).and_then(as_f64);
    match (lat, lon) {
        (Some(lat), Some(lon)) => GeoCoordinate::new(lat, lon).ok(),
        _ => field(obj, NESTED_POINT)
            .and_then(Value::as_object)
            .and_then(coordinate_of),
    }
}

/// Token endpoint response
pub fn token(endpoint: &str, body: &Value) -> TelematicsResult<IssuedToken> {
    let obj = unwrap_envelope(body).as_object().ok_or_else(|| TelematicsError::Payload {
        endpoint: endpoint.to_string(),
        message: "token response is not an object".to_string(),
    })?;

    let access_token = field(obj, &["accesstoken", "token"])
        .and_then(as_string)
        .ok_or(TelematicsError::MissingField {
            field: "access_token",
            context: "token response",
        })?;

    let expires_in = field(obj, &["expiresin", "expires"])
        .and_then(as_f64)
        .map(|secs| chrono::Duration::seconds(secs.clamp(0.0, MAX_TOKEN_TTL_SECS as f64) as i64));

    Ok(IssuedToken {
        access_token,
        expires_in,
    })
}

/// Position endpoint response.
///
/// Accepts a single object or an array of samples (newest wins). A sample
/// with no usable timestamp is stamped with `received_at`.
pub fn position(
    asset_id: AssetId,
    body: &Value,
    received_at: DateTime<Utc>,
) -> TelematicsResult<AssetPosition> {
    let candidates: Vec<&Map<String, Value>> = match unwrap_envelope(body) {
        Value::Object(obj) => vec![obj],
        Value::Array(items) => items.iter().filter_map(Value::as_object).collect(),
        _ => Vec::new(),
    };

    candidates
        .into_iter()
        .filter_map(|obj| {
            let coordinate = coordinate_of(obj)?;
            let timestamp = field(obj, TIMESTAMP).and_then(as_timestamp);
            Some((coordinate, timestamp))
        })
        // Later array entries win ties, so an untimed feed yields its last sample.
        .max_by_key(|(_, ts)| *ts)
        .map(|(coordinate, timestamp)| {
            AssetPosition::new(asset_id, coordinate, timestamp.unwrap_or(received_at))
        })
        .ok_or(TelematicsError::MissingField {
            field: "latitude/longitude",
            context: "position response",
        })
}

/// Geofence listing response.
///
/// Entries without an id are dropped. Entries without usable coordinates are
/// kept with `center: None` so the evaluator can skip them explicitly.
pub fn geofences(endpoint: &str, body: &Value) -> TelematicsResult<Vec<GeofenceDefinition>> {
    let items = unwrap_envelope(body).as_array().ok_or_else(|| TelematicsError::Payload {
        endpoint: endpoint.to_string(),
        message: "geofence listing is not an array".to_string(),
    })?;

    Ok(items
        .iter()
        .filter_map(|item| {
            let obj = item.as_object()?;
            let Some(id) = field(obj, &["id", "geofenceid"]).and_then(as_string) else {
                warn!("Dropping geofence without an id");
                return None;
            };
            let name = field(obj, &["name", "geofencename", "description"])
                .and_then(as_string)
                .unwrap_or_default();
            let radius_meters = field(obj, &["radius", "radiusmeters", "radiusm", "radiusinmeters"])
                .and_then(as_f64);

            Some(GeofenceDefinition {
                id,
                name,
                center: coordinate_of(obj),
                radius_meters,
            })
        })
        .collect())
}
