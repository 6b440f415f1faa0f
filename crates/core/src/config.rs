//! Configuration management for FleetWatch.
//!
//! Configuration is read from a TOML file (path in `FLEETWATCH_CONFIG`) and
//! then overridden by individual environment variables, so secrets never need
//! to live in the file.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Environment variable naming the TOML configuration file
pub const CONFIG_PATH_ENV: &str = "FLEETWATCH_CONFIG";

/// Statuses eligible for geofence-driven auto-advancement
pub const DEFAULT_TRACKABLE_STATUSES: [&str; 5] =
    ["pending", "scheduled", "loading", "in-transit", "offloading"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub telematics: TelematicsConfig,
    pub monitor: MonitorConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelematicsConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub client_id: Option<String>,
    pub organisation_id: String,
    pub token_path: String,
    /// Path template; `{asset_id}` is substituted.
    pub position_path: String,
    /// Path template; `{organisation_id}` is substituted.
    pub geofence_path: String,
    pub request_timeout_secs: u64,
    pub token_safety_margin_secs: i64,
}

impl fmt::Debug for TelematicsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelematicsConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("client_id", &self.client_id)
            .field("organisation_id", &self.organisation_id)
            .field("token_path", &self.token_path)
            .field("position_path", &self.position_path)
            .field("geofence_path", &self.geofence_path)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("token_safety_margin_secs", &self.token_safety_margin_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub trackable_statuses: Vec<String>,
    pub default_radius_meters: f64,
    /// Geofence name fragment identifying the depot whose exit marks departure.
    pub depot_marker: Option<String>,
    pub max_concurrent_assets: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8090,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "data/fleetwatch.db".to_string(),
        }
    }
}

impl Default for TelematicsConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            username: String::new(),
            password: String::new(),
            client_id: None,
            organisation_id: String::new(),
            token_path: "/token".to_string(),
            position_path: "/api/assets/{asset_id}/position".to_string(),
            geofence_path: "/api/organisations/{organisation_id}/geofences".to_string(),
            request_timeout_secs: 15,
            token_safety_margin_secs: 60,
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            trackable_statuses: DEFAULT_TRACKABLE_STATUSES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            default_radius_meters: 500.0,
            depot_marker: None,
            max_concurrent_assets: 4,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load from `FLEETWATCH_CONFIG` (if set), apply environment overrides
    /// and validate.
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a key lookup (normally the process environment).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| CoreError::InvalidConfig(format!("PORT is not a port: {}", port)))?;
        }
        if let Some(path) = lookup("DATABASE_PATH") {
            self.database.path = path;
        }
        if let Some(url) = lookup("TELEMATICS_BASE_URL") {
            self.telematics.base_url = url;
        }
        if let Some(username) = lookup("TELEMATICS_USERNAME") {
            self.telematics.username = username;
        }
        if let Some(password) = lookup("TELEMATICS_PASSWORD") {
            self.telematics.password = password;
        }
        if let Some(org) = lookup("TELEMATICS_ORGANISATION_ID") {
            self.telematics.organisation_id = org;
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            self.logging.format = match format.to_ascii_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" => LogFormat::Pretty,
                other => {
                    return Err(CoreError::InvalidConfig(format!(
                        "LOG_FORMAT must be 'json' or 'pretty', got {}",
                        other
                    )))
                }
            };
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let t = &self.telematics;
        if t.base_url.trim().is_empty() {
            return Err(CoreError::InvalidConfig("telematics.base_url is empty".into()));
        }
        if t.username.is_empty() || t.password.is_empty() {
            return Err(CoreError::InvalidConfig(
                "telematics credentials are not set".into(),
            ));
        }
        if t.organisation_id.trim().is_empty() {
            return Err(CoreError::InvalidConfig(
                "telematics.organisation_id is empty".into(),
            ));
        }
        if t.request_timeout_secs == 0 {
            return Err(CoreError::InvalidConfig(
                "telematics.request_timeout_secs must be positive".into(),
            ));
        }
        if t.token_safety_margin_secs < 0 {
            return Err(CoreError::InvalidConfig(
                "telematics.token_safety_margin_secs must not be negative".into(),
            ));
        }
        let m = &self.monitor;
        if !(m.default_radius_meters.is_finite() && m.default_radius_meters > 0.0) {
            return Err(CoreError::InvalidConfig(
                "monitor.default_radius_meters must be positive".into(),
            ));
        }
        if m.max_concurrent_assets == 0 {
            return Err(CoreError::InvalidConfig(
                "monitor.max_concurrent_assets must be at least 1".into(),
            ));
        }
        if m.trackable_statuses.is_empty() {
            return Err(CoreError::InvalidConfig(
                "monitor.trackable_statuses is empty".into(),
            ));
        }
        Ok(())
    }
}
