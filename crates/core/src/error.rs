//! Core error types

use thiserror::Error;

/// Core error type for FleetWatch
#[derive(Debug, Error)]
pub enum CoreError {
    /// Configuration file could not be parsed
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration parsed but holds unusable values
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Coordinate outside the valid latitude/longitude range
    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used across the core crate.
pub type Result<T> = std::result::Result<T, CoreError>;
