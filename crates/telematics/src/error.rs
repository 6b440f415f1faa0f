//! Error types for telematics provider calls.

use thiserror::Error;

/// Errors that can occur talking to the telematics provider.
#[derive(Debug, Error)]
pub enum TelematicsError {
    /// Transport failure (connection refused, TLS, DNS, ...)
    #[error("HTTP error calling {endpoint}: {message}")]
    Http { endpoint: String, message: String },

    /// Request exceeded the configured timeout
    #[error("Timed out calling {endpoint}")]
    Timeout { endpoint: String },

    /// Provider answered with a non-success status
    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },

    /// Body was not JSON or had an unexpected shape
    #[error("Invalid payload from {endpoint}: {message}")]
    Payload { endpoint: String, message: String },

    /// A required field was absent from an otherwise valid payload
    #[error("Missing field '{field}' in {context}")]
    MissingField {
        field: &'static str,
        context: &'static str,
    },

    /// Client could not be constructed
    #[error("Client configuration error: {0}")]
    Config(String),
}

impl TelematicsError {
    pub(crate) fn from_reqwest(endpoint: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TelematicsError::Timeout {
                endpoint: endpoint.to_string(),
            }
        } else {
            TelematicsError::Http {
                endpoint: endpoint.to_string(),
                message: err.to_string(),
            }
        }
    }
}

/// Result type for telematics operations.
pub type TelematicsResult<T> = Result<T, TelematicsError>;
