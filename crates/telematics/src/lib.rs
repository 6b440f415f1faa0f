//! Telematics provider integration for FleetWatch.
//!
//! - [`token::TokenCache`]: owned, injectable cache for the system bearer token
//! - [`client::HttpTelematicsClient`]: token exchange, asset position and
//!   geofence catalogue calls, each with an explicit timeout
//! - [`normalize`]: the single place provider field-name variance is resolved

pub mod client;
pub mod error;
pub mod normalize;
pub mod token;

pub use client::{HttpTelematicsClient, TelematicsApi};
pub use error::{TelematicsError, TelematicsResult};
pub use token::{
    CredentialExchange, IssuedToken, SystemToken, TokenCache, DEFAULT_SAFETY_MARGIN_SECS,
    DEFAULT_TOKEN_TTL_SECS, MAX_TOKEN_TTL_SECS,
};
