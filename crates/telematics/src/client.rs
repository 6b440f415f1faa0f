//! HTTP client for the telematics provider
//!
//! Three endpoints are used: the password-grant token endpoint, the per-asset
//! position endpoint and the per-organisation geofence listing. Every request
//! carries the configured timeout; a timeout surfaces as
//! [`TelematicsError::Timeout`] and is handled like any other unavailability.

use crate::error::{TelematicsError, TelematicsResult};
use crate::normalize;
use crate::token::{CredentialExchange, IssuedToken, SystemToken};
use fleetwatch_core::{Clock, TelematicsConfig};
use fleetwatch_dispatch::{AssetId, AssetPosition, GeofenceDefinition};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Bearer-authenticated provider reads used by the monitor.
pub trait TelematicsApi: Send + Sync {
    /// Current position of one asset.
    fn fetch_position(
        &self,
        token: &SystemToken,
        asset_id: AssetId,
    ) -> impl Future<Output = TelematicsResult<AssetPosition>> + Send;

    /// The organisation's geofence catalogue.
    fn list_geofences(
        &self,
        token: &SystemToken,
    ) -> impl Future<Output = TelematicsResult<Vec<GeofenceDefinition>>> + Send;
}

/// reqwest-backed provider client.
///
/// Uses a reusable `reqwest::Client` with connection pooling and a request
/// timeout taken from configuration.
#[derive(Clone)]
pub struct HttpTelematicsClient {
    http: reqwest::Client,
    config: TelematicsConfig,
    clock: Arc<dyn Clock>,
}

impl HttpTelematicsClient {
    pub fn new(config: TelematicsConfig, clock: Arc<dyn Clock>) -> TelematicsResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| TelematicsError::Config(e.to_string()))?;

        Ok(Self {
            http,
            config,
            clock,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn position_url(&self, asset_id: AssetId) -> String {
        self.url(
            &self
                .config
                .position_path
                .replace("{asset_id}", &asset_id.to_string()),
        )
    }

    fn geofence_url(&self) -> String {
        self.url(
            &self
                .config
                .geofence_path
                .replace("{organisation_id}", &self.config.organisation_id),
        )
    }

    async fn read_json(endpoint: &str, response: reqwest::Response) -> TelematicsResult<Value> {
        let status = response.status();
        if !status.is_success() {
            return Err(TelematicsError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TelematicsError::from_reqwest(endpoint, e))?;

        serde_json::from_slice(&bytes).map_err(|e| TelematicsError::Payload {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })
    }

    async fn get_authorized(&self, url: &str, token: &SystemToken) -> TelematicsResult<Value> {
        let response = self
            .http
            .get(url)
            .bearer_auth(token.value())
            .send()
            .await
            .map_err(|e| TelematicsError::from_reqwest(url, e))?;

        Self::read_json(url, response).await
    }
}

impl CredentialExchange for HttpTelematicsClient {
    async fn exchange(&self) -> TelematicsResult<IssuedToken> {
        let url = self.url(&self.config.token_path);

        let mut form = vec![
            ("grant_type", "password"),
            ("username", self.config.username.as_str()),
            ("password", self.config.password.as_str()),
        ];
        if let Some(client_id) = self.config.client_id.as_deref() {
            form.push(("client_id", client_id));
        }

        let response = self
            .http
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| TelematicsError::from_reqwest(&url, e))?;

        let body = Self::read_json(&url, response).await?;
        normalize::token(&url, &body)
    }
}

impl TelematicsApi for HttpTelematicsClient {
    async fn fetch_position(
        &self,
        token: &SystemToken,
        asset_id: AssetId,
    ) -> TelematicsResult<AssetPosition> {
        let url = self.position_url(asset_id);
        let body = self.get_authorized(&url, token).await?;
        let position = normalize::position(asset_id, &body, self.clock.now())?;

        debug!(
            asset_id = %asset_id,
            latitude = position.coordinate.latitude,
            longitude = position.coordinate.longitude,
            timestamp = %position.timestamp,
            "Fetched asset position"
        );

        Ok(position)
    }

    async fn list_geofences(&self, token: &SystemToken) -> TelematicsResult<Vec<GeofenceDefinition>> {
        let url = self.geofence_url();
        let body = self.get_authorized(&url, token).await?;
        let geofences = normalize::geofences(&url, &body)?;

        debug!(count = geofences.len(), "Fetched geofence catalogue");

        Ok(geofences)
    }
}
