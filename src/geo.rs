//! Single-shot "where am I" lookup used by the weather widget.
//!
//! Providers:
//!
//! - [`Unsupported`]: no location capability; always fails with
//!   [`GeoError::Unsupported`]
//! - [`FixedPosition`]: coordinates taken from configuration
//! - [`IpLookup`]: IP-based geolocation over HTTP, bounded by a timeout
//!   (default [`DEFAULT_GEO_TIMEOUT`])

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::GeolocationConfig;

/// Default IP geolocation endpoint.
pub const DEFAULT_LOOKUP_URL: &str = "http://ip-api.com/json";

/// Timeout applied when configuration does not set one.
pub const DEFAULT_GEO_TIMEOUT: Duration = Duration::from_secs(10);

/// Geographic coordinates in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeoError {
    #[error("Geolocation is not supported on this device.")]
    Unsupported,

    /// Position denied or unavailable; carries the platform's reason.
    #[error("Could not get your location: {0}")]
    PermissionOrPosition(String),
}

#[async_trait]
pub trait GeoProvider: Send + Sync + std::fmt::Debug {
    async fn current_position(&self) -> Result<Position, GeoError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Unsupported;

#[async_trait]
impl GeoProvider for Unsupported {
    async fn current_position(&self) -> Result<Position, GeoError> {
        Err(GeoError::Unsupported)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedPosition(pub Position);

#[async_trait]
impl GeoProvider for FixedPosition {
    async fn current_position(&self) -> Result<Position, GeoError> {
        Ok(self.0)
    }
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    status: String,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
    #[serde(default)]
    message: Option<String>,
}

/// IP geolocation over HTTP.
#[derive(Debug, Clone)]
pub struct IpLookup {
    http: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl IpLookup {
    #[must_use]
    pub fn new(http: reqwest::Client, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http,
            url: url.into(),
            timeout,
        }
    }

    async fn lookup(&self) -> Result<Position, GeoError> {
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| GeoError::PermissionOrPosition(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeoError::PermissionOrPosition(format!(
                "lookup service returned {status}"
            )));
        }

        let body: LookupResponse = response
            .json()
            .await
            .map_err(|e| GeoError::PermissionOrPosition(e.to_string()))?;

        match (body.status.as_str(), body.lat, body.lon) {
            ("success", Some(latitude), Some(longitude)) => Ok(Position {
                latitude,
                longitude,
            }),
            _ => Err(GeoError::PermissionOrPosition(
                body.message
                    .unwrap_or_else(|| "Position data not available.".to_string()),
            )),
        }
    }
}

#[async_trait]
impl GeoProvider for IpLookup {
    async fn current_position(&self) -> Result<Position, GeoError> {
        match tokio::time::timeout(self.timeout, self.lookup()).await {
            Ok(result) => result,
            Err(_) => Err(GeoError::PermissionOrPosition(format!(
                "timed out after {:?}",
                self.timeout
            ))),
        }
    }
}

/// Build the provider selected in configuration.
///
/// Unknown provider names, and `fixed` without both coordinates, fall back
/// to [`Unsupported`].
pub fn from_config(config: &GeolocationConfig, http: reqwest::Client) -> Arc<dyn GeoProvider> {
    match config.provider.as_str() {
        "ip" => Arc::new(IpLookup::new(
            http,
            config.lookup_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )),
        "fixed" => match (config.latitude, config.longitude) {
            (Some(latitude), Some(longitude)) => Arc::new(FixedPosition(Position {
                latitude,
                longitude,
            })),
            _ => {
                tracing::warn!(
                    name: "geo.config.incomplete",
                    "Fixed geolocation needs both latitude and longitude; geolocation disabled"
                );
                Arc::new(Unsupported)
            }
        },
        other => {
            if other != "none" {
                tracing::warn!(name: "geo.config.unknown", provider = %other, "Unknown geolocation provider");
            }
            Arc::new(Unsupported)
        }
    }
}
