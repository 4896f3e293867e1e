//! Currency exchange rates from the open.er-api.com service.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::FetchError;

/// Default rate service root.
pub const DEFAULT_CURRENCY_BASE_URL: &str = "https://open.er-api.com/v6";

/// Base currency every rate is expressed against.
pub const BASE_CURRENCY: &str = "EUR";

/// Rates keyed by ISO currency code, as units of that currency per one unit
/// of [`RateTable::base`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    pub base: String,
    pub rates: BTreeMap<String, f64>,
}

/// Source of currency rates.
#[async_trait]
pub trait RateSource: Send + Sync + std::fmt::Debug {
    async fn latest_rates(&self) -> Result<RateTable, FetchError>;
}

#[derive(Debug, Deserialize)]
struct LatestResponse {
    rates: BTreeMap<String, f64>,
}

/// Client for `GET /latest/EUR`.
#[derive(Debug, Clone)]
pub struct ExchangeRateClient {
    http: reqwest::Client,
    base_url: String,
}

impl ExchangeRateClient {
    #[must_use]
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl RateSource for ExchangeRateClient {
    async fn latest_rates(&self) -> Result<RateTable, FetchError> {
        let url = format!(
            "{}/latest/{BASE_CURRENCY}",
            self.base_url.trim_end_matches('/')
        );

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(name: "currency.fetch.failed", status = %status, "Rate service returned error status");
            return Err(FetchError::status(status.as_u16()));
        }

        let body = response.text().await?;
        let latest: LatestResponse =
            serde_json::from_str(&body).map_err(|e| FetchError::Parse(e.to_string()))?;

        if latest.rates.is_empty() {
            return Err(FetchError::DomainEmpty(
                "No currency rates available.".to_string(),
            ));
        }

        tracing::debug!(name: "currency.fetch.completed", count = latest.rates.len(), "Currency rates loaded");

        Ok(RateTable {
            base: BASE_CURRENCY.to_string(),
            rates: latest.rates,
        })
    }
}
