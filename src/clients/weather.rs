//! Current conditions and 5-day/3-hour forecast from the OpenWeather API.
//!
//! A fetch issues the current-conditions and forecast requests concurrently
//! and waits for both. The two halves fail differently:
//!
//! - current conditions are required; their failure fails the whole fetch,
//! - the forecast is optional; its failure is logged and the snapshot is
//!   returned with `forecast: None`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use super::FetchError;

/// Default OpenWeather API root.
pub const DEFAULT_WEATHER_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// Number of future days shown by the daily forecast.
pub const FORECAST_DAYS: usize = 5;

/// Where to fetch weather for. Also the persisted "last location" format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LocationQuery {
    City { name: String },
    Coords { lat: f64, lon: f64 },
}

impl LocationQuery {
    fn params(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::City { name } => vec![("q", name.clone())],
            Self::Coords { lat, lon } => vec![("lat", lat.to_string()), ("lon", lon.to_string())],
        }
    }
}

/// Place name reported by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub country: String,
}

/// Current weather conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conditions {
    pub temperature_kelvin: f64,
    pub description: String,
    pub icon_code: String,
}

/// One 3-hour forecast slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    /// Unix timestamp (seconds).
    pub timestamp_seconds: i64,
    pub temperature_kelvin: f64,
    pub description: String,
    pub icon_code: String,
}

/// Result of a successful weather fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub location: Location,
    pub current: Conditions,
    /// `None` when the forecast request failed.
    pub forecast: Option<Vec<ForecastEntry>>,
}

/// Forecast summary for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub day_of_week: String,
    pub temperature_celsius: i32,
    pub description: String,
    pub icon_code: String,
}

/// Source of weather snapshots.
#[async_trait]
pub trait WeatherSource: Send + Sync + std::fmt::Debug {
    async fn fetch(&self, query: &LocationQuery) -> Result<WeatherSnapshot, FetchError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire format
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct WireCondition {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct WireMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct WireSys {
    #[serde(default)]
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireCurrent {
    name: String,
    sys: WireSys,
    weather: Vec<WireCondition>,
    main: WireMain,
}

#[derive(Debug, Deserialize)]
struct WireForecastItem {
    dt: i64,
    main: WireMain,
    weather: Vec<WireCondition>,
}

#[derive(Debug, Deserialize)]
struct WireForecast {
    list: Vec<WireForecastItem>,
}

/// The provider reports its own status as `cod`, either a string or a number.
fn provider_code(body: &str) -> Option<u16> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("cod")? {
        serde_json::Value::String(s) => s.parse().ok(),
        serde_json::Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        _ => None,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Client
// ─────────────────────────────────────────────────────────────────────────────

/// Client for the `/weather` and `/forecast` endpoints.
#[derive(Clone)]
pub struct OpenWeatherClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl std::fmt::Debug for OpenWeatherClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenWeatherClient")
            .field("base_url", &self.base_url)
            .field("has_api_key", &self.api_key.is_some())
            .finish()
    }
}

impl OpenWeatherClient {
    #[must_use]
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    async fn get(
        &self,
        endpoint: &str,
        query: &LocationQuery,
        key: &str,
    ) -> Result<(reqwest::StatusCode, String), FetchError> {
        let url = format!("{}/{endpoint}", self.base_url.trim_end_matches('/'));
        let mut params = query.params();
        params.push(("appid", key.to_string()));
        params.push(("lang", "en".to_string()));

        let response = self.http.get(&url).query(&params).send().await?;
        let status = response.status();
        let body = response.text().await?;
        Ok((status, body))
    }

    async fn current(&self, query: &LocationQuery, key: &str) -> Result<(Location, Conditions), FetchError> {
        let (status, body) = self.get("weather", query, key).await?;
        if !status.is_success() {
            if provider_code(&body) == Some(404) || status == reqwest::StatusCode::NOT_FOUND {
                return Err(FetchError::NotFound("City not found.".to_string()));
            }
            return Err(FetchError::status(status.as_u16()));
        }

        let wire: WireCurrent =
            serde_json::from_str(&body).map_err(|e| FetchError::Parse(e.to_string()))?;
        let Some(condition) = wire.weather.into_iter().next() else {
            return Err(FetchError::DomainEmpty(
                "No current conditions reported for this location.".to_string(),
            ));
        };

        Ok((
            Location {
                name: wire.name,
                country: wire.sys.country.unwrap_or_default(),
            },
            Conditions {
                temperature_kelvin: wire.main.temp,
                description: condition.description,
                icon_code: condition.icon,
            },
        ))
    }

    async fn forecast(&self, query: &LocationQuery, key: &str) -> Result<Vec<ForecastEntry>, FetchError> {
        let (status, body) = self.get("forecast", query, key).await?;
        if !status.is_success() {
            return Err(FetchError::status(status.as_u16()));
        }

        let wire: WireForecast =
            serde_json::from_str(&body).map_err(|e| FetchError::Parse(e.to_string()))?;

        Ok(wire
            .list
            .into_iter()
            .filter_map(|item| {
                let condition = item.weather.into_iter().next()?;
                Some(ForecastEntry {
                    timestamp_seconds: item.dt,
                    temperature_kelvin: item.main.temp,
                    description: condition.description,
                    icon_code: condition.icon,
                })
            })
            .collect())
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherClient {
    async fn fetch(&self, query: &LocationQuery) -> Result<WeatherSnapshot, FetchError> {
        let Some(key) = self.api_key.as_deref() else {
            return Err(FetchError::Config { service: "Weather" });
        };

        tracing::debug!(name: "weather.fetch.started", query = ?query, "Fetching weather");

        let (current, forecast) =
            futures::future::join(self.current(query, key), self.forecast(query, key)).await;

        let (location, current) = current?;
        let forecast = match forecast {
            Ok(entries) => Some(entries),
            Err(e) => {
                tracing::warn!(name: "weather.forecast.failed", error = %e, "Failed to fetch forecast data");
                None
            }
        };

        tracing::info!(
            name: "weather.fetch.completed",
            location = %location.name,
            has_forecast = forecast.is_some(),
            "Weather loaded"
        );

        Ok(WeatherSnapshot {
            location,
            current,
            forecast,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Presentation helpers
// ─────────────────────────────────────────────────────────────────────────────

/// URL of the provider's icon image for `code`.
#[must_use]
pub fn icon_url(code: &str) -> String {
    format!("https://openweathermap.org/img/wn/{code}@2x.png")
}

#[must_use]
pub fn kelvin_to_celsius(kelvin: f64) -> f64 {
    kelvin - 273.15
}

/// Collapse 3-hour forecast slots into one entry per future day.
///
/// The first slot of each calendar day (in `now`'s timezone) represents that
/// day. Today is skipped and at most [`FORECAST_DAYS`] days are returned.
#[must_use]
pub fn daily_forecast<Tz: TimeZone>(entries: &[ForecastEntry], now: &DateTime<Tz>) -> Vec<DailyForecast> {
    let tz = now.timezone();
    let today = now.date_naive();

    let mut days: BTreeMap<NaiveDate, &ForecastEntry> = BTreeMap::new();
    for entry in entries {
        let Some(at) = DateTime::from_timestamp(entry.timestamp_seconds, 0) else {
            continue;
        };
        let date = at.with_timezone(&tz).date_naive();
        days.entry(date).or_insert(entry);
    }

    days.into_iter()
        .filter(|(date, _)| *date != today)
        .take(FORECAST_DAYS)
        .map(|(date, entry)| DailyForecast {
            date,
            day_of_week: date.format("%A").to_string(),
            temperature_celsius: kelvin_to_celsius(entry.temperature_kelvin).round() as i32,
            description: entry.description.clone(),
            icon_code: entry.icon_code.clone(),
        })
        .collect()
}
