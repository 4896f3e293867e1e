//! Fakes shared by the integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use startpage::clients::weather::{Conditions, ForecastEntry, Location};
use startpage::clients::{
    BackgroundImage, FetchError, ImageSource, LocationQuery, RateSource, RateTable,
    WeatherSnapshot, WeatherSource,
};
use startpage::dashboard::Services;
use startpage::geo::{FixedPosition, GeoProvider, Position, Unsupported};
use startpage::store::{KeyValueStore, MemoryStore};

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn spawn_mock(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

// ─────────────────────────────────────────────────────────────────────────────
// Images
// ─────────────────────────────────────────────────────────────────────────────

/// Always returns the same result.
#[derive(Debug)]
pub struct StaticImages(pub Result<String, FetchError>);

#[async_trait]
impl ImageSource for StaticImages {
    async fn random_image(&self, _query: Option<&str>) -> Result<BackgroundImage, FetchError> {
        self.0.clone().map(|url| BackgroundImage { url })
    }
}

/// The first call blocks until `release()`; later calls answer immediately.
/// Every call returns `https://img.test/<query>`.
#[derive(Debug, Default)]
pub struct GatedImages {
    gate: Notify,
    calls: AtomicUsize,
}

impl GatedImages {
    pub fn release(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl ImageSource for GatedImages {
    async fn random_image(&self, query: Option<&str>) -> Result<BackgroundImage, FetchError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            self.gate.notified().await;
        }
        Ok(BackgroundImage {
            url: format!("https://img.test/{}", query.unwrap_or("random")),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rates
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct StaticRates(pub Result<RateTable, FetchError>);

#[async_trait]
impl RateSource for StaticRates {
    async fn latest_rates(&self) -> Result<RateTable, FetchError> {
        self.0.clone()
    }
}

/// The first call blocks until `release()`. Call `n` answers with
/// `tables[n]`, or the last table once the list runs out.
#[derive(Debug)]
pub struct GatedRates {
    gate: Notify,
    calls: AtomicUsize,
    tables: Vec<RateTable>,
}

impl GatedRates {
    pub fn new(tables: Vec<RateTable>) -> Self {
        Self {
            gate: Notify::new(),
            calls: AtomicUsize::new(0),
            tables,
        }
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl RateSource for GatedRates {
    async fn latest_rates(&self) -> Result<RateTable, FetchError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call == 0 {
            self.gate.notified().await;
        }
        Ok(self.tables[call.min(self.tables.len() - 1)].clone())
    }
}

pub fn rate_table() -> RateTable {
    RateTable {
        base: "EUR".to_string(),
        rates: BTreeMap::from([
            ("EUR".to_string(), 1.0),
            ("GBP".to_string(), 0.86),
            ("JPY".to_string(), 160.0),
            ("USD".to_string(), 1.08),
        ]),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Weather
// ─────────────────────────────────────────────────────────────────────────────

pub fn snapshot(name: &str) -> WeatherSnapshot {
    WeatherSnapshot {
        location: Location {
            name: name.to_string(),
            country: "NO".to_string(),
        },
        current: Conditions {
            temperature_kelvin: 283.15,
            description: "few clouds".to_string(),
            icon_code: "02d".to_string(),
        },
        forecast: Some(vec![ForecastEntry {
            timestamp_seconds: 4_102_444_800,
            temperature_kelvin: 280.15,
            description: "clear sky".to_string(),
            icon_code: "01d".to_string(),
        }]),
    }
}

/// Answers every city except the ones listed as unknown, and names
/// coordinate lookups "Here". Records every query.
#[derive(Debug, Default)]
pub struct FakeWeather {
    pub unknown: Vec<String>,
    queries: Mutex<Vec<LocationQuery>>,
}

impl FakeWeather {
    pub fn with_unknown(cities: &[&str]) -> Self {
        Self {
            unknown: cities.iter().map(ToString::to_string).collect(),
            ..Self::default()
        }
    }

    pub fn queries(&self) -> Vec<LocationQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl WeatherSource for FakeWeather {
    async fn fetch(&self, query: &LocationQuery) -> Result<WeatherSnapshot, FetchError> {
        self.queries.lock().unwrap().push(query.clone());
        match query {
            LocationQuery::City { name } if self.unknown.contains(name) => {
                Err(FetchError::NotFound("City not found.".to_string()))
            }
            LocationQuery::City { name } => Ok(snapshot(name)),
            LocationQuery::Coords { .. } => Ok(snapshot("Here")),
        }
    }
}

/// The first call blocks until `release()`; every city answers by name.
#[derive(Debug, Default)]
pub struct GatedWeather {
    gate: Notify,
    calls: AtomicUsize,
}

impl GatedWeather {
    pub fn release(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl WeatherSource for GatedWeather {
    async fn fetch(&self, query: &LocationQuery) -> Result<WeatherSnapshot, FetchError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            self.gate.notified().await;
        }
        match query {
            LocationQuery::City { name } => Ok(snapshot(name)),
            LocationQuery::Coords { .. } => Ok(snapshot("Here")),
        }
    }
}

pub fn oslo() -> Arc<dyn GeoProvider> {
    Arc::new(FixedPosition(Position {
        latitude: 59.91,
        longitude: 10.75,
    }))
}

// ─────────────────────────────────────────────────────────────────────────────
// Services
// ─────────────────────────────────────────────────────────────────────────────

/// In-memory services where every fetch succeeds.
pub fn services() -> Services {
    services_with_store(Arc::new(MemoryStore::new()))
}

pub fn services_with_store(store: Arc<dyn KeyValueStore>) -> Services {
    Services {
        store,
        images: Arc::new(StaticImages(Ok("https://img.test/photo.jpg".to_string()))),
        rates: Arc::new(StaticRates(Ok(rate_table()))),
        weather: Arc::new(FakeWeather::default()),
        geo: Arc::new(Unsupported),
    }
}
