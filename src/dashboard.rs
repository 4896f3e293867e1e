//! Composition root.
//!
//! [`Dashboard`] wires the store and data clients into every widget
//! controller and owns the shared background channel. The HTTP layer only
//! ever talks to a `Dashboard`.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;

use crate::clients::{
    self, DailyForecast, ExchangeRateClient, ImageSource, OpenWeatherClient, RateSource,
    UnsplashClient, WeatherSource,
};
use crate::config::AppConfig;
use crate::geo::{self, GeoProvider};
use crate::store::{FileStore, KeyValueStore, MemoryStore, StoreError};
use crate::widgets::background::{self, BackgroundStatus};
use crate::widgets::converter::ConverterView;
use crate::widgets::heading::HeadingConfig;
use crate::widgets::links::LinksState;
use crate::widgets::weather::WeatherState;
use crate::widgets::{
    BackgroundController, Calculator, ClockController, ClockReading, ConverterController,
    HeadingController, Key, LinksController, NotesController, WeatherController,
};

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to open storage: {0}")]
    Store(#[from] StoreError),

    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unknown storage backend: {0}")]
    UnknownBackend(String),
}

/// External dependencies of the dashboard.
#[derive(Debug, Clone)]
pub struct Services {
    pub store: Arc<dyn KeyValueStore>,
    pub images: Arc<dyn ImageSource>,
    pub rates: Arc<dyn RateSource>,
    pub weather: Arc<dyn WeatherSource>,
    pub geo: Arc<dyn GeoProvider>,
}

impl Services {
    /// Real clients and storage, as selected by `config`.
    pub fn from_config(config: &AppConfig) -> Result<Self, BuildError> {
        let http = clients::http_client(Duration::from_secs(config.services.request_timeout_secs))?;

        let store: Arc<dyn KeyValueStore> = match config.storage.backend.as_str() {
            "file" => {
                let path = PathBuf::from(&config.storage.path);
                tracing::info!(name: "store.opened", path = %path.display(), "Using file storage");
                Arc::new(FileStore::open(path)?)
            }
            "memory" => {
                tracing::info!(name: "store.opened", "Using in-memory storage");
                Arc::new(MemoryStore::new())
            }
            other => return Err(BuildError::UnknownBackend(other.to_string())),
        };

        let services = &config.services;
        if services.unsplash_access_key.is_none() {
            tracing::warn!(name: "config.key.missing", service = "images", "No Unsplash access key; background search disabled");
        }
        if services.openweather_api_key.is_none() {
            tracing::warn!(name: "config.key.missing", service = "weather", "No OpenWeather API key; weather disabled");
        }

        Ok(Self {
            store,
            images: Arc::new(UnsplashClient::new(
                http.clone(),
                services.image_base_url.clone(),
                services.unsplash_access_key.clone(),
            )),
            rates: Arc::new(ExchangeRateClient::new(
                http.clone(),
                services.currency_base_url.clone(),
            )),
            weather: Arc::new(OpenWeatherClient::new(
                http.clone(),
                services.weather_base_url.clone(),
                services.openweather_api_key.clone(),
            )),
            geo: geo::from_config(&config.geolocation, http),
        })
    }
}

/// Serializable snapshot of every widget.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub heading: HeadingConfig,
    pub clock: ClockReading,
    pub background_url: Option<String>,
    pub background: BackgroundStatus,
    pub weather: WeatherState,
    pub forecast: Vec<DailyForecast>,
    pub converter: ConverterView,
    pub links: LinksState,
    pub notes: String,
    pub calculator: Calculator,
}

#[derive(Debug)]
pub struct Dashboard {
    pub background: BackgroundController,
    pub weather: WeatherController,
    pub converter: ConverterController,
    pub links: LinksController,
    pub notes: NotesController,
    pub heading: HeadingController,
    pub clock: ClockController,
    calculator: Mutex<Calculator>,
    background_rx: watch::Receiver<Option<String>>,
}

impl Dashboard {
    /// Hydrate every widget from `services.store`. No network I/O happens
    /// until [`Dashboard::start`].
    #[must_use]
    pub fn new(services: Services) -> Self {
        let Services {
            store,
            images,
            rates,
            weather,
            geo,
        } = services;

        let (background_tx, background_rx) = background::channel(store.as_ref());

        Self {
            background: BackgroundController::new(Arc::clone(&store), images, background_tx),
            weather: WeatherController::new(Arc::clone(&store), weather, geo),
            converter: ConverterController::new(rates),
            links: LinksController::new(Arc::clone(&store)),
            notes: NotesController::new(Arc::clone(&store)),
            heading: HeadingController::new(store),
            clock: ClockController::new(),
            calculator: Mutex::new(Calculator::new()),
            background_rx,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, BuildError> {
        Ok(Self::new(Services::from_config(config)?))
    }

    /// Start the clock and run the initial weather and currency loads
    /// concurrently. Failures end up in each widget's error state.
    pub async fn start(&self) {
        self.clock.start();
        let (weather, rates) = tokio::join!(self.weather.start(), self.converter.start());
        tracing::info!(name: "dashboard.started", weather = ?weather, rates = ?rates, "Dashboard started");
    }

    /// Stop the clock and drop results of any in-flight request.
    pub fn stop(&self) {
        self.clock.stop();
        self.weather.stop();
        self.converter.stop();
        self.background.stop();
        tracing::info!(name: "dashboard.stopped", "Dashboard stopped");
    }

    /// Watch the current background URL.
    pub fn subscribe_background(&self) -> watch::Receiver<Option<String>> {
        self.background_rx.clone()
    }

    #[must_use]
    pub fn background_url(&self) -> Option<String> {
        self.background_rx.borrow().clone()
    }

    /// Press a calculator key and return the resulting state.
    pub fn press(&self, key: Key) -> Calculator {
        let mut calculator = self.calculator.lock().unwrap_or_else(PoisonError::into_inner);
        calculator.press(key);
        calculator.clone()
    }

    #[must_use]
    pub fn calculator(&self) -> Calculator {
        self.calculator
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn view(&self) -> DashboardView {
        DashboardView {
            heading: self.heading.config(),
            clock: self.clock.reading(),
            background_url: self.background_url(),
            background: self.background.status(),
            weather: self.weather.state(),
            forecast: self.weather.daily_forecast(),
            converter: self.converter.view(),
            links: self.links.state(),
            notes: self.notes.text(),
            calculator: self.calculator(),
        }
    }
}
