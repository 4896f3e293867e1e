//! Weather widget controller.
//!
//! Startup is a small state machine:
//!
//! ```text
//! start() ── persisted location? ──yes──▶ fetch(location)
//!                   │
//!                   no
//!                   ▼
//!            geolocate ──ok──▶ fetch(coords)
//!                   │
//!                  err ──▶ error state
//! ```
//!
//! Every successful fetch persists its location descriptor, replacing the
//! previous one. Any failure clears the snapshot and records an error.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::Local;
use serde::Serialize;

use super::{Outcome, RequestGuard, ValidationError};
use crate::clients::weather::daily_forecast;
use crate::clients::{DailyForecast, LocationQuery, WeatherSnapshot, WeatherSource};
use crate::geo::GeoProvider;
use crate::store::{KeyValueStore, keys, load_json, save_json};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WeatherState {
    pub loading: bool,
    pub error: Option<String>,
    pub snapshot: Option<WeatherSnapshot>,
}

#[derive(Debug)]
pub struct WeatherController {
    store: Arc<dyn KeyValueStore>,
    source: Arc<dyn WeatherSource>,
    geo: Arc<dyn GeoProvider>,
    state: RwLock<WeatherState>,
    guard: RequestGuard,
}

impl WeatherController {
    #[must_use]
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        source: Arc<dyn WeatherSource>,
        geo: Arc<dyn GeoProvider>,
    ) -> Self {
        Self {
            store,
            source,
            geo,
            state: RwLock::new(WeatherState::default()),
            guard: RequestGuard::new(),
        }
    }

    /// Load weather for the persisted location, or the current position when
    /// nothing is persisted.
    pub async fn start(&self) -> Outcome {
        match load_json::<LocationQuery>(self.store.as_ref(), keys::WEATHER_LOCATION) {
            Some(query) => {
                tracing::debug!(name: "weather.start.persisted", query = ?query, "Using last location");
                self.run(Some(query)).await
            }
            None => self.run(None).await,
        }
    }

    /// Look up weather for a city by name. A blank name is rejected.
    pub async fn search_city(&self, name: &str) -> Outcome {
        let name = name.trim();
        if name.is_empty() {
            let err = ValidationError::EmptyCity;
            tracing::debug!(name: "weather.search.rejected", reason = %err, "Rejected city search");
            self.set_state(WeatherState {
                error: Some(err.to_string()),
                ..self.state()
            });
            return Outcome::Rejected;
        }
        self.run(Some(LocationQuery::City {
            name: name.to_string(),
        }))
        .await
    }

    /// Look up weather for the device's current position.
    pub async fn use_my_location(&self) -> Outcome {
        self.run(None).await
    }

    /// `query` of `None` means "geolocate first".
    async fn run(&self, query: Option<LocationQuery>) -> Outcome {
        self.guard.resume();
        let ticket = self.guard.begin();
        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            state.loading = true;
            state.error = None;
        }

        let query = match query {
            Some(query) => query,
            None => {
                let position = self.geo.current_position().await;
                if !self.guard.is_current(ticket) {
                    return self.superseded(ticket);
                }
                match position {
                    Ok(p) => LocationQuery::Coords {
                        lat: p.latitude,
                        lon: p.longitude,
                    },
                    Err(e) => {
                        tracing::warn!(name: "weather.geolocation.failed", error = %e, "Geolocation failed");
                        return self.fail(e.to_string());
                    }
                }
            }
        };

        let result = self.source.fetch(&query).await;
        if !self.guard.is_current(ticket) {
            return self.superseded(ticket);
        }

        match result {
            Ok(snapshot) => {
                save_json(self.store.as_ref(), keys::WEATHER_LOCATION, &query);
                self.set_state(WeatherState {
                    loading: false,
                    error: None,
                    snapshot: Some(snapshot),
                });
                Outcome::Applied
            }
            Err(e) => {
                tracing::warn!(name: "weather.fetch.failed", query = ?query, error = %e, "Error fetching weather");
                self.fail(e.user_message())
            }
        }
    }

    fn fail(&self, message: String) -> Outcome {
        self.set_state(WeatherState {
            loading: false,
            error: Some(message),
            snapshot: None,
        });
        Outcome::Failed
    }

    fn superseded(&self, ticket: u64) -> Outcome {
        tracing::debug!(name: "weather.fetch.superseded", ticket, "Dropped stale weather result");
        Outcome::Superseded
    }

    /// Drop any in-flight request.
    pub fn stop(&self) {
        self.guard.stop();
        self.state.write().unwrap_or_else(PoisonError::into_inner).loading = false;
    }

    #[must_use]
    pub fn state(&self) -> WeatherState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Five-day view of the current snapshot's forecast, in local time.
    #[must_use]
    pub fn daily_forecast(&self) -> Vec<DailyForecast> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state
            .snapshot
            .as_ref()
            .and_then(|s| s.forecast.as_deref())
            .map(|entries| daily_forecast(entries, &Local::now()))
            .unwrap_or_default()
    }

    fn set_state(&self, state: WeatherState) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = state;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::clients::FetchError;
    use crate::clients::weather::{Conditions, Location};
    use crate::geo::Unsupported;
    use crate::store::MemoryStore;

    #[derive(Debug, Default)]
    struct StaticWeather {
        calls: AtomicUsize,
    }

    impl StaticWeather {
        fn ok() -> Self {
            Self::default()
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl WeatherSource for StaticWeather {
        async fn fetch(&self, query: &LocationQuery) -> Result<WeatherSnapshot, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let name = match query {
                LocationQuery::City { name } => name.clone(),
                LocationQuery::Coords { .. } => "Here".to_string(),
            };
            Ok(WeatherSnapshot {
                location: Location {
                    name,
                    country: "GB".to_string(),
                },
                current: Conditions {
                    temperature_kelvin: 288.15,
                    description: "light rain".to_string(),
                    icon_code: "10d".to_string(),
                },
                forecast: None,
            })
        }
    }

    #[tokio::test]
    async fn test_no_location_and_no_geolocation_is_an_error_state() {
        let store = Arc::new(MemoryStore::new());
        let weather = WeatherController::new(store, Arc::new(StaticWeather::ok()), Arc::new(Unsupported));

        assert_eq!(weather.start().await, Outcome::Failed);
        let state = weather.state();
        assert!(!state.loading);
        assert_eq!(state.snapshot, None);
        assert_eq!(
            state.error.as_deref(),
            Some("Geolocation is not supported on this device.")
        );
    }

    #[tokio::test]
    async fn test_blank_city_rejected_without_fetch() {
        let store = Arc::new(MemoryStore::new());
        let source = Arc::new(StaticWeather::ok());
        let weather = WeatherController::new(store, Arc::<StaticWeather>::clone(&source), Arc::new(Unsupported));

        assert_eq!(weather.search_city("  ").await, Outcome::Rejected);
        assert_eq!(source.calls(), 0);
        assert_eq!(weather.state().error.as_deref(), Some("Please enter a city name."));
    }

    #[tokio::test]
    async fn test_city_search_persists_location_for_next_start() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let source = Arc::new(StaticWeather::ok());
        let weather = WeatherController::new(Arc::clone(&store), Arc::<StaticWeather>::clone(&source), Arc::new(Unsupported));

        assert_eq!(weather.search_city(" London ").await, Outcome::Applied);
        assert_eq!(
            load_json::<LocationQuery>(store.as_ref(), keys::WEATHER_LOCATION),
            Some(LocationQuery::City {
                name: "London".to_string()
            })
        );

        let restarted = WeatherController::new(store, source, Arc::new(Unsupported));
        assert_eq!(restarted.start().await, Outcome::Applied);
        let snapshot = restarted.state().snapshot.unwrap();
        assert_eq!(snapshot.location.name, "London");
        assert!(restarted.daily_forecast().is_empty());
    }
}
