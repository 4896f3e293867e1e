//! Read-only HTTP clients for the dashboard's third-party data.
//!
//! Each client sits behind a small `async_trait` so widget controllers can
//! be driven by fakes in tests:
//!
//! - [`ImageSource`] / [`UnsplashClient`]: background images
//! - [`RateSource`] / [`ExchangeRateClient`]: currency rates
//! - [`WeatherSource`] / [`OpenWeatherClient`]: current weather and forecast
//!
//! All of them fail with [`FetchError`].

pub mod currency;
pub mod error;
pub mod image;
pub mod weather;

pub use currency::{BASE_CURRENCY, ExchangeRateClient, RateSource, RateTable};
pub use error::FetchError;
pub use image::{BackgroundImage, ImageSource, UnsplashClient};
pub use weather::{DailyForecast, LocationQuery, OpenWeatherClient, WeatherSnapshot, WeatherSource};

use std::time::Duration;

/// Shared HTTP client for all outbound requests.
pub fn http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
}
