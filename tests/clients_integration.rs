mod common;

use std::collections::HashMap;
use std::time::Duration;

use axum::{Json, Router, extract::Query, http::StatusCode, routing::get};
use serde_json::{Value, json};

use common::spawn_mock;
use startpage::clients::{
    ExchangeRateClient, FetchError, ImageSource, LocationQuery, OpenWeatherClient, RateSource,
    UnsplashClient, WeatherSource, http_client,
};
use startpage::geo::{GeoError, GeoProvider, IpLookup};

fn http() -> reqwest::Client {
    http_client(Duration::from_secs(5)).unwrap()
}

/// Nothing listens here; a client that reaches the network fails with Transport.
const DEAD_URL: &str = "http://127.0.0.1:9";

// ─────────────────────────────────────────────────────────────────────────────
// Images
// ─────────────────────────────────────────────────────────────────────────────

async fn photos_random(Query(params): Query<HashMap<String, String>>) -> (StatusCode, Json<Value>) {
    if params.get("client_id").map(String::as_str) != Some("test-key") {
        return (StatusCode::UNAUTHORIZED, Json(json!({"errors": ["OAuth error"]})));
    }
    match params.get("query").map(String::as_str) {
        Some("nothing") => (StatusCode::OK, Json(json!({"id": "x"}))),
        Some(q) => (
            StatusCode::OK,
            Json(json!({"urls": {"regular": format!("https://images.test/{q}.jpg")}})),
        ),
        None => (
            StatusCode::OK,
            Json(json!({"urls": {"regular": "https://images.test/random.jpg"}})),
        ),
    }
}

#[tokio::test]
async fn test_image_client() {
    let base = spawn_mock(Router::new().route("/photos/random", get(photos_random))).await;
    let client = UnsplashClient::new(http(), base.clone(), Some("test-key".to_string()));

    let image = client.random_image(Some("mountains")).await.unwrap();
    assert_eq!(image.url, "https://images.test/mountains.jpg");

    let image = client.random_image(None).await.unwrap();
    assert_eq!(image.url, "https://images.test/random.jpg");

    let err = client.random_image(Some("nothing")).await.unwrap_err();
    assert!(matches!(err, FetchError::DomainEmpty(_)));

    let wrong_key = UnsplashClient::new(http(), base, Some("other".to_string()));
    let err = wrong_key.random_image(None).await.unwrap_err();
    assert_eq!(err, FetchError::status(401));
}

#[tokio::test]
async fn test_image_client_without_key_skips_network() {
    for key in [None, Some("   ".to_string())] {
        let client = UnsplashClient::new(http(), DEAD_URL, key);
        let err = client.random_image(Some("sea")).await.unwrap_err();
        assert_eq!(err, FetchError::Config { service: "Image search" });
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Currency
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_currency_client() {
    let router = Router::new().route(
        "/latest/EUR",
        get(|| async {
            Json(json!({
                "result": "success",
                "base_code": "EUR",
                "rates": {"EUR": 1, "USD": 1.08, "GBP": 0.86}
            }))
        }),
    );
    let base = spawn_mock(router).await;

    let table = ExchangeRateClient::new(http(), base).latest_rates().await.unwrap();
    assert_eq!(table.base, "EUR");
    assert_eq!(table.rates.len(), 3);
    assert!((table.rates["USD"] - 1.08).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_currency_client_errors() {
    let router = Router::new().route(
        "/latest/EUR",
        get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
    );
    let base = spawn_mock(router).await;
    let err = ExchangeRateClient::new(http(), base).latest_rates().await.unwrap_err();
    assert_eq!(err, FetchError::status(503));

    let router = Router::new().route("/latest/EUR", get(|| async { Json(json!({"rates": {}})) }));
    let base = spawn_mock(router).await;
    let err = ExchangeRateClient::new(http(), base).latest_rates().await.unwrap_err();
    assert!(matches!(err, FetchError::DomainEmpty(_)));

    let err = ExchangeRateClient::new(http(), DEAD_URL).latest_rates().await.unwrap_err();
    assert!(matches!(err, FetchError::Transport { status: None, .. }));
}

// ─────────────────────────────────────────────────────────────────────────────
// Weather
// ─────────────────────────────────────────────────────────────────────────────

async fn current_weather(Query(params): Query<HashMap<String, String>>) -> (StatusCode, Json<Value>) {
    assert_eq!(params.get("lang").map(String::as_str), Some("en"));
    let name = match (params.get("q"), params.get("lat")) {
        (Some(q), _) if q == "Atlantis" => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({"cod": "404", "message": "city not found"})),
            );
        }
        (Some(q), _) => q.clone(),
        (None, Some(_)) => "Oslo".to_string(),
        (None, None) => return (StatusCode::BAD_REQUEST, Json(json!({"cod": "400"}))),
    };
    (
        StatusCode::OK,
        Json(json!({
            "name": name,
            "sys": {"country": "NO"},
            "weather": [{"description": "light snow", "icon": "13d"}],
            "main": {"temp": 271.15}
        })),
    )
}

async fn forecast(Query(params): Query<HashMap<String, String>>) -> (StatusCode, Json<Value>) {
    if params.get("q").map(String::as_str) == Some("Bergen") {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"cod": "500"})));
    }
    (
        StatusCode::OK,
        Json(json!({
            "cod": "200",
            "list": [
                {"dt": 1_792_454_400, "main": {"temp": 272.15}, "weather": [{"description": "snow", "icon": "13d"}]},
                {"dt": 1_792_465_200, "main": {"temp": 273.15}, "weather": [{"description": "clouds", "icon": "04d"}]}
            ]
        })),
    )
}

async fn weather_mock() -> String {
    spawn_mock(
        Router::new()
            .route("/weather", get(current_weather))
            .route("/forecast", get(forecast)),
    )
    .await
}

fn city(name: &str) -> LocationQuery {
    LocationQuery::City {
        name: name.to_string(),
    }
}

#[tokio::test]
async fn test_weather_by_city_and_coords() {
    let client = OpenWeatherClient::new(http(), weather_mock().await, Some("test-key".to_string()));

    let snapshot = client.fetch(&city("Tromsø")).await.unwrap();
    assert_eq!(snapshot.location.name, "Tromsø");
    assert_eq!(snapshot.location.country, "NO");
    assert_eq!(snapshot.current.icon_code, "13d");
    assert_eq!(snapshot.forecast.as_ref().map(Vec::len), Some(2));

    let snapshot = client
        .fetch(&LocationQuery::Coords { lat: 59.91, lon: 10.75 })
        .await
        .unwrap();
    assert_eq!(snapshot.location.name, "Oslo");
}

#[tokio::test]
async fn test_weather_forecast_failure_is_not_fatal() {
    let client = OpenWeatherClient::new(http(), weather_mock().await, Some("test-key".to_string()));

    let snapshot = client.fetch(&city("Bergen")).await.unwrap();
    assert_eq!(snapshot.location.name, "Bergen");
    assert_eq!(snapshot.forecast, None);
}

#[tokio::test]
async fn test_weather_unknown_city_is_not_found() {
    let client = OpenWeatherClient::new(http(), weather_mock().await, Some("test-key".to_string()));

    let err = client.fetch(&city("Atlantis")).await.unwrap_err();
    assert_eq!(err, FetchError::NotFound("City not found.".to_string()));
    assert_eq!(err.user_message(), "City not found.");
}

#[tokio::test]
async fn test_weather_without_key_skips_network() {
    let client = OpenWeatherClient::new(http(), DEAD_URL, None);
    let err = client.fetch(&city("Oslo")).await.unwrap_err();
    assert_eq!(err, FetchError::Config { service: "Weather" });
}

// ─────────────────────────────────────────────────────────────────────────────
// Geolocation
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_ip_lookup() {
    let router = Router::new()
        .route(
            "/ok",
            get(|| async { Json(json!({"status": "success", "lat": 52.52, "lon": 13.4})) }),
        )
        .route(
            "/fail",
            get(|| async { Json(json!({"status": "fail", "message": "private range"})) }),
        );
    let base = spawn_mock(router).await;

    let geo = IpLookup::new(http(), format!("{base}/ok"), Duration::from_secs(5));
    let position = geo.current_position().await.unwrap();
    assert!((position.latitude - 52.52).abs() < f64::EPSILON);

    let geo = IpLookup::new(http(), format!("{base}/fail"), Duration::from_secs(5));
    assert_eq!(
        geo.current_position().await,
        Err(GeoError::PermissionOrPosition("private range".to_string()))
    );
}

#[tokio::test]
async fn test_ip_lookup_times_out() {
    let router = Router::new().route(
        "/slow",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({"status": "success", "lat": 52.52, "lon": 13.4}))
        }),
    );
    let base = spawn_mock(router).await;

    let geo = IpLookup::new(http(), format!("{base}/slow"), Duration::from_millis(100));
    let err = geo.current_position().await.unwrap_err();
    assert_eq!(
        err,
        GeoError::PermissionOrPosition("timed out after 100ms".to_string())
    );
}
