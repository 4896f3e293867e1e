use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::Html,
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use tower_http::trace::TraceLayer;

use tracing::info;

use crate::clients::weather::icon_url;
use crate::config::AppConfig;
use crate::conversion::FamilyKind;
use crate::dashboard::{Dashboard, DashboardView};
use crate::widgets::background::BackgroundStatus;
use crate::widgets::converter::ConverterView;
use crate::widgets::heading::HeadingConfig;
use crate::widgets::links::LinksState;
use crate::widgets::weather::WeatherState;
use crate::widgets::{Calculator, Key, Outcome, ValidationError};

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub dashboard: Arc<Dashboard>,
    pub config: Arc<AppConfig>,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, String)>;

fn unprocessable(err: &ValidationError) -> (StatusCode, String) {
    (StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
}

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    info!(
        name: "config.loaded",
        storage = %config.storage.backend,
        geolocation = %config.geolocation.provider,
        "Configuration loaded"
    );

    let dashboard = Arc::new(Dashboard::from_config(&config)?);

    // Initial weather and currency loads run in the background so the page
    // is served immediately.
    let starting = Arc::clone(&dashboard);
    tokio::spawn(async move { starting.start().await });

    let state = AppState {
        dashboard: Arc::clone(&dashboard),
        config: Arc::clone(&config),
    };
    let app = router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(name: "server.signal.failed", error = %e, "Failed to listen for shutdown signal");
            }
        })
        .await?;

    dashboard.stop();
    info!(name: "server.stopped", "Server stopped");
    Ok(())
}

/// Build the router over `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/dashboard", get(api_dashboard))
        .route("/api/background/random", post(api_background_random))
        .route("/api/background/search", post(api_background_search))
        .route("/api/weather/city", post(api_weather_city))
        .route("/api/weather/locate", post(api_weather_locate))
        .route("/api/converter", get(api_converter).put(api_converter_update))
        .route("/api/converter/refresh", post(api_converter_refresh))
        .route("/api/links", post(api_links_add))
        .route("/api/links/{index}", put(api_links_edit))
        .route("/api/links/{index}/delete", post(api_links_request_delete))
        .route("/api/links/delete/confirm", post(api_links_confirm_delete))
        .route("/api/links/delete/cancel", post(api_links_cancel_delete))
        .route("/api/notes", put(api_notes))
        .route("/api/heading/title", put(api_heading_title))
        .route("/api/heading/color", put(api_heading_color))
        .route("/api/calculator", post(api_calculator))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─────────────────────────────────────────────────────────────────────────────
// API Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Which optional features have credentials configured.
#[derive(Debug, Serialize)]
struct Features {
    images: bool,
    weather: bool,
}

#[derive(Debug, Serialize)]
struct DashboardResponse {
    #[serde(flatten)]
    view: DashboardView,
    features: Features,
}

async fn api_dashboard(State(state): State<AppState>) -> Json<DashboardResponse> {
    Json(DashboardResponse {
        view: state.dashboard.view(),
        features: Features {
            images: state.config.services.unsplash_access_key.is_some(),
            weather: state.config.services.openweather_api_key.is_some(),
        },
    })
}

/// Result of a background fetch.
#[derive(Debug, Serialize)]
struct BackgroundResponse {
    outcome: Outcome,
    url: Option<String>,
    status: BackgroundStatus,
}

#[derive(Debug, Deserialize)]
struct SearchRequest {
    term: String,
}

async fn api_background_random(State(state): State<AppState>) -> Json<BackgroundResponse> {
    let outcome = state.dashboard.background.random().await;
    Json(background_response(&state, outcome))
}

async fn api_background_search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> ApiResult<BackgroundResponse> {
    match state.dashboard.background.search(&req.term).await {
        Outcome::Rejected => Err(unprocessable(&ValidationError::EmptySearchTerm)),
        outcome => Ok(Json(background_response(&state, outcome))),
    }
}

fn background_response(state: &AppState, outcome: Outcome) -> BackgroundResponse {
    BackgroundResponse {
        outcome,
        url: state.dashboard.background_url(),
        status: state.dashboard.background.status(),
    }
}

#[derive(Debug, Serialize)]
struct WeatherResponse {
    outcome: Outcome,
    #[serde(flatten)]
    state: WeatherState,
    forecast: Vec<crate::clients::DailyForecast>,
}

#[derive(Debug, Deserialize)]
struct CityRequest {
    name: String,
}

async fn api_weather_city(
    State(state): State<AppState>,
    Json(req): Json<CityRequest>,
) -> ApiResult<WeatherResponse> {
    match state.dashboard.weather.search_city(&req.name).await {
        Outcome::Rejected => Err(unprocessable(&ValidationError::EmptyCity)),
        outcome => Ok(Json(weather_response(&state, outcome))),
    }
}

async fn api_weather_locate(State(state): State<AppState>) -> Json<WeatherResponse> {
    let outcome = state.dashboard.weather.use_my_location().await;
    Json(weather_response(&state, outcome))
}

fn weather_response(state: &AppState, outcome: Outcome) -> WeatherResponse {
    WeatherResponse {
        outcome,
        state: state.dashboard.weather.state(),
        forecast: state.dashboard.weather.daily_forecast(),
    }
}

async fn api_converter(State(state): State<AppState>) -> Json<ConverterView> {
    Json(state.dashboard.converter.view())
}

/// Partial converter update. A family switch is applied before the other
/// fields, so `{family, input}` converts the input in the new family.
#[derive(Debug, Deserialize)]
struct ConverterUpdate {
    #[serde(default)]
    family: Option<FamilyKind>,
    #[serde(default)]
    input: Option<String>,
    #[serde(default)]
    from: Option<String>,
    #[serde(default)]
    to: Option<String>,
}

async fn api_converter_update(
    State(state): State<AppState>,
    Json(update): Json<ConverterUpdate>,
) -> Json<ConverterView> {
    let converter = &state.dashboard.converter;
    if let Some(kind) = update.family {
        converter.select_family(kind);
    }
    if let Some(from) = update.from {
        converter.set_from(from);
    }
    if let Some(to) = update.to {
        converter.set_to(to);
    }
    if let Some(input) = update.input {
        converter.set_input(input);
    }
    Json(converter.view())
}

async fn api_converter_refresh(State(state): State<AppState>) -> Json<ConverterView> {
    state.dashboard.converter.refresh().await;
    Json(state.dashboard.converter.view())
}

#[derive(Debug, Deserialize)]
struct LinkRequest {
    title: String,
    url: String,
}

async fn api_links_add(
    State(state): State<AppState>,
    Json(req): Json<LinkRequest>,
) -> ApiResult<LinksState> {
    let links = &state.dashboard.links;
    links.add(&req.title, &req.url).map_err(|e| unprocessable(&e))?;
    Ok(Json(links.state()))
}

async fn api_links_edit(
    State(state): State<AppState>,
    Path(index): Path<usize>,
    Json(req): Json<LinkRequest>,
) -> ApiResult<LinksState> {
    let links = &state.dashboard.links;
    links
        .edit(index, &req.title, &req.url)
        .map_err(|e| unprocessable(&e))?;
    Ok(Json(links.state()))
}

async fn api_links_request_delete(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> ApiResult<LinksState> {
    let links = &state.dashboard.links;
    links.request_delete(index).map_err(|e| unprocessable(&e))?;
    Ok(Json(links.state()))
}

async fn api_links_confirm_delete(State(state): State<AppState>) -> ApiResult<LinksState> {
    let links = &state.dashboard.links;
    links.confirm_delete().map_err(|e| unprocessable(&e))?;
    Ok(Json(links.state()))
}

async fn api_links_cancel_delete(State(state): State<AppState>) -> Json<LinksState> {
    state.dashboard.links.cancel_delete();
    Json(state.dashboard.links.state())
}

#[derive(Debug, Deserialize)]
struct NotesRequest {
    text: String,
}

#[derive(Debug, Serialize)]
struct NotesResponse {
    text: String,
}

async fn api_notes(
    State(state): State<AppState>,
    Json(req): Json<NotesRequest>,
) -> Json<NotesResponse> {
    state.dashboard.notes.set(req.text);
    Json(NotesResponse {
        text: state.dashboard.notes.text(),
    })
}

#[derive(Debug, Deserialize)]
struct TitleRequest {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ColorRequest {
    color: String,
}

async fn api_heading_title(
    State(state): State<AppState>,
    Json(req): Json<TitleRequest>,
) -> ApiResult<HeadingConfig> {
    let heading = &state.dashboard.heading;
    heading.rename(&req.title).map_err(|e| unprocessable(&e))?;
    Ok(Json(heading.config()))
}

async fn api_heading_color(
    State(state): State<AppState>,
    Json(req): Json<ColorRequest>,
) -> ApiResult<HeadingConfig> {
    let heading = &state.dashboard.heading;
    heading.set_color(&req.color).map_err(|e| unprocessable(&e))?;
    Ok(Json(heading.config()))
}

#[derive(Debug, Deserialize)]
struct CalculatorRequest {
    key: String,
}

async fn api_calculator(
    State(state): State<AppState>,
    Json(req): Json<CalculatorRequest>,
) -> ApiResult<Calculator> {
    let key: Key = req
        .key
        .parse()
        .map_err(|e: crate::widgets::calculator::UnknownKey| {
            (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
        })?;
    Ok(Json(state.dashboard.press(key)))
}

// ─────────────────────────────────────────────────────────────────────────────
// HTML Shell
// ─────────────────────────────────────────────────────────────────────────────

async fn index(State(state): State<AppState>) -> Html<String> {
    let view = state.dashboard.view();
    Html(html_shell(&view))
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn links_html(links: &LinksState) -> String {
    links
        .links
        .iter()
        .map(|link| {
            let favicon = link
                .favicon_url()
                .map(|src| format!(r#"<img src="{}" alt="" width="16" height="16"> "#, escape_html(&src)))
                .unwrap_or_default();
            format!(
                r#"<li>{favicon}<a href="{}" target="_blank" rel="noopener noreferrer">{}</a></li>"#,
                escape_html(&link.url),
                escape_html(&link.title),
            )
        })
        .collect()
}

fn weather_html(weather: &WeatherState) -> String {
    match (&weather.snapshot, &weather.error) {
        (Some(snapshot), _) => format!(
            r#"<p><img src="{}" alt="" width="50" height="50"> {}, {}: {:.0}°C, {}</p>"#,
            escape_html(&icon_url(&snapshot.current.icon_code)),
            escape_html(&snapshot.location.name),
            escape_html(&snapshot.location.country),
            crate::clients::weather::kelvin_to_celsius(snapshot.current.temperature_kelvin),
            escape_html(&snapshot.current.description),
        ),
        (None, Some(error)) => format!(r#"<p class="error">{}</p>"#, escape_html(error)),
        (None, None) if weather.loading => "<p>Loading weather…</p>".to_string(),
        (None, None) => "<p>Search for a city to see the weather.</p>".to_string(),
    }
}

fn html_shell(view: &DashboardView) -> String {
    let title = escape_html(&view.heading.document_title);
    let heading = escape_html(&view.heading.title);
    let color = escape_html(&view.heading.color);
    let background = view
        .background_url
        .as_deref()
        .map(|url| format!(r#" style="background-image: url('{}')""#, escape_html(url)))
        .unwrap_or_default();
    let links = links_html(&view.links);
    let weather = weather_html(&view.weather);
    let notes = escape_html(&view.notes);
    let time = escape_html(&view.clock.time);
    let date = escape_html(&view.clock.date);

    format!(r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="description" content="Personal start page">
    <title>{title}</title>
</head>
<body{background}>
    <header>
        <h1 id="heading" style="color: {color}">{heading}</h1>
        <p id="clock"><span id="time">{time}</span> <span id="date">{date}</span></p>
    </header>
    <main id="app">
        <section id="weather">{weather}</section>
        <section id="links"><ul>{links}</ul></section>
        <section id="notes"><textarea name="notes">{notes}</textarea></section>
        <section id="calculator"><output>{calculator}</output></section>
    </main>
</body>
</html>"#,
        calculator = escape_html(view.calculator.display()),
    )
}
