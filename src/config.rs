use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::env;

use crate::clients::currency::DEFAULT_CURRENCY_BASE_URL;
use crate::clients::image::DEFAULT_IMAGE_BASE_URL;
use crate::clients::weather::DEFAULT_WEATHER_BASE_URL;
use crate::geo::DEFAULT_LOOKUP_URL;

/// Prefix for layered environment settings, e.g. `STARTPAGE__SERVER__PORT`.
const ENV_PREFIX: &str = "STARTPAGE";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Path of the JSON file backing persistent widget state
    #[arg(long, env = "STORAGE_PATH")]
    pub storage_path: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub services: ServicesConfig,
    pub geolocation: GeolocationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// `file` or `memory`.
    pub backend: String,
    pub path: String,
}

#[derive(Deserialize, Clone)]
pub struct ServicesConfig {
    #[serde(default)]
    pub unsplash_access_key: Option<String>,
    #[serde(default)]
    pub openweather_api_key: Option<String>,
    pub image_base_url: String,
    pub currency_base_url: String,
    pub weather_base_url: String,
    pub request_timeout_secs: u64,
}

impl std::fmt::Debug for ServicesConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServicesConfig")
            .field("has_unsplash_access_key", &self.unsplash_access_key.is_some())
            .field("has_openweather_api_key", &self.openweather_api_key.is_some())
            .field("image_base_url", &self.image_base_url)
            .field("currency_base_url", &self.currency_base_url)
            .field("weather_base_url", &self.weather_base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeolocationConfig {
    /// `ip`, `fixed` or `none`.
    pub provider: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    pub lookup_url: String,
    pub timeout_secs: u64,
}

/// Read an environment variable, treating blank values as unset.
fn non_blank_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        let mut builder = Config::builder();

        // 1. Defaults
        builder = builder
            .set_default("server.port", 3000)?
            .set_default("server.host", "127.0.0.1")?
            .set_default("storage.backend", "file")?
            .set_default("storage.path", "startpage-data.json")?
            .set_default("services.image_base_url", DEFAULT_IMAGE_BASE_URL)?
            .set_default("services.currency_base_url", DEFAULT_CURRENCY_BASE_URL)?
            .set_default("services.weather_base_url", DEFAULT_WEATHER_BASE_URL)?
            .set_default("services.request_timeout_secs", 10)?
            .set_default("geolocation.provider", "ip")?
            .set_default("geolocation.lookup_url", DEFAULT_LOOKUP_URL)?
            .set_default("geolocation.timeout_secs", 10)?;

        // 2. Config file: explicit path must exist, ./startpage.{toml,json,yaml} is optional
        builder = match &cli.config {
            Some(path) => builder.add_source(File::with_name(path)),
            None => builder.add_source(File::with_name("startpage").required(false)),
        };

        // 3. Prefixed environment, e.g. STARTPAGE__SERVICES__OPENWEATHER_API_KEY
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        // 4. Manual overrides: conventional key names and CLI flags
        if let Some(key) = non_blank_env("UNSPLASH_ACCESS_KEY") {
            builder = builder.set_override("services.unsplash_access_key", key)?;
        }
        if let Some(key) = non_blank_env("OPENWEATHER_API_KEY") {
            builder = builder.set_override("services.openweather_api_key", key)?;
        }
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }
        if let Some(path) = cli.storage_path {
            builder = builder.set_override("storage.path", path)?;
        }

        let mut cfg: Self = builder.build()?.try_deserialize()?;

        // A blank key disables the feature, same as no key.
        cfg.services.unsplash_access_key = cfg
            .services
            .unsplash_access_key
            .filter(|k| !k.trim().is_empty());
        cfg.services.openweather_api_key = cfg
            .services
            .openweather_api_key
            .filter(|k| !k.trim().is_empty());

        Ok(cfg)
    }
}
