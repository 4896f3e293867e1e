//! Random/search background images from the Unsplash API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::FetchError;

/// Default Unsplash API root.
pub const DEFAULT_IMAGE_BASE_URL: &str = "https://api.unsplash.com";

/// A background image picked by the image service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundImage {
    pub url: String,
}

/// Source of background images.
#[async_trait]
pub trait ImageSource: Send + Sync + std::fmt::Debug {
    /// Fetch a random image, optionally matching `query`.
    async fn random_image(&self, query: Option<&str>) -> Result<BackgroundImage, FetchError>;
}

#[derive(Debug, Deserialize)]
struct RandomPhoto {
    #[serde(default)]
    urls: Option<PhotoUrls>,
}

#[derive(Debug, Deserialize)]
struct PhotoUrls {
    #[serde(default)]
    regular: Option<String>,
}

/// Client for `GET /photos/random`.
#[derive(Clone)]
pub struct UnsplashClient {
    http: reqwest::Client,
    base_url: String,
    access_key: Option<String>,
}

impl std::fmt::Debug for UnsplashClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnsplashClient")
            .field("base_url", &self.base_url)
            .field("has_access_key", &self.access_key.is_some())
            .finish()
    }
}

impl UnsplashClient {
    #[must_use]
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, access_key: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            access_key: access_key.filter(|k| !k.trim().is_empty()),
        }
    }
}

#[async_trait]
impl ImageSource for UnsplashClient {
    async fn random_image(&self, query: Option<&str>) -> Result<BackgroundImage, FetchError> {
        let Some(key) = &self.access_key else {
            return Err(FetchError::Config { service: "Image search" });
        };

        let url = format!("{}/photos/random", self.base_url.trim_end_matches('/'));
        let mut params = vec![("client_id", key.as_str())];
        if let Some(q) = query.filter(|q| !q.is_empty()) {
            params.push(("query", q));
        }

        tracing::debug!(name: "image.fetch.started", query = ?query, "Fetching background image");

        let response = self.http.get(&url).query(&params).send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(name: "image.fetch.failed", status = %status, "Image service returned error status");
            return Err(FetchError::status(status.as_u16()));
        }

        let body = response.text().await?;
        let photo: RandomPhoto =
            serde_json::from_str(&body).map_err(|e| FetchError::Parse(e.to_string()))?;

        match photo.urls.and_then(|u| u.regular).filter(|u| !u.is_empty()) {
            Some(url) => Ok(BackgroundImage { url }),
            None => Err(FetchError::DomainEmpty(
                "No image found. Please try a different search.".to_string(),
            )),
        }
    }
}
