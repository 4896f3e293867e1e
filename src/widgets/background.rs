//! Background image controller.
//!
//! The current background URL is the one piece of state shared across
//! widgets. The composition root creates the channel with [`channel`],
//! hands the sender to this controller, and keeps receivers for the views.

use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;
use tokio::sync::watch;

use super::{Outcome, RequestGuard, ValidationError};
use crate::clients::ImageSource;
use crate::store::{KeyValueStore, keys};

/// Loading/error line shown under the background controls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BackgroundStatus {
    pub loading: bool,
    pub error: Option<String>,
}

/// Create the shared background channel, seeded with the persisted URL.
pub fn channel(
    store: &dyn KeyValueStore,
) -> (watch::Sender<Option<String>>, watch::Receiver<Option<String>>) {
    let initial = store
        .get(keys::BACKGROUND_IMAGE)
        .filter(|url| !url.is_empty());
    watch::channel(initial)
}

#[derive(Debug)]
pub struct BackgroundController {
    store: Arc<dyn KeyValueStore>,
    images: Arc<dyn ImageSource>,
    current: watch::Sender<Option<String>>,
    status: RwLock<BackgroundStatus>,
    guard: RequestGuard,
}

impl BackgroundController {
    #[must_use]
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        images: Arc<dyn ImageSource>,
        current: watch::Sender<Option<String>>,
    ) -> Self {
        Self {
            store,
            images,
            current,
            status: RwLock::new(BackgroundStatus::default()),
            guard: RequestGuard::new(),
        }
    }

    /// Fetch a random image with no search term.
    pub async fn random(&self) -> Outcome {
        self.fetch(None).await
    }

    /// Fetch a random image matching `term`. A blank term is rejected.
    pub async fn search(&self, term: &str) -> Outcome {
        let term = term.trim();
        if term.is_empty() {
            let err = ValidationError::EmptySearchTerm;
            tracing::debug!(name: "background.search.rejected", reason = %err, "Rejected background search");
            self.set_status(BackgroundStatus {
                loading: false,
                error: Some(err.to_string()),
            });
            return Outcome::Rejected;
        }
        self.fetch(Some(term)).await
    }

    async fn fetch(&self, query: Option<&str>) -> Outcome {
        self.guard.resume();
        let ticket = self.guard.begin();
        self.set_status(BackgroundStatus {
            loading: true,
            error: None,
        });

        let result = self.images.random_image(query).await;

        if !self.guard.is_current(ticket) {
            tracing::debug!(name: "background.fetch.superseded", ticket, "Dropped stale background result");
            return Outcome::Superseded;
        }

        match result {
            Ok(image) => {
                tracing::info!(name: "background.changed", url = %image.url, "Background image updated");
                self.store.set(keys::BACKGROUND_IMAGE, &image.url);
                self.current.send_replace(Some(image.url));
                self.set_status(BackgroundStatus::default());
                Outcome::Applied
            }
            Err(e) => {
                tracing::warn!(name: "background.fetch.failed", error = %e, "Error fetching background image");
                self.set_status(BackgroundStatus {
                    loading: false,
                    error: Some(e.user_message()),
                });
                Outcome::Failed
            }
        }
    }

    /// Drop any in-flight result.
    pub fn stop(&self) {
        self.guard.stop();
        let mut status = self.status.write().unwrap_or_else(PoisonError::into_inner);
        status.loading = false;
    }

    #[must_use]
    pub fn status(&self) -> BackgroundStatus {
        self.status
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn current_url(&self) -> Option<String> {
        self.current.borrow().clone()
    }

    fn set_status(&self, status: BackgroundStatus) {
        *self.status.write().unwrap_or_else(PoisonError::into_inner) = status;
    }
}
