//! Dashboard heading: title, color, and the derived document title.
//!
//! Each field lives under its own storage key, so the three can drift apart
//! if the process dies between writes.

use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;

use super::ValidationError;
use crate::store::{KeyValueStore, keys};

pub const DEFAULT_TITLE: &str = "My Dashboard";
pub const DEFAULT_COLOR: &str = "#ffffff";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeadingConfig {
    pub title: String,
    pub color: String,
    /// Title of the browser tab; always follows `title`.
    pub document_title: String,
}

/// `#rgb` or `#rrggbb`.
fn is_hex_color(color: &str) -> bool {
    color
        .strip_prefix('#')
        .is_some_and(|hex| matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

#[derive(Debug)]
pub struct HeadingController {
    store: Arc<dyn KeyValueStore>,
    config: RwLock<HeadingConfig>,
}

impl HeadingController {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let title = store
            .get(keys::HEADING_TITLE)
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());
        let color = store
            .get(keys::HEADING_COLOR)
            .filter(|c| is_hex_color(c))
            .unwrap_or_else(|| DEFAULT_COLOR.to_string());
        store.set(keys::DOCUMENT_TITLE, &title);

        Self {
            store,
            config: RwLock::new(HeadingConfig {
                document_title: title.clone(),
                title,
                color,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> HeadingConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Change the title, trimmed. Blank titles are rejected and the old one kept.
    pub fn rename(&self, title: &str) -> Result<(), ValidationError> {
        let title = title.trim();
        if title.is_empty() {
            tracing::debug!(name: "heading.rename.rejected", "Ignored blank heading title");
            return Err(ValidationError::EmptyTitle);
        }
        let mut config = self.config.write().unwrap_or_else(PoisonError::into_inner);
        config.title = title.to_string();
        config.document_title = title.to_string();
        self.store.set(keys::HEADING_TITLE, title);
        self.store.set(keys::DOCUMENT_TITLE, title);
        Ok(())
    }

    pub fn set_color(&self, color: &str) -> Result<(), ValidationError> {
        let color = color.trim();
        if !is_hex_color(color) {
            tracing::debug!(name: "heading.color.rejected", color = %color, "Rejected heading color");
            return Err(ValidationError::InvalidColor(color.to_string()));
        }
        let mut config = self.config.write().unwrap_or_else(PoisonError::into_inner);
        config.color = color.to_string();
        self.store.set(keys::HEADING_COLOR, color);
        Ok(())
    }
}
