//! Free-text notes. Every change is persisted immediately.

use std::sync::{Arc, PoisonError, RwLock};

use crate::store::{KeyValueStore, keys};

#[derive(Debug)]
pub struct NotesController {
    store: Arc<dyn KeyValueStore>,
    text: RwLock<String>,
}

impl NotesController {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let text = store.get(keys::NOTES).unwrap_or_default();
        Self {
            store,
            text: RwLock::new(text),
        }
    }

    #[must_use]
    pub fn text(&self) -> String {
        self.text
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set(&self, text: impl Into<String>) {
        let text = text.into();
        self.store.set(keys::NOTES, &text);
        *self.text.write().unwrap_or_else(PoisonError::into_inner) = text;
    }
}
