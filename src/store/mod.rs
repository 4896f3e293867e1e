//! Persistent key-value storage used by every stateful widget.
//!
//! The store is a flat, synchronous string-to-string map. Structured values
//! are serialized to JSON by the caller through [`load_json`] and
//! [`save_json`]; scalars are stored as raw strings.
//!
//! # Failure policy
//!
//! [`KeyValueStore::try_get`] and [`KeyValueStore::try_set`] report failures
//! explicitly. Widgets use the provided [`KeyValueStore::get`] and
//! [`KeyValueStore::set`] wrappers instead, which log the failure and degrade
//! to a miss / no-op so a broken disk never blocks the dashboard.
//!
//! There are no cross-key transactions: a crash between two `set` calls for
//! related keys can leave them inconsistent.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Storage keys shared by the widgets.
pub mod keys {
    /// Last background image URL (raw string).
    pub const BACKGROUND_IMAGE: &str = "lastBackgroundImage";
    /// Links collection (JSON array of `{title, url}`).
    pub const LINKS: &str = "dashboardLinks";
    /// Note text (raw string).
    pub const NOTES: &str = "dashboardNotes";
    /// Heading title (raw string).
    pub const HEADING_TITLE: &str = "dashboardH1Title";
    /// Heading color (raw string).
    pub const HEADING_COLOR: &str = "dashboardH1Color";
    /// Derived document title (raw string).
    pub const DOCUMENT_TITLE: &str = "dashboardTitle";
    /// Last weather location descriptor (JSON).
    pub const WEATHER_LOCATION: &str = "lastLocation";
}

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file or a stored value is not valid JSON.
    #[error("storage encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),

    /// The backend is not usable (e.g. a poisoned lock).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// A synchronous, flat key-value store.
pub trait KeyValueStore: Send + Sync + std::fmt::Debug {
    /// Read a value, reporting backend failures.
    fn try_get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value, reporting backend failures.
    fn try_set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Read a value; backend failures are logged and read as a miss.
    fn get(&self, key: &str) -> Option<String> {
        match self.try_get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(name: "store.read.failed", key = %key, error = %e, "Storage read failed");
                None
            }
        }
    }

    /// Write a value; backend failures are logged and dropped.
    fn set(&self, key: &str, value: &str) {
        if let Err(e) = self.try_set(key, value) {
            tracing::warn!(name: "store.write.failed", key = %key, error = %e, "Storage write failed");
        }
    }
}

/// Read and decode a JSON value. Undecodable values are logged and treated
/// as absent.
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = store.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(name: "store.decode.failed", key = %key, error = %e, "Stored value is not valid JSON");
            None
        }
    }
}

/// Encode and write a JSON value. Fire-and-forget, like [`KeyValueStore::set`].
pub fn save_json<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) {
    match serde_json::to_string(value) {
        Ok(raw) => store.set(key, &raw),
        Err(e) => {
            tracing::warn!(name: "store.encode.failed", key = %key, error = %e, "Failed to encode value");
        }
    }
}
