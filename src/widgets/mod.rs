//! Widget state controllers.
//!
//! Every controller follows the same shape:
//!
//! 1. **Hydrate**: the constructor reads persisted state from the
//!    [`KeyValueStore`](crate::store::KeyValueStore) or falls back to a
//!    documented default.
//! 2. **Mutate**: methods apply user- or fetch-triggered transitions.
//! 3. **Persist**: transitions that represent durable intent write through
//!    to the store; writes are fire-and-forget.
//!
//! Controllers that fetch remote data hold a [`RequestGuard`] so results of
//! superseded requests, or results arriving after `stop()`, are dropped
//! instead of overwriting newer state. Failures never escape a controller:
//! they become that widget's error message.

pub mod background;
pub mod calculator;
pub mod clock;
pub mod converter;
pub mod heading;
pub mod links;
pub mod notes;
pub mod weather;

pub use background::BackgroundController;
pub use calculator::{Calculator, Key};
pub use clock::{ClockController, ClockReading};
pub use converter::ConverterController;
pub use heading::HeadingController;
pub use links::{Link, LinksController};
pub use notes::NotesController;
pub use weather::WeatherController;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use serde::Serialize;
use thiserror::Error;

/// How an async controller operation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The result was applied to widget state.
    Applied,
    /// Input was rejected before any network call.
    Rejected,
    /// The fetch failed; the error is recorded in widget state.
    Failed,
    /// A newer request started, or the widget stopped, before this one
    /// finished; its result was dropped.
    Superseded,
}

/// Bad user input, caught before any side effect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please provide a title and a URL.")]
    MissingLinkFields,
    #[error("Invalid URL. Please enter a valid web address.")]
    InvalidUrl,
    #[error("No link at position {0}.")]
    NoSuchLink(usize),
    #[error("No link is awaiting deletion.")]
    NoPendingDelete,
    #[error("Please enter a search term.")]
    EmptySearchTerm,
    #[error("Please enter a city name.")]
    EmptyCity,
    #[error("Title cannot be empty.")]
    EmptyTitle,
    #[error("Invalid color \"{0}\". Use a hex color such as #ffffff.")]
    InvalidColor(String),
}

/// Generation counter plus stopped flag for in-flight requests.
///
/// Each request takes a ticket from [`RequestGuard::begin`]; only the holder
/// of the latest ticket may apply its result, and nobody may after
/// [`RequestGuard::stop`].
#[derive(Debug, Default)]
pub struct RequestGuard {
    generation: AtomicU64,
    stopped: AtomicBool,
}

impl RequestGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a request and return its ticket.
    pub fn begin(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Whether the request holding `ticket` may still apply its result.
    #[must_use]
    pub fn is_current(&self, ticket: u64) -> bool {
        !self.stopped.load(Ordering::SeqCst) && self.generation.load(Ordering::SeqCst) == ticket
    }

    /// Invalidate every outstanding ticket and refuse further results.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Accept results again after a `stop()`.
    pub fn resume(&self) {
        self.stopped.store(false, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}
