use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,startpage=debug";

/// Filter from `RUST_LOG`, or [`DEFAULT_FILTER`] when it is unset or invalid.
#[must_use]
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global logging subscriber.
///
/// Configures:
/// - `tracing-subscriber::fmt` in compact form, with target, thread id and
///   line number on every event.
/// - [`env_filter`] for levels.
///
/// Fails if a global subscriber is already set.
pub fn try_init() -> Result<(), TryInitError> {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt_layer)
        .try_init()
}

/// Install logging for the binary. A second call keeps the first subscriber.
pub fn init() {
    if let Err(e) = try_init() {
        tracing::debug!(name: "telemetry.init.skipped", error = %e, "Subscriber already installed");
    }
}
