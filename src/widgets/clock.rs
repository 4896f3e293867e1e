//! Wall clock ticking once per second.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Local, TimeZone};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

const TICK: Duration = Duration::from_secs(1);

/// Formatted time and date, e.g. `09:05` and `Sunday 18 October 2026`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClockReading {
    pub time: String,
    pub date: String,
}

impl ClockReading {
    #[must_use]
    pub fn at<Tz>(instant: &DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        Self {
            time: instant.format("%H:%M").to_string(),
            date: instant.format("%A %-d %B %Y").to_string(),
        }
    }

    #[must_use]
    pub fn now() -> Self {
        Self::at(&Local::now())
    }
}

#[derive(Debug)]
pub struct ClockController {
    reading: watch::Sender<ClockReading>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl Default for ClockController {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockController {
    #[must_use]
    pub fn new() -> Self {
        let (reading, _) = watch::channel(ClockReading::now());
        Self {
            reading,
            ticker: Mutex::new(None),
        }
    }

    /// Start ticking. A second call while running is a no-op.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) {
        let mut ticker = self.ticker.lock().unwrap_or_else(PoisonError::into_inner);
        if ticker.is_some() {
            return;
        }

        let reading = self.reading.clone();
        *ticker = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                reading.send_if_modified(|current| {
                    let next = ClockReading::now();
                    let changed = *current != next;
                    if changed {
                        *current = next;
                    }
                    changed
                });
            }
        }));
        tracing::debug!(name: "clock.started", "Clock ticker started");
    }

    /// Cancel the ticker. Safe to call repeatedly.
    pub fn stop(&self) {
        let handle = self.ticker.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(handle) = handle {
            handle.abort();
            tracing::debug!(name: "clock.stopped", "Clock ticker stopped");
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.ticker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    #[must_use]
    pub fn reading(&self) -> ClockReading {
        self.reading.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ClockReading> {
        self.reading.subscribe()
    }
}

impl Drop for ClockController {
    fn drop(&mut self) {
        self.stop();
    }
}
