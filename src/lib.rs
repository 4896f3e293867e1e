//! Start page
//!
//! A personal dashboard: clock, changeable background image, and a panel of
//! small widgets (links, notes, calculator, unit/currency converter,
//! weather), served over HTTP with all state persisted locally.
//!
//! # Architecture
//!
//! - **Store**: flat key-value persistence behind [`store::KeyValueStore`]
//! - **Clients**: read-only HTTP clients for images, currency rates and weather
//! - **Geolocation**: pluggable position providers
//! - **Conversion**: pure unit and currency conversion engine
//! - **Widgets**: one state controller per widget
//! - **Dashboard**: composition root owning every controller
//! - **Server**: Axum JSON API and HTML shell over the dashboard
//!
//! # Modules
//!
//! - [`clients`]: image, currency and weather clients
//! - [`config`]: layered configuration (defaults, file, env, CLI)
//! - [`conversion`]: conversion families and `convert`
//! - [`dashboard`]: composition root
//! - [`geo`]: geolocation providers
//! - [`server`]: HTTP surface
//! - [`store`]: key-value persistence
//! - [`telemetry`]: logging setup
//! - [`widgets`]: widget controllers

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::assigning_clones)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::default_trait_access)]
#![allow(clippy::unused_async)]

pub mod clients;
pub mod config;
pub mod conversion;
pub mod dashboard;
pub mod geo;
pub mod server;
pub mod store;
pub mod telemetry;
pub mod widgets;
