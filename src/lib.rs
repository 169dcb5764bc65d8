//! Exchange-rate fetching with a time-stamped local cache.
//!
//! [`RateFetcher::fetch_rates`] is the entry point: it serves a snapshot from
//! the [`CacheStore`] while it is younger than twelve hours, and otherwise
//! requests one from the rates API under a fixed deadline.

pub mod api;
pub mod cache;
pub mod config;
pub mod convert;
pub mod error;
pub mod models;

pub use api::RateFetcher;
pub use cache::{CacheBackend, CacheStore, FileBackend, MemoryBackend};
pub use config::Config;
pub use error::{CacheError, ConfigError, RateError, RateResult};
pub use models::{CacheEntry, Conversion, RateSnapshot};
