//! Write path of the hotspot service.
//!
//! [`PlatformRegistry`] discovers which platforms the upstream exposes,
//! [`Collector`] fetches every platform's hot list concurrently, and
//! [`CollectionJob`] ties both to the topic store as one serialized cycle.

pub mod client;
pub mod collector;
pub mod error;
pub(crate) mod parse;
pub mod pipeline;
pub mod registry;
pub(crate) mod retry;

pub use client::HotApiClient;
pub use collector::{CollectionOutcome, Collector, PlatformFailure, PlatformSuccess};
pub use error::{CollectorError, RegistryError, UpstreamError};
pub use pipeline::{CollectionJob, CycleReport};
pub use registry::PlatformRegistry;

/// Retry settings shared by the registry and the collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub attempts: u32,
    pub delay_ms: u64,
}

impl RetryPolicy {
    #[must_use]
    pub fn new(attempts: u32, delay_ms: u64) -> Self {
        Self {
            attempts: attempts.max(1),
            delay_ms,
        }
    }

    #[must_use]
    pub fn from_config(config: &hotspot_core::AppConfig) -> Self {
        Self::new(config.fetch_attempts, config.retry_delay_ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, 1_000)
    }
}
