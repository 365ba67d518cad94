//! Concurrent fan-out over every registered platform.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use hotspot_core::{AppConfig, Clock, PlatformConfig, RawTopic, Topic};
use tracing::{debug, warn};

use crate::client::HotApiClient;
use crate::error::{CollectorError, UpstreamError};
use crate::retry::retry_fixed;
use crate::RetryPolicy;

const DEFAULT_MAX_CONCURRENT: usize = 16;
const DEFAULT_PLATFORM_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformSuccess {
    pub platform: String,
    /// Items with a usable title.
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformFailure {
    pub platform: String,
    pub error: String,
}

/// Result of one fan-out. Both lists are sorted by platform name.
#[derive(Debug, Clone, Default)]
pub struct CollectionOutcome {
    pub topics: Vec<Topic>,
    pub succeeded: Vec<PlatformSuccess>,
    pub failed: Vec<PlatformFailure>,
}

impl CollectionOutcome {
    #[must_use]
    pub fn failed_names(&self) -> Vec<String> {
        self.failed.iter().map(|f| f.platform.clone()).collect()
    }
}

pub struct Collector {
    client: Arc<HotApiClient>,
    clock: Arc<dyn Clock>,
    retry: RetryPolicy,
    max_concurrent: usize,
    platform_timeout: Duration,
}

impl Collector {
    #[must_use]
    pub fn new(client: Arc<HotApiClient>, clock: Arc<dyn Clock>, retry: RetryPolicy) -> Self {
        Self {
            client,
            clock,
            retry,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            platform_timeout: DEFAULT_PLATFORM_TIMEOUT,
        }
    }

    /// Builds a collector whose per-platform deadline covers every attempt
    /// at the configured request timeout plus the delays between them.
    #[must_use]
    pub fn from_config(client: Arc<HotApiClient>, clock: Arc<dyn Clock>, config: &AppConfig) -> Self {
        let retry = RetryPolicy::from_config(config);
        let deadline = Duration::from_secs(config.request_timeout_secs) * retry.attempts
            + Duration::from_millis(retry.delay_ms) * (retry.attempts - 1);
        Self::new(client, clock, retry)
            .with_max_concurrent(config.max_concurrent_platforms)
            .with_platform_timeout(deadline)
    }

    #[must_use]
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    #[must_use]
    pub fn with_platform_timeout(mut self, timeout: Duration) -> Self {
        self.platform_timeout = timeout;
        self
    }

    /// Fetches every platform in `config`, at most `max_concurrent` at a time.
    ///
    /// A platform that fails after all attempts, or runs past the
    /// per-platform deadline, is recorded in [`CollectionOutcome::failed`]
    /// and the rest of the batch continues.
    ///
    /// # Errors
    ///
    /// - [`CollectorError::NoPlatforms`] if `config` is empty.
    /// - [`CollectorError::NoPlatformSucceeded`] if every platform failed.
    pub async fn fetch_all(&self, config: &PlatformConfig) -> Result<CollectionOutcome, CollectorError> {
        if config.is_empty() {
            return Err(CollectorError::NoPlatforms);
        }

        let fetch_time = self.clock.now();
        let fetches: Vec<_> = config
            .platforms
            .iter()
            .map(|(name, entry)| async move {
                (name, self.fetch_platform(name, &entry.path).await)
            })
            .collect();
        let mut results: Vec<(&String, Result<Vec<RawTopic>, UpstreamError>)> =
            stream::iter(fetches)
                .buffer_unordered(self.max_concurrent)
                .collect()
                .await;
        results.sort_by(|a, b| a.0.cmp(b.0));

        let mut outcome = CollectionOutcome::default();
        for (platform, result) in results {
            match result {
                Ok(raws) => {
                    debug!(platform = %platform, count = raws.len(), "platform fetched");
                    outcome.succeeded.push(PlatformSuccess {
                        platform: platform.clone(),
                        count: raws.len(),
                    });
                    outcome.topics.extend(
                        raws.into_iter()
                            .map(|raw| Topic::from_raw(platform, raw, fetch_time)),
                    );
                }
                Err(e) => {
                    warn!(platform = %platform, error = %e, "platform fetch failed");
                    outcome.failed.push(PlatformFailure {
                        platform: platform.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        if outcome.succeeded.is_empty() {
            return Err(CollectorError::NoPlatformSucceeded {
                failed: outcome.failed_names(),
            });
        }
        if !outcome.failed.is_empty() {
            warn!(
                failed = outcome.failed.len(),
                total = config.len(),
                "some platforms failed during collection"
            );
        }
        Ok(outcome)
    }

    async fn fetch_platform(&self, platform: &str, path: &str) -> Result<Vec<RawTopic>, UpstreamError> {
        let attempt = retry_fixed(self.retry, platform, || self.client.fetch_platform(path));
        tokio::time::timeout(self.platform_timeout, attempt)
            .await
            .map_err(|_| UpstreamError::Timeout {
                context: platform.to_string(),
                secs: self.platform_timeout.as_secs(),
            })?
    }
}
