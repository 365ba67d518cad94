//! Platform discovery with a cached, periodically refreshed mapping.

use std::sync::Arc;

use hotspot_core::{AppConfig, PlatformConfig};
use hotspot_store::TopicStore;
use tracing::{info, warn};

use crate::client::HotApiClient;
use crate::error::RegistryError;
use crate::retry::retry_fixed;
use crate::RetryPolicy;

pub struct PlatformRegistry {
    client: Arc<HotApiClient>,
    store: Arc<TopicStore>,
    retry: RetryPolicy,
    refresh_interval_secs: i64,
}

impl PlatformRegistry {
    #[must_use]
    pub fn new(
        client: Arc<HotApiClient>,
        store: Arc<TopicStore>,
        retry: RetryPolicy,
        refresh_interval_secs: i64,
    ) -> Self {
        Self {
            client,
            store,
            retry,
            refresh_interval_secs: refresh_interval_secs.max(1),
        }
    }

    #[must_use]
    pub fn from_config(client: Arc<HotApiClient>, store: Arc<TopicStore>, config: &AppConfig) -> Self {
        Self::new(
            client,
            store,
            RetryPolicy::from_config(config),
            config.config_update_interval_secs,
        )
    }

    /// Re-fetches the discovery listing and replaces the cached mapping.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::Upstream`] if discovery fails after all attempts.
    /// - [`RegistryError::NoValidRoutes`] if every route was rejected.
    /// - [`RegistryError::Store`] if the mapping cannot be cached.
    pub async fn refresh(&self) -> Result<PlatformConfig, RegistryError> {
        let routes = retry_fixed(self.retry, "platform discovery", || {
            self.client.fetch_routes()
        })
        .await?;
        let received = routes.len();

        let (config, rejected) = PlatformConfig::from_routes(routes, self.store.now());
        if rejected > 0 {
            warn!(rejected, received, "skipped invalid platform routes");
        }
        if config.is_empty() {
            return Err(RegistryError::NoValidRoutes { rejected });
        }

        self.store.save_platform_config(&config).await?;
        info!(platforms = config.len(), "platform registry refreshed");
        Ok(config)
    }

    /// Returns the platform mapping, refreshing it when stale.
    ///
    /// A stale cached mapping is still used when the refresh fails.
    ///
    /// # Errors
    ///
    /// Returns the refresh error only when nothing usable is cached.
    pub async fn load(&self) -> Result<PlatformConfig, RegistryError> {
        let cached = match self.store.load_platform_config().await {
            Ok(cached) => cached,
            Err(e) => {
                warn!(error = %e, "failed to read cached platform config");
                None
            }
        };

        let now = self.store.now();
        if let Some(config) = cached
            .as_ref()
            .filter(|c| !c.is_empty() && c.is_fresh(now, self.refresh_interval_secs))
        {
            return Ok(config.clone());
        }

        match self.refresh().await {
            Ok(config) => Ok(config),
            Err(e) => match cached.filter(|c| !c.is_empty()) {
                Some(stale) => {
                    warn!(
                        error = %e,
                        age_secs = now - stale.update_time,
                        "platform refresh failed, using stale mapping"
                    );
                    Ok(stale)
                }
                None => Err(e),
            },
        }
    }
}
