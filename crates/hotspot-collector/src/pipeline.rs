//! One collection cycle: registry → collector → store.

use std::sync::Arc;

use hotspot_store::TopicStore;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::collector::Collector;
use crate::error::CollectorError;
use crate::registry::PlatformRegistry;

/// Summary of a completed cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub platforms: usize,
    pub succeeded: usize,
    pub failed: Vec<String>,
    pub fetched: usize,
    pub written: usize,
    pub duplicates: usize,
}

/// Runs collection cycles, never more than one at a time per process.
pub struct CollectionJob {
    registry: PlatformRegistry,
    collector: Collector,
    store: Arc<TopicStore>,
    running: Mutex<()>,
}

impl CollectionJob {
    #[must_use]
    pub fn new(registry: PlatformRegistry, collector: Collector, store: Arc<TopicStore>) -> Self {
        Self {
            registry,
            collector,
            store,
            running: Mutex::new(()),
        }
    }

    /// Runs one cycle. Returns `Ok(None)` without doing anything when
    /// another cycle is still in flight.
    ///
    /// When every platform fails, the failure list is still written to the
    /// stats rollup before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError`] if discovery, the fan-out or the store
    /// write fails.
    pub async fn run_cycle(&self) -> Result<Option<CycleReport>, CollectorError> {
        let Ok(_guard) = self.running.try_lock() else {
            warn!("collection cycle already running, skipping this tick");
            return Ok(None);
        };

        let config = self.registry.load().await?;
        let outcome = match self.collector.fetch_all(&config).await {
            Ok(outcome) => outcome,
            Err(CollectorError::NoPlatformSucceeded { failed }) => {
                if let Err(e) = self.store.record_cycle_failures(&failed).await {
                    error!(error = %e, "failed to record cycle failures");
                }
                return Err(CollectorError::NoPlatformSucceeded { failed });
            }
            Err(e) => return Err(e),
        };

        let failed = outcome.failed_names();
        let stored = self.store.store_cycle(&outcome.topics, &failed).await?;

        let report = CycleReport {
            platforms: config.len(),
            succeeded: outcome.succeeded.len(),
            failed,
            fetched: outcome.topics.len(),
            written: stored.written,
            duplicates: stored.duplicates,
        };
        info!(
            platforms = report.platforms,
            succeeded = report.succeeded,
            failed = report.failed.len(),
            fetched = report.fetched,
            written = report.written,
            duplicates = report.duplicates,
            "collection cycle complete"
        );
        Ok(Some(report))
    }
}
