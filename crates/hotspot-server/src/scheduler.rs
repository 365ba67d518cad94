//! Background jobs.
//!
//! Two recurring jobs: the collection cycle (registry → collector → store)
//! and the expired-topic sweep. One collection cycle also runs right after
//! startup so a fresh deployment does not serve an empty cache until the
//! first tick.

use std::sync::Arc;

use hotspot_collector::CollectionJob;
use hotspot_core::AppConfig;
use hotspot_store::TopicStore;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Builds and starts the scheduler.
///
/// The returned handle must be kept alive for the lifetime of the process;
/// dropping it stops every job.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if a cron expression is invalid or the
/// scheduler cannot start.
pub async fn build_scheduler(
    job: Arc<CollectionJob>,
    store: Arc<TopicStore>,
    config: &AppConfig,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_collect_job(&scheduler, Arc::clone(&job), &config.collect_cron).await?;
    register_sweep_job(&scheduler, store, &config.sweep_cron).await?;
    scheduler.start().await?;

    tokio::spawn(async move {
        tracing::info!("scheduler: running startup collection cycle");
        run_collection(&job).await;
    });

    Ok(scheduler)
}

async fn register_collect_job(
    scheduler: &JobScheduler,
    job: Arc<CollectionJob>,
    cron: &str,
) -> Result<(), JobSchedulerError> {
    let entry = Job::new_async(cron, move |_uuid, _lock| {
        let job = Arc::clone(&job);
        Box::pin(async move {
            run_collection(&job).await;
        })
    })?;
    scheduler.add(entry).await?;
    tracing::info!(cron, "scheduler: collection job registered");
    Ok(())
}

async fn register_sweep_job(
    scheduler: &JobScheduler,
    store: Arc<TopicStore>,
    cron: &str,
) -> Result<(), JobSchedulerError> {
    let entry = Job::new_async(cron, move |_uuid, _lock| {
        let store = Arc::clone(&store);
        Box::pin(async move {
            match store.clear_expired().await {
                Ok(report) => tracing::info!(
                    scanned = report.scanned,
                    deleted = report.deleted,
                    "scheduler: expired topic sweep complete"
                ),
                Err(e) => tracing::error!(error = %e, "scheduler: expired topic sweep failed"),
            }
        })
    })?;
    scheduler.add(entry).await?;
    tracing::info!(cron, "scheduler: sweep job registered");
    Ok(())
}

/// Runs one cycle and logs the outcome. Failures are retried on the next
/// tick, never propagated.
async fn run_collection(job: &CollectionJob) {
    match job.run_cycle().await {
        Ok(Some(report)) => tracing::info!(
            written = report.written,
            failed = report.failed.len(),
            "scheduler: collection cycle finished"
        ),
        Ok(None) => {}
        Err(e) => tracing::error!(error = %e, "scheduler: collection cycle failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn default_cron_expressions_parse() {
        for cron in ["0 */30 * * * *", "0 15 * * * *"] {
            let job = Job::new_async(cron, |_uuid, _lock| Box::pin(async {}));
            assert!(job.is_ok(), "{cron} should parse");
        }
    }

    #[tokio::test]
    async fn invalid_cron_is_rejected() {
        assert!(Job::new_async("not a cron", |_uuid, _lock| Box::pin(async {})).is_err());
    }
}
