mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use hotspot_aggregator::{Filter, HotspotService, Scorer};
use hotspot_collector::{CollectionJob, Collector, HotApiClient, PlatformRegistry};
use hotspot_core::{Clock, SystemClock};
use hotspot_store::{CacheKeys, RedisBackend, TopicStore};
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Arc::new(hotspot_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    tracing::info!(env = %config.env, namespace = %config.kv_namespace, "starting hotspot server");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let backend = Arc::new(RedisBackend::connect(&config.redis_url()).await?);
    let store = Arc::new(TopicStore::new(
        backend,
        CacheKeys::new(config.kv_namespace.clone()),
        Arc::clone(&clock),
    ));
    store.ping().await?;

    let client = Arc::new(HotApiClient::from_config(&config)?);
    let registry = PlatformRegistry::from_config(Arc::clone(&client), Arc::clone(&store), &config);
    let collector = Collector::from_config(client, clock, &config);
    let job = Arc::new(CollectionJob::new(registry, collector, Arc::clone(&store)));

    let _scheduler = scheduler::build_scheduler(job, Arc::clone(&store), &config).await?;

    let service = Arc::new(HotspotService::new(
        Arc::clone(&store),
        Filter::default(),
        Scorer::default(),
    ));
    let app = build_app(AppState { service, store });

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
