//! deltaproxy server entry point.
//!
//! Boots the HTTP listener in front of the configured origin. Logging goes
//! to stderr as JSON lines.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use deltaproxy_client::{FetchConfig, HttpUpstream, canonicalize_origin};
use deltaproxy_core::{AppConfig, ProxyPolicy, VersionStore};
use tokio::net::TcpListener;
use tokio::time::MissedTickBehavior;
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod router;
mod state;

use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()
        .inspect_err(|e| tracing::error!(error = %e, "invalid configuration"))
        .context("failed to load configuration")?;

    let origin = config
        .require_target_origin()
        .inspect_err(|e| tracing::error!(error = %e, "no origin to proxy"))?;
    let origin = canonicalize_origin(origin.as_str())?;

    let store = Arc::new(VersionStore::with_policy(config.eviction_policy()));
    if let Some(max_age) = store.policy().max_age {
        tokio::spawn(sweep_expired(Arc::clone(&store), max_age));
    }
    let upstream = HttpUpstream::new(origin.clone(), FetchConfig::from(&config))?;
    let policy = Arc::new(ProxyPolicy::new(store, Arc::new(upstream)));

    let app = router::build_router(AppState { policy });

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(
        bind_addr = %config.bind_addr,
        origin = %origin,
        max_entries = config.max_entries,
        max_age_secs = config.max_age_secs,
        "deltaproxy listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("deltaproxy stopped");

    Ok(())
}

/// Periodically drop expired snapshots so idle resources do not linger.
async fn sweep_expired(store: Arc<VersionStore>, max_age: Duration) {
    let mut ticker = tokio::time::interval(sweep_period(max_age));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let purged = store.purge_expired();
        if purged > 0 {
            tracing::info!(purged, remaining = store.len(), "swept expired snapshots");
        }
    }
}

/// Half the maximum age, clamped to between one second and five minutes.
fn sweep_period(max_age: Duration) -> Duration {
    (max_age / 2).clamp(Duration::from_secs(1), Duration::from_secs(300))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
