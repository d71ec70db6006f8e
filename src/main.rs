//! Marketplace Cache - diagnostics server for the read-through cache layer
//!
//! Wires the configured store into the engine, starts the background tasks
//! and serves the operator endpoints.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use marketplace_cache::cache::{
    CacheStats, KeyValueStore, MemoryStore, MetricsRecorder, ReadThroughCache, RedisStore,
};
use marketplace_cache::{
    create_router, spawn_cleanup_task, spawn_metrics_task, AppState, Config, StoreBackend,
};

/// Main entry point for the cache diagnostics server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Open the configured store (Redis connects lazily, so an outage does not block startup)
/// 4. Start the metrics task and, for the memory backend, the TTL cleanup task
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marketplace_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Marketplace Cache");

    // Load configuration from environment variables
    let config = Config::from_env();
    info!(
        "Configuration loaded: backend={:?}, default_ttl={}s, store_timeout={}ms, port={}",
        config.store_backend, config.default_ttl, config.store_timeout_ms, config.server_port
    );

    let mut background: Vec<JoinHandle<()>> = Vec::new();

    let store: Arc<dyn KeyValueStore> = match config.store_backend {
        StoreBackend::Memory => {
            let memory = Arc::new(MemoryStore::new());
            background.push(spawn_cleanup_task(memory.clone(), config.cleanup_interval));
            info!("In-process store initialized");
            memory
        }
        StoreBackend::Redis => {
            let redis = RedisStore::open(&config.redis_url, config.store_timeout())
                .with_context(|| format!("invalid REDIS_URL '{}'", config.redis_url))?;
            info!("Redis store configured");
            Arc::new(redis)
        }
    };

    let stats = Arc::new(RwLock::new(CacheStats::with_key_limit(config.stats_max_keys)));
    let (recorder, events) = MetricsRecorder::channel(config.metrics_buffer.max(1));
    background.push(spawn_metrics_task(events, stats.clone()));

    let cache = ReadThroughCache::new(store, config.ttl_policy()).with_metrics(recorder);
    let state = AppState::with_stats(cache, stats);

    // Create router with all endpoints
    let app = create_router(state);

    // Bind to configured port
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    // Start server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(background))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the background tasks and allows graceful shutdown.
async fn shutdown_signal(background: Vec<JoinHandle<()>>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    for handle in background {
        handle.abort();
    }
    warn!("Background tasks aborted");
}
