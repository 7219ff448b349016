//! # Coupon API Server
//!
//! ## Startup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ApiConfig::load()  (defaults → coupon-api.toml → env)                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  tracing_subscriber fmt + EnvFilter(log.filter)                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new (pool + migrations)                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  TtlCache + janitor ──► CouponService ──► axum Router                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  serve until Ctrl+C / SIGTERM, then close the pool                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use coupon_api::{router, ApiConfig, AppState};
use coupon_db::{Database, DbConfig};
use coupon_service::TtlCache;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration first: it carries the log filter
    let config = ApiConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.log.filter)?)
        .with_target(true)
        .init();

    info!("Starting Coupon API server...");
    info!(
        addr = %config.bind_address(),
        db = %config.database.path.display(),
        cache_ttl_secs = config.cache.ttl_secs,
        "Configuration loaded"
    );

    // Connect to database (runs migrations)
    let db = Database::new(
        DbConfig::new(&config.database.path).max_connections(config.database.max_connections),
    )
    .await?;
    info!("Database ready");

    // Lookup cache with background purge
    let cache = Arc::new(TtlCache::new(config.cache_ttl()));
    let janitor = config
        .purge_interval()
        .map(|every| cache.spawn_janitor(every));

    let app = router(AppState::with_database(db.clone(), cache));

    let listener = TcpListener::bind(config.bind_address()).await?;
    info!(addr = %listener.local_addr()?, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(janitor) = janitor {
        janitor.abort();
    }
    db.close().await;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
