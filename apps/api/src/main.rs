//! Zarmind API server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use zarmind_api::cache::{Cache, RedisCache};
use zarmind_api::config::ApiConfig;
use zarmind_api::{bootstrap_admin, build_router, AppState};
use zarmind_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("Starting Zarmind API server...");

    let config = ApiConfig::load()?;
    info!(
        port = config.http_port,
        database = %config.database_path,
        cache = config.redis_url.is_some(),
        "Configuration loaded"
    );

    let db = Database::new(
        DbConfig::new(&config.database_path).max_connections(config.db_max_connections),
    )
    .await?;
    info!("Database ready");

    let cache = match config.redis_url.as_deref() {
        Some(url) => match RedisCache::connect(url).await {
            Ok(store) => Cache::new(Arc::new(store), config.redis_key_prefix.clone()),
            Err(e) => {
                warn!(error = %e, "Failed to connect to Redis, continuing without cache");
                Cache::disabled()
            }
        },
        None => Cache::disabled(),
    };

    bootstrap_admin(&db, &config).await?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let state = Arc::new(AppState::new(db.clone(), cache, config));

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
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
                error!(error = %e, "Failed to install SIGTERM handler");
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

    info!("Shutdown signal received");
}
