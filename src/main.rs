//! Tasknest server binary
//!
//! Multi-user todo server with a REST API, an agent tool façade, and
//! conversation persistence. All user data is isolated per owner.

use anyhow::Result;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower::limit::ConcurrencyLimitLayer;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tracing::info;

use tasknest::auth::{self, TokenVerifier};
use tasknest::config::ServerConfig;
use tasknest::handlers::{build_protected_routes, build_public_routes, AppManager};
use tasknest::{metrics, middleware};

const DATABASE_FLUSH_TIMEOUT_SECS: u64 = 10;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    metrics::register_metrics().expect("Failed to register metrics");
    info!("📊 Metrics registered at /metrics");

    info!("📋 Starting Tasknest server...");

    // Load configuration from environment
    let server_config = ServerConfig::from_env();
    server_config.log();

    let manager = Arc::new(AppManager::new(server_config.clone())?);

    // Keep a reference for shutdown cleanup (clone BEFORE moving into router)
    let manager_for_shutdown = Arc::clone(&manager);

    let verifier = Arc::new(TokenVerifier::new(&server_config.auth));

    // Configure rate limiting from config
    let governor_conf = GovernorConfigBuilder::default()
        .per_second(server_config.rate_limit_per_second)
        .burst_size(server_config.rate_limit_burst)
        .finish()
        .expect("Failed to build governor rate limiter configuration");

    let governor_layer = GovernorLayer::new(governor_conf);

    info!(
        "⚡ Rate limiting enabled: {} req/sec, burst of {}",
        server_config.rate_limit_per_second, server_config.rate_limit_burst
    );

    // Build CORS layer from configuration
    let cors = server_config.cors.to_layer();

    // Protected API routes - auth + rate limiting
    let protected_routes = build_protected_routes(manager.clone())
        .layer(axum::middleware::from_fn_with_state(
            verifier.clone(),
            auth::auth_middleware,
        ))
        .layer(governor_layer);

    // Public routes - NO auth, NO rate limiting (Kubernetes probes, metrics)
    let public_routes = build_public_routes(manager.clone());

    let max_concurrent = server_config.max_concurrent_requests;
    info!(
        "🔄 Concurrency limiting enabled: max_concurrent={}",
        max_concurrent
    );

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(axum::middleware::from_fn(middleware::track_metrics))
        .layer(ConcurrencyLimitLayer::new(max_concurrent))
        .layer(cors);

    // Start server using port from config
    let port = server_config.port;
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("🔒 Shutdown signal received, flushing databases...");

    let flush_future = async { manager_for_shutdown.flush() };
    match tokio::time::timeout(
        std::time::Duration::from_secs(DATABASE_FLUSH_TIMEOUT_SECS),
        flush_future,
    )
    .await
    {
        Ok(Ok(())) => info!("✅ Databases flushed successfully"),
        Ok(Err(e)) => tracing::error!("❌ Failed to flush databases: {}", e),
        Err(_) => tracing::error!(
            "⏱️  Database flush timed out after {}s",
            DATABASE_FLUSH_TIMEOUT_SECS
        ),
    }

    info!("👋 Server shutdown complete");

    Ok(())
}

/// Handle graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("🛑 Shutdown signal received, starting graceful shutdown");
}
