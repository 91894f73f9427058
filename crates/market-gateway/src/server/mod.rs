//! Gateway server setup
//!
//! Wires storage and cache backends into the service context, exposes the
//! WebSocket and health routes, and runs the server with its heartbeat
//! monitor.

mod handler;
mod state;

pub use handler::gateway_handler;
pub use state::GatewayState;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Router};
use market_cache::{CacheStore, HistoryCache, MemoryCacheStore, RedisCacheStore, RedisPool};
use market_common::{AppConfig, AppError};
use market_db::InMemoryStore;
use market_service::ServiceContext;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::heartbeat::HeartbeatMonitor;

/// Create the gateway router
pub fn create_router() -> Router<GatewayState> {
    Router::new()
        .route("/ws", get(gateway_handler))
        .route("/health", get(health_check))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Build the complete application
pub fn create_app(state: GatewayState) -> Router {
    create_router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Initialize all dependencies and create `GatewayState`
///
/// `DATABASE_URL=memory://` selects an empty in-process store; without
/// `REDIS_URL` the cache stays in-process too.
pub async fn create_gateway_state(config: AppConfig) -> Result<GatewayState, AppError> {
    let cache = create_cache(&config).await?;

    let builder = if config.database.is_in_memory() {
        tracing::info!("Using in-memory store");
        ServiceContext::builder().store(Arc::new(InMemoryStore::new()))
    } else {
        tracing::info!("Connecting to PostgreSQL...");
        let pool = market_db::create_pool(&config.database)
            .await
            .map_err(AppError::database)?;
        market_db::run_migrations(&pool)
            .await
            .map_err(AppError::database)?;
        tracing::info!("PostgreSQL connection established");

        ServiceContext::builder()
            .user_repo(Arc::new(market_db::PgUserRepository::new(pool.clone())))
            .project_repo(Arc::new(market_db::PgProjectRepository::new(pool.clone())))
            .bid_repo(Arc::new(market_db::PgBidRepository::new(pool.clone())))
            .message_repo(Arc::new(market_db::PgMessageRepository::new(pool.clone())))
            .attachment_repo(Arc::new(market_db::PgAttachmentRepository::new(pool)))
    };

    let service_context = builder
        .cache(cache)
        .config(config.chat.clone())
        .build()
        .map_err(|e| AppError::Server(e.to_string()))?;

    Ok(GatewayState::new(service_context, config))
}

/// Create state over a caller-owned in-memory store and an in-process cache
pub fn in_memory_state(config: AppConfig, store: Arc<InMemoryStore>) -> Result<GatewayState, AppError> {
    let service_context = ServiceContext::builder()
        .store(store)
        .cache(HistoryCache::new(Arc::new(MemoryCacheStore::new())))
        .config(config.chat.clone())
        .build()
        .map_err(|e| AppError::Server(e.to_string()))?;

    Ok(GatewayState::new(service_context, config))
}

async fn create_cache(config: &AppConfig) -> Result<HistoryCache, AppError> {
    let store: Arc<dyn CacheStore> = match &config.redis {
        Some(redis) => {
            tracing::info!("Connecting to Redis...");
            let pool = RedisPool::from_config(redis).map_err(AppError::cache)?;
            pool.health_check().await.map_err(AppError::cache)?;
            tracing::info!("Redis connection established");
            Arc::new(RedisCacheStore::new(pool))
        }
        None => {
            tracing::info!("Using in-process cache");
            Arc::new(MemoryCacheStore::new())
        }
    };
    Ok(HistoryCache::new(store))
}

/// Serve on `listener` until `shutdown` resolves, then stop the heartbeat
/// monitor and wait for background writes to finish
pub async fn serve<F>(listener: TcpListener, state: GatewayState, shutdown: F) -> Result<(), AppError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let heartbeat = HeartbeatMonitor::new(
        state.shared_registry(),
        state.config().chat.heartbeat_interval(),
    )
    .spawn();

    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Gateway listening on ws://{}/ws", addr);
    }

    let result = axum::serve(listener, create_app(state.clone()))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| AppError::Server(format!("Server error: {e}")));

    heartbeat.shutdown().await;
    state.service_context().tasks().wait_idle().await;
    tracing::info!("Gateway stopped");
    result
}

/// Run the gateway server
pub async fn run_server(state: GatewayState, addr: SocketAddr) -> Result<(), AppError> {
    tracing::info!("Starting Gateway server on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Server(format!("Failed to bind to {addr}: {e}")))?;

    serve(listener, state, shutdown_signal()).await
}

/// Run the complete gateway server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr: SocketAddr = config
        .gateway
        .address()
        .parse()
        .map_err(|e| AppError::Server(format!("Invalid gateway address: {e}")))?;

    let state = create_gateway_state(config).await?;
    run_server(state, addr).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
