//! Marketplace chat gateway entry point
//!
//! Run with:
//! ```bash
//! cargo run -p market-gateway
//! ```
//!
//! Configuration is loaded from environment variables (and `.env`).

use anyhow::Context;
use market_common::{try_init_tracing, AppConfig, TracingConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("Failed to load configuration")?;

    if let Err(e) = try_init_tracing(&TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    info!(
        app = %config.app.name,
        env = ?config.app.env,
        port = config.gateway.port,
        in_memory = config.database.is_in_memory(),
        redis = config.redis.is_some(),
        "Configuration loaded"
    );

    market_gateway::run(config)
        .await
        .context("Gateway failed")?;

    Ok(())
}
