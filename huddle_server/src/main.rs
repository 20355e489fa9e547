//! Signaling relay entry point

use anyhow::Context;
use clap::Parser;
use huddle_server::{RelayConfig, RelayServer};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(default_filter: &str) {
    // RUST_LOG wins over --log-level
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = RelayConfig::parse();
    init_tracing(&config.log_level);

    let server = RelayServer::bind(&config)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address()))?;
    info!(
        outbound_buffer = config.outbound_buffer,
        "Starting huddle signaling relay"
    );

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    info!("Relay stopped");
    Ok(())
}
