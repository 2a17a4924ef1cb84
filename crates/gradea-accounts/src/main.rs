//! GradeA account backend - Entry point.

use anyhow::{Context, Result};
use gradea_accounts::{
    api::{create_router_with_rate_limit, AppState, RateLimitState},
    Backend, Config,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log.level));
    let json = config.log.json;

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json()))
        .with((!json).then(fmt::layer))
        .init();

    info!("Starting GradeA account backend");

    let backend = Backend::from_config(&config).await?;
    let state = AppState::new(backend.clone());
    let rate_limit = RateLimitState::new(config.rate_limit.global_per_minute);
    let app = create_router_with_rate_limit(state, rate_limit);

    let addr = SocketAddr::new(
        config
            .server
            .listen_addr
            .parse()
            .unwrap_or([0, 0, 0, 0].into()),
        config.server.port,
    );

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Err(e) = backend.shutdown().await {
        error!("Failed to flush document store: {}", e);
    }

    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
