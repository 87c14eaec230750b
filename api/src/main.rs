//! Feedback Forms API - server entry point

use feedback_api::{build_router, ApiState, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Feedback Forms API v{}", env!("CARGO_PKG_VERSION"));

    let config = ServerConfig::from_env();
    config.validate()?;
    let bind_addr = config.bind_addr.clone();

    let app = build_router(ApiState::in_memory(config));
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
