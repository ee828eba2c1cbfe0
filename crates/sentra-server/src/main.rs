//! Sentra HTTP Server
//!
//! Exposes the risk-decision pipeline over REST.

use anyhow::Result;
use sentra_server::api::{create_router, AppState};
use sentra_server::config::ServerConfig;
use sentra_sdk::PipelineBuilder;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    init_tracing()?;

    // Load configuration
    let config = ServerConfig::load()?;
    info!("Loaded configuration: {:?}", config);

    // Wire the pipeline with in-memory collaborators
    let pipeline = PipelineBuilder::new()
        .with_config(config.to_pipeline_config())
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build pipeline: {}", e))?;
    info!(
        "Pipeline initialized (ml={}, geoip={:?})",
        config.ml_service_url, config.geoip_api_url
    );

    let app = create_router(AppState::new(Arc::new(pipeline)));

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    info!("Starting server on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    info!("✓ Server listening on http://{}", addr);
    info!("  Health check: http://{}/health", addr);
    info!("  Transactions: POST/GET http://{}/v1/transactions", addr);
    info!("  Settings: GET/PUT http://{}/v1/settings", addr);
    info!("  Simulation: POST http://{}/v1/simulation/start", addr);
    info!("  System health: http://{}/v1/system/health", addr);
    info!("  Metrics: http://{}/metrics", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Initialize tracing subscriber
fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "sentra_server=info,sentra_sdk=info,sentra_runtime=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    Ok(())
}
