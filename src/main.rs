//! FleetPulse - IoT Device Status Service
//!
//! Ingests periodic device status reports and serves latest-status,
//! fleet-summary, at-risk, and history queries over HTTP.

mod config;
mod db;
mod error;
mod metrics;
mod query;
mod web;

use config::ServerConfig;
use db::Store;
use web::Server;

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("fleetpulse=info".parse()?))
        .init();

    // Load configuration
    let cfg = ServerConfig::load();
    tracing::info!("Starting FleetPulse on port {}...", cfg.http_port);
    tracing::info!("Using database at {}", cfg.db_path);

    // Initialize database
    let store = Arc::new(Store::new(&cfg.db_path)?);
    tracing::info!("Database initialized successfully");

    // Register Prometheus metrics
    metrics::init_metrics();

    // Start web server
    let server = Server::new(cfg, store);
    server.start().await?;

    Ok(())
}
