//! cloudhost - Cloud Host Inventory Service
//!
//! Serves a generated, internally consistent cloud host inventory over HTTP.

mod config;
mod format;
mod metrics;
mod mock;
mod store;
mod web;

use config::ServerConfig;
use store::{Inventory, InventoryOptions, Latency};
use web::Server;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("cloudhost=info".parse()?))
        .init();

    // Load configuration
    let cfg = ServerConfig::load();
    tracing::info!("Starting cloudhost on port {}...", cfg.http_port);
    match cfg.seed {
        Some(seed) => tracing::info!("Generator seed {}", seed),
        None => tracing::info!("Generator seeded from entropy"),
    }

    // Generate the inventory
    let inventory = Inventory::new(InventoryOptions {
        host_count: cfg.host_count,
        channel_count: cfg.channel_count,
        seed: cfg.seed,
        latency: if cfg.latency { Latency::default() } else { Latency::none() },
        window_end: cfg.window_end,
    });
    let snapshot = inventory.snapshot().await;
    tracing::info!(
        "Inventory ready: {} hosts, {} channels, {} change records",
        snapshot.hosts.len(),
        snapshot.channel_summaries.len(),
        snapshot.change_records.len()
    );

    // Start web server
    let server = Server::new(cfg, inventory);
    server.start().await?;

    Ok(())
}
