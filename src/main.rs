use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;
mod domain;
mod metrics;
mod store;
mod utils;

use config::{Config, StorageKind};
use domain::order::OrderCommandHandler;
use store::{MemoryOrderStore, OrderRepository, RedisOrderStore};
use utils::RetryConfig;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::parse();

    // RUST_LOG wins over --log-level, e.g. RUST_LOG=debug cargo run
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    tracing::info!(storage = ?config.storage, "Starting order service");

    let metrics = Arc::new(metrics::Metrics::new()?);
    tracing::info!(
        "Metrics registry created with {} metrics",
        metrics.registry().gather().len()
    );

    let repository: Arc<dyn OrderRepository> = match config.storage {
        StorageKind::Redis => {
            tracing::info!(addr = %config.redis_addr, "Connecting to Redis...");
            let info = config
                .redis_connection_info()
                .context("invalid Redis connection settings")?;
            let client = redis::Client::open(info)?;
            let store = RedisOrderStore::connect(&client, config.store_timeout())
                .await
                .with_context(|| format!("failed to connect to Redis at {}", config.redis_addr))?;
            Arc::new(store)
        }
        StorageKind::Memory => {
            tracing::warn!("Using in-memory storage; orders are lost on restart");
            Arc::new(MemoryOrderStore::new())
        }
    };

    let handler = OrderCommandHandler::new(repository, metrics.clone())
        .with_page_size(config.page_size)
        .with_retry(RetryConfig {
            max_attempts: config.update_attempts,
            ..RetryConfig::default()
        });

    handler
        .ping()
        .await
        .context("order store did not answer the startup ping")?;

    api::run(handler, metrics, config.server_port).await?;

    tracing::info!("Order service stopped");
    Ok(())
}
