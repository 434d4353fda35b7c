use std::sync::Arc;

use anyhow::Context;

use wms_ingest::{FileProcessor, FileProcessorConfig, InMemoryServiceProvider};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    wms_observability::init();

    let config = FileProcessorConfig::load().context("failed to load configuration")?;

    for dir in [&config.watch_path, &config.processed_path, &config.error_path] {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }

    let services = Arc::new(InMemoryServiceProvider::new());
    let handle = FileProcessor::new(config, services)?
        .start()
        .await
        .context("failed to start file processor")?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    tracing::info!("shutdown requested");

    handle.stop().await;
    Ok(())
}
