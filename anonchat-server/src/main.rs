use anonchat_server::{ServerConfig, StoreService, router};
use anonchat_store::MemoryRoomStore;
use anyhow::Context;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = ServerConfig::from_env();
    let service = StoreService::new(Arc::new(MemoryRoomStore::new()));
    let app = router(service);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("Room store listening on ws://{}/store", config.bind_addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
