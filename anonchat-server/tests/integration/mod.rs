//! Integration tests for the room store service.
//!
//! - `store_tests` - request/reply and subscriptions over a real WebSocket


use anonchat_server::{StoreService, router};
use anonchat_store::{MemoryRoomStore, WsRoomStore};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::Level;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Serve a fresh in-memory store on an ephemeral port.
///
/// Returns the backing store (for direct inspection) and the service address.
pub async fn spawn_store_server() -> (MemoryRoomStore, SocketAddr) {
    let store = MemoryRoomStore::new();
    let app = router(StoreService::new(Arc::new(store.clone())));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("No local address");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    (store, addr)
}

pub async fn connect_client(addr: SocketAddr) -> WsRoomStore {
    WsRoomStore::connect(&format!("ws://{}/store", addr))
        .await
        .expect("Failed to connect to room store")
}
