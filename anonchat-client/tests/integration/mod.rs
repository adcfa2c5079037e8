//! Integration tests for the chat client.
//!
//! - `matchmaking_tests` - room selection, claims and teardown against the in-memory store
//! - `signaling_tests` - offer/answer and candidate exchange through the store
//! - `session_tests` - full session actors, over mock and real peer connections

pub mod matchmaking_tests;
pub mod session_tests;
pub mod signaling_tests;

use anonchat_client::{
    AllowAll, MediaSource, ModerationGate, PeerSession, SessionConfig, SessionHandle,
    SyntheticMediaSource, TransportFactory,
};
use anonchat_store::RoomStore;
use std::sync::Arc;
use tracing::Level;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Everything a test session is built from.
pub struct SessionParts {
    pub store: Arc<dyn RoomStore>,
    pub transports: Arc<dyn TransportFactory>,
    pub media: Arc<dyn MediaSource>,
    pub moderator: Arc<dyn ModerationGate>,
    pub config: SessionConfig,
}

impl SessionParts {
    pub fn new(store: Arc<dyn RoomStore>, transports: Arc<dyn TransportFactory>) -> Self {
        Self {
            store,
            transports,
            media: Arc::new(SyntheticMediaSource::new()),
            moderator: Arc::new(AllowAll),
            config: SessionConfig::local(),
        }
    }

    pub fn with_media(mut self, media: Arc<dyn MediaSource>) -> Self {
        self.media = media;
        self
    }

    pub fn with_moderator(mut self, moderator: Arc<dyn ModerationGate>) -> Self {
        self.moderator = moderator;
        self
    }

    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Spawn the session actor and return its handle.
    pub fn spawn(self) -> SessionHandle {
        let (session, handle) = PeerSession::new(
            self.store,
            self.transports,
            self.media,
            self.moderator,
            self.config,
        );
        tokio::spawn(async move {
            session.run().await;
        });
        handle
    }
}
