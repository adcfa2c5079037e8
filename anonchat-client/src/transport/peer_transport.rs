use crate::config::SessionConfig;
use crate::media::LocalMedia;
use crate::transport::transport_event::TransportEvent;
use anonchat_core::{IceCandidate, SessionDescription};
use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// One direct peer connection, used for exactly one match.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// Attach every local track so the partner receives our media.
    async fn add_local_media(&self, media: &LocalMedia) -> Result<()>;

    /// Open the chat channel, create an offer and install it as the local description.
    async fn create_offer(&self) -> Result<SessionDescription>;

    /// Create an answer to the installed remote offer and install it locally.
    async fn create_answer(&self) -> Result<SessionDescription>;

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()>;

    async fn has_remote_description(&self) -> bool;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()>;

    /// Send text over the chat channel. Fails while the channel is not open.
    async fn send_text(&self, text: &str) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

/// Builds a fresh [`PeerTransport`] for every match.
#[async_trait]
pub trait TransportFactory: Send + Sync + 'static {
    async fn create(
        &self,
        config: &SessionConfig,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Box<dyn PeerTransport>>;
}
