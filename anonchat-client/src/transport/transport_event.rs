use crate::media::RemoteTrack;
use anonchat_core::IceCandidate;
use std::fmt;

/// Connectivity of the direct peer link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkState {
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

impl LinkState {
    /// States after which the link will not recover on its own.
    pub fn is_terminal(self) -> bool {
        matches!(self, LinkState::Failed | LinkState::Closed)
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LinkState::Connecting => "connecting",
            LinkState::Connected => "connected",
            LinkState::Disconnected => "disconnected",
            LinkState::Failed => "failed",
            LinkState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Events a peer transport produces for the session loop.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// A local ICE candidate was gathered and must be published to the room.
    CandidateGenerated(IceCandidate),

    /// The partner started sending a media track.
    TrackAdded(RemoteTrack),

    /// Text arrived on the chat data channel.
    TextReceived(String),

    StateChanged(LinkState),
}
