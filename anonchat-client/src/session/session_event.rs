use crate::transport::LinkState;
use anonchat_core::{Phase, Role, RoomId};

/// Notifications for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    PhaseChanged(Phase),

    /// A partner is on the other end of `room_id`.
    Matched { room_id: RoomId, role: Role },

    /// The partner hung up; a new search starts right away.
    PartnerLeft,

    MessageReceived(String),
    MessageSent(String),

    /// An outgoing message was rejected by moderation. The session moves on
    /// to the next partner.
    Violation { reason: String },

    /// Camera/microphone could not be acquired; the session stays idle.
    MediaDenied(String),

    MuteChanged { muted: bool },
    VideoChanged { video_off: bool },

    LinkStateChanged(LinkState),

    Error(String),
}
