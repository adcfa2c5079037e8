/// User intents a [`PeerSession`](crate::PeerSession) reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// Acquire media (once) and look for a partner.
    Start,

    /// Hang up on the current partner and look for another one.
    Next,

    /// Hang up, release media and go idle.
    Cancel,

    ToggleMute,
    ToggleVideo,

    /// Chat text for the partner. Checked by the moderation gate first.
    SendMessage(String),
}
