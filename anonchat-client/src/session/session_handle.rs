use crate::error::SessionError;
use crate::media::RemoteStream;
use crate::session::session_command::SessionCommand;
use crate::session::session_event::SessionEvent;
use anonchat_core::Phase;
use tokio::sync::{mpsc, watch};

/// Front end of a running [`PeerSession`](crate::PeerSession).
///
/// Dropping the handle shuts the session down.
pub struct SessionHandle {
    pub(crate) command_tx: mpsc::UnboundedSender<SessionCommand>,
    pub(crate) phase_rx: watch::Receiver<Phase>,
    pub(crate) remote_rx: watch::Receiver<RemoteStream>,
    pub(crate) event_rx: mpsc::UnboundedReceiver<SessionEvent>,
}

impl SessionHandle {
    pub fn send(&self, command: SessionCommand) -> Result<(), SessionError> {
        self.command_tx
            .send(command)
            .map_err(|_| SessionError::Closed)
    }

    pub fn start(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::Start)
    }

    pub fn next(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::Next)
    }

    pub fn cancel(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::Cancel)
    }

    pub fn toggle_mute(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::ToggleMute)
    }

    pub fn toggle_video(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::ToggleVideo)
    }

    pub fn send_message(&self, text: impl Into<String>) -> Result<(), SessionError> {
        self.send(SessionCommand::SendMessage(text.into()))
    }

    pub fn phase(&self) -> Phase {
        *self.phase_rx.borrow()
    }

    /// Partner media for the current match. Values are never mutated; watch
    /// for replacements with [`SessionHandle::subscribe_remote_stream`].
    pub fn remote_stream(&self) -> RemoteStream {
        self.remote_rx.borrow().clone()
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<Phase> {
        self.phase_rx.clone()
    }

    pub fn subscribe_remote_stream(&self) -> watch::Receiver<RemoteStream> {
        self.remote_rx.clone()
    }

    /// Next session event, or `None` once the session has stopped.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.event_rx.recv().await
    }

    pub fn try_next_event(&mut self) -> Option<SessionEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Stop the session. Equivalent to dropping the handle.
    pub fn close(self) {
        drop(self);
    }
}
