use crate::media::RemoteStream;
use crate::signaling::{SignalingEvent, SignalingLink};
use crate::transport::{PeerTransport, TransportEvent};
use anonchat_core::{Role, RoomId};
use tokio::sync::mpsc;

pub(crate) enum CallEvent {
    Signal(SignalingEvent),
    Transport(Option<TransportEvent>),
}

/// Everything owned by one match: the peer connection, its event channel and
/// the store subscriptions. Torn down as a unit.
pub(crate) struct ActiveCall {
    pub(crate) room_id: RoomId,
    pub(crate) role: Role,
    pub(crate) transport: Box<dyn PeerTransport>,
    pub(crate) link: SignalingLink,
    pub(crate) remote: RemoteStream,
    transport_rx: mpsc::Receiver<TransportEvent>,
    transport_open: bool,
}

impl ActiveCall {
    pub(crate) fn new(
        transport: Box<dyn PeerTransport>,
        transport_rx: mpsc::Receiver<TransportEvent>,
        link: SignalingLink,
        remote: RemoteStream,
    ) -> Self {
        Self {
            room_id: link.room_id(),
            role: link.role(),
            transport,
            link,
            remote,
            transport_rx,
            transport_open: true,
        }
    }

    pub(crate) async fn next_event(&mut self) -> CallEvent {
        tokio::select! {
            event = self.link.next_event() => CallEvent::Signal(event),
            event = self.transport_rx.recv(), if self.transport_open => {
                if event.is_none() {
                    self.transport_open = false;
                }
                CallEvent::Transport(event)
            }
        }
    }
}

/// Next event of the current call; pends forever when there is none.
pub(crate) async fn next_call_event(call: &mut Option<ActiveCall>) -> CallEvent {
    match call {
        Some(call) => call.next_event().await,
        None => std::future::pending().await,
    }
}
