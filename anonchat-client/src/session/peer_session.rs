use crate::config::SessionConfig;
use crate::error::{SessionError, SignalingError};
use crate::matchmaking::{MatchOutcome, Matchmaker};
use crate::media::{LocalMedia, MediaSource, RemoteStream};
use crate::moderation::{ModerationGate, check_message};
use crate::session::active_call::{ActiveCall, CallEvent, next_call_event};
use crate::session::session_command::SessionCommand;
use crate::session::session_event::SessionEvent;
use crate::session::session_handle::SessionHandle;
use crate::signaling::{RoomUpdate, SignalingEvent, SignalingLink};
use crate::transport::{LinkState, PeerTransport, TransportEvent, TransportFactory};
use anonchat_core::{Phase, Role, RoomSnapshot};
use anonchat_store::RoomStore;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

/// The chat session actor.
///
/// Owns at most one [`ActiveCall`] at a time; a call is always closed and its
/// subscriptions cancelled before the next one starts. All state changes go
/// through [`PeerSession::run`].
pub struct PeerSession {
    matchmaker: Matchmaker,
    transports: Arc<dyn TransportFactory>,
    media_source: Arc<dyn MediaSource>,
    moderator: Arc<dyn ModerationGate>,
    config: SessionConfig,

    command_rx: mpsc::UnboundedReceiver<SessionCommand>,
    event_tx: mpsc::UnboundedSender<SessionEvent>,
    phase_tx: watch::Sender<Phase>,
    remote_tx: watch::Sender<RemoteStream>,

    /// Acquired on the first start, kept across "next", released on cancel.
    local_media: Option<LocalMedia>,
    call: Option<ActiveCall>,
    generation: u64,
}

impl PeerSession {
    pub fn new(
        store: Arc<dyn RoomStore>,
        transports: Arc<dyn TransportFactory>,
        media_source: Arc<dyn MediaSource>,
        moderator: Arc<dyn ModerationGate>,
        config: SessionConfig,
    ) -> (Self, SessionHandle) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (phase_tx, phase_rx) = watch::channel(Phase::Idle);
        let (remote_tx, remote_rx) = watch::channel(RemoteStream::default());

        let session = Self {
            matchmaker: Matchmaker::new(store),
            transports,
            media_source,
            moderator,
            config,
            command_rx,
            event_tx,
            phase_tx,
            remote_tx,
            local_media: None,
            call: None,
            generation: 0,
        };
        let handle = SessionHandle {
            command_tx,
            phase_rx,
            remote_rx,
            event_rx,
        };
        (session, handle)
    }

    /// Event loop. Runs until the [`SessionHandle`] is dropped, then hangs up.
    pub async fn run(mut self) {
        info!("Session event loop started");

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(c) => self.handle_command(c).await,
                        None => {
                            info!("Session handle dropped. Shutting down session.");
                            break;
                        }
                    }
                }

                evt = next_call_event(&mut self.call) => self.handle_call_event(evt).await,
            }
        }

        self.cancel().await;
        info!("Session event loop finished");
    }

    async fn handle_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::Start => self.start().await,

            SessionCommand::Next => {
                if self.phase() == Phase::Idle {
                    debug!("Ignoring next while idle");
                    return;
                }
                self.end_call(true).await;
                self.enter_search().await;
            }

            SessionCommand::Cancel => self.cancel().await,

            SessionCommand::ToggleMute => {
                let Some(media) = &self.local_media else { return };
                let muted = media.toggle_audio();
                self.emit(SessionEvent::MuteChanged { muted });
            }

            SessionCommand::ToggleVideo => {
                let Some(media) = &self.local_media else { return };
                let video_off = media.toggle_video();
                self.emit(SessionEvent::VideoChanged { video_off });
            }

            SessionCommand::SendMessage(text) => self.send_message(text).await,
        }
    }

    async fn handle_call_event(&mut self, event: CallEvent) {
        match event {
            CallEvent::Signal(SignalingEvent::Room(Some(snapshot))) => {
                self.on_room_snapshot(snapshot).await
            }

            CallEvent::Signal(SignalingEvent::Room(None)) => {
                warn!("Room subscription ended unexpectedly");
                self.emit(SessionEvent::Error("lost connection to the room store".to_owned()));
                self.end_call(true).await;
                self.set_phase(Phase::Idle);
            }

            CallEvent::Signal(SignalingEvent::Candidates(Some(changes))) => {
                let Some(call) = &self.call else { return };
                let applied = call
                    .link
                    .apply_candidate_changes(call.transport.as_ref(), changes)
                    .await;
                debug!("Applied {} remote candidate(s)", applied);
            }

            CallEvent::Signal(SignalingEvent::Candidates(None)) => {
                debug!("Remote candidate subscription ended");
            }

            CallEvent::Transport(Some(event)) => self.on_transport_event(event).await,

            CallEvent::Transport(None) => debug!("Transport event channel closed"),
        }
    }

    async fn on_room_snapshot(&mut self, snapshot: RoomSnapshot) {
        let Some(call) = &self.call else { return };
        let (room_id, role) = (call.room_id, call.role);
        let update = call
            .link
            .apply_room_snapshot(call.transport.as_ref(), snapshot)
            .await;

        match update {
            Ok(RoomUpdate::Unchanged) => {}
            Ok(RoomUpdate::AnswerApplied) => {
                self.emit(SessionEvent::Matched { room_id, role });
                self.set_phase(Phase::Connected);
            }
            Ok(RoomUpdate::RemoteHangUp) => {
                info!("Partner left room {}", room_id);
                self.emit(SessionEvent::PartnerLeft);
                self.end_call(false).await;
                self.enter_search().await;
            }
            Err(e) => {
                error!("Failed to apply room update for {}: {}", room_id, e);
                self.emit(SessionEvent::Error(e.to_string()));
                self.end_call(true).await;
                self.enter_search().await;
            }
        }
    }

    async fn on_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::CandidateGenerated(candidate) => {
                let Some(call) = &self.call else { return };
                let published = call
                    .link
                    .publish_candidate(self.matchmaker.store().as_ref(), candidate)
                    .await;
                if let Err(e) = published {
                    warn!("Failed to publish local candidate: {}", e);
                }
            }

            TransportEvent::TrackAdded(track) => {
                let Some(call) = &mut self.call else { return };
                call.remote = call.remote.with_track(track);
                self.remote_tx.send_replace(call.remote.clone());
            }

            TransportEvent::TextReceived(text) => {
                self.emit(SessionEvent::MessageReceived(text));
            }

            TransportEvent::StateChanged(state) => {
                self.emit(SessionEvent::LinkStateChanged(state));
                if state == LinkState::Failed && self.call.is_some() {
                    warn!("Peer connection failed, looking for a new partner");
                    self.emit(SessionEvent::Error("connection to partner failed".to_owned()));
                    self.end_call(true).await;
                    self.enter_search().await;
                }
            }
        }
    }

    async fn start(&mut self) {
        if self.phase() != Phase::Idle || self.call.is_some() {
            debug!("Ignoring start in phase {}", self.phase());
            return;
        }

        if self.local_media.is_none() {
            match self
                .media_source
                .acquire(self.config.audio, self.config.video)
                .await
            {
                Ok(media) => self.local_media = Some(media),
                Err(e) => {
                    warn!("Media unavailable: {}", e);
                    self.emit(SessionEvent::MediaDenied(e.to_string()));
                    self.set_phase(Phase::Idle);
                    return;
                }
            }
        }

        self.enter_search().await;
    }

    async fn cancel(&mut self) {
        self.end_call(true).await;
        if let Some(media) = self.local_media.take() {
            media.stop();
            debug!("Local media released");
        }
        self.set_phase(Phase::Idle);
    }

    async fn send_message(&mut self, text: String) {
        if self.phase() != Phase::Connected || text.trim().is_empty() {
            debug!("Not sending message in phase {}", self.phase());
            return;
        }

        let verdict = check_message(self.moderator.as_ref(), &text).await;
        if !verdict.is_safe {
            warn!("Outgoing message blocked: {}", verdict.reason);
            self.emit(SessionEvent::Violation {
                reason: verdict.reason,
            });
            self.end_call(true).await;
            self.enter_search().await;
            return;
        }

        let Some(call) = &self.call else { return };
        match call.transport.send_text(&text).await {
            Ok(()) => self.emit(SessionEvent::MessageSent(text)),
            Err(e) => {
                warn!("Failed to send message: {:#}", e);
                self.emit(SessionEvent::Error(format!("message not delivered: {:#}", e)));
            }
        }
    }

    async fn enter_search(&mut self) {
        self.set_phase(Phase::Searching);
        if let Err(e) = self.search().await {
            error!("Search failed: {}", e);
            self.emit(SessionEvent::Error(e.to_string()));
            self.set_phase(Phase::Idle);
        }
    }

    /// Find or create a room and start signaling in it. A lost claim means
    /// another client answered first; the scan is repeated a bounded number of
    /// times before falling back to opening our own room.
    async fn search(&mut self) -> Result<(), SessionError> {
        let mut lost_claims = 0;

        loop {
            let outcome = if lost_claims < self.config.max_claim_attempts {
                self.matchmaker.find_or_create_room().await?
            } else {
                MatchOutcome::Offering {
                    room_id: self.matchmaker.create_room().await?,
                }
            };

            match self.begin_call(outcome).await {
                Err(SessionError::Signaling(SignalingError::RoomTaken(room_id))) => {
                    lost_claims += 1;
                    debug!("Lost claim on room {} ({} so far)", room_id, lost_claims);
                }
                other => return other,
            }
        }
    }

    async fn begin_call(&mut self, outcome: MatchOutcome) -> Result<(), SessionError> {
        let room_id = outcome.room_id();
        let role = outcome.role();
        let (transport_tx, transport_rx) = mpsc::channel(self.config.event_capacity);

        let transport = match self.transports.create(&self.config, transport_tx).await {
            Ok(transport) => transport,
            Err(e) => {
                if role == Role::Offering {
                    self.matchmaker.teardown_room(&room_id, true).await;
                }
                return Err(SessionError::Transport(e));
            }
        };

        let link = match self.open_link(transport.as_ref(), outcome).await {
            Ok(link) => link,
            Err(e) => {
                if let Err(close_err) = transport.close().await {
                    debug!("Closing unused transport failed: {:#}", close_err);
                }
                let claimed = matches!(
                    e,
                    SessionError::Signaling(SignalingError::ClaimAbandoned { .. })
                );
                if role == Role::Offering || claimed {
                    self.matchmaker.teardown_room(&room_id, true).await;
                }
                return Err(e);
            }
        };

        self.generation += 1;
        let remote = RemoteStream::empty(self.generation);
        self.remote_tx.send_replace(remote.clone());
        self.call = Some(ActiveCall::new(transport, transport_rx, link, remote));
        info!("Signaling started in room {} as {}", room_id, role);

        if role == Role::Answering {
            self.emit(SessionEvent::Matched { room_id, role });
            self.set_phase(Phase::Connected);
        }
        Ok(())
    }

    async fn open_link(
        &self,
        transport: &dyn PeerTransport,
        outcome: MatchOutcome,
    ) -> Result<SignalingLink, SessionError> {
        if let Some(media) = &self.local_media {
            transport
                .add_local_media(media)
                .await
                .map_err(SessionError::Transport)?;
        }

        let store = self.matchmaker.store().as_ref();
        let link = match outcome {
            MatchOutcome::Offering { room_id } => {
                SignalingLink::start_offering(store, transport, room_id).await?
            }
            MatchOutcome::Answering { room_id, offer } => {
                SignalingLink::start_answering(store, transport, room_id, offer).await?
            }
        };
        Ok(link)
    }

    /// Close the peer connection, cancel the subscriptions, then tear the room
    /// down. The remote stream is replaced by an empty one.
    async fn end_call(&mut self, notify: bool) {
        let Some(call) = self.call.take() else { return };
        let ActiveCall {
            room_id,
            transport,
            link,
            ..
        } = call;

        if let Err(e) = transport.close().await {
            debug!("Closing transport for room {} failed: {:#}", room_id, e);
        }
        link.cancel();
        self.matchmaker.teardown_room(&room_id, notify).await;

        self.generation += 1;
        self.remote_tx
            .send_replace(RemoteStream::empty(self.generation));
    }

    fn phase(&self) -> Phase {
        *self.phase_tx.borrow()
    }

    /// The event goes out before the watch value changes, so whoever observes
    /// the new phase can already drain the matching event.
    fn set_phase(&self, phase: Phase) {
        if self.phase() == phase {
            return;
        }
        info!("Session phase: {}", phase);
        self.emit(SessionEvent::PhaseChanged(phase));
        self.phase_tx.send_replace(phase);
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.event_tx.send(event);
    }
}
