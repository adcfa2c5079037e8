use crate::error::SignalingError;
use crate::transport::PeerTransport;
use anonchat_core::{
    CandidateChange, CandidateDirection, CandidateId, ChangeKind, IceCandidate, Role, RoomId,
    RoomSnapshot, SessionDescription,
};
use anonchat_store::{RoomStore, StoreError, Subscription};
use tracing::{debug, info, warn};

/// What a room snapshot meant for the local side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomUpdate {
    Unchanged,
    /// The partner's answer was installed as the remote description.
    AnswerApplied,
    /// The room document is gone: the partner hung up.
    RemoteHangUp,
}

/// Next item from either of a link's subscriptions. `None` means the
/// subscription has ended.
#[derive(Debug)]
pub enum SignalingEvent {
    Room(Option<RoomSnapshot>),
    Candidates(Option<Vec<CandidateChange>>),
}

/// Store-side half of one call: the room document subscription plus the
/// partner's candidate collection.
///
/// Dropping the link cancels both subscriptions, so nothing the store sends
/// afterwards can reach the session.
#[derive(Debug)]
pub struct SignalingLink {
    room_id: RoomId,
    role: Role,
    room_events: Subscription<RoomSnapshot>,
    remote_candidates: Subscription<Vec<CandidateChange>>,
    candidates_open: bool,
}

impl SignalingLink {
    /// Offering side: publish our offer, then listen for the answer and the
    /// callee's candidates.
    pub async fn start_offering(
        store: &dyn RoomStore,
        transport: &dyn PeerTransport,
        room_id: RoomId,
    ) -> Result<Self, SignalingError> {
        let offer = transport
            .create_offer()
            .await
            .map_err(SignalingError::Transport)?;
        store.set_offer(&room_id, offer).await?;
        debug!("Offer written to room {}", room_id);

        let room_events = store.watch_room(&room_id).await?;
        let remote_candidates = store
            .watch_candidates(&room_id, CandidateDirection::Callee)
            .await?;

        Ok(Self {
            room_id,
            role: Role::Offering,
            room_events,
            remote_candidates,
            candidates_open: true,
        })
    }

    /// Answering side: answer `offer`, claim the room, then listen for the
    /// caller's candidates and for the room disappearing.
    ///
    /// Fails with [`SignalingError::RoomTaken`] when another client claimed the
    /// room first, and with [`SignalingError::ClaimAbandoned`] when the room
    /// was claimed but could not be watched.
    pub async fn start_answering(
        store: &dyn RoomStore,
        transport: &dyn PeerTransport,
        room_id: RoomId,
        offer: SessionDescription,
    ) -> Result<Self, SignalingError> {
        transport
            .set_remote_description(offer)
            .await
            .map_err(SignalingError::Transport)?;
        let answer = transport
            .create_answer()
            .await
            .map_err(SignalingError::Transport)?;

        if !store.claim_room(&room_id, answer).await? {
            info!("Room {} was claimed by someone else", room_id);
            return Err(SignalingError::RoomTaken(room_id));
        }

        let abandon = |source: StoreError| {
            warn!("Lost track of claimed room {}: {}", room_id, source);
            SignalingError::ClaimAbandoned { room_id, source }
        };
        let remote_candidates = store
            .watch_candidates(&room_id, CandidateDirection::Caller)
            .await
            .map_err(abandon)?;
        let room_events = store.watch_room(&room_id).await.map_err(abandon)?;

        Ok(Self {
            room_id,
            role: Role::Answering,
            room_events,
            remote_candidates,
            candidates_open: true,
        })
    }

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Collection our own candidates go to.
    pub fn own_direction(&self) -> CandidateDirection {
        CandidateDirection::produced_by(self.role)
    }

    /// Wait for the next room snapshot or candidate batch.
    pub async fn next_event(&mut self) -> SignalingEvent {
        tokio::select! {
            snapshot = self.room_events.next() => SignalingEvent::Room(snapshot),
            changes = self.remote_candidates.next(), if self.candidates_open => {
                if changes.is_none() {
                    self.candidates_open = false;
                }
                SignalingEvent::Candidates(changes)
            }
        }
    }

    /// React to a room snapshot. The answer is applied at most once: repeated
    /// snapshots carrying it are ignored once a remote description exists.
    pub async fn apply_room_snapshot(
        &self,
        transport: &dyn PeerTransport,
        snapshot: RoomSnapshot,
    ) -> Result<RoomUpdate, SignalingError> {
        let Some(record) = snapshot.record else {
            return Ok(RoomUpdate::RemoteHangUp);
        };

        if self.role != Role::Offering {
            return Ok(RoomUpdate::Unchanged);
        }
        let Some(answer) = record.answer else {
            return Ok(RoomUpdate::Unchanged);
        };
        if transport.has_remote_description().await {
            return Ok(RoomUpdate::Unchanged);
        }

        transport
            .set_remote_description(answer)
            .await
            .map_err(SignalingError::Transport)?;
        info!("Answer applied for room {}", self.room_id);
        Ok(RoomUpdate::AnswerApplied)
    }

    /// Hand every newly added partner candidate to the transport, each on its
    /// own. Returns how many were accepted.
    pub async fn apply_candidate_changes(
        &self,
        transport: &dyn PeerTransport,
        changes: Vec<CandidateChange>,
    ) -> usize {
        let mut applied = 0;
        for change in changes {
            if change.kind != ChangeKind::Added {
                continue;
            }
            match transport.add_ice_candidate(change.record.candidate).await {
                Ok(()) => applied += 1,
                Err(e) => warn!(
                    "Failed to add candidate {} in room {}: {:#}",
                    change.record.id, self.room_id, e
                ),
            }
        }
        applied
    }

    /// Append a locally gathered candidate to our own collection.
    pub async fn publish_candidate(
        &self,
        store: &dyn RoomStore,
        candidate: IceCandidate,
    ) -> Result<CandidateId, SignalingError> {
        let id = store
            .add_candidate(&self.room_id, self.own_direction(), candidate)
            .await?;
        Ok(id)
    }

    /// Cancel both subscriptions.
    pub fn cancel(self) {
        drop(self);
    }
}
