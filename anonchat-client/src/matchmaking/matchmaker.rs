use anonchat_core::{CandidateDirection, RoomId, Role, SessionDescription};
use anonchat_store::{RoomStore, StoreResult};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of one matchmaking attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// A fresh room was created; we publish the offer and wait for a partner.
    Offering { room_id: RoomId },

    /// A waiting room was found; we answer its offer.
    Answering {
        room_id: RoomId,
        offer: SessionDescription,
    },
}

impl MatchOutcome {
    pub fn room_id(&self) -> RoomId {
        match self {
            MatchOutcome::Offering { room_id } | MatchOutcome::Answering { room_id, .. } => *room_id,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            MatchOutcome::Offering { .. } => Role::Offering,
            MatchOutcome::Answering { .. } => Role::Answering,
        }
    }
}

/// Pairs clients through the room store: join the first waiting room, or
/// open a new one.
#[derive(Clone)]
pub struct Matchmaker {
    store: Arc<dyn RoomStore>,
}

impl Matchmaker {
    pub fn new(store: Arc<dyn RoomStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn RoomStore> {
        &self.store
    }

    /// Join the first waiting room that carries an offer, otherwise create one.
    ///
    /// Joining is not final until the answer is claimed; two searches that run
    /// at the same moment may both find nothing and both create rooms.
    pub async fn find_or_create_room(&self) -> StoreResult<MatchOutcome> {
        if let Some(room) = self.store.find_waiting_room().await? {
            if let Some(offer) = room.offer {
                debug!("Found waiting room {}", room.id);
                return Ok(MatchOutcome::Answering {
                    room_id: room.id,
                    offer,
                });
            }
        }

        let room_id = self.create_room().await?;
        Ok(MatchOutcome::Offering { room_id })
    }

    pub async fn create_room(&self) -> StoreResult<RoomId> {
        let room = self.store.create_room().await?;
        info!("Created room {}", room.id);
        Ok(room.id)
    }

    /// Delete both candidate collections, then the room itself.
    ///
    /// Best effort: failures are logged and swallowed. `notify` is false when
    /// reacting to the partner's hang-up, where the room is usually gone already.
    pub async fn teardown_room(&self, room_id: &RoomId, notify: bool) {
        if notify {
            info!("Hanging up room {}", room_id);
        } else {
            debug!("Cleaning up after partner left room {}", room_id);
        }

        for direction in [CandidateDirection::Caller, CandidateDirection::Callee] {
            if let Err(e) = self.store.clear_candidates(room_id, direction).await {
                if notify {
                    warn!("Failed to clear {} of room {}: {}", direction, room_id, e);
                } else {
                    debug!("Failed to clear {} of room {}: {}", direction, room_id, e);
                }
            }
        }

        if let Err(e) = self.store.delete_room(room_id).await {
            if notify {
                warn!("Failed to delete room {}: {}", room_id, e);
            } else {
                debug!("Failed to delete room {}: {}", room_id, e);
            }
        }
    }
}
