use crate::error::StoreResult;
use crate::store::subscription::Subscription;
use anonchat_core::{
    CandidateChange, CandidateDirection, CandidateId, IceCandidate, RoomId, RoomRecord,
    RoomSnapshot, SessionDescription,
};
use async_trait::async_trait;

/// Shared document store the matchmaker and signaling exchange talk through.
///
/// Rooms are plain documents; each room owns two append-only candidate
/// collections, one per [`CandidateDirection`]. Candidate collections live
/// independently of the room document, so deleting a room does not remove its
/// candidates. Callers clear them explicitly.
#[async_trait]
pub trait RoomStore: Send + Sync + 'static {
    /// Create a new room with `waiting = true` and no descriptions.
    async fn create_room(&self) -> StoreResult<RoomRecord>;

    /// First room (in creation order) that is waiting and already carries an offer.
    async fn find_waiting_room(&self) -> StoreResult<Option<RoomRecord>>;

    async fn get_room(&self, room_id: &RoomId) -> StoreResult<Option<RoomRecord>>;

    async fn set_offer(&self, room_id: &RoomId, offer: SessionDescription) -> StoreResult<()>;

    /// Write `answer` and clear `waiting` in one atomic step, but only if the
    /// room is still waiting. Returns `false` when someone else got there first
    /// or the room is gone.
    async fn claim_room(&self, room_id: &RoomId, answer: SessionDescription)
    -> StoreResult<bool>;

    /// Remove the room document. Deleting a missing room is not an error.
    async fn delete_room(&self, room_id: &RoomId) -> StoreResult<()>;

    async fn add_candidate(
        &self,
        room_id: &RoomId,
        direction: CandidateDirection,
        candidate: IceCandidate,
    ) -> StoreResult<CandidateId>;

    /// Delete every candidate in one collection, returning how many were removed.
    async fn clear_candidates(
        &self,
        room_id: &RoomId,
        direction: CandidateDirection,
    ) -> StoreResult<usize>;

    /// Current snapshot first, then one snapshot per write, in write order.
    async fn watch_room(&self, room_id: &RoomId) -> StoreResult<Subscription<RoomSnapshot>>;

    /// Existing candidates first (as `Added`), then every later change batch.
    async fn watch_candidates(
        &self,
        room_id: &RoomId,
        direction: CandidateDirection,
    ) -> StoreResult<Subscription<Vec<CandidateChange>>>;
}
