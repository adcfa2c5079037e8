use crate::error::{StoreError, StoreResult};
use crate::store::room_store::RoomStore;
use crate::store::subscription::Subscription;
use anonchat_core::{
    CandidateChange, CandidateDirection, CandidateId, CandidateRecord, IceCandidate, RoomId,
    RoomRecord, RoomSnapshot, SessionDescription, SubscriptionId,
};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::debug;

type CandidateKey = (RoomId, CandidateDirection);
type RoomWatcher = mpsc::UnboundedSender<RoomSnapshot>;
type CandidateWatcher = mpsc::UnboundedSender<Vec<CandidateChange>>;

struct StoredRoom {
    seq: u64,
    record: RoomRecord,
}

struct MemoryInner {
    rooms: DashMap<RoomId, StoredRoom>,
    candidates: DashMap<CandidateKey, Vec<CandidateRecord>>,
    room_watchers: DashMap<RoomId, Vec<RoomWatcher>>,
    candidate_watchers: DashMap<CandidateKey, Vec<CandidateWatcher>>,
    next_seq: AtomicU64,
}

/// Process-local [`RoomStore`].
///
/// Notifications for a document are sent while the document's map entry is
/// still locked, which keeps per-document delivery in write order.
#[derive(Clone)]
pub struct MemoryRoomStore {
    inner: Arc<MemoryInner>,
}

impl MemoryRoomStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MemoryInner {
                rooms: DashMap::new(),
                candidates: DashMap::new(),
                room_watchers: DashMap::new(),
                candidate_watchers: DashMap::new(),
                next_seq: AtomicU64::new(0),
            }),
        }
    }

    pub fn room_count(&self) -> usize {
        self.inner.rooms.len()
    }

    pub fn candidate_count(&self, room_id: &RoomId, direction: CandidateDirection) -> usize {
        self.inner
            .candidates
            .get(&(*room_id, direction))
            .map(|list| list.len())
            .unwrap_or(0)
    }

    pub fn watched_room_count(&self) -> usize {
        self.inner.room_watchers.len()
    }

    pub fn watched_candidate_count(&self) -> usize {
        self.inner.candidate_watchers.len()
    }

    fn notify_room(&self, snapshot: RoomSnapshot) {
        let Some(mut watchers) = self.inner.room_watchers.get_mut(&snapshot.room_id) else {
            return;
        };
        watchers.retain(|tx| tx.send(snapshot.clone()).is_ok());
        let drained = watchers.is_empty();
        drop(watchers);

        if drained {
            self.inner
                .room_watchers
                .remove_if(&snapshot.room_id, |_, list| list.is_empty());
        }
    }

    fn notify_candidates(&self, key: &CandidateKey, changes: Vec<CandidateChange>) {
        if changes.is_empty() {
            return;
        }
        let Some(mut watchers) = self.inner.candidate_watchers.get_mut(key) else {
            return;
        };
        watchers.retain(|tx| tx.send(changes.clone()).is_ok());
        let drained = watchers.is_empty();
        drop(watchers);

        if drained {
            self.inner
                .candidate_watchers
                .remove_if(key, |_, list| list.is_empty());
        }
    }

    fn update_room<F>(&self, room_id: &RoomId, apply: F) -> StoreResult<bool>
    where
        F: FnOnce(&mut RoomRecord) -> bool,
    {
        let Some(mut stored) = self.inner.rooms.get_mut(room_id) else {
            return Err(StoreError::RoomNotFound(*room_id));
        };

        let changed = apply(&mut stored.record);
        if changed {
            self.notify_room(RoomSnapshot {
                room_id: *room_id,
                record: Some(stored.record.clone()),
            });
        }
        Ok(changed)
    }
}

impl Default for MemoryRoomStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoomStore for MemoryRoomStore {
    async fn create_room(&self) -> StoreResult<RoomRecord> {
        let record = RoomRecord::waiting(RoomId::new());
        let seq = self.inner.next_seq.fetch_add(1, Ordering::SeqCst);

        self.inner.rooms.insert(
            record.id,
            StoredRoom {
                seq,
                record: record.clone(),
            },
        );
        debug!("Room {} created", record.id);
        Ok(record)
    }

    async fn find_waiting_room(&self) -> StoreResult<Option<RoomRecord>> {
        let found = self
            .inner
            .rooms
            .iter()
            .filter(|entry| entry.record.is_joinable())
            .min_by_key(|entry| entry.seq)
            .map(|entry| entry.record.clone());
        Ok(found)
    }

    async fn get_room(&self, room_id: &RoomId) -> StoreResult<Option<RoomRecord>> {
        Ok(self
            .inner
            .rooms
            .get(room_id)
            .map(|stored| stored.record.clone()))
    }

    async fn set_offer(&self, room_id: &RoomId, offer: SessionDescription) -> StoreResult<()> {
        self.update_room(room_id, |record| {
            record.offer = Some(offer);
            true
        })?;
        Ok(())
    }

    async fn claim_room(
        &self,
        room_id: &RoomId,
        answer: SessionDescription,
    ) -> StoreResult<bool> {
        let result = self.update_room(room_id, |record| {
            if !record.waiting {
                return false;
            }
            record.answer = Some(answer);
            record.waiting = false;
            true
        });

        match result {
            Ok(claimed) => Ok(claimed),
            Err(StoreError::RoomNotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn delete_room(&self, room_id: &RoomId) -> StoreResult<()> {
        if self.inner.rooms.remove(room_id).is_some() {
            debug!("Room {} deleted", room_id);
            self.notify_room(RoomSnapshot {
                room_id: *room_id,
                record: None,
            });
        }

        // A deleted room never changes again; its watchers end here.
        self.inner.room_watchers.remove(room_id);
        for direction in [CandidateDirection::Caller, CandidateDirection::Callee] {
            self.inner.candidate_watchers.remove(&(*room_id, direction));
        }
        Ok(())
    }

    async fn add_candidate(
        &self,
        room_id: &RoomId,
        direction: CandidateDirection,
        candidate: IceCandidate,
    ) -> StoreResult<CandidateId> {
        let key = (*room_id, direction);
        let record = CandidateRecord {
            id: CandidateId::new(),
            candidate,
        };

        let mut list = self.inner.candidates.entry(key).or_default();
        list.push(record.clone());
        self.notify_candidates(&key, vec![CandidateChange::added(record.clone())]);

        Ok(record.id)
    }

    async fn clear_candidates(
        &self,
        room_id: &RoomId,
        direction: CandidateDirection,
    ) -> StoreResult<usize> {
        let key = (*room_id, direction);
        let Some((_, removed)) = self.inner.candidates.remove(&key) else {
            return Ok(0);
        };

        let count = removed.len();
        self.notify_candidates(
            &key,
            removed.into_iter().map(CandidateChange::removed).collect(),
        );
        Ok(count)
    }

    async fn watch_room(&self, room_id: &RoomId) -> StoreResult<Subscription<RoomSnapshot>> {
        let (tx, rx) = mpsc::unbounded_channel();

        // Holding the room entry keeps writers out until the watcher is registered.
        let current = self.inner.rooms.get(room_id);
        let snapshot = RoomSnapshot {
            room_id: *room_id,
            record: current.as_ref().map(|stored| stored.record.clone()),
        };
        let _ = tx.send(snapshot);
        // A missing room only gets its snapshot; the subscription then ends.
        if current.is_some() {
            self.inner
                .room_watchers
                .entry(*room_id)
                .or_default()
                .push(tx);
        }
        drop(current);

        Ok(Subscription::new(SubscriptionId::new(), rx))
    }

    async fn watch_candidates(
        &self,
        room_id: &RoomId,
        direction: CandidateDirection,
    ) -> StoreResult<Subscription<Vec<CandidateChange>>> {
        let key = (*room_id, direction);
        let (tx, rx) = mpsc::unbounded_channel();

        let Some(room) = self.inner.rooms.get(room_id) else {
            // Only leftovers of a deleted room; nothing new will arrive.
            let leftovers = self
                .inner
                .candidates
                .get(&key)
                .map(|list| list.iter().cloned().map(CandidateChange::added).collect())
                .unwrap_or_default();
            let _ = tx.send(leftovers);
            return Ok(Subscription::new(SubscriptionId::new(), rx));
        };

        let existing = self.inner.candidates.entry(key).or_default();
        let initial: Vec<CandidateChange> =
            existing.iter().cloned().map(CandidateChange::added).collect();
        let _ = tx.send(initial);
        self.inner
            .candidate_watchers
            .entry(key)
            .or_default()
            .push(tx);
        drop(existing);
        drop(room);

        Ok(Subscription::new(SubscriptionId::new(), rx))
    }
}
