use anonchat_core::{ClientFrame, ServerFrame, StoreReply, StoreRequest, SubscriptionId};
use anonchat_store::{RoomStore, StoreError, StoreResult, Subscription};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Forwarding tasks for the subscriptions one connection holds.
/// Dropping the set cancels all of them.
#[derive(Default)]
pub struct WatchSet {
    tasks: HashMap<SubscriptionId, JoinHandle<()>>,
}

impl WatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    fn insert(&mut self, subscription: SubscriptionId, task: JoinHandle<()>) {
        if let Some(previous) = self.tasks.insert(subscription, task) {
            previous.abort();
        }
    }

    fn cancel(&mut self, subscription: &SubscriptionId) {
        if let Some(task) = self.tasks.remove(subscription) {
            task.abort();
        }
    }
}

impl Drop for WatchSet {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}

/// Applies client requests to the hosted [`RoomStore`].
#[derive(Clone)]
pub struct StoreService {
    store: Arc<dyn RoomStore>,
}

impl StoreService {
    pub fn new(store: Arc<dyn RoomStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn RoomStore> {
        &self.store
    }

    /// Run one client frame and build the frame to send back.
    pub async fn handle_frame(
        &self,
        frame: ClientFrame,
        watches: &mut WatchSet,
        out: &mpsc::UnboundedSender<ServerFrame>,
    ) -> ServerFrame {
        let req_id = frame.req_id;
        match self.execute(frame.request, watches, out).await {
            Ok(reply) => ServerFrame::Reply { req_id, reply },
            Err(e) => ServerFrame::Failure {
                req_id,
                not_found: match e {
                    StoreError::RoomNotFound(room_id) => Some(room_id),
                    _ => None,
                },
                message: e.to_string(),
            },
        }
    }

    async fn execute(
        &self,
        request: StoreRequest,
        watches: &mut WatchSet,
        out: &mpsc::UnboundedSender<ServerFrame>,
    ) -> StoreResult<StoreReply> {
        let reply = match request {
            StoreRequest::CreateRoom => StoreReply::Room(self.store.create_room().await?),
            StoreRequest::FindWaitingRoom => {
                StoreReply::MaybeRoom(self.store.find_waiting_room().await?)
            }
            StoreRequest::GetRoom { room_id } => {
                StoreReply::MaybeRoom(self.store.get_room(&room_id).await?)
            }
            StoreRequest::SetOffer { room_id, offer } => {
                self.store.set_offer(&room_id, offer).await?;
                StoreReply::Done
            }
            StoreRequest::ClaimRoom { room_id, answer } => {
                StoreReply::Claimed(self.store.claim_room(&room_id, answer).await?)
            }
            StoreRequest::DeleteRoom { room_id } => {
                self.store.delete_room(&room_id).await?;
                StoreReply::Done
            }
            StoreRequest::AddCandidate {
                room_id,
                direction,
                candidate,
            } => StoreReply::Candidate(
                self.store
                    .add_candidate(&room_id, direction, candidate)
                    .await?,
            ),
            StoreRequest::ClearCandidates { room_id, direction } => {
                StoreReply::Cleared(self.store.clear_candidates(&room_id, direction).await?)
            }
            StoreRequest::WatchRoom {
                subscription,
                room_id,
            } => {
                let sub = self.store.watch_room(&room_id).await?;
                let task = forward(sub, out.clone(), move |snapshot| {
                    ServerFrame::RoomChanged {
                        subscription,
                        snapshot,
                    }
                });
                watches.insert(subscription, task);
                StoreReply::Watching(subscription)
            }
            StoreRequest::WatchCandidates {
                subscription,
                room_id,
                direction,
            } => {
                let sub = self.store.watch_candidates(&room_id, direction).await?;
                let task = forward(sub, out.clone(), move |changes| {
                    ServerFrame::CandidatesChanged {
                        subscription,
                        changes,
                    }
                });
                watches.insert(subscription, task);
                StoreReply::Watching(subscription)
            }
            StoreRequest::Unwatch { subscription } => {
                debug!("Unwatch {}", subscription);
                watches.cancel(&subscription);
                StoreReply::Done
            }
        };
        Ok(reply)
    }
}

fn forward<T, F>(
    mut sub: Subscription<T>,
    out: mpsc::UnboundedSender<ServerFrame>,
    to_frame: F,
) -> JoinHandle<()>
where
    T: Send + 'static,
    F: Fn(T) -> ServerFrame + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(item) = sub.next().await {
            if out.send(to_frame(item)).is_err() {
                break;
            }
        }
    })
}
