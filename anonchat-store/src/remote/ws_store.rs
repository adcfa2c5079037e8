use crate::error::{StoreError, StoreResult};
use crate::store::{RoomStore, Subscription};
use anonchat_core::{
    CandidateChange, CandidateDirection, CandidateId, ClientFrame, IceCandidate, RequestId,
    RoomId, RoomRecord, RoomSnapshot, ServerFrame, SessionDescription, StoreReply, StoreRequest,
    SubscriptionId,
};
use async_trait::async_trait;
use dashmap::DashMap;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

struct WsInner {
    outgoing: mpsc::UnboundedSender<Message>,
    pending: DashMap<RequestId, oneshot::Sender<ServerFrame>>,
    room_subs: DashMap<SubscriptionId, mpsc::UnboundedSender<RoomSnapshot>>,
    candidate_subs: DashMap<SubscriptionId, mpsc::UnboundedSender<Vec<CandidateChange>>>,
    closed: AtomicBool,
}

impl WsInner {
    fn send_frame(&self, frame: &ClientFrame) -> StoreResult<()> {
        let json = serde_json::to_string(frame)?;
        self.outgoing
            .send(Message::Text(json.into()))
            .map_err(|_| StoreError::Disconnected)
    }

    fn dispatch(&self, frame: ServerFrame) {
        match frame {
            ServerFrame::Reply { req_id, .. } | ServerFrame::Failure { req_id, .. } => {
                let Some((_, waiter)) = self.pending.remove(&req_id) else {
                    debug!("Dropping reply for unknown request {:?}", req_id);
                    return;
                };
                let _ = waiter.send(frame);
            }
            ServerFrame::RoomChanged {
                subscription,
                snapshot,
            } => {
                let delivered = self
                    .room_subs
                    .get(&subscription)
                    .map(|tx| tx.send(snapshot).is_ok());
                if delivered == Some(false) {
                    self.room_subs.remove(&subscription);
                }
            }
            ServerFrame::CandidatesChanged {
                subscription,
                changes,
            } => {
                let delivered = self
                    .candidate_subs
                    .get(&subscription)
                    .map(|tx| tx.send(changes).is_ok());
                if delivered == Some(false) {
                    self.candidate_subs.remove(&subscription);
                }
            }
        }
    }

    /// Fails every outstanding request and ends every subscription.
    fn shut_down(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.pending.clear();
        self.room_subs.clear();
        self.candidate_subs.clear();
    }

    fn unwatch(&self, subscription: SubscriptionId) {
        self.room_subs.remove(&subscription);
        self.candidate_subs.remove(&subscription);

        if self.closed.load(Ordering::SeqCst) {
            return;
        }
        let frame = ClientFrame {
            req_id: RequestId::new(),
            request: StoreRequest::Unwatch { subscription },
        };
        if let Err(e) = self.send_frame(&frame) {
            debug!("Could not unwatch {}: {}", subscription, e);
        }
    }
}

/// [`RoomStore`] backed by the room store service over a WebSocket.
#[derive(Clone)]
pub struct WsRoomStore {
    inner: Arc<WsInner>,
}

impl WsRoomStore {
    /// Connect to a store endpoint such as `ws://127.0.0.1:3000/store`.
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let (socket, _) = connect_async(url)
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        info!("Connected to room store at {}", url);

        let (mut sender, mut receiver) = socket.split();
        let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

        let inner = Arc::new(WsInner {
            outgoing: tx,
            pending: DashMap::new(),
            room_subs: DashMap::new(),
            candidate_subs: DashMap::new(),
            closed: AtomicBool::new(false),
        });

        tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                let closing = matches!(msg, Message::Close(_));
                if sender.send(msg).await.is_err() || closing {
                    break;
                }
            }
        });

        tokio::spawn({
            let inner = inner.clone();

            async move {
                while let Some(Ok(msg)) = receiver.next().await {
                    match msg {
                        Message::Text(text) => match serde_json::from_str::<ServerFrame>(&text) {
                            Ok(frame) => inner.dispatch(frame),
                            Err(e) => warn!("Invalid frame from room store: {:?}", e),
                        },
                        Message::Close(_) => break,
                        _ => {}
                    }
                }

                inner.shut_down();
                info!("Room store connection closed");
            }
        });

        Ok(Self { inner })
    }

    pub fn is_connected(&self) -> bool {
        !self.inner.closed.load(Ordering::SeqCst)
    }

    /// Ask the service to close the socket. Outstanding requests fail with
    /// [`StoreError::Disconnected`].
    pub fn close(&self) {
        let _ = self.inner.outgoing.send(Message::Close(None));
    }

    async fn request(&self, request: StoreRequest) -> StoreResult<StoreReply> {
        if !self.is_connected() {
            return Err(StoreError::Disconnected);
        }

        let req_id = RequestId::new();
        let (tx, rx) = oneshot::channel();
        self.inner.pending.insert(req_id, tx);
        // The reader may have shut down between the check above and the insert.
        if self.inner.closed.load(Ordering::SeqCst) {
            self.inner.pending.remove(&req_id);
            return Err(StoreError::Disconnected);
        }

        let frame = ClientFrame { req_id, request };
        if let Err(e) = self.inner.send_frame(&frame) {
            self.inner.pending.remove(&req_id);
            return Err(e);
        }

        match rx.await.map_err(|_| StoreError::Disconnected)? {
            ServerFrame::Reply { reply, .. } => Ok(reply),
            ServerFrame::Failure {
                not_found: Some(room_id),
                ..
            } => Err(StoreError::RoomNotFound(room_id)),
            ServerFrame::Failure { message, .. } => Err(StoreError::Remote(message)),
            other => Err(unexpected(&other)),
        }
    }

    async fn expect_done(&self, request: StoreRequest) -> StoreResult<()> {
        match self.request(request).await? {
            StoreReply::Done => Ok(()),
            other => Err(unexpected(&other)),
        }
    }

    fn cancel_hook(&self, subscription: SubscriptionId) -> impl FnOnce() + Send + Sync + 'static {
        let inner = self.inner.clone();
        move || inner.unwatch(subscription)
    }
}

fn unexpected(reply: &impl std::fmt::Debug) -> StoreError {
    StoreError::Protocol(format!("{:?}", reply))
}

#[async_trait]
impl RoomStore for WsRoomStore {
    async fn create_room(&self) -> StoreResult<RoomRecord> {
        match self.request(StoreRequest::CreateRoom).await? {
            StoreReply::Room(record) => Ok(record),
            other => Err(unexpected(&other)),
        }
    }

    async fn find_waiting_room(&self) -> StoreResult<Option<RoomRecord>> {
        match self.request(StoreRequest::FindWaitingRoom).await? {
            StoreReply::MaybeRoom(record) => Ok(record),
            other => Err(unexpected(&other)),
        }
    }

    async fn get_room(&self, room_id: &RoomId) -> StoreResult<Option<RoomRecord>> {
        match self
            .request(StoreRequest::GetRoom { room_id: *room_id })
            .await?
        {
            StoreReply::MaybeRoom(record) => Ok(record),
            other => Err(unexpected(&other)),
        }
    }

    async fn set_offer(&self, room_id: &RoomId, offer: SessionDescription) -> StoreResult<()> {
        self.expect_done(StoreRequest::SetOffer {
            room_id: *room_id,
            offer,
        })
        .await
    }

    async fn claim_room(
        &self,
        room_id: &RoomId,
        answer: SessionDescription,
    ) -> StoreResult<bool> {
        match self
            .request(StoreRequest::ClaimRoom {
                room_id: *room_id,
                answer,
            })
            .await?
        {
            StoreReply::Claimed(claimed) => Ok(claimed),
            other => Err(unexpected(&other)),
        }
    }

    async fn delete_room(&self, room_id: &RoomId) -> StoreResult<()> {
        self.expect_done(StoreRequest::DeleteRoom { room_id: *room_id })
            .await
    }

    async fn add_candidate(
        &self,
        room_id: &RoomId,
        direction: CandidateDirection,
        candidate: IceCandidate,
    ) -> StoreResult<CandidateId> {
        match self
            .request(StoreRequest::AddCandidate {
                room_id: *room_id,
                direction,
                candidate,
            })
            .await?
        {
            StoreReply::Candidate(id) => Ok(id),
            other => Err(unexpected(&other)),
        }
    }

    async fn clear_candidates(
        &self,
        room_id: &RoomId,
        direction: CandidateDirection,
    ) -> StoreResult<usize> {
        match self
            .request(StoreRequest::ClearCandidates {
                room_id: *room_id,
                direction,
            })
            .await?
        {
            StoreReply::Cleared(count) => Ok(count),
            other => Err(unexpected(&other)),
        }
    }

    async fn watch_room(&self, room_id: &RoomId) -> StoreResult<Subscription<RoomSnapshot>> {
        let subscription = SubscriptionId::new();
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.room_subs.insert(subscription, tx);

        let reply = self
            .request(StoreRequest::WatchRoom {
                subscription,
                room_id: *room_id,
            })
            .await;
        match reply {
            Ok(StoreReply::Watching(_)) => {
                Ok(Subscription::new(subscription, rx)
                    .with_cancel_hook(self.cancel_hook(subscription)))
            }
            Ok(other) => {
                self.inner.room_subs.remove(&subscription);
                Err(unexpected(&other))
            }
            Err(e) => {
                self.inner.room_subs.remove(&subscription);
                Err(e)
            }
        }
    }

    async fn watch_candidates(
        &self,
        room_id: &RoomId,
        direction: CandidateDirection,
    ) -> StoreResult<Subscription<Vec<CandidateChange>>> {
        let subscription = SubscriptionId::new();
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.candidate_subs.insert(subscription, tx);

        let reply = self
            .request(StoreRequest::WatchCandidates {
                subscription,
                room_id: *room_id,
                direction,
            })
            .await;
        match reply {
            Ok(StoreReply::Watching(_)) => {
                Ok(Subscription::new(subscription, rx)
                    .with_cancel_hook(self.cancel_hook(subscription)))
            }
            Ok(other) => {
                self.inner.candidate_subs.remove(&subscription);
                Err(unexpected(&other))
            }
            Err(e) => {
                self.inner.candidate_subs.remove(&subscription);
                Err(e)
            }
        }
    }
}
