use crate::model::candidate::{CandidateChange, CandidateDirection, CandidateId, IceCandidate};
use crate::model::description::SessionDescription;
use crate::model::room::{RoomId, RoomRecord, RoomSnapshot};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Hash, Eq, PartialEq)]
pub struct RequestId(pub Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

/// Chosen by the client before it asks to watch something, so pushed
/// snapshots can be routed even if they overtake the reply.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Hash, Eq, PartialEq)]
pub struct SubscriptionId(pub Uuid);

impl SubscriptionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Operations a client can ask the room store service to perform.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", content = "d")]
pub enum StoreRequest {
    CreateRoom,
    FindWaitingRoom,
    GetRoom {
        room_id: RoomId,
    },
    SetOffer {
        room_id: RoomId,
        offer: SessionDescription,
    },
    ClaimRoom {
        room_id: RoomId,
        answer: SessionDescription,
    },
    DeleteRoom {
        room_id: RoomId,
    },
    AddCandidate {
        room_id: RoomId,
        direction: CandidateDirection,
        candidate: IceCandidate,
    },
    ClearCandidates {
        room_id: RoomId,
        direction: CandidateDirection,
    },
    WatchRoom {
        subscription: SubscriptionId,
        room_id: RoomId,
    },
    WatchCandidates {
        subscription: SubscriptionId,
        room_id: RoomId,
        direction: CandidateDirection,
    },
    Unwatch {
        subscription: SubscriptionId,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", content = "d")]
pub enum StoreReply {
    Room(RoomRecord),
    MaybeRoom(Option<RoomRecord>),
    Claimed(bool),
    Candidate(CandidateId),
    Cleared(usize),
    Watching(SubscriptionId),
    Done,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientFrame {
    pub req_id: RequestId,
    pub request: StoreRequest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", content = "d")]
pub enum ServerFrame {
    Reply {
        req_id: RequestId,
        reply: StoreReply,
    },
    Failure {
        req_id: RequestId,
        message: String,
        not_found: Option<RoomId>,
    },
    RoomChanged {
        subscription: SubscriptionId,
        snapshot: RoomSnapshot,
    },
    CandidatesChanged {
        subscription: SubscriptionId,
        changes: Vec<CandidateChange>,
    },
}
