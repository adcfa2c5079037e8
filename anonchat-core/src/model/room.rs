use crate::model::description::SessionDescription;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Hash, Eq, PartialEq)]
pub struct RoomId(pub Uuid);

impl RoomId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RoomId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for RoomId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Shared record two clients use to find each other and swap descriptions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomRecord {
    pub id: RoomId,
    pub waiting: bool,
    pub offer: Option<SessionDescription>,
    pub answer: Option<SessionDescription>,
}

impl RoomRecord {
    /// A freshly created room: waiting for a partner, no descriptions yet.
    pub fn waiting(id: RoomId) -> Self {
        Self {
            id,
            waiting: true,
            offer: None,
            answer: None,
        }
    }

    /// Whether an answering client may pick this room up.
    pub fn is_joinable(&self) -> bool {
        self.waiting && self.offer.is_some()
    }
}

/// Full-document view delivered to room watchers. `record` is `None` once the
/// room no longer exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub room_id: RoomId,
    pub record: Option<RoomRecord>,
}

impl RoomSnapshot {
    pub fn exists(&self) -> bool {
        self.record.is_some()
    }
}
