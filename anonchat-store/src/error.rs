use anonchat_core::RoomId;
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("room {0} does not exist")]
    RoomNotFound(RoomId),

    #[error("room store connection is closed")]
    Disconnected,

    #[error("room store transport error: {0}")]
    Transport(String),

    #[error("unexpected reply from room store: {0}")]
    Protocol(String),

    #[error("room store rejected the request: {0}")]
    Remote(String),

    #[error("failed to encode store message: {0}")]
    Serialization(#[from] serde_json::Error),
}
