use anonchat_core::RoomId;
use anonchat_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("permission to use {0} was denied")]
    PermissionDenied(String),

    #[error("no usable {0} device")]
    DeviceUnavailable(String),
}

#[derive(Debug, Error)]
pub enum SignalingError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("peer connection error: {0:#}")]
    Transport(#[source] anyhow::Error),

    #[error("room {0} was claimed by another client")]
    RoomTaken(RoomId),

    #[error("room {0} has no offer to answer")]
    MissingOffer(RoomId),

    /// The claim went through but the room could not be followed afterwards.
    /// The room is ours and must be torn down.
    #[error("claimed room {room_id} could not be watched: {source}")]
    ClaimAbandoned {
        room_id: RoomId,
        #[source]
        source: StoreError,
    },
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    Signaling(#[from] SignalingError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("peer connection error: {0:#}")]
    Transport(#[source] anyhow::Error),

    #[error("session has shut down")]
    Closed,
}
