mod candidate;
mod description;
mod moderation;
mod protocol;
mod room;
mod session;
mod signaling;

pub use candidate::{
    CandidateChange, CandidateDirection, CandidateId, CandidateRecord, ChangeKind, IceCandidate,
};
pub use description::{SdpType, SessionDescription};
pub use moderation::ModerationVerdict;
pub use protocol::{ClientFrame, RequestId, ServerFrame, StoreReply, StoreRequest, SubscriptionId};
pub use room::{RoomId, RoomRecord, RoomSnapshot};
pub use session::{Phase, Role};
pub use signaling::IceServerConfig;
