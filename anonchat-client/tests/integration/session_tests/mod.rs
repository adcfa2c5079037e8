pub mod test_abandoned_claim;
pub mod test_media_controls;
pub mod test_two_sessions_connect;
pub mod test_webrtc_loopback;

use anonchat_client::SessionHandle;
use anonchat_core::Phase;
use anonchat_store::MemoryRoomStore;

use crate::integration::SessionParts;
use crate::utils::{wait_for_open_room, wait_for_phase};

/// Start `first`, wait for its offer to land in `store`, then start `second`
/// and wait until both are connected.
pub async fn connect_pair(
    store: &MemoryRoomStore,
    first: SessionParts,
    second: SessionParts,
) -> (SessionHandle, SessionHandle) {
    let alice = first.spawn();
    alice.start().unwrap();
    wait_for_phase(&alice, Phase::Searching).await.unwrap();
    wait_for_open_room(store).await.unwrap();

    let bob = second.spawn();
    bob.start().unwrap();

    wait_for_phase(&bob, Phase::Connected).await.unwrap();
    wait_for_phase(&alice, Phase::Connected).await.unwrap();
    (alice, bob)
}
