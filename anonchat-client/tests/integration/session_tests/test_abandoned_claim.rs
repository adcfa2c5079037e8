use anonchat_client::SessionEvent;
use anonchat_core::Phase;
use anonchat_store::{MemoryRoomStore, RoomStore};
use std::sync::Arc;

use crate::integration::{SessionParts, init_tracing};
use crate::utils::{
    BrokenWatchStore, EVENT_TIMEOUT_MS, MockTransportFactory, wait_for_event, wait_for_open_room,
    wait_for_phase, wait_until,
};

#[tokio::test]
async fn test_claimed_room_is_torn_down_when_watch_fails() {
    init_tracing();

    let store = MemoryRoomStore::new();
    let alice_transports = MockTransportFactory::new("alice");
    let bob_transports = MockTransportFactory::new("bob");

    let mut alice =
        SessionParts::new(Arc::new(store.clone()), Arc::new(alice_transports.clone())).spawn();
    alice.start().unwrap();
    wait_for_phase(&alice, Phase::Searching).await.unwrap();
    wait_for_open_room(&store).await.unwrap();
    let first_room = store.find_waiting_room().await.unwrap().unwrap().id;

    let broken = Arc::new(BrokenWatchStore::new(store.clone()));
    let mut bob = SessionParts::new(broken.clone(), Arc::new(bob_transports.clone())).spawn();
    bob.start().unwrap();

    wait_for_event(&mut bob, EVENT_TIMEOUT_MS, |e| {
        matches!(e, SessionEvent::Error(_))
    })
    .await
    .unwrap();
    wait_for_phase(&bob, Phase::Idle).await.unwrap();
    assert_eq!(broken.failed_watches(), 1);
    assert!(bob_transports.created()[0].is_closed());

    // The claimed room is gone, so alice treats it as a hang-up and moves on.
    wait_for_event(&mut alice, EVENT_TIMEOUT_MS, |e| {
        *e == SessionEvent::PartnerLeft
    })
    .await
    .unwrap();
    wait_for_phase(&alice, Phase::Searching).await.unwrap();
    assert!(store.get_room(&first_room).await.unwrap().is_none());

    wait_until(|| alice_transports.count() == 2).await.unwrap();
    wait_for_open_room(&store).await.unwrap();
    assert_eq!(store.room_count(), 1);
}
