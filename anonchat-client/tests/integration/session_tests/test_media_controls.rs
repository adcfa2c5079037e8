use anonchat_client::SessionEvent;
use anonchat_core::Phase;
use anonchat_store::MemoryRoomStore;
use std::sync::Arc;

use super::connect_pair;
use crate::integration::{SessionParts, init_tracing};
use crate::utils::{
    EVENT_TIMEOUT_MS, MockTransportFactory, TransportCall, drain_events, wait_for_event,
};

#[tokio::test]
async fn test_toggles_never_touch_the_connection() {
    init_tracing();

    let store = MemoryRoomStore::new();
    let alice_transports = MockTransportFactory::new("alice");

    let (mut alice, _bob) = connect_pair(
        &store,
        SessionParts::new(Arc::new(store.clone()), Arc::new(alice_transports.clone())),
        SessionParts::new(
            Arc::new(store.clone()),
            Arc::new(MockTransportFactory::new("bob")),
        ),
    )
    .await;
    drain_events(&mut alice);
    let transport = alice_transports.last().unwrap();
    let calls_before = transport.calls();

    alice.toggle_mute().unwrap();
    let events = wait_for_event(&mut alice, EVENT_TIMEOUT_MS, |e| {
        matches!(e, SessionEvent::MuteChanged { .. })
    })
    .await
    .unwrap();
    assert_eq!(events.last(), Some(&SessionEvent::MuteChanged { muted: true }));

    alice.toggle_video().unwrap();
    let events = wait_for_event(&mut alice, EVENT_TIMEOUT_MS, |e| {
        matches!(e, SessionEvent::VideoChanged { .. })
    })
    .await
    .unwrap();
    assert_eq!(
        events.last(),
        Some(&SessionEvent::VideoChanged { video_off: true })
    );

    alice.toggle_mute().unwrap();
    let events = wait_for_event(&mut alice, EVENT_TIMEOUT_MS, |e| {
        matches!(e, SessionEvent::MuteChanged { .. })
    })
    .await
    .unwrap();
    assert_eq!(events.last(), Some(&SessionEvent::MuteChanged { muted: false }));

    assert_eq!(alice.phase(), Phase::Connected);
    assert_eq!(alice_transports.count(), 1);
    assert_eq!(transport.calls(), calls_before, "no renegotiation");
    assert_eq!(
        transport.count(|c| *c == TransportCall::AddLocalMedia { tracks: 2 }),
        1
    );
}
