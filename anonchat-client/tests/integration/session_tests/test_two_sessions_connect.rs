use anonchat_client::SessionEvent;
use anonchat_core::{Phase, Role};
use anonchat_store::MemoryRoomStore;
use std::sync::Arc;
use std::time::Duration;

use super::connect_pair;
use crate::integration::{SessionParts, init_tracing};
use crate::utils::{
    EVENT_TIMEOUT_MS, MockTransportFactory, count_events, drain_events, wait_for_event, wait_until,
};

#[tokio::test]
async fn test_two_sessions_connect_exactly_once() {
    init_tracing();

    let store = MemoryRoomStore::new();
    let alice_transports = MockTransportFactory::new("alice").with_local_candidates(2);
    let bob_transports = MockTransportFactory::new("bob").with_local_candidates(2);

    let (mut alice, mut bob) = connect_pair(
        &store,
        SessionParts::new(Arc::new(store.clone()), Arc::new(alice_transports.clone())),
        SessionParts::new(Arc::new(store.clone()), Arc::new(bob_transports.clone())),
    )
    .await;

    let mut alice_events = wait_for_event(&mut alice, EVENT_TIMEOUT_MS, |e| {
        *e == SessionEvent::PhaseChanged(Phase::Connected)
    })
    .await
    .unwrap();
    let bob_events = wait_for_event(&mut bob, EVENT_TIMEOUT_MS, |e| {
        *e == SessionEvent::PhaseChanged(Phase::Connected)
    })
    .await
    .unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;
    alice_events.extend(drain_events(&mut alice));

    let connected_count = count_events(&alice_events, |e| {
        *e == SessionEvent::PhaseChanged(Phase::Connected)
    });
    assert_eq!(connected_count, 1);

    let alice_match = alice_events.iter().find_map(|e| match e {
        SessionEvent::Matched { room_id, role } => Some((*room_id, *role)),
        _ => None,
    });
    let bob_match = bob_events.iter().find_map(|e| match e {
        SessionEvent::Matched { room_id, role } => Some((*room_id, *role)),
        _ => None,
    });
    let (alice_room, alice_role) = alice_match.expect("alice was never matched");
    let (bob_room, bob_role) = bob_match.expect("bob was never matched");
    assert_eq!(alice_room, bob_room);
    assert_eq!(alice_role, Role::Offering);
    assert_eq!(bob_role, Role::Answering);

    // Each side applies the other's candidates.
    let alice_transport = alice_transports.last().unwrap();
    let bob_transport = bob_transports.last().unwrap();
    wait_until(|| alice_transport.added_candidates().len() == 2)
        .await
        .unwrap();
    wait_until(|| bob_transport.added_candidates().len() == 2)
        .await
        .unwrap();

    assert!(
        alice_transport
            .added_candidates()
            .iter()
            .all(|c| c.candidate.contains("bob"))
    );
    assert_eq!(alice_transport.remote_descriptions_set(), 1);
    assert_eq!(alice_transports.count(), 1);
    assert_eq!(bob_transports.count(), 1);
}
