use anonchat_client::{LinkState, SessionEvent, WebRtcTransportFactory};
use anonchat_core::Phase;
use anonchat_store::MemoryRoomStore;
use std::sync::Arc;
use std::time::Duration;

use super::connect_pair;
use crate::integration::{SessionParts, init_tracing};
use crate::utils::{CONNECTION_TIMEOUT_MS, EVENT_TIMEOUT_MS, wait_for_event, wait_for_phase};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_sessions_talk_over_real_peer_connection() {
    init_tracing();

    let store = MemoryRoomStore::new();
    let (mut alice, mut bob) = connect_pair(
        &store,
        SessionParts::new(Arc::new(store.clone()), Arc::new(WebRtcTransportFactory)),
        SessionParts::new(Arc::new(store.clone()), Arc::new(WebRtcTransportFactory)),
    )
    .await;

    let connected =
        |e: &SessionEvent| *e == SessionEvent::LinkStateChanged(LinkState::Connected);
    wait_for_event(&mut alice, CONNECTION_TIMEOUT_MS, connected)
        .await
        .expect("alice link never connected");
    wait_for_event(&mut bob, CONNECTION_TIMEOUT_MS, connected)
        .await
        .expect("bob link never connected");

    // The chat channel opens shortly after the link; retry until it takes.
    let mut delivered = false;
    for _ in 0..20 {
        alice.send_message("hello over webrtc").unwrap();
        let events = wait_for_event(&mut alice, EVENT_TIMEOUT_MS, |e| {
            matches!(e, SessionEvent::MessageSent(_) | SessionEvent::Error(_))
        })
        .await
        .unwrap();
        if matches!(events.last(), Some(SessionEvent::MessageSent(_))) {
            delivered = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
    assert!(delivered, "chat channel never opened");

    let events = wait_for_event(&mut bob, EVENT_TIMEOUT_MS, |e| {
        matches!(e, SessionEvent::MessageReceived(_))
    })
    .await
    .unwrap();
    assert_eq!(
        events.last(),
        Some(&SessionEvent::MessageReceived("hello over webrtc".to_owned()))
    );

    // Placeholder frames make the partner's tracks show up.
    let mut remote = bob.subscribe_remote_stream();
    tokio::time::timeout(
        Duration::from_millis(CONNECTION_TIMEOUT_MS),
        remote.wait_for(|stream| !stream.is_empty()),
    )
    .await
    .expect("no remote track arrived")
    .unwrap();

    alice.cancel().unwrap();
    wait_for_event(&mut bob, EVENT_TIMEOUT_MS, |e| *e == SessionEvent::PartnerLeft)
        .await
        .unwrap();
    wait_for_phase(&alice, Phase::Idle).await.unwrap();
}
