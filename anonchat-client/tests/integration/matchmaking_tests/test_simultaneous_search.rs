use anonchat_client::Matchmaker;
use anonchat_core::{Role, SessionDescription};
use anonchat_store::{MemoryRoomStore, RoomStore};
use std::sync::Arc;

use crate::integration::init_tracing;

#[tokio::test]
async fn test_simultaneous_searches_open_two_joinable_rooms() {
    init_tracing();

    let store = MemoryRoomStore::new();
    let alice = Matchmaker::new(Arc::new(store.clone()));
    let bob = Matchmaker::new(Arc::new(store.clone()));

    let (a, b) = tokio::join!(alice.find_or_create_room(), bob.find_or_create_room());
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(a.role(), Role::Offering);
    assert_eq!(b.role(), Role::Offering);
    assert_ne!(a.room_id(), b.room_id());

    store
        .set_offer(&a.room_id(), SessionDescription::offer("v=0 a"))
        .await
        .unwrap();
    store
        .set_offer(&b.room_id(), SessionDescription::offer("v=0 b"))
        .await
        .unwrap();

    // Each room can still be joined by someone else.
    let carol = Matchmaker::new(Arc::new(store.clone()));
    let mut joined = Vec::new();
    for _ in 0..2 {
        let outcome = carol.find_or_create_room().await.unwrap();
        assert_eq!(outcome.role(), Role::Answering);
        assert!(
            store
                .claim_room(&outcome.room_id(), SessionDescription::answer("v=0 c"))
                .await
                .unwrap()
        );
        joined.push(outcome.room_id());
    }

    joined.sort_by_key(|id| id.to_string());
    let mut expected = vec![a.room_id(), b.room_id()];
    expected.sort_by_key(|id| id.to_string());
    assert_eq!(joined, expected);
}
