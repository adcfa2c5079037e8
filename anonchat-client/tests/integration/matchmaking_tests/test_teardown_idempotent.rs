use anonchat_client::Matchmaker;
use anonchat_core::{CandidateDirection, IceCandidate, RoomId};
use anonchat_store::{MemoryRoomStore, RoomStore};
use std::sync::Arc;

use crate::integration::init_tracing;

#[tokio::test]
async fn test_teardown_twice_leaves_same_state() {
    init_tracing();

    let store = MemoryRoomStore::new();
    let matchmaker = Matchmaker::new(Arc::new(store.clone()));
    let room_id = matchmaker.create_room().await.unwrap();

    for direction in [CandidateDirection::Caller, CandidateDirection::Callee] {
        store
            .add_candidate(&room_id, direction, IceCandidate::new("candidate:1"))
            .await
            .unwrap();
    }

    matchmaker.teardown_room(&room_id, true).await;
    matchmaker.teardown_room(&room_id, false).await;

    assert!(store.get_room(&room_id).await.unwrap().is_none());
    assert_eq!(store.room_count(), 0);
    assert_eq!(store.candidate_count(&room_id, CandidateDirection::Caller), 0);
    assert_eq!(store.candidate_count(&room_id, CandidateDirection::Callee), 0);
}

#[tokio::test]
async fn test_teardown_of_unknown_room_is_quiet() {
    init_tracing();

    let store = MemoryRoomStore::new();
    let matchmaker = Matchmaker::new(Arc::new(store.clone()));

    matchmaker.teardown_room(&RoomId::new(), true).await;
    assert_eq!(store.room_count(), 0);
}
