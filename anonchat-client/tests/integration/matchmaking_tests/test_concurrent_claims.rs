use anonchat_client::Matchmaker;
use anonchat_core::SessionDescription;
use anonchat_store::{MemoryRoomStore, RoomStore};
use std::sync::Arc;
use tokio::task::JoinSet;

use crate::integration::init_tracing;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_at_most_one_answering_client_per_room() {
    init_tracing();

    let store = MemoryRoomStore::new();
    let room_id = Matchmaker::new(Arc::new(store.clone()))
        .create_room()
        .await
        .unwrap();
    store
        .set_offer(&room_id, SessionDescription::offer("v=0"))
        .await
        .unwrap();

    let mut claims = JoinSet::new();
    for i in 0..16 {
        let store = store.clone();
        claims.spawn(async move {
            let matchmaker = Matchmaker::new(Arc::new(store.clone()));
            let outcome = matchmaker.find_or_create_room().await.unwrap();
            if outcome.room_id() != room_id {
                return false;
            }
            store
                .claim_room(&room_id, SessionDescription::answer(format!("v=0 {}", i)))
                .await
                .unwrap()
        });
    }

    let mut winners = 0;
    while let Some(won) = claims.join_next().await {
        if won.unwrap() {
            winners += 1;
        }
    }

    assert_eq!(winners, 1);
    let room = store.get_room(&room_id).await.unwrap().unwrap();
    assert!(!room.waiting);
    assert!(room.answer.is_some());
}
