use anonchat_core::SessionDescription;
use anonchat_store::{RoomStore, StoreError};

use crate::integration::{connect_client, init_tracing, spawn_store_server};

#[tokio::test]
async fn test_only_one_remote_client_claims_a_room() {
    init_tracing();

    let (backing, addr) = spawn_store_server().await;
    let host = connect_client(addr).await;
    let guest_a = connect_client(addr).await;
    let guest_b = connect_client(addr).await;

    let room = host.create_room().await.expect("create_room failed");
    host.set_offer(&room.id, SessionDescription::offer("offer"))
        .await
        .expect("set_offer failed");

    let found = guest_a
        .find_waiting_room()
        .await
        .expect("find failed")
        .expect("room should be joinable");
    assert_eq!(found.id, room.id);
    assert_eq!(found.offer, Some(SessionDescription::offer("offer")));

    let a = guest_a
        .claim_room(&room.id, SessionDescription::answer("a"))
        .await
        .expect("claim failed");
    let b = guest_b
        .claim_room(&room.id, SessionDescription::answer("b"))
        .await
        .expect("claim failed");

    assert!(a ^ b, "exactly one claim must win");
    assert!(guest_b.find_waiting_room().await.unwrap().is_none());

    let stored = backing.get_room(&room.id).await.unwrap().unwrap();
    assert!(!stored.waiting);
}

#[tokio::test]
async fn test_missing_room_maps_to_not_found() {
    init_tracing();

    let (_backing, addr) = spawn_store_server().await;
    let client = connect_client(addr).await;

    let room = client.create_room().await.unwrap();
    client.delete_room(&room.id).await.unwrap();
    client
        .delete_room(&room.id)
        .await
        .expect("second delete must be harmless");

    let err = client
        .set_offer(&room.id, SessionDescription::offer("late"))
        .await
        .expect_err("offer on deleted room must fail");
    assert!(matches!(err, StoreError::RoomNotFound(id) if id == room.id));
}
