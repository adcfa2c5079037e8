
use anonchat_client::{MatchOutcome, Matchmaker, SignalingEvent, SignalingLink};
use anonchat_store::MemoryRoomStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::utils::{EVENT_TIMEOUT_MS, MockTransport, MockTransportFactory, MockTransportState};

pub struct LinkedPair {
    pub store: MemoryRoomStore,
    pub offering: SignalingLink,
    pub answering: SignalingLink,
    pub offerer: MockTransport,
    pub offerer_state: Arc<MockTransportState>,
    pub answerer: MockTransport,
    pub answerer_state: Arc<MockTransportState>,
}

/// Run both halves of the exchange against one in-memory store.
pub async fn linked_pair() -> LinkedPair {
    let store = MemoryRoomStore::new();
    let factory = MockTransportFactory::new("sig");
    let (offerer, offerer_state) = factory.build(mpsc::channel(64).0);
    let (answerer, answerer_state) = factory.build(mpsc::channel(64).0);
    let matchmaker = Matchmaker::new(Arc::new(store.clone()));

    let MatchOutcome::Offering { room_id } = matchmaker.find_or_create_room().await.unwrap() else {
        panic!("empty store must yield the offering role");
    };
    let offering = SignalingLink::start_offering(&store, &offerer, room_id)
        .await
        .unwrap();

    let MatchOutcome::Answering { room_id, offer } =
        matchmaker.find_or_create_room().await.unwrap()
    else {
        panic!("published offer must be found");
    };
    let answering = SignalingLink::start_answering(&store, &answerer, room_id, offer)
        .await
        .unwrap();

    LinkedPair {
        store,
        offering,
        answering,
        offerer,
        offerer_state,
        answerer,
        answerer_state,
    }
}

pub async fn next_signal(link: &mut SignalingLink) -> SignalingEvent {
    tokio::time::timeout(Duration::from_millis(EVENT_TIMEOUT_MS), link.next_event())
        .await
        .expect("Timeout waiting for signaling event")
}
