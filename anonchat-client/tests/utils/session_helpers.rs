use anonchat_client::{SessionEvent, SessionHandle};
use anonchat_core::Phase;
use anonchat_store::{MemoryRoomStore, RoomStore};
use anyhow::{Context, Result, bail};
use std::time::Duration;

/// Timeout for session phase/event waits (ms).
pub const EVENT_TIMEOUT_MS: u64 = 5000;

/// Timeout for real peer connections to come up (ms).
pub const CONNECTION_TIMEOUT_MS: u64 = 20000;

/// Wait until the session reports `phase`.
pub async fn wait_for_phase(handle: &SessionHandle, phase: Phase) -> Result<()> {
    let mut rx = handle.subscribe_phase();
    tokio::time::timeout(
        Duration::from_millis(EVENT_TIMEOUT_MS),
        async move { rx.wait_for(|current| *current == phase).await.map(|_| ()) },
    )
    .await
    .with_context(|| format!("Timeout waiting for phase {}", phase))?
    .context("Session stopped")
}

/// Consume events until one matches. Returns every event seen, the match last.
pub async fn wait_for_event(
    handle: &mut SessionHandle,
    timeout_ms: u64,
    matches: impl Fn(&SessionEvent) -> bool,
) -> Result<Vec<SessionEvent>> {
    let deadline = tokio::time::Instant::now() + Duration::from_millis(timeout_ms);
    let mut seen = Vec::new();

    loop {
        let event = tokio::time::timeout_at(deadline, handle.next_event())
            .await
            .with_context(|| format!("Timeout waiting for event, saw {:?}", seen))?;
        let Some(event) = event else {
            bail!("Session stopped, saw {:?}", seen);
        };
        let done = matches(&event);
        seen.push(event);
        if done {
            return Ok(seen);
        }
    }
}

/// Everything already queued on the handle.
pub fn drain_events(handle: &mut SessionHandle) -> Vec<SessionEvent> {
    std::iter::from_fn(|| handle.try_next_event()).collect()
}

/// Poll `condition` until it holds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) -> Result<()> {
    let deadline = tokio::time::Instant::now() + Duration::from_millis(EVENT_TIMEOUT_MS);
    while !condition() {
        if tokio::time::Instant::now() > deadline {
            bail!("Condition not met in time");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    Ok(())
}

/// Wait until some room in `store` is waiting with an offer.
pub async fn wait_for_open_room(store: &MemoryRoomStore) -> Result<()> {
    let deadline = tokio::time::Instant::now() + Duration::from_millis(EVENT_TIMEOUT_MS);
    loop {
        if store.find_waiting_room().await?.is_some() {
            return Ok(());
        }
        if tokio::time::Instant::now() > deadline {
            bail!("No joinable room appeared");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

pub fn count_events(events: &[SessionEvent], matches: impl Fn(&SessionEvent) -> bool) -> usize {
    events.iter().filter(|e| matches(e)).count()
}
