use std::sync::atomic::Ordering;

use super::*;
use crate::state::test_helpers::MemoryStore;

fn fast() -> LiveSyncConfig {
    LiveSyncConfig {
        initial_backoff: Duration::from_millis(2),
        max_backoff: Duration::from_millis(10),
        max_jitter: Duration::ZERO,
        connect_timeout: Duration::from_millis(50),
    }
}

/// Store whose live handshake never completes.
#[derive(Default)]
struct StalledFeedStore {
    cells: MemoryStore,
}

#[async_trait::async_trait]
impl RemoteStore for StalledFeedStore {
    async fn fetch_all_cells(&self) -> Result<Vec<Cell>, StoreError> {
        self.cells.fetch_all_cells().await
    }

    async fn insert_cell(&self, cell: &crate::store::NewCell) -> Result<(), StoreError> {
        self.cells.insert_cell(cell).await
    }

    async fn fetch_last_placement(&self, user_id: &str) -> Result<Option<i64>, StoreError> {
        self.cells.fetch_last_placement(user_id).await
    }

    async fn subscribe(&self) -> Result<CellStream, StoreError> {
        self.cells.subscribe_calls.fetch_add(1, Ordering::SeqCst);
        futures::future::pending().await
    }
}

#[tokio::test]
async fn stalled_subscribe_is_retried() {
    let store = Arc::new(StalledFeedStore::default());
    let (tx, mut rx) = mpsc::channel(16);
    let task = spawn_live_sync(store.clone(), tx, None, fast());

    tokio::time::timeout(Duration::from_secs(5), async {
        while store.cells.subscribe_calls.load(Ordering::SeqCst) < 3 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("subscribe retried after each timeout");
    assert!(rx.try_recv().is_err());
    task.abort();
}

async fn next_event(rx: &mut mpsc::Receiver<SessionEvent>) -> SessionEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("event before timeout")
        .expect("channel open")
}

async fn wait_for_feed(store: &MemoryStore) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while store.open_feeds() == 0 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("feed opened");
}

// =============================================================================
// BACKOFF
// =============================================================================

#[test]
fn default_backoff_matches_reconnect_policy() {
    let config = LiveSyncConfig::default();
    assert_eq!(config.initial_backoff, Duration::from_secs(1));
    assert_eq!(config.max_backoff, Duration::from_secs(10));
    assert_eq!(config.max_jitter, Duration::from_millis(250));
}

#[test]
fn backoff_doubles_to_cap_and_resets() {
    let mut backoff = Backoff::new(LiveSyncConfig { max_jitter: Duration::ZERO, ..LiveSyncConfig::default() });
    let delays: Vec<u64> = (0..6).map(|_| millis(backoff.next_delay())).collect();
    assert_eq!(delays, vec![1000, 2000, 4000, 8000, 10_000, 10_000]);

    backoff.reset();
    assert_eq!(backoff.next_delay(), Duration::from_secs(1));
}

#[test]
fn jitter_stays_within_bound() {
    let mut backoff = Backoff::new(LiveSyncConfig::default());
    for _ in 0..50 {
        backoff.reset();
        let delay = backoff.next_delay();
        assert!(delay >= Duration::from_millis(1000));
        assert!(delay <= Duration::from_millis(1250));
    }
}

// =============================================================================
// INITIAL LOADS
// =============================================================================

#[tokio::test]
async fn load_initial_returns_cells() {
    let store = MemoryStore::with_cells(vec![Cell::new(1, 2, "#000000", "a")]);
    assert_eq!(load_initial(&store).await, Some(vec![Cell::new(1, 2, "#000000", "a")]));
}

#[tokio::test]
async fn load_initial_failure_is_none() {
    let store = MemoryStore::default();
    store.fetch_failures.store(1, Ordering::SeqCst);
    assert_eq!(load_initial(&store).await, None);
}

#[tokio::test]
async fn load_last_placement_reads_store() {
    let store = MemoryStore::default();
    store.last_placed.lock().unwrap().insert("u1".into(), 42);
    assert_eq!(load_last_placement(&store, "u1").await, Some(42));
    assert_eq!(load_last_placement(&store, "u2").await, None);
}

// =============================================================================
// LIVE FEED
// =============================================================================

#[tokio::test]
async fn open_feed_gives_up_after_timeout() {
    let store = StalledFeedStore::default();
    let result = tokio::time::timeout(Duration::from_secs(5), open_feed(&store, Duration::from_millis(20)))
        .await
        .expect("bounded by the connect timeout");
    assert!(matches!(result, Err(StoreError::Live(_))));
}

#[tokio::test]
async fn forwards_live_cells_from_initial_feed() {
    let store = Arc::new(MemoryStore::default());
    let initial = store.subscribe().await.unwrap();
    let (tx, mut rx) = mpsc::channel(16);
    let task = spawn_live_sync(store.clone(), tx, Some(initial), fast());

    store.push_live(Cell::new(3, 4, "#E50000", "a"));
    match next_event(&mut rx).await {
        SessionEvent::Live(cell) => assert_eq!(cell, Cell::new(3, 4, "#E50000", "a")),
        other => panic!("unexpected event: {other:?}"),
    }
    // An initial feed means the caller does its own bulk load.
    assert_eq!(store.fetch_calls.load(Ordering::SeqCst), 0);
    task.abort();
}

#[tokio::test]
async fn reconnect_resyncs_before_forwarding() {
    let store = Arc::new(MemoryStore::with_cells(vec![Cell::new(1, 1, "#000000", "a")]));
    let initial = store.subscribe().await.unwrap();
    let (tx, mut rx) = mpsc::channel(16);
    let task = spawn_live_sync(store.clone(), tx, Some(initial), fast());

    store.disconnect_all();
    store.add_silently(Cell::new(2, 2, "#000000", "missed"));

    match next_event(&mut rx).await {
        SessionEvent::Resync(cells) => {
            assert_eq!(cells.len(), 2);
            assert!(cells.contains(&Cell::new(2, 2, "#000000", "missed")));
        }
        other => panic!("unexpected event: {other:?}"),
    }

    wait_for_feed(&store).await;
    store.push_live(Cell::new(5, 5, "#FFFFFF", "b"));
    assert!(matches!(next_event(&mut rx).await, SessionEvent::Live(_)));
    assert_eq!(store.subscribe_calls.load(Ordering::SeqCst), 2);
    task.abort();
}

#[tokio::test]
async fn subscribe_failures_are_retried() {
    let store = Arc::new(MemoryStore::default());
    store.subscribe_failures.store(2, Ordering::SeqCst);
    let (tx, mut rx) = mpsc::channel(16);
    let task = spawn_live_sync(store.clone(), tx, None, fast());

    // Without an initial feed the first successful subscription resyncs.
    assert!(matches!(next_event(&mut rx).await, SessionEvent::Resync(_)));
    assert_eq!(store.subscribe_calls.load(Ordering::SeqCst), 3);
    task.abort();
}

#[tokio::test]
async fn failed_resync_still_forwards() {
    let store = Arc::new(MemoryStore::default());
    store.fetch_failures.store(1, Ordering::SeqCst);
    let (tx, mut rx) = mpsc::channel(16);
    let task = spawn_live_sync(store.clone(), tx, None, fast());

    wait_for_feed(&store).await;
    store.push_live(Cell::new(8, 8, "#000000", "c"));
    assert!(matches!(next_event(&mut rx).await, SessionEvent::Live(_)));
    task.abort();
}

#[tokio::test]
async fn stops_when_session_is_gone() {
    let store = Arc::new(MemoryStore::default());
    let initial = store.subscribe().await.unwrap();
    let (tx, rx) = mpsc::channel(16);
    let task = spawn_live_sync(store.clone(), tx, Some(initial), fast());

    drop(rx);
    store.push_live(Cell::new(1, 1, "#000000", "a"));
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("task exits")
        .unwrap();
}
