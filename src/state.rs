//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is handed to every service. It holds the remote store handle
//! and the signed-in identity; there is no global client. Grid, camera and
//! cooldown state are not here: they belong to the session loop, which owns
//! them exclusively.

use std::sync::Arc;

use canvas::engine::Identity;

use crate::store::RemoteStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RemoteStore>,
    /// `None` makes the session read-only.
    pub identity: Option<Identity>,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn RemoteStore>, identity: Option<Identity>) -> Self {
        Self { store, identity }
    }
}

#[cfg(test)]
pub mod test_helpers {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use canvas::grid::Cell;
    use futures::StreamExt;
    use tokio::sync::mpsc;

    use super::*;
    use crate::store::{CellStream, NewCell, StoreError};

    /// In-memory `RemoteStore` with scriptable failures.
    ///
    /// Inserts are appended to the listing and echoed to every open live
    /// feed, like the real store does.
    #[derive(Default)]
    pub struct MemoryStore {
        pub cells: Mutex<Vec<Cell>>,
        pub inserted: Mutex<Vec<NewCell>>,
        pub last_placed: Mutex<HashMap<String, i64>>,
        feeds: Mutex<Vec<mpsc::UnboundedSender<Result<Cell, StoreError>>>>,
        /// Number of upcoming `fetch_all_cells` calls that fail.
        pub fetch_failures: AtomicUsize,
        /// Number of upcoming `subscribe` calls that fail.
        pub subscribe_failures: AtomicUsize,
        pub fail_inserts: AtomicBool,
        pub fetch_calls: AtomicUsize,
        pub subscribe_calls: AtomicUsize,
    }

    impl MemoryStore {
        #[must_use]
        pub fn with_cells(cells: Vec<Cell>) -> Self {
            Self { cells: Mutex::new(cells), ..Self::default() }
        }

        /// Deliver a cell to open feeds without adding it to the listing.
        pub fn push_live(&self, cell: Cell) {
            let feeds = self.feeds.lock().unwrap();
            for feed in feeds.iter() {
                let _ = feed.send(Ok(cell.clone()));
            }
        }

        /// Add a cell to the listing only, as if its live event was missed.
        pub fn add_silently(&self, cell: Cell) {
            self.cells.lock().unwrap().push(cell);
        }

        /// End every open live feed.
        pub fn disconnect_all(&self) {
            self.feeds.lock().unwrap().clear();
        }

        #[must_use]
        pub fn open_feeds(&self) -> usize {
            self.feeds.lock().unwrap().iter().filter(|feed| !feed.is_closed()).count()
        }

        fn take_failure(counter: &AtomicUsize) -> bool {
            counter
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
        }
    }

    #[async_trait::async_trait]
    impl RemoteStore for MemoryStore {
        async fn fetch_all_cells(&self) -> Result<Vec<Cell>, StoreError> {
            self.fetch_calls.fetch_add(1, Ordering::SeqCst);
            if Self::take_failure(&self.fetch_failures) {
                return Err(StoreError::Request("scripted fetch failure".into()));
            }
            Ok(self.cells.lock().unwrap().clone())
        }

        async fn insert_cell(&self, cell: &NewCell) -> Result<(), StoreError> {
            if self.fail_inserts.load(Ordering::SeqCst) {
                return Err(StoreError::Status { status: 500, body: "scripted insert failure".into() });
            }
            self.inserted.lock().unwrap().push(cell.clone());
            self.cells.lock().unwrap().push(cell.to_cell());
            self.push_live(cell.to_cell());
            Ok(())
        }

        async fn fetch_last_placement(&self, user_id: &str) -> Result<Option<i64>, StoreError> {
            Ok(self.last_placed.lock().unwrap().get(user_id).copied())
        }

        async fn subscribe(&self) -> Result<CellStream, StoreError> {
            self.subscribe_calls.fetch_add(1, Ordering::SeqCst);
            if Self::take_failure(&self.subscribe_failures) {
                return Err(StoreError::Live("scripted subscribe failure".into()));
            }
            let (tx, rx) = mpsc::unbounded_channel();
            self.feeds.lock().unwrap().push(tx);
            let stream = futures::stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|item| (item, rx)) });
            Ok(stream.boxed())
        }
    }

    #[must_use]
    pub fn alice() -> Identity {
        Identity::new("user-a", Some("alice"))
    }

    /// App state over a shared `MemoryStore` so tests can keep poking it.
    #[must_use]
    pub fn test_app_state(store: &Arc<MemoryStore>, identity: Option<Identity>) -> AppState {
        AppState::new(store.clone(), identity)
    }
}
