//! Sync service: initial loads and the supervised live feed.
//!
//! DESIGN
//! ======
//! The live feed runs in its own task and only posts events to the session
//! loop; it never touches engine state. When the feed fails or ends, the
//! task waits with exponential backoff (plus jitter) and subscribes again.
//! Every successful re-subscription is followed by a bulk fetch that the
//! session merges over its grid, so inserts missed while disconnected are
//! recovered. The new feed is opened before that fetch, so nothing falls in
//! between; duplicates are harmless upserts.
//!
//! The task exits once the session loop has gone away.

#[cfg(test)]
#[path = "sync_test.rs"]
mod sync_test;

use std::sync::Arc;
use std::time::Duration;

use canvas::grid::Cell;
use futures::StreamExt;
use rand::Rng;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::session::SessionEvent;
use crate::store::{CellStream, RemoteStore, StoreError};

pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(1000);
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_millis(10_000);
pub const DEFAULT_MAX_JITTER: Duration = Duration::from_millis(250);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveSyncConfig {
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub max_jitter: Duration,
    /// Upper bound on one subscribe attempt, handshake included.
    pub connect_timeout: Duration,
}

impl Default for LiveSyncConfig {
    fn default() -> Self {
        Self {
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
            max_jitter: DEFAULT_MAX_JITTER,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

/// Doubling reconnect delay, capped, with random jitter on top.
#[derive(Debug)]
pub(crate) struct Backoff {
    config: LiveSyncConfig,
    current: Duration,
}

impl Backoff {
    pub(crate) fn new(config: LiveSyncConfig) -> Self {
        Self { config, current: config.initial_backoff }
    }

    pub(crate) fn reset(&mut self) {
        self.current = self.config.initial_backoff;
    }

    pub(crate) fn next_delay(&mut self) -> Duration {
        let base = self.current;
        self.current = (self.current * 2).min(self.config.max_backoff);
        base + jitter(self.config.max_jitter)
    }
}

fn jitter(max: Duration) -> Duration {
    let max_ms = millis(max);
    if max_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::rng().random_range(0..=max_ms))
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

// =============================================================================
// INITIAL LOADS
// =============================================================================

/// Fetch every cell for the initial load. `None` on failure; the grid then
/// stays in its loading state.
pub async fn load_initial(store: &dyn RemoteStore) -> Option<Vec<Cell>> {
    match store.fetch_all_cells().await {
        Ok(cells) => {
            info!(count = cells.len(), "fetched grid");
            Some(cells)
        }
        Err(e) => {
            error!(error = %e, "initial grid load failed; grid stays loading");
            None
        }
    }
}

/// Fetch the user's last placement to seed the cooldown. Failures are logged
/// and treated as "no cooldown"; the store still enforces its own limit.
pub async fn load_last_placement(store: &dyn RemoteStore, user_id: &str) -> Option<i64> {
    match store.fetch_last_placement(user_id).await {
        Ok(last) => last,
        Err(e) => {
            warn!(error = %e, %user_id, "cooldown lookup failed");
            None
        }
    }
}

// =============================================================================
// LIVE FEED
// =============================================================================

/// Subscribe to the live feed, giving up after `timeout`.
///
/// # Errors
///
/// Returns the store's error, or [`StoreError::Live`] when the attempt
/// does not finish in time.
pub async fn open_feed(store: &dyn RemoteStore, timeout: Duration) -> Result<CellStream, StoreError> {
    match tokio::time::timeout(timeout, store.subscribe()).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Live(format!("subscribe timed out after {}ms", millis(timeout)))),
    }
}

/// Spawn the supervised live feed.
///
/// `initial` is a feed the caller already opened (so that it predates the
/// caller's bulk fetch). When it is `None` the task subscribes itself and
/// resynchronizes once it succeeds.
pub fn spawn_live_sync(
    store: Arc<dyn RemoteStore>,
    events: mpsc::Sender<SessionEvent>,
    initial: Option<CellStream>,
    config: LiveSyncConfig,
) -> JoinHandle<()> {
    tokio::spawn(run_live_sync(store, events, initial, config))
}

async fn run_live_sync(
    store: Arc<dyn RemoteStore>,
    events: mpsc::Sender<SessionEvent>,
    initial: Option<CellStream>,
    config: LiveSyncConfig,
) {
    let mut backoff = Backoff::new(config);
    let mut needs_resync = initial.is_none();
    let mut pending = initial;

    loop {
        let stream = match pending.take() {
            Some(stream) => stream,
            None => match open_feed(store.as_ref(), config.connect_timeout).await {
                Ok(stream) => stream,
                Err(e) => {
                    let delay = backoff.next_delay();
                    warn!(error = %e, delay_ms = millis(delay), "live subscribe failed; retrying");
                    if events.is_closed() {
                        return;
                    }
                    tokio::time::sleep(delay).await;
                    needs_resync = true;
                    continue;
                }
            },
        };
        backoff.reset();

        if needs_resync {
            info!("live feed connected; resynchronizing");
            if !resync(store.as_ref(), &events).await {
                return;
            }
        }
        needs_resync = true;

        if !forward(stream, &events).await {
            debug!("session closed; live feed stopping");
            return;
        }

        let delay = backoff.next_delay();
        warn!(delay_ms = millis(delay), "live feed ended; reconnecting");
        tokio::time::sleep(delay).await;
    }
}

/// Fetch a full snapshot and post it for merging. Returns `false` once the
/// session is gone.
async fn resync(store: &dyn RemoteStore, events: &mpsc::Sender<SessionEvent>) -> bool {
    match store.fetch_all_cells().await {
        Ok(cells) => {
            debug!(count = cells.len(), "resync snapshot fetched");
            events.send(SessionEvent::Resync(cells)).await.is_ok()
        }
        Err(e) => {
            warn!(error = %e, "resync fetch failed; continuing with live feed only");
            true
        }
    }
}

/// Forward feed items until the feed fails or ends. Returns `false` once the
/// session is gone.
async fn forward(mut stream: CellStream, events: &mpsc::Sender<SessionEvent>) -> bool {
    while let Some(item) = stream.next().await {
        match item {
            Ok(cell) => {
                if events.send(SessionEvent::Live(cell)).await.is_err() {
                    return false;
                }
            }
            Err(e) => {
                warn!(error = %e, "live feed error");
                break;
            }
        }
    }
    !events.is_closed()
}
