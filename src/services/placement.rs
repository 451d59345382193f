//! Remote append for accepted placements.
//!
//! The engine has already applied the cell and started the cooldown by the
//! time this runs. The append is fire-and-forget from the session loop's
//! point of view: it runs on its own task and posts the outcome back as a
//! `SessionEvent::AppendFinished`. Nothing is rolled back on failure.

#[cfg(test)]
#[path = "placement_test.rs"]
mod placement_test;

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

use super::session::SessionEvent;
use crate::store::{NewCell, RemoteStore};

/// Spawn the append of one placement.
///
/// `reply`, when given, is forwarded with the outcome by the session loop.
pub fn spawn_append(
    store: Arc<dyn RemoteStore>,
    cell: NewCell,
    events: mpsc::Sender<SessionEvent>,
    reply: Option<oneshot::Sender<bool>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let result = store.insert_cell(&cell).await.map_err(|e| e.to_string());
        let (x, y) = (cell.x, cell.y);
        if events
            .send(SessionEvent::AppendFinished { cell, result, reply })
            .await
            .is_err()
        {
            debug!(x, y, "session closed before append finished");
        }
    })
}
