//! Remote store boundary.
//!
//! DESIGN
//! ======
//! The shared grid lives in a remote, append-only store. This module names
//! the four things the client needs from it behind the `RemoteStore` trait,
//! so services take an `Arc<dyn RemoteStore>` and tests swap in the
//! in-memory store from `state::test_helpers`.
//!
//! ERROR HANDLING
//! ==============
//! Every call returns `StoreError`. Callers decide severity: load failures
//! leave the grid loading, append failures are logged and never rolled back,
//! stream failures trigger a reconnect.

pub mod http;

use canvas::grid::Cell;
use futures::stream::BoxStream;
use serde::Serialize;

/// Live feed of inserted cells. Ends when the connection drops.
pub type CellStream = BoxStream<'static, Result<Cell, StoreError>>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to build HTTP client: {0}")]
    HttpClientBuild(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("store returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed store payload: {0}")]
    Decode(String),
    #[error("live connection failed: {0}")]
    Live(String),
}

/// One append request. Carries the author id the store uses for its own
/// cooldown bookkeeping, which is not part of a `Cell`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewCell {
    pub x: i32,
    pub y: i32,
    pub color: String,
    pub user_id: String,
    pub user_name: String,
}

impl NewCell {
    #[must_use]
    pub fn from_cell(cell: &Cell, user_id: &str) -> Self {
        Self {
            x: cell.x,
            y: cell.y,
            color: cell.color.clone(),
            user_id: user_id.to_owned(),
            user_name: cell.author_name.clone(),
        }
    }

    #[must_use]
    pub fn to_cell(&self) -> Cell {
        Cell::new(self.x, self.y, self.color.clone(), self.user_name.clone())
    }
}

#[async_trait::async_trait]
pub trait RemoteStore: Send + Sync {
    /// Every cell currently in the store.
    async fn fetch_all_cells(&self) -> Result<Vec<Cell>, StoreError>;

    /// Append one placement.
    async fn insert_cell(&self, cell: &NewCell) -> Result<(), StoreError>;

    /// Epoch milliseconds of the user's most recent placement, if any.
    async fn fetch_last_placement(&self, user_id: &str) -> Result<Option<i64>, StoreError>;

    /// Open the live insert feed.
    async fn subscribe(&self) -> Result<CellStream, StoreError>;
}
