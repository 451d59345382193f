//! Session loop: the single owner of grid, camera and cooldown state.
//!
//! DESIGN
//! ======
//! Everything that mutates engine state arrives as a `SessionEvent` on one
//! mpsc channel and is applied by `Session::run`, one event at a time, so no
//! locks guard the engine. Producers:
//!
//! - the live-feed task (`Live`, `Resync`),
//! - spawned appends (`AppendFinished`),
//! - the host via `SessionHandle` (pointer input, color, placement, snapshots).
//!
//! The live feed is opened before the initial bulk fetch. Inserts that race
//! the fetch wait in the channel and are applied afterwards as idempotent
//! upserts.
//!
//! A one-second ticker refreshes the cooldown countdown. On shutdown the
//! live feed is stopped and in-flight appends get a short grace period.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::future::Future;
use std::time::Duration;

use canvas::camera::{Camera, Point};
use canvas::consts::PALETTE;
use canvas::engine::{Action, EngineCore, PlaceError};
use canvas::grid::{Cell, CellCoord, UpsertOutcome};
use canvas::input::PointerEvent;
use canvas::render::{self, HoverOutline, Redraw};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::now_ms;
use super::placement::spawn_append;
use super::sync::{self, LiveSyncConfig};
use crate::state::AppState;
use crate::store::NewCell;

const EVENT_BUFFER: usize = 1024;
const COOLDOWN_TICK: Duration = Duration::from_secs(1);
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug)]
pub enum SessionEvent {
    /// One insert from the live feed.
    Live(Cell),
    /// Full snapshot fetched after the live feed reconnected.
    Resync(Vec<Cell>),
    /// A spawned append completed.
    AppendFinished {
        cell: NewCell,
        result: Result<(), String>,
        reply: Option<oneshot::Sender<bool>>,
    },
    Pointer(PointerEvent),
    SetColor(String),
    Place {
        x: i32,
        y: i32,
        reply: oneshot::Sender<Result<PendingPlacement, PlaceError>>,
    },
    Snapshot(oneshot::Sender<ViewSnapshot>),
}

/// An accepted placement whose remote append is still running.
#[derive(Debug)]
pub struct PendingPlacement {
    pub cell: Cell,
    /// Resolves to whether the store accepted the append.
    pub appended: oneshot::Receiver<bool>,
}

/// Everything a UI needs to draw one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSnapshot {
    pub loading: bool,
    pub cell_count: usize,
    pub last_changed: Option<Cell>,
    pub camera: Camera,
    pub transform: String,
    pub zoom_label: String,
    pub hover: Option<CellCoord>,
    pub hover_outline: Option<HoverOutline>,
    pub tooltip: Option<[String; 2]>,
    /// Tooltip top-left in viewport pixels.
    pub tooltip_anchor: Option<Point>,
    pub cooldown_secs: u64,
    pub cooldown_label: Option<String>,
    pub can_place: bool,
    pub color: String,
    pub pending_appends: usize,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session loop has stopped")]
    Closed,
}

// =============================================================================
// HANDLE
// =============================================================================

/// Cheap, cloneable sender side of a running session.
#[derive(Clone)]
pub struct SessionHandle {
    events: mpsc::Sender<SessionEvent>,
}

impl SessionHandle {
    async fn send(&self, event: SessionEvent) -> Result<(), SessionError> {
        self.events.send(event).await.map_err(|_| SessionError::Closed)
    }

    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] once the loop has stopped.
    pub async fn pointer(&self, event: PointerEvent) -> Result<(), SessionError> {
        self.send(SessionEvent::Pointer(event)).await
    }

    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] once the loop has stopped.
    pub async fn set_color(&self, color: impl Into<String>) -> Result<(), SessionError> {
        self.send(SessionEvent::SetColor(color.into())).await
    }

    /// Place a cell at grid coordinates with the selected color.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] once the loop has stopped. A refused
    /// placement is the inner `Err`.
    pub async fn place(&self, x: i32, y: i32) -> Result<Result<PendingPlacement, PlaceError>, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionEvent::Place { x, y, reply }).await?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] once the loop has stopped.
    pub async fn snapshot(&self) -> Result<ViewSnapshot, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionEvent::Snapshot(reply)).await?;
        rx.await.map_err(|_| SessionError::Closed)
    }
}

// =============================================================================
// SESSION
// =============================================================================

pub struct Session {
    state: AppState,
    engine: EngineCore,
    events_tx: mpsc::Sender<SessionEvent>,
    events_rx: mpsc::Receiver<SessionEvent>,
    live: JoinHandle<()>,
    pending_appends: usize,
    last_cooldown_secs: u64,
}

impl Session {
    /// Open the live feed, load the grid and seed the cooldown.
    ///
    /// A subscribe that fails or outlasts `live_config.connect_timeout` does
    /// not hold up the bulk load; the live task retries it in the background.
    pub async fn start_with(state: AppState, viewport: (f64, f64), live_config: LiveSyncConfig) -> Self {
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        let mut engine = EngineCore::new(state.identity.clone());
        engine.set_viewport(viewport.0, viewport.1);

        let initial = match sync::open_feed(state.store.as_ref(), live_config.connect_timeout).await {
            Ok(stream) => Some(stream),
            Err(e) => {
                warn!(error = %e, "live subscribe failed; retrying in background");
                None
            }
        };
        let live = sync::spawn_live_sync(state.store.clone(), events_tx.clone(), initial, live_config);

        if let Some(cells) = sync::load_initial(state.store.as_ref()).await {
            let stored = engine.load_snapshot(cells);
            let camera = engine.camera();
            info!(stored, zoom = camera.zoom, pan_x = camera.pan_x, pan_y = camera.pan_y, "grid loaded");
        }

        if let Some(identity) = &state.identity {
            if let Some(last) = sync::load_last_placement(state.store.as_ref(), &identity.id).await {
                let now = now_ms();
                if engine.seed_cooldown(last, now) {
                    info!(remaining_secs = engine.cooldown_remaining_secs(now), "cooldown active from last placement");
                }
            }
        }

        Self {
            state,
            engine,
            events_tx,
            events_rx,
            live,
            pending_appends: 0,
            last_cooldown_secs: 0,
        }
    }

    #[must_use]
    pub fn handle(&self) -> SessionHandle {
        SessionHandle { events: self.events_tx.clone() }
    }

    /// Process events until `shutdown` resolves.
    pub async fn run(mut self, shutdown: impl Future<Output = ()>) {
        let mut ticker = tokio::time::interval(COOLDOWN_TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => break,
                Some(event) = self.events_rx.recv() => self.handle_event(event, now_ms()),
                _ = ticker.tick() => self.tick_cooldown(now_ms()),
            }
        }

        self.live.abort();
        self.drain().await;
        info!(cells = self.engine.grid.len(), "session stopped");
    }

    /// Give in-flight appends a bounded chance to report back.
    async fn drain(&mut self) {
        if self.pending_appends == 0 {
            return;
        }
        info!(pending = self.pending_appends, "waiting for in-flight appends");
        let deadline = tokio::time::sleep(DRAIN_TIMEOUT);
        tokio::pin!(deadline);
        while self.pending_appends > 0 {
            tokio::select! {
                () = &mut deadline => {
                    warn!(pending = self.pending_appends, "gave up waiting for appends");
                    return;
                }
                Some(event) = self.events_rx.recv() => {
                    if matches!(event, SessionEvent::AppendFinished { .. }) {
                        self.handle_event(event, now_ms());
                    }
                }
            }
        }
    }

    fn handle_event(&mut self, event: SessionEvent, now: i64) {
        match event {
            SessionEvent::Live(cell) => self.apply_live(cell),
            SessionEvent::Resync(cells) => {
                let total = cells.len();
                let changed = self.engine.merge_snapshot(cells);
                info!(total, changed, "grid resynchronized");
            }
            SessionEvent::AppendFinished { cell, result, reply } => {
                self.pending_appends = self.pending_appends.saturating_sub(1);
                match &result {
                    Ok(()) => debug!(x = cell.x, y = cell.y, "append accepted"),
                    Err(e) => warn!(error = %e, x = cell.x, y = cell.y, "append failed; keeping local cell"),
                }
                if let Some(reply) = reply {
                    if reply.send(result.is_ok()).is_err() {
                        debug!("append reply dropped");
                    }
                }
            }
            SessionEvent::Pointer(pointer) => {
                for action in self.engine.handle_pointer(pointer, now) {
                    self.apply_action(action);
                }
            }
            SessionEvent::SetColor(color) => {
                if !PALETTE.contains(&color.as_str()) {
                    debug!(%color, "color outside palette");
                }
                self.engine.set_color(color);
            }
            SessionEvent::Place { x, y, reply } => {
                let result = self.engine.place(x, y, now).map(|cell| {
                    let (tx, appended) = oneshot::channel();
                    self.start_append(&cell, Some(tx));
                    PendingPlacement { cell, appended }
                });
                match &result {
                    Ok(pending) => info!(x, y, color = %pending.cell.color, "placed cell"),
                    Err(e) => info!(error = %e, "placement rejected"),
                }
                if reply.send(result).is_err() {
                    debug!("placement reply dropped");
                }
            }
            SessionEvent::Snapshot(reply) => {
                if reply.send(self.snapshot(now)).is_err() {
                    debug!("snapshot reply dropped");
                }
            }
        }
        self.flush_redraw();
    }

    fn apply_live(&mut self, cell: Cell) {
        let (x, y) = (cell.x, cell.y);
        match self.engine.apply_insert(cell) {
            UpsertOutcome::Inserted | UpsertOutcome::Replaced => {
                if let Some(cell) = self.engine.grid.last_changed() {
                    info!(x, y, color = %cell.color, author = %cell.author_name, "live cell");
                }
            }
            UpsertOutcome::Unchanged => debug!(x, y, "duplicate live cell"),
            UpsertOutcome::OutOfBounds => warn!(x, y, "live cell outside grid dropped"),
        }
    }

    fn apply_action(&mut self, action: Action) {
        match action {
            Action::CellPlaced(cell) => {
                info!(x = cell.x, y = cell.y, color = %cell.color, "placed cell");
                self.start_append(&cell, None);
            }
            Action::PlacementRejected(e) => info!(error = %e, "placement rejected"),
            Action::HoverChanged(Some(coord)) => {
                let [heading, detail] = render::tooltip_text(coord, self.engine.grid.get(coord));
                debug!(%heading, %detail, "hover");
            }
            Action::HoverChanged(None) => debug!("hover cleared"),
            Action::SetCursor(cursor) => debug!(%cursor, "cursor"),
            Action::RenderNeeded => {
                let camera = self.engine.camera();
                debug!(transform = %render::css_transform(&camera), "camera moved");
            }
        }
    }

    fn start_append(&mut self, cell: &Cell, reply: Option<oneshot::Sender<bool>>) {
        let Some(identity) = &self.state.identity else {
            return;
        };
        self.pending_appends += 1;
        spawn_append(
            self.state.store.clone(),
            NewCell::from_cell(cell, &identity.id),
            self.events_tx.clone(),
            reply,
        );
    }

    /// Turn the engine's pending repaint into draw commands.
    fn flush_redraw(&mut self) {
        let redraw = self.engine.take_redraw();
        if redraw.is_nothing() {
            return;
        }
        let fills = render::draw_commands(&self.engine.grid, &redraw);
        debug!(fills = fills.len(), full = matches!(redraw, Redraw::Full), "repaint");
    }

    fn tick_cooldown(&mut self, now: i64) {
        let secs = self.engine.cooldown_remaining_secs(now);
        if secs == self.last_cooldown_secs {
            return;
        }
        match render::cooldown_label(secs) {
            Some(label) => debug!(%label, "cooldown"),
            None => info!("cooldown over; placement available"),
        }
        self.last_cooldown_secs = secs;
    }

    fn snapshot(&self, now: i64) -> ViewSnapshot {
        let camera = self.engine.camera();
        let cooldown_secs = self.engine.cooldown_remaining_secs(now);
        let hover = self.engine.hover();
        ViewSnapshot {
            loading: self.engine.is_loading(),
            cell_count: self.engine.grid.len(),
            last_changed: self.engine.grid.last_changed().cloned(),
            camera,
            transform: render::css_transform(&camera),
            zoom_label: render::zoom_label(&camera),
            hover: hover.map(|(coord, _)| coord),
            hover_outline: hover.map(|(coord, _)| render::hover_outline(&camera, coord)),
            tooltip: hover.map(|(coord, cell)| render::tooltip_text(coord, cell)),
            tooltip_anchor: hover.map(|(coord, _)| {
                render::tooltip_anchor(&camera, coord, self.engine.viewport_width, self.engine.viewport_height)
            }),
            cooldown_secs,
            cooldown_label: render::cooldown_label(cooldown_secs),
            can_place: self.engine.can_place(now),
            color: self.engine.ui.color.clone(),
            pending_appends: self.pending_appends,
        }
    }
}
