use crate::camera::{Camera, Point};
use crate::consts::{ANONYMOUS_NAME, ZOOM_STEP};
use crate::cooldown::CooldownGate;
use crate::focus;
use crate::grid::{Cell, CellCoord, GridStore, UpsertOutcome};
use crate::hit;
use crate::input::{Button, InputState, PointerEvent, UiState, WheelDelta};
use crate::render::Redraw;

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// The signed-in user placements are attributed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub display_name: String,
}

impl Identity {
    /// Build an identity; a missing or blank display name becomes `"Anonymous"`.
    #[must_use]
    pub fn new(id: impl Into<String>, display_name: Option<&str>) -> Self {
        let display_name = display_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(ANONYMOUS_NAME)
            .to_owned();
        Self { id: id.into(), display_name }
    }
}

/// Why a placement was refused locally.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlaceError {
    #[error("no signed-in user")]
    NoIdentity,
    #[error("grid has not finished loading")]
    Loading,
    #[error("cell ({x}, {y}) is outside the grid")]
    OutOfBounds { x: i32, y: i32 },
    #[error("cooldown active for another {remaining_ms} ms")]
    CoolingDown { remaining_ms: i64 },
}

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// A cell was placed optimistically; the host must append it remotely.
    CellPlaced(Cell),
    /// A click landed on the grid but the placement was refused.
    PlacementRejected(PlaceError),
    HoverChanged(Option<CellCoord>),
    SetCursor(String),
    RenderNeeded,
}

/// Core engine state: the replica, the camera, the cooldown gate and the
/// gesture state machine.
///
/// Holds no I/O. Every mutation arrives through a method call from the host's
/// single event loop; time is passed in as epoch milliseconds.
#[derive(Debug, Default)]
pub struct EngineCore {
    pub grid: GridStore,
    pub camera: Camera,
    pub cooldown: CooldownGate,
    pub identity: Option<Identity>,
    pub ui: UiState,
    pub input: InputState,
    pub viewport_width: f64,
    pub viewport_height: f64,
    focus_applied: bool,
    redraw: Redraw,
}

impl EngineCore {
    #[must_use]
    pub fn new(identity: Option<Identity>) -> Self {
        Self { identity, ..Self::default() }
    }

    // --- Data inputs ---

    /// Hydrate the grid from the initial bulk fetch.
    pub fn load_snapshot(&mut self, cells: Vec<Cell>) -> usize {
        let stored = self.grid.load_bulk(cells);
        self.redraw.mark_full();
        self.apply_initial_focus();
        stored
    }

    /// Merge a resynchronization snapshot over the current grid.
    pub fn merge_snapshot(&mut self, cells: Vec<Cell>) -> usize {
        let changed = self.grid.merge_bulk(cells);
        if changed > 0 {
            self.redraw.mark_full();
        }
        self.apply_initial_focus();
        changed
    }

    /// Apply one live insert event.
    pub fn apply_insert(&mut self, cell: Cell) -> UpsertOutcome {
        let coord = cell.coord();
        let outcome = self.grid.apply_upsert(cell);
        if let (true, Some(coord)) = (outcome.changed(), coord) {
            self.redraw.mark_cell(coord);
        }
        outcome
    }

    /// Seed the cooldown from the store's last-placement timestamp.
    ///
    /// Returns whether a cooldown is active afterwards.
    pub fn seed_cooldown(&mut self, last_placed_ms: i64, now_ms: i64) -> bool {
        let Some(identity) = self.identity.as_ref() else {
            return false;
        };
        self.cooldown
            .seed_from_last_placement(&identity.id, last_placed_ms, now_ms)
    }

    // --- Viewport ---

    /// Update viewport dimensions in CSS pixels.
    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport_width = width;
        self.viewport_height = height;
        self.apply_initial_focus();
    }

    /// Point the camera at the densest bucket, once, as soon as both the
    /// grid and the viewport size are known. Returns whether it ran now.
    pub fn apply_initial_focus(&mut self) -> bool {
        if self.focus_applied || !self.grid.is_loaded() {
            return false;
        }
        if self.viewport_width <= 0.0 || self.viewport_height <= 0.0 {
            return false;
        }
        self.camera = focus::initial_camera(&self.grid, self.viewport_width, self.viewport_height);
        self.focus_applied = true;
        true
    }

    // --- Placement ---

    /// Set the color used by the next placement.
    pub fn set_color(&mut self, color: impl Into<String>) {
        self.ui.color = color.into();
    }

    /// Place a cell with the selected color.
    ///
    /// On success the cell is already in the grid and the cooldown restarted;
    /// the caller owns the remote append and must not roll either back if it
    /// fails.
    ///
    /// # Errors
    ///
    /// Returns a [`PlaceError`] without touching any state when there is no
    /// identity, the grid is loading, the coordinate is off-grid, or the user
    /// is cooling down.
    pub fn place(&mut self, x: i32, y: i32, now_ms: i64) -> Result<Cell, PlaceError> {
        let Some(identity) = self.identity.as_ref() else {
            return Err(PlaceError::NoIdentity);
        };
        if !self.grid.is_loaded() {
            return Err(PlaceError::Loading);
        }
        let Some(coord) = CellCoord::new(x, y) else {
            return Err(PlaceError::OutOfBounds { x, y });
        };
        if !self.cooldown.can_place(&identity.id, now_ms) {
            return Err(PlaceError::CoolingDown {
                remaining_ms: self.cooldown.remaining_ms(&identity.id, now_ms),
            });
        }

        let cell = Cell::new(x, y, self.ui.color.clone(), identity.display_name.clone());
        self.grid.apply_upsert(cell.clone());
        self.redraw.mark_cell(coord);
        self.cooldown.start(&identity.id, now_ms);
        Ok(cell)
    }

    // --- Input events ---

    /// Dispatch one pointer event. Input is ignored until the grid has loaded.
    pub fn handle_pointer(&mut self, event: PointerEvent, now_ms: i64) -> Vec<Action> {
        if !self.grid.is_loaded() {
            return Vec::new();
        }
        match event {
            PointerEvent::Down { at, button } => self.on_pointer_down(at, button),
            PointerEvent::Move { at } => self.on_pointer_move(at),
            PointerEvent::Up { at } => self.on_pointer_up(at, now_ms),
            PointerEvent::Wheel { at, delta } => self.on_wheel(at, delta),
            PointerEvent::Leave => self.on_pointer_leave(),
        }
    }

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button) -> Vec<Action> {
        let mut actions = Vec::new();
        self.input = InputState::Dragging {
            drag_start: Point::new(screen_pt.x - self.camera.pan_x, screen_pt.y - self.camera.pan_y),
            button,
            has_dragged: false,
        };
        if self.ui.hover.take().is_some() {
            actions.push(Action::HoverChanged(None));
        }
        actions.push(Action::SetCursor("grabbing".into()));
        actions
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point) -> Vec<Action> {
        match self.input {
            InputState::Dragging { drag_start, button, .. } => {
                self.camera.pan_x = screen_pt.x - drag_start.x;
                self.camera.pan_y = screen_pt.y - drag_start.y;
                self.input = InputState::Dragging { drag_start, button, has_dragged: true };
                vec![Action::RenderNeeded]
            }
            InputState::Idle => {
                let hover = hit::cell_at(&self.camera, screen_pt);
                if hover == self.ui.hover {
                    return Vec::new();
                }
                self.ui.hover = hover;
                vec![Action::HoverChanged(hover)]
            }
        }
    }

    /// End a gesture. Only an undragged primary-button press places a cell;
    /// middle and secondary presses are pan-only.
    pub fn on_pointer_up(&mut self, screen_pt: Point, now_ms: i64) -> Vec<Action> {
        let InputState::Dragging { button, has_dragged, .. } = self.input else {
            return Vec::new();
        };
        self.input = InputState::Idle;
        let mut actions = vec![Action::SetCursor("grab".into())];
        if has_dragged || button != Button::Primary {
            return actions;
        }
        let Some(coord) = hit::cell_at(&self.camera, screen_pt) else {
            return actions;
        };
        match self.place(coord.x(), coord.y(), now_ms) {
            Ok(cell) => {
                actions.push(Action::CellPlaced(cell));
                actions.push(Action::RenderNeeded);
            }
            Err(e) => actions.push(Action::PlacementRejected(e)),
        }
        actions
    }

    /// Zoom one step around the cursor: in for upward scroll, out for downward.
    pub fn on_wheel(&mut self, screen_pt: Point, delta: WheelDelta) -> Vec<Action> {
        let factor = if delta.dy < 0.0 {
            ZOOM_STEP
        } else if delta.dy > 0.0 {
            1.0 / ZOOM_STEP
        } else {
            return Vec::new();
        };
        if !self.camera.zoom_at(screen_pt, factor) {
            return Vec::new();
        }
        // Keep an in-progress drag anchored to the re-solved pan.
        if let InputState::Dragging { button, has_dragged, .. } = self.input {
            self.input = InputState::Dragging {
                drag_start: Point::new(screen_pt.x - self.camera.pan_x, screen_pt.y - self.camera.pan_y),
                button,
                has_dragged,
            };
        }
        vec![Action::RenderNeeded]
    }

    /// Drop any gesture and hover when the pointer leaves the surface.
    pub fn on_pointer_leave(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.input.is_dragging() {
            self.input = InputState::Idle;
            actions.push(Action::SetCursor("grab".into()));
        }
        if self.ui.hover.take().is_some() {
            actions.push(Action::HoverChanged(None));
        }
        actions
    }

    // --- Queries ---

    /// Whether the initial bulk load is still outstanding.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        !self.grid.is_loaded()
    }

    /// The current camera state.
    #[must_use]
    pub fn camera(&self) -> Camera {
        self.camera
    }

    /// The hovered coordinate and its occupant, if any.
    #[must_use]
    pub fn hover(&self) -> Option<(CellCoord, Option<&Cell>)> {
        self.ui.hover.map(|coord| (coord, self.grid.get(coord)))
    }

    /// Whether the signed-in user may place at `now_ms`.
    #[must_use]
    pub fn can_place(&self, now_ms: i64) -> bool {
        self.identity
            .as_ref()
            .is_some_and(|identity| self.cooldown.can_place(&identity.id, now_ms))
    }

    /// Whole seconds until the signed-in user may place again.
    #[must_use]
    pub fn cooldown_remaining_secs(&self, now_ms: i64) -> u64 {
        self.identity
            .as_ref()
            .map_or(0, |identity| self.cooldown.remaining_secs(&identity.id, now_ms))
    }

    /// Epoch millisecond at which the signed-in user's cooldown ends.
    #[must_use]
    pub fn cooldown_end(&self) -> Option<i64> {
        self.identity
            .as_ref()
            .and_then(|identity| self.cooldown.cooldown_end(&identity.id))
    }

    /// Take the pending redraw, leaving nothing pending.
    pub fn take_redraw(&mut self) -> Redraw {
        std::mem::take(&mut self.redraw)
    }
}
