//! Input model: mouse buttons, pointer events, and the gesture state machine.
//!
//! `PointerEvent` is the host-neutral form of a raw DOM (or scripted) pointer
//! event. `InputState` is the active gesture tracked between pointer-down and
//! pointer-up; only one gesture is active at a time. `UiState` holds what the
//! renderer shows outside the grid itself: the hovered cell and the color the
//! next placement will use.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::camera::Point;
use crate::consts::DEFAULT_COLOR;
use crate::grid::CellCoord;

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
}

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelDelta {
    /// Horizontal scroll amount in pixels.
    pub dx: f64,
    /// Vertical scroll amount in pixels (positive = down = zoom out).
    pub dy: f64,
}

/// A pointer event in screen space (CSS pixels relative to the canvas container).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down { at: Point, button: Button },
    Move { at: Point },
    Up { at: Point },
    Wheel { at: Point, delta: WheelDelta },
    /// The pointer left the interactive surface.
    Leave,
}

/// Persistent UI state visible to the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct UiState {
    /// Cell under the idle pointer, if it is over the grid.
    pub hover: Option<CellCoord>,
    /// Color used by the next placement.
    pub color: String,
}

impl Default for UiState {
    fn default() -> Self {
        Self { hover: None, color: DEFAULT_COLOR.to_owned() }
    }
}

/// Internal state for the input state machine.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InputState {
    /// No button held; pointer moves update hover.
    #[default]
    Idle,
    /// A button is held. Moves pan the camera; a release without any move
    /// in between is a click.
    Dragging {
        /// Pointer position minus pan at pointer-down, so that
        /// `pan = pointer - drag_start` during the drag.
        drag_start: Point,
        /// Button that started the gesture.
        button: Button,
        /// Whether any move arrived since pointer-down.
        has_dragged: bool,
    },
}

impl InputState {
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        matches!(self, Self::Dragging { .. })
    }
}
