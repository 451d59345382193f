//! Rendering: turns grid and camera state into host-neutral draw output.
//!
//! The grid is painted into a fixed `GRID_SIZE`² world-space backing surface,
//! one unit per cell. Pan and zoom are applied to that surface as a single
//! CSS-style transform, so a camera change never repaints cells. Cells are
//! repainted only when the grid changes: everything after a bulk load or
//! resync, otherwise just the coordinates that changed.
//!
//! Nothing here mutates application state; the host executes the returned
//! [`FillRect`]s on whatever surface it owns.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use crate::camera::{Camera, Point};
use crate::consts::{BACKGROUND_COLOR, GRID_SIZE, TOOLTIP_HEIGHT_PX, TOOLTIP_OFFSET_PX, TOOLTIP_WIDTH_PX};
use crate::grid::{Cell, CellCoord, GridStore};
use crate::hit;

/// Pending repaint of the backing surface.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Redraw {
    #[default]
    Nothing,
    /// Clear to the background and paint every cell.
    Full,
    /// Repaint only these coordinates, in the order they changed.
    Cells(Vec<CellCoord>),
}

impl Redraw {
    /// Escalate to a full repaint.
    pub fn mark_full(&mut self) {
        *self = Self::Full;
    }

    /// Add one coordinate to the pending repaint.
    pub fn mark_cell(&mut self, coord: CellCoord) {
        match self {
            Self::Full => {}
            Self::Nothing => *self = Self::Cells(vec![coord]),
            Self::Cells(coords) => {
                if !coords.contains(&coord) {
                    coords.push(coord);
                }
            }
        }
    }

    #[must_use]
    pub fn is_nothing(&self) -> bool {
        matches!(self, Self::Nothing)
    }
}

/// One solid rectangle in world units.
#[derive(Debug, Clone, PartialEq)]
pub struct FillRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub color: String,
}

impl FillRect {
    fn cell(cell: &Cell) -> Self {
        Self {
            x: f64::from(cell.x),
            y: f64::from(cell.y),
            width: 1.0,
            height: 1.0,
            color: cell.color.clone(),
        }
    }
}

/// Draw commands for a pending repaint.
///
/// A full repaint starts with the background; an incremental repaint only
/// fills the listed coordinates that hold a cell.
#[must_use]
pub fn draw_commands(grid: &GridStore, redraw: &Redraw) -> Vec<FillRect> {
    match redraw {
        Redraw::Nothing => Vec::new(),
        Redraw::Full => {
            let side = f64::from(GRID_SIZE);
            let mut commands = Vec::with_capacity(grid.len() + 1);
            commands.push(FillRect {
                x: 0.0,
                y: 0.0,
                width: side,
                height: side,
                color: BACKGROUND_COLOR.to_owned(),
            });
            commands.extend(grid.iter().map(FillRect::cell));
            commands
        }
        Redraw::Cells(coords) => coords
            .iter()
            .filter_map(|&coord| grid.get(coord))
            .map(FillRect::cell)
            .collect(),
    }
}

/// CSS transform placing the backing surface, with origin at its top-left.
#[must_use]
pub fn css_transform(camera: &Camera) -> String {
    format!("translate({}px, {}px) scale({})", camera.pan_x, camera.pan_y, camera.zoom)
}

/// Hover highlight around one cell, in world units.
///
/// Two concentric rings (dark inner, light outer) whose widths stay one and
/// two screen pixels at any zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoverOutline {
    pub x: f64,
    pub y: f64,
    pub inner_width: f64,
    pub outer_width: f64,
}

#[must_use]
pub fn hover_outline(camera: &Camera, coord: CellCoord) -> HoverOutline {
    HoverOutline {
        x: f64::from(coord.x()),
        y: f64::from(coord.y()),
        inner_width: camera.screen_dist_to_world(1.0),
        outer_width: camera.screen_dist_to_world(2.0),
    }
}

/// Top-left of the hover tooltip in container pixels, kept inside the
/// container's right and bottom edges.
#[must_use]
pub fn tooltip_anchor(camera: &Camera, coord: CellCoord, viewport_w: f64, viewport_h: f64) -> Point {
    let (cell, _) = hit::cell_screen_rect(camera, coord);
    Point::new(
        (cell.x + TOOLTIP_OFFSET_PX).min(viewport_w - TOOLTIP_WIDTH_PX),
        (cell.y + TOOLTIP_OFFSET_PX).min(viewport_h - TOOLTIP_HEIGHT_PX),
    )
}

/// Tooltip lines: the coordinate, then the author or an empty marker.
#[must_use]
pub fn tooltip_text(coord: CellCoord, cell: Option<&Cell>) -> [String; 2] {
    let heading = format!("Pixel ({}, {})", coord.x(), coord.y());
    let detail = match cell {
        Some(cell) => format!("Placed by: {}", cell.author_name),
        None => "Empty".to_owned(),
    };
    [heading, detail]
}

#[must_use]
pub fn zoom_label(camera: &Camera) -> String {
    format!("Zoom: {}%", camera.zoom_percent())
}

/// Countdown badge text, or `None` when no cooldown is running.
#[must_use]
pub fn cooldown_label(remaining_secs: u64) -> Option<String> {
    (remaining_secs > 0).then(|| format!("Cooldown: {remaining_secs}s"))
}
