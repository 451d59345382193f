#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use crate::consts::{MAX_ZOOM, MIN_ZOOM};

/// A point in either screen or world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Camera state for pan/zoom over the grid.
///
/// `pan_x` / `pan_y` are in CSS pixels and place world origin on screen.
/// `zoom` is a scale factor (1.0 = one CSS pixel per cell), always within
/// `[MIN_ZOOM, MAX_ZOOM]` once it has passed through [`Camera::zoom_at`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub pan_x: f64,
    pub pan_y: f64,
    pub zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self { pan_x: 0.0, pan_y: 0.0, zoom: 1.0 }
    }
}

impl Camera {
    /// Camera that shows world point `focus` at the centre of a
    /// `viewport_w` × `viewport_h` viewport.
    #[must_use]
    pub fn centered_on(focus: Point, zoom: f64, viewport_w: f64, viewport_h: f64) -> Self {
        Self {
            pan_x: viewport_w * 0.5 - focus.x * zoom,
            pan_y: viewport_h * 0.5 - focus.y * zoom,
            zoom,
        }
    }

    /// Convert a screen-space point (CSS pixels) to world coordinates.
    #[must_use]
    pub fn screen_to_world(&self, screen: Point) -> Point {
        Point {
            x: (screen.x - self.pan_x) / self.zoom,
            y: (screen.y - self.pan_y) / self.zoom,
        }
    }

    /// Convert a world-space point to screen coordinates (CSS pixels).
    #[must_use]
    pub fn world_to_screen(&self, world: Point) -> Point {
        Point {
            x: world.x * self.zoom + self.pan_x,
            y: world.y * self.zoom + self.pan_y,
        }
    }

    /// Convert a screen-space distance (pixels) to world-space distance.
    #[must_use]
    pub fn screen_dist_to_world(&self, screen_dist: f64) -> f64 {
        screen_dist / self.zoom
    }

    /// Multiply the zoom by `factor` while keeping the world point under
    /// `anchor` at the same screen position.
    ///
    /// The new zoom is clamped to `[MIN_ZOOM, MAX_ZOOM]`. Returns `false`
    /// (and leaves the camera untouched) when the clamped zoom is unchanged.
    pub fn zoom_at(&mut self, anchor: Point, factor: f64) -> bool {
        let new_zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return false;
        }

        let world = self.screen_to_world(anchor);
        self.zoom = new_zoom;
        self.pan_x = anchor.x - world.x * new_zoom;
        self.pan_y = anchor.y - world.y * new_zoom;
        true
    }

    /// Zoom as a whole percentage, for the zoom indicator.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn zoom_percent(&self) -> i64 {
        (self.zoom * 100.0).round() as i64
    }
}
