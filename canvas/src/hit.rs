#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::camera::{Camera, Point};
use crate::consts::GRID_SIZE;
use crate::grid::CellCoord;

/// The grid cell under `screen_pt`, or `None` when the point lies outside the grid.
///
/// World coordinates are floored, so the whole square `[x, x+1) × [y, y+1)`
/// maps to cell `(x, y)`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn cell_at(camera: &Camera, screen_pt: Point) -> Option<CellCoord> {
    let world = camera.screen_to_world(screen_pt);
    let (fx, fy) = (world.x.floor(), world.y.floor());
    let limit = f64::from(GRID_SIZE);
    if !(0.0..limit).contains(&fx) || !(0.0..limit).contains(&fy) {
        return None;
    }
    CellCoord::new(fx as i32, fy as i32)
}

/// Screen-space top-left corner of a cell and its side length in pixels.
#[must_use]
pub fn cell_screen_rect(camera: &Camera, coord: CellCoord) -> (Point, f64) {
    let top_left = camera.world_to_screen(Point::new(f64::from(coord.x()), f64::from(coord.y())));
    (top_left, camera.zoom)
}
