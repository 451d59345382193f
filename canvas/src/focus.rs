//! Initial viewport selection.
//!
//! The grid is split into `BUCKETS_PER_SIDE`² square buckets. The first view
//! of a populated grid zooms into the bucket holding the most cells; an empty
//! grid is shown whole, centred on the middle of the world.

#[cfg(test)]
#[path = "focus_test.rs"]
mod focus_test;

use crate::camera::{Camera, Point};
use crate::consts::{BUCKET_SIZE, BUCKETS_PER_SIDE, FOCUS_ZOOM, GRID_SIZE};
use crate::grid::GridStore;

/// Bucket reported when no cell has been placed yet.
const DEFAULT_BUCKET: (i32, i32) = (5, 5);

/// The chosen initial view, before it is fitted to a viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Focus {
    pub bucket: (i32, i32),
    /// World-space point to centre on: the middle of `bucket`, or the middle
    /// of the grid when nothing has been placed.
    pub world: Point,
    pub zoom: f64,
}

/// Bucket with the most claimed cells, or `None` for an empty grid.
///
/// Cells are counted in first-arrival order and a bucket only takes the lead
/// by strictly exceeding the running maximum, so among equally dense buckets
/// the one that reached that count first wins.
#[must_use]
pub fn densest_bucket(grid: &GridStore) -> Option<(i32, i32)> {
    let mut counts = [[0u32; BUCKETS_PER_SIDE]; BUCKETS_PER_SIDE];
    let mut best: Option<((i32, i32), u32)> = None;

    for coord in grid.iter().filter_map(crate::grid::Cell::coord) {
        let (bx, by) = coord.bucket();
        let (Ok(col), Ok(row)) = (usize::try_from(bx), usize::try_from(by)) else {
            continue;
        };
        counts[row][col] += 1;
        let count = counts[row][col];
        if best.is_none_or(|(_, max)| count > max) {
            best = Some(((bx, by), count));
        }
    }

    best.map(|(bucket, _)| bucket)
}

/// Pick the initial focus for the current grid contents.
#[must_use]
pub fn initial_focus(grid: &GridStore) -> Focus {
    match densest_bucket(grid) {
        Some(bucket) => Focus { bucket, world: bucket_center(bucket), zoom: FOCUS_ZOOM },
        None => {
            let mid = f64::from(GRID_SIZE) * 0.5;
            Focus { bucket: DEFAULT_BUCKET, world: Point::new(mid, mid), zoom: 1.0 }
        }
    }
}

/// Camera that shows [`initial_focus`] at the centre of the viewport.
#[must_use]
pub fn initial_camera(grid: &GridStore, viewport_w: f64, viewport_h: f64) -> Camera {
    let focus = initial_focus(grid);
    Camera::centered_on(focus.world, focus.zoom, viewport_w, viewport_h)
}

fn bucket_center((bx, by): (i32, i32)) -> Point {
    let half = f64::from(BUCKET_SIZE) * 0.5;
    Point::new(f64::from(bx * BUCKET_SIZE) + half, f64::from(by * BUCKET_SIZE) + half)
}
