//! Grid model: cells, their coordinates, and the in-memory replica store.
//!
//! This module defines what is on the canvas (`Cell`), a validated
//! coordinate key (`CellCoord`), and the store that owns every known cell
//! (`GridStore`).
//!
//! Data flows into this layer from the network (bulk snapshot and live insert
//! events) and from the placement path (optimistic writes). Every write is an
//! upsert keyed by coordinate, so replaying the same event is harmless. The
//! renderer reads from `GridStore` via `iter` and `last_changed`.

#[cfg(test)]
#[path = "grid_test.rs"]
mod grid_test;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::consts::{BUCKET_SIZE, GRID_SIZE};

/// A validated grid coordinate, `0 <= x, y < GRID_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellCoord {
    x: i32,
    y: i32,
}

impl CellCoord {
    /// Build a coordinate, or `None` when it falls outside the grid.
    #[must_use]
    pub fn new(x: i32, y: i32) -> Option<Self> {
        if (0..GRID_SIZE).contains(&x) && (0..GRID_SIZE).contains(&y) {
            Some(Self { x, y })
        } else {
            None
        }
    }

    #[must_use]
    pub fn x(self) -> i32 {
        self.x
    }

    #[must_use]
    pub fn y(self) -> i32 {
        self.y
    }

    /// Column and row of the focal bucket containing this coordinate.
    #[must_use]
    pub fn bucket(self) -> (i32, i32) {
        (self.x / BUCKET_SIZE, self.y / BUCKET_SIZE)
    }
}

/// One claimed grid position, as stored locally and on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
    /// CSS color string. Not checked against the palette.
    pub color: String,
    /// Display name of the user who placed the cell.
    #[serde(rename = "user_name")]
    pub author_name: String,
}

impl Cell {
    #[must_use]
    pub fn new(x: i32, y: i32, color: impl Into<String>, author_name: impl Into<String>) -> Self {
        Self { x, y, color: color.into(), author_name: author_name.into() }
    }

    /// The cell's coordinate, or `None` if it lies outside the grid.
    #[must_use]
    pub fn coord(&self) -> Option<CellCoord> {
        CellCoord::new(self.x, self.y)
    }
}

/// What an upsert did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// First cell seen at this coordinate.
    Inserted,
    /// Overwrote a different cell at this coordinate.
    Replaced,
    /// The same cell was already stored here.
    Unchanged,
    /// Coordinate outside the grid; nothing stored.
    OutOfBounds,
}

impl UpsertOutcome {
    /// Whether the stored state differs after the upsert.
    #[must_use]
    pub fn changed(self) -> bool {
        matches!(self, Self::Inserted | Self::Replaced)
    }
}

/// In-memory replica of the shared grid.
///
/// Keys are unique coordinates. `order` remembers the order in which each
/// coordinate was first seen so iteration is deterministic.
#[derive(Debug, Default)]
pub struct GridStore {
    cells: HashMap<CellCoord, Cell>,
    order: Vec<CellCoord>,
    last_changed: Option<Cell>,
    loaded: bool,
}

impl GridStore {
    /// Create an empty, not-yet-loaded store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all cells with a full snapshot and mark the store loaded.
    ///
    /// Out-of-range cells are skipped. Returns the number of coordinates
    /// stored afterwards.
    pub fn load_bulk(&mut self, cells: Vec<Cell>) -> usize {
        self.cells.clear();
        self.order.clear();
        self.last_changed = None;
        for cell in cells {
            self.write(cell);
        }
        self.loaded = true;
        self.cells.len()
    }

    /// Upsert a full snapshot over the current state without clearing it.
    ///
    /// Returns how many coordinates changed.
    pub fn merge_bulk(&mut self, cells: Vec<Cell>) -> usize {
        let mut changed = 0;
        for cell in cells {
            if self.write(cell).changed() {
                changed += 1;
            }
        }
        self.loaded = true;
        changed
    }

    /// Insert or overwrite the cell at its coordinate and record it as the
    /// last changed cell.
    pub fn apply_upsert(&mut self, cell: Cell) -> UpsertOutcome {
        let outcome = self.write(cell.clone());
        if outcome != UpsertOutcome::OutOfBounds {
            self.last_changed = Some(cell);
        }
        outcome
    }

    fn write(&mut self, cell: Cell) -> UpsertOutcome {
        let Some(coord) = cell.coord() else {
            return UpsertOutcome::OutOfBounds;
        };
        match self.cells.insert(coord, cell) {
            None => {
                self.order.push(coord);
                UpsertOutcome::Inserted
            }
            Some(previous) if Some(&previous) == self.cells.get(&coord) => UpsertOutcome::Unchanged,
            Some(_) => UpsertOutcome::Replaced,
        }
    }

    /// Point query by raw coordinates.
    #[must_use]
    pub fn lookup(&self, x: i32, y: i32) -> Option<&Cell> {
        CellCoord::new(x, y).and_then(|coord| self.cells.get(&coord))
    }

    /// Point query by validated coordinate.
    #[must_use]
    pub fn get(&self, coord: CellCoord) -> Option<&Cell> {
        self.cells.get(&coord)
    }

    /// The most recent cell passed to [`GridStore::apply_upsert`], if any
    /// since the last bulk load.
    #[must_use]
    pub fn last_changed(&self) -> Option<&Cell> {
        self.last_changed.as_ref()
    }

    /// All cells in the order their coordinates were first seen.
    pub fn iter(&self) -> impl Iterator<Item = &Cell> {
        self.order.iter().filter_map(|coord| self.cells.get(coord))
    }

    /// Whether a bulk snapshot has been applied.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Number of claimed coordinates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns `true` if no coordinate has been claimed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
