#![allow(clippy::float_cmp)]

use super::*;

fn coord(x: i32, y: i32) -> CellCoord {
    CellCoord::new(x, y).unwrap()
}

fn grid_with(cells: Vec<Cell>) -> GridStore {
    let mut grid = GridStore::new();
    grid.load_bulk(cells);
    grid
}

// =============================================================
// Redraw
// =============================================================

#[test]
fn mark_cell_accumulates_unique_coords() {
    let mut redraw = Redraw::default();
    assert!(redraw.is_nothing());
    redraw.mark_cell(coord(1, 1));
    redraw.mark_cell(coord(2, 2));
    redraw.mark_cell(coord(1, 1));
    assert_eq!(redraw, Redraw::Cells(vec![coord(1, 1), coord(2, 2)]));
}

#[test]
fn full_absorbs_cell_marks() {
    let mut redraw = Redraw::Cells(vec![coord(1, 1)]);
    redraw.mark_full();
    redraw.mark_cell(coord(3, 3));
    assert_eq!(redraw, Redraw::Full);
}

// =============================================================
// draw_commands
// =============================================================

#[test]
fn nothing_draws_nothing() {
    let grid = grid_with(vec![Cell::new(1, 1, "#000000", "a")]);
    assert!(draw_commands(&grid, &Redraw::Nothing).is_empty());
}

#[test]
fn full_paints_background_then_every_cell() {
    let grid = grid_with(vec![Cell::new(3, 4, "#000000", "a"), Cell::new(9, 9, "#E50000", "b")]);
    let commands = draw_commands(&grid, &Redraw::Full);
    assert_eq!(commands.len(), 3);
    assert_eq!(
        commands[0],
        FillRect { x: 0.0, y: 0.0, width: 500.0, height: 500.0, color: "#FFFFFF".into() }
    );
    assert_eq!(
        commands[1],
        FillRect { x: 3.0, y: 4.0, width: 1.0, height: 1.0, color: "#000000".into() }
    );
    assert_eq!(commands[2].color, "#E50000");
}

#[test]
fn full_on_empty_grid_is_background_only() {
    let commands = draw_commands(&grid_with(Vec::new()), &Redraw::Full);
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0].color, "#FFFFFF");
}

#[test]
fn incremental_paints_only_listed_cells() {
    let grid = grid_with(vec![Cell::new(3, 4, "#000000", "a"), Cell::new(9, 9, "#E50000", "b")]);
    let commands = draw_commands(&grid, &Redraw::Cells(vec![coord(9, 9), coord(40, 40)]));
    assert_eq!(commands.len(), 1);
    assert_eq!((commands[0].x, commands[0].y), (9.0, 9.0));
}

// =============================================================
// Overlays
// =============================================================

#[test]
fn css_transform_formats_pan_and_zoom() {
    let camera = Camera { pan_x: 12.5, pan_y: -3.0, zoom: 4.0 };
    assert_eq!(css_transform(&camera), "translate(12.5px, -3px) scale(4)");
}

#[test]
fn hover_outline_widths_scale_inversely_with_zoom() {
    let camera = Camera { pan_x: 0.0, pan_y: 0.0, zoom: 4.0 };
    let outline = hover_outline(&camera, coord(7, 8));
    assert_eq!((outline.x, outline.y), (7.0, 8.0));
    assert_eq!(outline.inner_width, 0.25);
    assert_eq!(outline.outer_width, 0.5);
}

#[test]
fn tooltip_offsets_from_cell() {
    let camera = Camera { pan_x: 10.0, pan_y: 20.0, zoom: 2.0 };
    let anchor = tooltip_anchor(&camera, coord(5, 5), 1000.0, 800.0);
    assert_eq!(anchor, Point::new(35.0, 45.0));
}

#[test]
fn tooltip_clamps_to_container() {
    let camera = Camera::default();
    let anchor = tooltip_anchor(&camera, coord(490, 495), 500.0, 400.0);
    assert_eq!(anchor, Point::new(300.0, 340.0));
}

#[test]
fn tooltip_text_names_author_or_empty() {
    let cell = Cell::new(2, 3, "#000000", "alice");
    assert_eq!(tooltip_text(coord(2, 3), Some(&cell)), ["Pixel (2, 3)".to_owned(), "Placed by: alice".to_owned()]);
    assert_eq!(tooltip_text(coord(2, 3), None)[1], "Empty");
}

#[test]
fn zoom_label_rounds_percent() {
    let camera = Camera { pan_x: 0.0, pan_y: 0.0, zoom: 1.2 };
    assert_eq!(zoom_label(&camera), "Zoom: 120%");
}

#[test]
fn cooldown_label_hidden_at_zero() {
    assert_eq!(cooldown_label(0), None);
    assert_eq!(cooldown_label(7).as_deref(), Some("Cooldown: 7s"));
}
