//! Shared numeric constants for the canvas crate.

// ── Grid ────────────────────────────────────────────────────────

/// Width and height of the shared grid, in cells.
pub const GRID_SIZE: i32 = 500;

/// Side length of one focal bucket, in cells.
pub const BUCKET_SIZE: i32 = 50;

/// Number of focal buckets along each axis.
pub const BUCKETS_PER_SIDE: usize = 10;

// ── Camera ──────────────────────────────────────────────────────

/// Smallest allowed zoom factor.
pub const MIN_ZOOM: f64 = 0.5;

/// Largest allowed zoom factor.
pub const MAX_ZOOM: f64 = 25.0;

/// Multiplicative zoom change per wheel tick.
pub const ZOOM_STEP: f64 = 1.2;

/// Zoom used for the initial view of a populated grid.
pub const FOCUS_ZOOM: f64 = 4.0;

// ── Placement ───────────────────────────────────────────────────

/// Minimum interval between two placements by the same user.
pub const COOLDOWN_MS: i64 = 10_000;

/// Author name used when the identity carries no display name.
pub const ANONYMOUS_NAME: &str = "Anonymous";

/// Color selected before the user picks one.
pub const DEFAULT_COLOR: &str = "#E50000";

/// The fixed palette offered by the color picker.
pub const PALETTE: [&str; 16] = [
    "#FFFFFF", "#E4E4E4", "#888888", "#222222", "#FFA7D1", "#E50000", "#E59500", "#A06A42", "#E5D900", "#94E044",
    "#02BE01", "#00D3DD", "#0083C7", "#0000EA", "#CF6EE4", "#820080",
];

// ── Overlay ─────────────────────────────────────────────────────

/// Color painted under every unclaimed cell.
pub const BACKGROUND_COLOR: &str = "#FFFFFF";

/// Distance in screen pixels between a hovered cell and its tooltip.
pub const TOOLTIP_OFFSET_PX: f64 = 15.0;

/// Space reserved for the tooltip at the container's right edge.
pub const TOOLTIP_WIDTH_PX: f64 = 200.0;

/// Space reserved for the tooltip at the container's bottom edge.
pub const TOOLTIP_HEIGHT_PX: f64 = 60.0;
