//! Grid engine for the shared pixel board.
//!
//! Pure state and geometry with no I/O: the host feeds in network events,
//! pointer events and the current time, and executes the [`engine::Action`]s
//! and draw output it gets back. Remote persistence and the live event feed
//! live in the host crate.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | [`engine::EngineCore`]: placement, gestures, redraw tracking |
//! | [`grid`] | Cells, validated coordinates and the replica store |
//! | [`camera`] | Pan/zoom camera and coordinate conversions |
//! | [`focus`] | Densest-bucket selection for the initial view |
//! | [`cooldown`] | Per-user placement cooldown |
//! | [`input`] | Pointer event types and the gesture state machine |
//! | [`hit`] | Screen point to cell mapping |
//! | [`render`] | Draw commands and overlay geometry |
//! | [`consts`] | Grid size, zoom limits, palette, timings |

pub mod camera;
pub mod consts;
pub mod cooldown;
pub mod engine;
pub mod focus;
pub mod grid;
pub mod hit;
pub mod input;
pub mod render;
