//! Canvas 2D rendering module
//!
//! Reads simulation snapshots only; never mutates game state.

pub mod canvas;

pub use canvas::CanvasRenderer;
