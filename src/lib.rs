//! Parkour Rush - An endless side-scrolling runner
//!
//! Core modules:
//! - `sim`: Simulation core (clock, physics, spawning, collisions, scoring)
//! - `renderer`: Canvas 2D presentation (wasm only)
//! - `platform`: Browser/native platform abstraction
//! - `persistence`: Key/value storage for records and settings
//! - `tuning`: Data-driven game balance

pub mod persistence;
pub mod platform;
pub mod records;
#[cfg(target_arch = "wasm32")]
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use records::Records;
pub use settings::{QualityPreset, Settings};
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Default logical viewport (CSS pixels)
    pub const DEFAULT_VIEWPORT_WIDTH: f32 = 800.0;
    pub const DEFAULT_VIEWPORT_HEIGHT: f32 = 600.0;

    /// Player body (standing), fixed horizontal lane
    pub const PLAYER_X: f32 = 120.0;
    pub const PLAYER_WIDTH: f32 = 50.0;
    pub const PLAYER_HEIGHT: f32 = 70.0;

    /// Height of the ground strip at the bottom of the viewport
    pub const GROUND_HEIGHT: f32 = 100.0;

    /// Distance units per displayed metre
    pub const UNITS_PER_METRE: f32 = 100.0;

    /// Fallback frame time when the host has no previous timestamp
    pub const NOMINAL_FRAME_DT: f32 = 1.0 / 60.0;
}

/// Axis-aligned rectangle in screen space (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    /// Shrink by `fraction` of the size on every side
    pub fn inset(&self, fraction: f32) -> Self {
        let dx = self.w * fraction;
        let dy = self.h * fraction;
        Self {
            x: self.x + dx,
            y: self.y + dy,
            w: (self.w - 2.0 * dx).max(0.0),
            h: (self.h - 2.0 * dy).max(0.0),
        }
    }

    /// Closest point inside the rectangle to `p`
    #[inline]
    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        Vec2::new(p.x.clamp(self.x, self.right()), p.y.clamp(self.y, self.bottom()))
    }
}

/// Lerp helper used by difficulty ramps
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
