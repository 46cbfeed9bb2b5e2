//! Data-driven game balance
//!
//! Every gameplay constant lives here so a run can be re-tuned from JSON
//! without touching simulation code. Missing fields fall back to defaults.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest coin group a single spawn may place
pub const MAX_COIN_GROUP: u32 = 32;

/// Errors while loading a tuning override
#[derive(Debug, Error)]
pub enum TuningError {
    /// JSON could not be parsed
    #[error("invalid tuning json: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is outside the range the simulation can handle
    #[error("invalid tuning value for {field}: {value}")]
    OutOfRange { field: &'static str, value: f32 },
}

/// Gameplay balance constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Clock ===
    /// Largest simulated step per frame (seconds)
    pub frame_cap: f32,
    /// Time-scale while slow motion is active
    pub slow_motion_scale: f32,
    /// Real-time length of a slow motion burst (seconds)
    pub slow_motion_duration: f32,

    // === World ===
    pub gravity: f32,
    pub base_speed: f32,
    /// Speed cap as a multiple of `base_speed`
    pub max_speed_multiplier: f32,
    /// Distance over which speed gains +1x
    pub speed_ramp_distance: f32,
    /// Distance at which difficulty reaches 1.0
    pub difficulty_distance: f32,
    pub boost_speed_multiplier: f32,

    // === Player ===
    pub jump_peak_height: f32,
    pub max_jumps: u8,
    pub coyote_time: f32,
    pub jump_buffer_time: f32,
    /// Upward velocity factor applied per step while jump is released
    pub jump_release_damping: f32,
    pub slide_duration: f32,
    pub max_lives: u8,
    pub invulnerability_time: f32,

    // === Spawning ===
    pub obstacle_interval: f32,
    pub obstacle_min_interval: f32,
    pub obstacle_jitter: f32,
    /// Seconds of reaction time the spacing floor guarantees
    pub reaction_time: f32,
    pub double_obstacle_chance: f32,
    pub coin_interval: f32,
    pub coin_jitter: f32,
    pub coin_group_min: u32,
    pub coin_group_max: u32,
    pub powerup_interval: f32,
    pub powerup_jitter: f32,
    pub powerup_chance: f32,

    // === Power-ups ===
    pub shield_duration: f32,
    pub magnet_duration: f32,
    pub boost_duration: f32,
    pub multiplier_duration: f32,
    pub multiplier_max_duration: f32,
    pub multiplier_max: u32,
    pub magnet_radius: f32,
    pub magnet_pull_speed: f32,

    // === Scoring ===
    /// Passive points per distance unit
    pub distance_score_rate: f32,
    pub coin_value: f32,
    pub combo_window: f32,
    /// Pickups per combo multiplier step
    pub combo_step: u32,
    pub combo_step_bonus: f32,
    pub combo_max_multiplier: f32,

    // === Collision ===
    /// Hitbox inset per side as a fraction of its size
    pub hitbox_tolerance: f32,
    pub grid_cell_size: f32,
    pub grid_cell_capacity: usize,

    // === Particles ===
    pub particle_capacity: usize,
    pub particle_gravity: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            frame_cap: 1.0 / 30.0,
            slow_motion_scale: 0.3,
            slow_motion_duration: 0.5,

            gravity: 2500.0,
            base_speed: 400.0,
            max_speed_multiplier: 3.0,
            speed_ramp_distance: 50_000.0,
            difficulty_distance: 100_000.0,
            boost_speed_multiplier: 1.5,

            jump_peak_height: 350.0,
            max_jumps: 2,
            coyote_time: 0.1,
            jump_buffer_time: 0.1,
            jump_release_damping: 0.5,
            slide_duration: 0.8,
            max_lives: 3,
            invulnerability_time: 2.0,

            obstacle_interval: 1.5,
            obstacle_min_interval: 0.8,
            obstacle_jitter: 0.5,
            reaction_time: 0.8,
            double_obstacle_chance: 0.2,
            coin_interval: 2.0,
            coin_jitter: 1.0,
            coin_group_min: 3,
            coin_group_max: 6,
            powerup_interval: 8.0,
            powerup_jitter: 3.0,
            powerup_chance: 0.7,

            shield_duration: 8.0,
            magnet_duration: 10.0,
            boost_duration: 5.0,
            multiplier_duration: 15.0,
            multiplier_max_duration: 30.0,
            multiplier_max: 5,
            magnet_radius: 200.0,
            magnet_pull_speed: 600.0,

            distance_score_rate: 0.02,
            coin_value: 50.0,
            combo_window: 3.0,
            combo_step: 5,
            combo_step_bonus: 0.2,
            combo_max_multiplier: 3.0,

            hitbox_tolerance: 0.1,
            grid_cell_size: 64.0,
            grid_cell_capacity: 32,

            particle_capacity: 100,
            particle_gravity: 500.0,
        }
    }
}

impl Tuning {
    /// Parse a (possibly partial) JSON override
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Parse an override, falling back to defaults on any error
    pub fn from_json_or_default(json: &str) -> Self {
        match Self::from_json(json) {
            Ok(tuning) => tuning,
            Err(e) => {
                log::warn!("Ignoring tuning override: {}", e);
                Self::default()
            }
        }
    }

    /// Reject values that would break simulation invariants
    pub fn validate(&self) -> Result<(), TuningError> {
        let positive = [
            ("frame_cap", self.frame_cap),
            ("slow_motion_scale", self.slow_motion_scale),
            ("gravity", self.gravity),
            ("base_speed", self.base_speed),
            ("jump_peak_height", self.jump_peak_height),
            ("obstacle_min_interval", self.obstacle_min_interval),
            ("coin_interval", self.coin_interval),
            ("powerup_interval", self.powerup_interval),
            ("combo_window", self.combo_window),
            ("grid_cell_size", self.grid_cell_size),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(TuningError::OutOfRange { field, value });
            }
        }
        if self.slow_motion_scale > 1.0 {
            return Err(TuningError::OutOfRange {
                field: "slow_motion_scale",
                value: self.slow_motion_scale,
            });
        }
        if self.max_speed_multiplier < 1.0 {
            return Err(TuningError::OutOfRange {
                field: "max_speed_multiplier",
                value: self.max_speed_multiplier,
            });
        }
        if !(0.0..0.5).contains(&self.hitbox_tolerance) {
            return Err(TuningError::OutOfRange {
                field: "hitbox_tolerance",
                value: self.hitbox_tolerance,
            });
        }
        if self.coin_group_min == 0 || self.coin_group_min > self.coin_group_max {
            return Err(TuningError::OutOfRange {
                field: "coin_group_min",
                value: self.coin_group_min as f32,
            });
        }
        if self.coin_group_max > MAX_COIN_GROUP {
            return Err(TuningError::OutOfRange {
                field: "coin_group_max",
                value: self.coin_group_max as f32,
            });
        }
        if !(0.0..=1.0).contains(&self.jump_release_damping) {
            return Err(TuningError::OutOfRange {
                field: "jump_release_damping",
                value: self.jump_release_damping,
            });
        }
        if !(self.reaction_time.is_finite() && self.reaction_time >= 0.0) {
            return Err(TuningError::OutOfRange {
                field: "reaction_time",
                value: self.reaction_time,
            });
        }
        if self.combo_step == 0 {
            return Err(TuningError::OutOfRange {
                field: "combo_step",
                value: 0.0,
            });
        }
        if self.grid_cell_capacity == 0 {
            return Err(TuningError::OutOfRange {
                field: "grid_cell_capacity",
                value: 0.0,
            });
        }
        Ok(())
    }

    /// Upward launch velocity reaching exactly `jump_peak_height`
    #[inline]
    pub fn jump_velocity(&self) -> f32 {
        -(2.0 * self.gravity * self.jump_peak_height).sqrt()
    }

    /// Top speed reachable without boost
    #[inline]
    pub fn max_speed(&self) -> f32 {
        self.base_speed * self.max_speed_multiplier
    }
}
