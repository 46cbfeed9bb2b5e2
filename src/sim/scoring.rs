//! Score, coins and combo chain

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::events::{GameEvent, PickupKind};
use super::pool::Burst;
use super::state::GameState;
use crate::tuning::Tuning;

/// Consecutive pickups inside the combo window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Combo {
    pub count: u32,
    pub multiplier: f32,
    /// Seconds until the chain breaks
    pub remaining: f32,
    /// Longest chain this run
    pub best: u32,
}

impl Default for Combo {
    fn default() -> Self {
        Self {
            count: 0,
            multiplier: 1.0,
            remaining: 0.0,
            best: 0,
        }
    }
}

impl Combo {
    /// 1 + 0.2 per full step of five pickups, capped
    pub fn multiplier_for(count: u32, tuning: &Tuning) -> f32 {
        let steps = (count / tuning.combo_step.max(1)) as f32;
        (1.0 + steps * tuning.combo_step_bonus).min(tuning.combo_max_multiplier)
    }

    /// Extend the chain. Returns true when a new step is reached.
    pub fn register(&mut self, tuning: &Tuning) -> bool {
        self.count += 1;
        self.remaining = tuning.combo_window;
        self.best = self.best.max(self.count);
        let before = self.multiplier;
        self.multiplier = Self::multiplier_for(self.count, tuning);
        self.multiplier > before
    }

    /// Count down; the chain resets when the window closes
    pub fn decay(&mut self, dt: f32) -> bool {
        if self.count == 0 {
            return false;
        }
        self.remaining -= dt;
        if self.remaining <= 0.0 {
            let best = self.best;
            *self = Self {
                best,
                ..Self::default()
            };
            return true;
        }
        false
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Scoring {
    /// Fractional score; never decreases during a run
    pub score: f64,
    pub coins_collected: u32,
    pub combo: Combo,
}

impl Scoring {
    /// Whole points shown to the player
    #[inline]
    pub fn score_points(&self) -> u64 {
        self.score.floor() as u64
    }
}

/// Award a coin picked up at `at`. Returns the points granted.
pub fn collect_coin(state: &mut GameState, at: Vec2) -> u64 {
    let tuning = &state.tuning;
    let milestone = state.scoring.combo.register(tuning);
    let score_mult = state.player.powerups.score_multiplier() as f64;
    let points = (tuning.coin_value as f64 * score_mult * state.scoring.combo.multiplier as f64)
        .round()
        .max(0.0);

    state.scoring.score += points;
    state.scoring.coins_collected += 1;

    state.particles.emit(&Burst::coin(at), &mut state.rng);
    let value = points as u64;
    state.emit(GameEvent::PickupCollected {
        kind: PickupKind::Coin,
        value,
    });
    if milestone {
        let count = state.scoring.combo.count;
        log::debug!("Combo x{} ({} pickups)", state.scoring.combo.multiplier, count);
        state.emit(GameEvent::ComboMilestone { count });
    }
    value
}

/// End-of-frame scoring: passive distance points and combo decay
pub fn finalize(state: &mut GameState, dt: f32) {
    let travelled = state.world.scroll_speed * dt;
    let score_mult = state.player.powerups.score_multiplier() as f32;
    let passive = travelled * state.tuning.distance_score_rate * score_mult;
    state.scoring.score += passive.max(0.0) as f64;
    state.scoring.combo.decay(dt);
}
