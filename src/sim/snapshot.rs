//! Read-only view of a frame for renderers and HUDs

use serde::Serialize;

use super::physics::{Player, PowerUps};
use super::pool::ParticlePool;
use super::state::{Entity, GamePhase, GameState, Viewport};

/// Everything the presentation layer needs for one frame
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot<'a> {
    pub phase: GamePhase,
    pub viewport: Viewport,
    pub ground_y: f32,
    pub score: u64,
    pub distance_m: u32,
    pub coins: u32,
    pub lives: u8,
    pub max_lives: u8,
    pub speed: f32,
    pub combo_count: u32,
    pub combo_multiplier: f32,
    pub score_multiplier: u32,
    pub powerups: PowerUps,
    pub slow_motion: bool,
    /// Run time in seconds (drives animation)
    pub game_time: f64,
    pub player: &'a Player,
    pub entities: &'a [Entity],
    #[serde(skip)]
    pub particles: &'a ParticlePool,
}

impl GameState {
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            phase: self.phase,
            viewport: self.viewport,
            ground_y: self.world.ground_y,
            score: self.scoring.score_points(),
            distance_m: self.distance_metres(),
            coins: self.scoring.coins_collected,
            lives: self.player.lives,
            max_lives: self.tuning.max_lives,
            speed: self.world.scroll_speed,
            combo_count: self.scoring.combo.count,
            combo_multiplier: self.scoring.combo.multiplier,
            score_multiplier: self.player.powerups.score_multiplier(),
            powerups: self.player.powerups,
            slow_motion: self.clock.is_slow_motion(),
            game_time: self.clock.game_time,
            player: &self.player,
            entities: &self.entities,
            particles: &self.particles,
        }
    }
}
