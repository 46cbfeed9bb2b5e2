//! Game state and core simulation types
//!
//! `GameState` is the single context every simulation stage receives.
//! Stages only touch its fields, never each other.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::clock::SimClock;
use super::events::GameEvent;
use super::grid::SpatialGrid;
use super::physics::{Player, World};
use super::pool::{Burst, ParticlePool};
use super::progress::{self, ProgressTracker};
use super::scoring::Scoring;
use super::spawner::Spawner;
use crate::Rect;
use crate::consts::*;
use crate::tuning::Tuning;

/// Current phase of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Assets and records still loading
    Loading,
    /// Title screen, waiting for start
    Menu,
    /// Active run
    Playing,
    /// Run frozen by the player or by losing focus
    Paused,
    /// Run ended, waiting to return to the menu
    GameOver,
}

/// Obstacle variants (fixed footprints)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObstacleShape {
    Box,
    Crate,
    Spike,
    Barrier,
}

impl ObstacleShape {
    pub const ALL: [ObstacleShape; 4] = [
        ObstacleShape::Box,
        ObstacleShape::Crate,
        ObstacleShape::Spike,
        ObstacleShape::Barrier,
    ];

    /// Width and height
    pub fn size(&self) -> Vec2 {
        match self {
            ObstacleShape::Box => Vec2::new(40.0, 60.0),
            ObstacleShape::Crate => Vec2::new(60.0, 80.0),
            ObstacleShape::Spike => Vec2::new(30.0, 120.0),
            ObstacleShape::Barrier => Vec2::new(80.0, 40.0),
        }
    }

    /// Fill colour (0xRRGGBB)
    pub fn color(&self) -> u32 {
        match self {
            ObstacleShape::Box => 0x8b4513,
            ObstacleShape::Crate => 0xa0522d,
            ObstacleShape::Spike => 0x696969,
            ObstacleShape::Barrier => 0xdc143c,
        }
    }
}

/// Collectible power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerUpKind {
    Shield,
    Magnet,
    Boost,
    Multiplier,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 4] = [
        PowerUpKind::Shield,
        PowerUpKind::Magnet,
        PowerUpKind::Boost,
        PowerUpKind::Multiplier,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PowerUpKind::Shield => "shield",
            PowerUpKind::Magnet => "magnet",
            PowerUpKind::Boost => "boost",
            PowerUpKind::Multiplier => "multiplier",
        }
    }

    pub fn color(&self) -> u32 {
        match self {
            PowerUpKind::Shield => 0x44aaff,
            PowerUpKind::Magnet => 0xff44aa,
            PowerUpKind::Boost => 0x44ff88,
            PowerUpKind::Multiplier => 0xffaa00,
        }
    }
}

pub const COIN_RADIUS: f32 = 15.0;
pub const POWERUP_RADIUS: f32 = 20.0;

/// Kind-specific payload of a world entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EntityKind {
    /// `pos` is the top-left corner
    Obstacle { shape: ObstacleShape, size: Vec2 },
    /// `pos` is the centre
    Coin { radius: f32 },
    /// `pos` is the centre
    PowerUp { kind: PowerUpKind, radius: f32 },
}

/// Anything that scrolls with the world
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: u32,
    pub pos: Vec2,
    pub kind: EntityKind,
}

impl Entity {
    pub fn obstacle(id: u32, shape: ObstacleShape, pos: Vec2) -> Self {
        Self {
            id,
            pos,
            kind: EntityKind::Obstacle {
                shape,
                size: shape.size(),
            },
        }
    }

    pub fn coin(id: u32, center: Vec2) -> Self {
        Self {
            id,
            pos: center,
            kind: EntityKind::Coin {
                radius: COIN_RADIUS,
            },
        }
    }

    pub fn powerup(id: u32, kind: PowerUpKind, center: Vec2) -> Self {
        Self {
            id,
            pos: center,
            kind: EntityKind::PowerUp {
                kind,
                radius: POWERUP_RADIUS,
            },
        }
    }

    /// Axis-aligned bounds (circles use their bounding square)
    pub fn bounds(&self) -> Rect {
        match self.kind {
            EntityKind::Obstacle { size, .. } => Rect::new(self.pos.x, self.pos.y, size.x, size.y),
            EntityKind::Coin { radius } | EntityKind::PowerUp { radius, .. } => Rect::new(
                self.pos.x - radius,
                self.pos.y - radius,
                radius * 2.0,
                radius * 2.0,
            ),
        }
    }

    #[inline]
    pub fn is_obstacle(&self) -> bool {
        matches!(self.kind, EntityKind::Obstacle { .. })
    }

    /// Entirely past the left edge of the screen
    #[inline]
    pub fn is_offscreen(&self) -> bool {
        self.bounds().right() < 0.0
    }
}

/// Logical drawing surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    /// Device pixels per logical pixel
    pub pixel_ratio: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: DEFAULT_VIEWPORT_WIDTH,
            height: DEFAULT_VIEWPORT_HEIGHT,
            pixel_ratio: 1.0,
        }
    }
}

/// Complete simulation context
#[derive(Debug, Clone)]
pub struct GameState {
    pub seed: u64,
    pub tuning: Tuning,
    pub phase: GamePhase,
    pub viewport: Viewport,
    pub clock: SimClock,
    pub world: World,
    pub player: Player,
    /// Obstacles and pickups in spawn order
    pub entities: Vec<Entity>,
    pub spawner: Spawner,
    pub grid: SpatialGrid,
    pub scoring: Scoring,
    pub particles: ParticlePool,
    pub progress: ProgressTracker,
    pub rng: Pcg32,
    events: Vec<GameEvent>,
    next_id: u32,
    /// Scratch buffers reused by the collision stage
    pub(crate) query_buf: Vec<usize>,
    pub(crate) consumed_buf: Vec<usize>,
}

impl GameState {
    /// New game with default tuning, starting in `Loading`
    pub fn new(seed: u64) -> Self {
        Self::with_tuning(seed, Tuning::default())
    }

    pub fn with_tuning(seed: u64, tuning: Tuning) -> Self {
        let viewport = Viewport::default();
        let world = World::new(&tuning, viewport.height);
        let player = Player::new(&tuning, world.player_floor());
        Self {
            seed,
            phase: GamePhase::Loading,
            viewport,
            clock: SimClock::new(&tuning),
            player,
            world,
            entities: Vec::new(),
            spawner: Spawner::new(&tuning),
            grid: SpatialGrid::new(tuning.grid_cell_size, tuning.grid_cell_capacity),
            scoring: Scoring::default(),
            particles: ParticlePool::new(tuning.particle_capacity),
            progress: ProgressTracker::default(),
            rng: Pcg32::seed_from_u64(seed),
            events: Vec::new(),
            next_id: 0,
            query_buf: Vec::new(),
            consumed_buf: Vec::new(),
            tuning,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    #[inline]
    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Events emitted since the last drain
    #[inline]
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> std::vec::Drain<'_, GameEvent> {
        self.events.drain(..)
    }

    /// Move to `to`, emitting a phase change event. No-op if already there.
    pub fn set_phase(&mut self, to: GamePhase) -> bool {
        let from = self.phase;
        if from == to {
            return false;
        }
        log::debug!("Phase {:?} -> {:?}", from, to);
        self.phase = to;
        self.emit(GameEvent::PhaseChanged { from, to });
        true
    }

    /// Loading finished: show the menu
    pub fn finish_loading(&mut self) {
        if self.phase == GamePhase::Loading {
            self.set_phase(GamePhase::Menu);
        }
    }

    /// Reset run state and start playing
    pub fn start_run(&mut self) {
        if self.phase == GamePhase::Loading {
            return;
        }
        self.clock = SimClock::new(&self.tuning);
        self.world = World::new(&self.tuning, self.viewport.height);
        self.player = Player::new(&self.tuning, self.world.player_floor());
        self.entities.clear();
        self.spawner = Spawner::new(&self.tuning);
        self.grid.clear();
        self.scoring = Scoring::default();
        self.particles.clear();
        self.progress = ProgressTracker::default();
        self.next_id = 0;

        log::info!("Run started (seed {})", self.seed);
        self.emit(GameEvent::RunStarted);
        self.set_phase(GamePhase::Playing);
    }

    /// Playing <-> Paused
    pub fn toggle_pause(&mut self) {
        match self.phase {
            GamePhase::Playing => {
                self.set_phase(GamePhase::Paused);
            }
            GamePhase::Paused => {
                self.set_phase(GamePhase::Playing);
            }
            _ => {}
        }
    }

    /// Pause if running (focus lost); never resumes
    pub fn pause(&mut self) {
        if self.phase == GamePhase::Playing {
            self.set_phase(GamePhase::Paused);
        }
    }

    /// Leave a finished or paused run for the title screen
    pub fn to_menu(&mut self) {
        if matches!(self.phase, GamePhase::GameOver | GamePhase::Paused) {
            self.set_phase(GamePhase::Menu);
        }
    }

    /// Transition to GameOver exactly once
    pub fn end_run(&mut self) {
        if self.phase != GamePhase::Playing {
            return;
        }
        progress::report(self, true);

        let burst = Burst::game_over(self.player.center());
        self.particles.emit(&burst, &mut self.rng);

        let final_score = self.scoring.score_points();
        let final_distance = self.distance_metres();
        let final_coins = self.scoring.coins_collected;
        log::info!(
            "Run ended: score {}, {} m, {} coins",
            final_score,
            final_distance,
            final_coins
        );
        self.set_phase(GamePhase::GameOver);
        self.emit(GameEvent::RunEnded {
            final_score,
            final_distance,
            final_coins,
        });
    }

    /// Distance in displayed metres
    #[inline]
    pub fn distance_metres(&self) -> u32 {
        (self.world.distance / UNITS_PER_METRE).floor() as u32
    }

    /// Adopt a new viewport. Ground-anchored things follow the ground line.
    pub fn resize(&mut self, width: f32, height: f32, pixel_ratio: f32) {
        let width = if width.is_finite() { width.max(1.0) } else { DEFAULT_VIEWPORT_WIDTH };
        let height = if height.is_finite() {
            height.max(GROUND_HEIGHT + PLAYER_HEIGHT)
        } else {
            DEFAULT_VIEWPORT_HEIGHT
        };
        let pixel_ratio = if pixel_ratio.is_finite() && pixel_ratio > 0.0 {
            pixel_ratio
        } else {
            1.0
        };

        let old_ground = self.world.ground_y;
        self.viewport = Viewport {
            width,
            height,
            pixel_ratio,
        };
        self.world.ground_y = height - GROUND_HEIGHT;
        let dy = self.world.ground_y - old_ground;

        for entity in &mut self.entities {
            entity.pos.y += dy;
        }
        self.player.pos.y += dy;
        if self.player.grounded {
            self.player.pos.y = self.world.player_floor();
        }
        log::debug!("Viewport {}x{} @{}x", width, height, pixel_ratio);
    }

    /// Resize the particle pool (quality setting changed)
    pub fn set_particle_capacity(&mut self, capacity: usize) {
        self.particles.set_capacity(capacity);
    }
}
