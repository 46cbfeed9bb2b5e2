//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must stay pure:
//! - Seeded RNG only
//! - Stable iteration order (entity spawn order)
//! - No rendering or platform dependencies
//! - Outward communication through drained `GameEvent`s only

pub mod clock;
pub mod collision;
pub mod events;
pub mod grid;
pub mod physics;
pub mod pool;
pub mod progress;
pub mod scoring;
pub mod snapshot;
pub mod spawner;
pub mod state;
pub mod tick;

pub use clock::SimClock;
pub use collision::{CollisionSummary, aabb_overlap, circle_rect_overlap};
pub use events::{AchievementId, GameEvent, PickupKind};
pub use grid::SpatialGrid;
pub use physics::{Player, PowerUps, TimedEffect, World};
pub use pool::{Burst, Particle, ParticlePool, PoolStats};
pub use scoring::{Combo, Scoring};
pub use snapshot::Snapshot;
pub use spawner::Spawner;
pub use state::{
    COIN_RADIUS, Entity, EntityKind, GamePhase, GameState, ObstacleShape, POWERUP_RADIUS,
    PowerUpKind, Viewport,
};
pub use tick::{TickInput, tick};
