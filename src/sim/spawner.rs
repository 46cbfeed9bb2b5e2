//! Procedural spawning, scrolling and retirement of world entities

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::{Entity, EntityKind, GameState, ObstacleShape, PowerUpKind};
use crate::lerp;
use crate::tuning::Tuning;

/// Horizontal offset past the right edge where obstacles appear
pub const OBSTACLE_SPAWN_OFFSET: f32 = 50.0;
/// Pickups appear a little further out
pub const PICKUP_SPAWN_OFFSET: f32 = 100.0;
/// Horizontal spacing between coins in a group
pub const COIN_SPACING: f32 = 40.0;
/// Smallest spacing between the two halves of a double obstacle
pub const MIN_DOUBLE_GAP: f32 = 150.0;

/// Countdown timers for each spawn stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spawner {
    pub obstacle_timer: f32,
    pub coin_timer: f32,
    pub powerup_timer: f32,
    /// Obstacles rejected by the spacing rule
    pub obstacles_dropped: u32,
}

impl Spawner {
    /// Timers start at their base intervals so a run opens with a clear stretch
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            obstacle_timer: tuning.obstacle_interval,
            coin_timer: tuning.coin_interval,
            powerup_timer: tuning.powerup_interval,
            obstacles_dropped: 0,
        }
    }
}

/// Smallest allowed gap between consecutive obstacles at the current speed
#[inline]
pub fn min_obstacle_gap(state: &GameState) -> f32 {
    state.world.scroll_speed * state.tuning.reaction_time
}

/// Scroll entities left, pull coins toward a magnetised player, retire off-screen ones
pub fn advance_entities(state: &mut GameState, dt: f32) {
    let shift = state.world.scroll_speed * dt;
    let magnet = state.player.powerups.magnet.active;
    let target = state.player.center();
    let radius = state.tuning.magnet_radius;
    let pull = state.tuning.magnet_pull_speed * dt;

    for entity in &mut state.entities {
        entity.pos.x -= shift;
        if magnet && matches!(entity.kind, EntityKind::Coin { .. }) {
            let to_player = target - entity.pos;
            let dist = to_player.length();
            if dist > 0.0 && dist < radius {
                entity.pos += to_player / dist * pull.min(dist);
            }
        }
    }
    state.entities.retain(|e| !e.is_offscreen());
}

/// Run the three spawn timers
pub fn update(state: &mut GameState, dt: f32) {
    state.spawner.obstacle_timer -= dt;
    if state.spawner.obstacle_timer <= 0.0 {
        spawn_obstacle(state);
        let difficulty = state.world.difficulty(&state.tuning);
        let tuning = &state.tuning;
        let base = lerp(tuning.obstacle_min_interval, tuning.obstacle_interval, 1.0 - difficulty);
        let jitter = state.rng.random::<f32>() * tuning.obstacle_jitter;
        state.spawner.obstacle_timer = base + jitter;
    }

    state.spawner.coin_timer -= dt;
    if state.spawner.coin_timer <= 0.0 {
        spawn_coin_group(state);
        let jitter = state.rng.random::<f32>() * state.tuning.coin_jitter;
        state.spawner.coin_timer = state.tuning.coin_interval + jitter;
    }

    state.spawner.powerup_timer -= dt;
    if state.spawner.powerup_timer <= 0.0 {
        if state.rng.random_bool(state.tuning.powerup_chance.clamp(0.0, 1.0) as f64) {
            spawn_powerup(state);
        }
        let jitter = state.rng.random::<f32>() * state.tuning.powerup_jitter;
        state.spawner.powerup_timer = state.tuning.powerup_interval + jitter;
    }
}

/// Right edge of the most recently spawned obstacle
fn last_obstacle_right(entities: &[Entity]) -> Option<f32> {
    entities
        .iter()
        .rev()
        .find(|e| e.is_obstacle())
        .map(|e| e.bounds().right())
}

/// Spawn an obstacle just off-screen unless it would crowd the previous one.
/// Returns how many obstacles were placed.
pub fn spawn_obstacle(state: &mut GameState) -> usize {
    let shape = ObstacleShape::ALL[state.rng.random_range(0..ObstacleShape::ALL.len())];
    let size = shape.size();
    let x = state.viewport.width + OBSTACLE_SPAWN_OFFSET;
    let y = state.world.ground_y - size.y;
    let min_gap = min_obstacle_gap(state);

    if let Some(right) = last_obstacle_right(&state.entities) {
        if x - right < min_gap {
            state.spawner.obstacles_dropped += 1;
            log::trace!("Obstacle skipped: gap {:.0} < {:.0}", x - right, min_gap);
            return 0;
        }
    }

    let id = state.next_entity_id();
    state.entities.push(Entity::obstacle(id, shape, Vec2::new(x, y)));

    if state
        .rng
        .random_bool(state.tuning.double_obstacle_chance.clamp(0.0, 1.0) as f64)
    {
        let x2 = x + size.x + (min_gap * 1.5).max(MIN_DOUBLE_GAP);
        let id = state.next_entity_id();
        state.entities.push(Entity::obstacle(id, shape, Vec2::new(x2, y)));
        return 2;
    }
    1
}

/// Spawn a small arc of coins above the ground
pub fn spawn_coin_group(state: &mut GameState) -> usize {
    let tuning = &state.tuning;
    let count = state
        .rng
        .random_range(tuning.coin_group_min..=tuning.coin_group_max.max(tuning.coin_group_min));
    let base_x = state.viewport.width + PICKUP_SPAWN_OFFSET;
    let base_y = state.world.ground_y - 150.0 - state.rng.random::<f32>() * 100.0;

    for i in 0..count {
        let t = if count > 1 {
            i as f32 / (count - 1) as f32
        } else {
            0.5
        };
        let arc = (t * std::f32::consts::PI).sin() * 30.0;
        let jitter = state.rng.random_range(-5.0f32..=5.0);
        let pos = Vec2::new(base_x + i as f32 * COIN_SPACING, base_y - arc + jitter);
        let id = state.next_entity_id();
        state.entities.push(Entity::coin(id, pos));
    }
    count as usize
}

/// Spawn a random power-up
pub fn spawn_powerup(state: &mut GameState) -> PowerUpKind {
    let kind = PowerUpKind::ALL[state.rng.random_range(0..PowerUpKind::ALL.len())];
    let x = state.viewport.width + PICKUP_SPAWN_OFFSET;
    let y = state.world.ground_y - 100.0 - state.rng.random::<f32>() * 100.0;
    let id = state.next_entity_id();
    state.entities.push(Entity::powerup(id, kind, Vec2::new(x, y)));
    log::debug!("Spawned {} power-up", kind.as_str());
    kind
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::physics::World;
    use proptest::prelude::*;

    fn playing(seed: u64) -> GameState {
        let mut state = GameState::new(seed);
        state.finish_loading();
        state.start_run();
        state
    }

    #[test]
    fn test_opening_stretch_is_clear() {
        let mut state = playing(9);
        for _ in 0..60 {
            update(&mut state, 1.0 / 60.0);
        }
        assert!(state.entities.is_empty());
    }

    #[test]
    fn test_obstacles_sit_on_ground() {
        let mut state = playing(4);
        for _ in 0..20 {
            spawn_obstacle(&mut state);
            advance_entities(&mut state, 1.0);
        }
        for e in state.entities.iter().filter(|e| e.is_obstacle()) {
            assert!((e.bounds().bottom() - state.world.ground_y).abs() < 1e-3);
        }
    }

    #[test]
    fn test_crowded_obstacle_dropped() {
        let mut state = playing(1);
        state.world.scroll_speed = 400.0;
        let first = spawn_obstacle(&mut state);
        assert!(first >= 1);
        let before = state.entities.len();
        assert_eq!(spawn_obstacle(&mut state), 0);
        assert_eq!(state.entities.len(), before);
        assert_eq!(state.spawner.obstacles_dropped, 1);
    }

    #[test]
    fn test_coin_group_size() {
        let mut state = playing(2);
        for _ in 0..50 {
            state.entities.clear();
            let n = spawn_coin_group(&mut state);
            assert!((3..=6).contains(&n));
            assert_eq!(state.entities.len(), n);
        }
    }

    #[test]
    fn test_retire_offscreen() {
        let mut state = playing(5);
        spawn_powerup(&mut state);
        state.world.scroll_speed = 1000.0;
        advance_entities(&mut state, 2.0);
        assert!(state.entities.is_empty());
    }

    #[test]
    fn test_magnet_pulls_coins() {
        let mut state = playing(6);
        let center = state.player.center();
        let id = state.next_entity_id();
        state
            .entities
            .push(Entity::coin(id, center + Vec2::new(100.0, -50.0)));
        state.player.powerups.magnet.activate(10.0);
        state.world.scroll_speed = 0.0;

        let before = state.entities[0].pos.distance(center);
        advance_entities(&mut state, 0.05);
        assert!(state.entities[0].pos.distance(center) < before);
    }

    proptest! {
        /// Consecutive obstacles keep at least speed x reaction time apart
        #[test]
        fn prop_obstacle_spacing(
            seed in any::<u64>(),
            steps in proptest::collection::vec((0.0f32..300_000.0, 0.0f32..2.0), 1..60),
        ) {
            let mut state = playing(seed);
            for (distance, scroll_secs) in steps {
                state.world.distance = distance;
                state.world.speed = World::speed_for_distance(distance, &state.tuning);
                state.world.scroll_speed = state.world.speed;
                let min_gap = min_obstacle_gap(&state);

                let before = state.entities.len();
                let prev_right = last_obstacle_right(&state.entities);
                let placed = spawn_obstacle(&mut state);
                prop_assert_eq!(state.entities.len(), before + placed);

                if placed > 0 {
                    let first = &state.entities[before];
                    if let Some(right) = prev_right {
                        prop_assert!(first.pos.x - right >= min_gap - 1e-3);
                    }
                    if placed == 2 {
                        let second = &state.entities[before + 1];
                        prop_assert!(second.pos.x - first.bounds().right() >= min_gap - 1e-3);
                    }
                }
                advance_entities(&mut state, scroll_secs);
            }
        }
    }
}
