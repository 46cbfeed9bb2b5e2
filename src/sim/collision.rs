//! Collision detection and response
//!
//! Narrow phase only runs against grid candidates near the player's hitbox.
//! Obstacles resolve first (at most one hit per frame), then coins, then
//! power-ups.

use glam::Vec2;

use super::events::{GameEvent, PickupKind};
use super::pool::Burst;
use super::scoring;
use super::state::{EntityKind, GamePhase, GameState, PowerUpKind};
use crate::Rect;

/// Strict AABB overlap (touching edges do not collide)
#[inline]
pub fn aabb_overlap(a: &Rect, b: &Rect) -> bool {
    a.x < b.right() && a.right() > b.x && a.y < b.bottom() && a.bottom() > b.y
}

/// Circle vs AABB using the closest point on the rectangle
#[inline]
pub fn circle_rect_overlap(center: Vec2, radius: f32, rect: &Rect) -> bool {
    rect.closest_point(center).distance_squared(center) <= radius * radius
}

/// What the player touched this frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollisionSummary {
    pub damaged: bool,
    pub shield_broken: bool,
    pub coins: u32,
    pub powerups: u32,
}

/// Resolve player contacts against the current grid
pub fn resolve(state: &mut GameState) -> CollisionSummary {
    let mut summary = CollisionSummary::default();
    let hitbox = state.player.hitbox(state.tuning.hitbox_tolerance);

    let mut candidates = std::mem::take(&mut state.query_buf);
    let mut consumed = std::mem::take(&mut state.consumed_buf);
    consumed.clear();
    state.grid.query_into(&hitbox, &mut candidates);

    for &index in &candidates {
        let entity = &state.entities[index];
        if !matches!(entity.kind, EntityKind::Obstacle { .. }) {
            continue;
        }
        if !aabb_overlap(&hitbox, &entity.bounds()) {
            continue;
        }
        if state.player.powerups.shield.active {
            state.player.powerups.shield.deactivate();
            consumed.push(index);
            summary.shield_broken = true;
            let burst = Burst::shield_break(state.player.center());
            state.particles.emit(&burst, &mut state.rng);
            log::debug!("Shield absorbed obstacle {}", entity.id);
            state.emit(GameEvent::ShieldBroken);
            continue;
        }
        if state.player.invulnerable {
            continue;
        }
        apply_damage(state);
        summary.damaged = true;
        break;
    }

    if state.phase == GamePhase::Playing {
        for &index in &candidates {
            let entity = &state.entities[index];
            match entity.kind {
                EntityKind::Coin { radius } => {
                    if circle_rect_overlap(entity.pos, radius, &hitbox) {
                        let at = entity.pos;
                        consumed.push(index);
                        scoring::collect_coin(state, at);
                        summary.coins += 1;
                    }
                }
                EntityKind::PowerUp { .. } | EntityKind::Obstacle { .. } => {}
            }
        }

        for &index in &candidates {
            let entity = &state.entities[index];
            if let EntityKind::PowerUp { kind, radius } = entity.kind {
                if circle_rect_overlap(entity.pos, radius, &hitbox) {
                    let at = entity.pos;
                    consumed.push(index);
                    activate_powerup(state, kind, at);
                    summary.powerups += 1;
                }
            }
        }
    }

    if !consumed.is_empty() {
        consumed.sort_unstable();
        consumed.dedup();
        let mut index = 0;
        state.entities.retain(|_| {
            let keep = consumed.binary_search(&index).is_err();
            index += 1;
            keep
        });
    }

    state.query_buf = candidates;
    state.consumed_buf = consumed;
    summary
}

/// Lose a life, start invulnerability and slow motion; end the run at zero
pub fn apply_damage(state: &mut GameState) {
    let player = &mut state.player;
    player.lives = player.lives.saturating_sub(1);
    player.invulnerable = true;
    player.invulnerable_remaining = state.tuning.invulnerability_time;
    let lives_left = player.lives;

    state.progress.note_damage();
    state.clock.start_slow_motion();
    let burst = Burst::damage(state.player.center());
    state.particles.emit(&burst, &mut state.rng);

    log::debug!("Player hit, {} lives left", lives_left);
    state.emit(GameEvent::DamageTaken { lives_left });
    if lives_left == 0 {
        state.end_run();
    }
}

/// Apply a collected power-up
pub fn activate_powerup(state: &mut GameState, kind: PowerUpKind, at: Vec2) {
    let tuning = &state.tuning;
    let powerups = &mut state.player.powerups;
    match kind {
        PowerUpKind::Shield => powerups.shield.activate(tuning.shield_duration),
        PowerUpKind::Magnet => powerups.magnet.activate(tuning.magnet_duration),
        PowerUpKind::Boost => powerups.boost.activate(tuning.boost_duration),
        PowerUpKind::Multiplier => powerups.stack_multiplier(tuning),
    }

    state.particles.emit(&Burst::powerup(at, kind.color()), &mut state.rng);
    log::debug!("Power-up {} activated", kind.as_str());
    state.emit(GameEvent::PickupCollected {
        kind: PickupKind::PowerUp(kind),
        value: 0,
    });
    state.emit(GameEvent::PowerUpActivated { kind });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{Entity, ObstacleShape};
    use proptest::prelude::*;

    fn playing() -> GameState {
        let mut state = GameState::new(11);
        state.finish_loading();
        state.start_run();
        state.drain_events().for_each(drop);
        state
    }

    /// Obstacle overlapping the player's hitbox
    fn obstacle_on_player(state: &mut GameState) {
        let id = state.next_entity_id();
        let pos = Vec2::new(state.player.pos.x, state.world.ground_y - 60.0);
        state.entities.push(Entity::obstacle(id, ObstacleShape::Box, pos));
    }

    fn rebuild(state: &mut GameState) {
        state.grid.rebuild(&state.entities);
    }

    #[test]
    fn test_aabb_touching_is_miss() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(!aabb_overlap(&a, &Rect::new(10.0, 0.0, 10.0, 10.0)));
        assert!(aabb_overlap(&a, &Rect::new(9.0, 9.0, 10.0, 10.0)));
    }

    #[test]
    fn test_circle_rect() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(circle_rect_overlap(Vec2::new(5.0, 5.0), 1.0, &r));
        assert!(circle_rect_overlap(Vec2::new(14.0, 5.0), 5.0, &r));
        assert!(!circle_rect_overlap(Vec2::new(14.0, 14.0), 5.0, &r));
    }

    #[test]
    fn test_hit_costs_a_life() {
        let mut state = playing();
        obstacle_on_player(&mut state);
        rebuild(&mut state);

        let summary = resolve(&mut state);
        assert!(summary.damaged);
        assert_eq!(state.player.lives, 2);
        assert!(state.player.invulnerable);
        assert!(state.clock.is_slow_motion());
        assert!(state.events().contains(&GameEvent::DamageTaken { lives_left: 2 }));
        assert_eq!(state.entities.len(), 1, "obstacle stays after a hit");

        // Invulnerable: the same obstacle does nothing
        let summary = resolve(&mut state);
        assert!(!summary.damaged);
        assert_eq!(state.player.lives, 2);
    }

    #[test]
    fn test_damage_resumes_after_invulnerability() {
        let mut state = playing();
        obstacle_on_player(&mut state);
        rebuild(&mut state);
        resolve(&mut state);
        assert_eq!(state.player.lives, 2);

        let window = state.tuning.invulnerability_time;
        state.player.tick_timers(window + 0.01);
        assert!(!state.player.invulnerable);

        rebuild(&mut state);
        assert!(resolve(&mut state).damaged);
        assert_eq!(state.player.lives, 1);
    }

    #[test]
    fn test_powerup_pickup_refreshes() {
        let mut state = playing();
        activate_powerup(&mut state, PowerUpKind::Magnet, Vec2::ZERO);
        let full = state.tuning.magnet_duration;
        state.player.tick_timers(4.0);
        assert!((state.player.powerups.magnet.remaining - (full - 4.0)).abs() < 1e-4);

        activate_powerup(&mut state, PowerUpKind::Magnet, Vec2::ZERO);
        assert_eq!(state.player.powerups.magnet.remaining, full);
        assert!(state.events().contains(&GameEvent::PowerUpActivated {
            kind: PowerUpKind::Magnet
        }));
    }

    #[test]
    fn test_one_hit_per_frame() {
        let mut state = playing();
        obstacle_on_player(&mut state);
        obstacle_on_player(&mut state);
        rebuild(&mut state);
        resolve(&mut state);
        assert_eq!(state.player.lives, 2);
    }

    #[test]
    fn test_shield_absorbs_without_invulnerability() {
        let mut state = playing();
        state.player.powerups.shield.activate(8.0);
        obstacle_on_player(&mut state);
        rebuild(&mut state);

        let summary = resolve(&mut state);
        assert!(summary.shield_broken);
        assert!(!summary.damaged);
        assert_eq!(state.player.lives, 3);
        assert!(!state.player.invulnerable);
        assert!(!state.player.powerups.shield.active);
        assert!(state.entities.is_empty());
        assert!(state.events().contains(&GameEvent::ShieldBroken));
    }

    #[test]
    fn test_last_life_ends_run_once() {
        let mut state = playing();
        state.player.lives = 1;
        obstacle_on_player(&mut state);
        let id = state.next_entity_id();
        state.entities.push(Entity::coin(id, state.player.center()));
        rebuild(&mut state);

        resolve(&mut state);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(state.scoring.coins_collected, 0, "no pickups after game over");
        let ended = state
            .events()
            .iter()
            .filter(|e| matches!(e, GameEvent::RunEnded { .. }))
            .count();
        assert_eq!(ended, 1);
    }

    #[test]
    fn test_coin_and_powerup_collected() {
        let mut state = playing();
        let c = state.player.center();
        let id = state.next_entity_id();
        state.entities.push(Entity::coin(id, c));
        let id = state.next_entity_id();
        state
            .entities
            .push(Entity::powerup(id, PowerUpKind::Magnet, c + Vec2::new(10.0, 0.0)));
        rebuild(&mut state);

        let summary = resolve(&mut state);
        assert_eq!(summary.coins, 1);
        assert_eq!(summary.powerups, 1);
        assert!(state.entities.is_empty());
        assert!(state.player.powerups.magnet.active);
        assert!(
            state
                .events()
                .contains(&GameEvent::PowerUpActivated { kind: PowerUpKind::Magnet })
        );
    }

    #[test]
    fn test_sliding_ducks_barrier() {
        let mut state = playing();
        // Barrier hanging at standing head height
        let id = state.next_entity_id();
        let top = state.player.pos.y - 20.0;
        state.entities.push(Entity::obstacle(
            id,
            ObstacleShape::Barrier,
            Vec2::new(state.player.pos.x, top),
        ));
        let tuning = state.tuning.clone();
        state.player.start_slide(&tuning);
        rebuild(&mut state);
        assert!(!resolve(&mut state).damaged);
    }

    fn arb_rect() -> impl Strategy<Value = Rect> {
        (-200.0f32..200.0, -200.0f32..200.0, 1.0f32..150.0, 1.0f32..150.0)
            .prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
    }

    proptest! {
        /// The tolerance inset only ever removes hits
        #[test]
        fn prop_inset_only_shrinks(body in arb_rect(), other in arb_rect(), tol in 0.0f32..0.49) {
            if aabb_overlap(&body.inset(tol), &other) {
                prop_assert!(aabb_overlap(&body, &other));
            }
        }
    }
}
