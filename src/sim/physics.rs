//! Vertical kinematics for the runner and the scrolling world
//!
//! The player never moves horizontally; the world scrolls past instead.
//! Screen space: y grows downward, so an upward jump has negative velocity.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::Rect;
use crate::consts::*;
use crate::tuning::Tuning;

/// A power-up effect that runs for a limited time
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TimedEffect {
    pub active: bool,
    /// Seconds left while active
    pub remaining: f32,
}

impl TimedEffect {
    /// Activate or refresh (never shortens a running effect)
    pub fn activate(&mut self, duration: f32) {
        self.remaining = if self.active {
            self.remaining.max(duration)
        } else {
            duration
        };
        self.active = true;
    }

    pub fn deactivate(&mut self) {
        self.active = false;
        self.remaining = 0.0;
    }

    /// Count down; returns true on the step the effect expires
    pub fn tick(&mut self, dt: f32) -> bool {
        if !self.active {
            return false;
        }
        self.remaining -= dt;
        if self.remaining <= 0.0 {
            self.deactivate();
            return true;
        }
        false
    }
}

/// Timed power-up states carried by the player
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerUps {
    pub shield: TimedEffect,
    pub magnet: TimedEffect,
    pub boost: TimedEffect,
    pub multiplier: TimedEffect,
    /// Score multiplier while `multiplier` is active (1 otherwise)
    pub multiplier_level: u32,
}

impl Default for PowerUps {
    fn default() -> Self {
        Self {
            shield: TimedEffect::default(),
            magnet: TimedEffect::default(),
            boost: TimedEffect::default(),
            multiplier: TimedEffect::default(),
            multiplier_level: 1,
        }
    }
}

impl PowerUps {
    /// Stack the score multiplier: +1 level and extra time, both capped
    pub fn stack_multiplier(&mut self, tuning: &Tuning) {
        if !self.multiplier.active {
            self.multiplier_level = 1;
            self.multiplier.remaining = 0.0;
        }
        self.multiplier_level = (self.multiplier_level + 1).min(tuning.multiplier_max.max(1));
        self.multiplier.remaining = (self.multiplier.remaining + tuning.multiplier_duration)
            .min(tuning.multiplier_max_duration);
        self.multiplier.active = true;
    }

    /// Active score multiplier (1 when the power-up is off)
    #[inline]
    pub fn score_multiplier(&self) -> u32 {
        if self.multiplier.active {
            self.multiplier_level
        } else {
            1
        }
    }

    fn tick(&mut self, dt: f32) {
        self.shield.tick(dt);
        self.magnet.tick(dt);
        self.boost.tick(dt);
        if self.multiplier.tick(dt) {
            self.multiplier_level = 1;
        }
    }
}

/// The runner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Top-left corner of the standing body
    pub pos: Vec2,
    pub vel_y: f32,
    pub grounded: bool,
    /// Jump input currently held (drives variable jump height)
    pub jump_held: bool,
    pub sliding: bool,
    pub slide_remaining: f32,
    pub jump_count: u8,
    pub max_jumps: u8,
    pub coyote_remaining: f32,
    pub jump_buffer_remaining: f32,
    pub invulnerable: bool,
    pub invulnerable_remaining: f32,
    pub lives: u8,
    pub powerups: PowerUps,
}

impl Player {
    /// Fresh runner standing on the floor at `floor_y`
    pub fn new(tuning: &Tuning, floor_y: f32) -> Self {
        Self {
            pos: Vec2::new(PLAYER_X, floor_y),
            vel_y: 0.0,
            grounded: true,
            jump_held: false,
            sliding: false,
            slide_remaining: 0.0,
            jump_count: 0,
            max_jumps: tuning.max_jumps,
            coyote_remaining: 0.0,
            jump_buffer_remaining: 0.0,
            invulnerable: false,
            invulnerable_remaining: 0.0,
            lives: tuning.max_lives,
            powerups: PowerUps::default(),
        }
    }

    /// Grounded, inside the coyote window, or a spare air jump left
    pub fn can_jump(&self) -> bool {
        self.grounded || self.coyote_remaining > 0.0 || self.jump_count < self.max_jumps
    }

    /// Jump input went down: arm the buffer and try to jump right away
    pub fn press_jump(&mut self, tuning: &Tuning) -> bool {
        self.jump_held = true;
        self.jump_buffer_remaining = tuning.jump_buffer_time;
        self.try_jump(tuning)
    }

    /// Jump input went up
    pub fn release_jump(&mut self) {
        self.jump_held = false;
    }

    /// Launch if allowed. Every jump uses the same impulse.
    pub fn try_jump(&mut self, tuning: &Tuning) -> bool {
        if !self.can_jump() {
            return false;
        }
        self.vel_y = tuning.jump_velocity();
        self.grounded = false;
        self.jump_count = self.jump_count.saturating_add(1);
        self.sliding = false;
        self.slide_remaining = 0.0;
        self.coyote_remaining = 0.0;
        self.jump_buffer_remaining = 0.0;
        true
    }

    /// Start a slide (ground only)
    pub fn start_slide(&mut self, tuning: &Tuning) -> bool {
        if !self.grounded {
            return false;
        }
        self.sliding = true;
        self.slide_remaining = tuning.slide_duration;
        true
    }

    /// Count down slide, invulnerability and power-up timers
    pub fn tick_timers(&mut self, dt: f32) {
        if self.invulnerable {
            self.invulnerable_remaining -= dt;
            if self.invulnerable_remaining <= 0.0 {
                self.invulnerable = false;
                self.invulnerable_remaining = 0.0;
            }
        }
        if self.sliding {
            self.slide_remaining -= dt;
            if self.slide_remaining <= 0.0 {
                self.sliding = false;
                self.slide_remaining = 0.0;
            }
        }
        self.powerups.tick(dt);
    }

    /// Integrate one step. Returns true if a buffered jump fired.
    ///
    /// Position advances with the velocity from the start of the step, then
    /// gravity is applied to the velocity.
    pub fn step(&mut self, dt: f32, tuning: &Tuning, floor_y: f32) -> bool {
        let mut buffered_jump = false;
        if self.jump_buffer_remaining > 0.0 {
            if self.grounded {
                buffered_jump = self.try_jump(tuning);
                self.jump_buffer_remaining = 0.0;
            } else {
                self.jump_buffer_remaining = (self.jump_buffer_remaining - dt).max(0.0);
            }
        }

        if self.coyote_remaining > 0.0 {
            self.coyote_remaining = (self.coyote_remaining - dt).max(0.0);
        }

        // Released early: cut the arc short
        if !self.jump_held && self.vel_y < 0.0 {
            self.vel_y *= tuning.jump_release_damping;
        }

        let v0 = self.vel_y;
        self.vel_y += tuning.gravity * dt;
        self.pos.y += v0 * dt;

        let was_grounded = self.grounded;
        if self.pos.y >= floor_y {
            self.pos.y = floor_y;
            self.vel_y = 0.0;
            self.grounded = true;
            self.jump_count = 0;
            self.coyote_remaining = 0.0;
        } else {
            self.grounded = false;
            if was_grounded {
                self.coyote_remaining = tuning.coyote_time;
            }
        }

        buffered_jump
    }

    /// Body rectangle: full when standing, lower half when sliding
    pub fn body(&self) -> Rect {
        if self.sliding {
            let h = PLAYER_HEIGHT * 0.5;
            Rect::new(self.pos.x, self.pos.y + h, PLAYER_WIDTH, h)
        } else {
            Rect::new(self.pos.x, self.pos.y, PLAYER_WIDTH, PLAYER_HEIGHT)
        }
    }

    /// Collision box: body inset by `tolerance` per side so near misses favour the player
    #[inline]
    pub fn hitbox(&self, tolerance: f32) -> Rect {
        self.body().inset(tolerance)
    }

    /// Centre of the current body, lower while sliding (magnet target, particle origin)
    #[inline]
    pub fn center(&self) -> Vec2 {
        self.body().center()
    }
}

/// Scroll speed, distance and ground line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    /// Distance-derived speed, clamped to `[base_speed, max_speed]`
    pub speed: f32,
    /// Speed the world actually scrolls at (includes boost)
    pub scroll_speed: f32,
    pub distance: f32,
    pub gravity: f32,
    /// Y of the ground surface
    pub ground_y: f32,
}

impl World {
    pub fn new(tuning: &Tuning, viewport_height: f32) -> Self {
        Self {
            speed: tuning.base_speed,
            scroll_speed: tuning.base_speed,
            distance: 0.0,
            gravity: tuning.gravity,
            ground_y: viewport_height - GROUND_HEIGHT,
        }
    }

    /// Speed as a pure function of distance
    pub fn speed_for_distance(distance: f32, tuning: &Tuning) -> f32 {
        let ramp = (1.0 + distance.max(0.0) / tuning.speed_ramp_distance)
            .min(tuning.max_speed_multiplier);
        (tuning.base_speed * ramp).clamp(tuning.base_speed, tuning.max_speed())
    }

    /// Difficulty in [0, 1] from distance travelled
    pub fn difficulty(&self, tuning: &Tuning) -> f32 {
        (self.distance / tuning.difficulty_distance).clamp(0.0, 1.0)
    }

    /// Y the standing player's top rests at
    #[inline]
    pub fn player_floor(&self) -> f32 {
        self.ground_y - PLAYER_HEIGHT
    }

    /// Refresh speed from distance, then travel for `dt`
    pub fn advance(&mut self, dt: f32, boost_active: bool, tuning: &Tuning) {
        self.speed = Self::speed_for_distance(self.distance, tuning);
        let boost = if boost_active {
            tuning.boost_speed_multiplier
        } else {
            1.0
        };
        self.scroll_speed = self.speed * boost;
        self.distance += self.scroll_speed * dt.max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn grounded_player(tuning: &Tuning) -> (Player, f32) {
        let floor = 430.0;
        (Player::new(tuning, floor), floor)
    }

    #[test]
    fn test_jump_impulse_and_first_step() {
        let tuning = Tuning::default();
        let (mut player, floor) = grounded_player(&tuning);

        assert!(player.press_jump(&tuning));
        assert!((player.vel_y - (-1322.876)).abs() < 0.01);

        let y0 = player.pos.y;
        player.step(DT, &tuning, floor);
        assert!((player.vel_y - (-1281.209)).abs() < 0.01);
        assert!((player.pos.y - (y0 - 1322.876 / 60.0)).abs() < 0.01);
        assert!(!player.grounded);
    }

    #[test]
    fn test_impulse_same_for_every_jump() {
        let tuning = Tuning::default();
        let (mut player, floor) = grounded_player(&tuning);
        player.press_jump(&tuning);
        let first = player.vel_y;
        for _ in 0..10 {
            player.step(DT, &tuning, floor);
        }
        assert!(player.press_jump(&tuning), "double jump allowed");
        assert_eq!(player.vel_y, first);
        assert!(!player.try_jump(&tuning), "third jump rejected");
    }

    #[test]
    fn test_release_damps_upward_velocity() {
        let tuning = Tuning::default();
        let (mut player, floor) = grounded_player(&tuning);
        player.press_jump(&tuning);
        player.release_jump();
        let v = player.vel_y;
        player.step(DT, &tuning, floor);
        assert!((player.vel_y - (v * 0.5 + tuning.gravity * DT)).abs() < 0.01);
    }

    #[test]
    fn test_landing_clamps_and_resets() {
        let tuning = Tuning::default();
        let (mut player, floor) = grounded_player(&tuning);
        player.press_jump(&tuning);
        player.press_jump(&tuning);
        for _ in 0..600 {
            player.step(DT, &tuning, floor);
            if player.grounded {
                break;
            }
        }
        assert!(player.grounded);
        assert_eq!(player.pos.y, floor);
        assert_eq!(player.vel_y, 0.0);
        assert_eq!(player.jump_count, 0);
    }

    #[test]
    fn test_buffered_jump_fires_once() {
        let tuning = Tuning::default();
        let (mut player, floor) = grounded_player(&tuning);
        player.press_jump(&tuning);
        player.press_jump(&tuning);

        // Fall until just above the floor
        let mut jumps = 0;
        let mut pressed = false;
        for _ in 0..600 {
            if !pressed && player.vel_y > 0.0 && floor - player.pos.y < 40.0 {
                // No jumps left, so this press is only buffered
                assert!(!player.press_jump(&tuning));
                pressed = true;
            }
            if player.step(DT, &tuning, floor) {
                jumps += 1;
            }
            if jumps > 0 && player.grounded {
                break;
            }
        }
        assert!(pressed);
        assert_eq!(jumps, 1);
        assert_eq!(player.jump_buffer_remaining, 0.0);
    }

    #[test]
    fn test_buffer_expires_in_air() {
        let tuning = Tuning::default();
        let (mut player, floor) = grounded_player(&tuning);
        player.press_jump(&tuning);
        player.press_jump(&tuning);
        assert!(!player.press_jump(&tuning));
        let mut fired = false;
        for _ in 0..600 {
            fired |= player.step(DT, &tuning, floor);
        }
        assert!(!fired, "stale buffer must not fire on a late landing");
    }

    #[test]
    fn test_coyote_only_after_leaving_ground() {
        let tuning = Tuning::default();
        let (mut player, floor) = grounded_player(&tuning);

        // Ground drops away (viewport grew): walked off without jumping
        let lower = floor + 200.0;
        player.step(DT, &tuning, lower);
        assert!(!player.grounded);
        assert_eq!(player.coyote_remaining, tuning.coyote_time);

        // Still airborne: window only shrinks
        player.step(DT, &tuning, lower);
        assert!(player.coyote_remaining < tuning.coyote_time);

        // A jump clears it and does not re-arm it
        player.try_jump(&tuning);
        player.step(DT, &tuning, lower);
        assert_eq!(player.coyote_remaining, 0.0);
    }

    #[test]
    fn test_slide_needs_ground_and_jump_cancels() {
        let tuning = Tuning::default();
        let (mut player, floor) = grounded_player(&tuning);
        assert!(player.start_slide(&tuning));
        assert!(player.body().h < PLAYER_HEIGHT);
        player.press_jump(&tuning);
        assert!(!player.sliding);
        player.step(DT, &tuning, floor);
        assert!(!player.start_slide(&tuning));
    }

    #[test]
    fn test_multiplier_stacking() {
        let tuning = Tuning::default();
        let mut powerups = PowerUps::default();
        assert_eq!(powerups.score_multiplier(), 1);
        powerups.stack_multiplier(&tuning);
        assert_eq!(powerups.score_multiplier(), 2);
        for _ in 0..10 {
            powerups.stack_multiplier(&tuning);
        }
        assert_eq!(powerups.score_multiplier(), tuning.multiplier_max);
        assert!(powerups.multiplier.remaining <= tuning.multiplier_max_duration);

        powerups.tick(tuning.multiplier_max_duration + 1.0);
        assert_eq!(powerups.score_multiplier(), 1);
    }

    #[test]
    fn test_speed_monotonic_and_capped() {
        let tuning = Tuning::default();
        let mut last = 0.0;
        for d in (0..400_000).step_by(5_000) {
            let s = World::speed_for_distance(d as f32, &tuning);
            assert!(s >= last);
            assert!(s >= tuning.base_speed && s <= tuning.max_speed());
            last = s;
        }
        assert_eq!(World::speed_for_distance(1.0e9, &tuning), tuning.max_speed());
    }

    #[test]
    fn test_boost_scales_scroll_speed() {
        let tuning = Tuning::default();
        let mut world = World::new(&tuning, 600.0);
        world.advance(1.0, true, &tuning);
        assert_eq!(world.speed, tuning.base_speed);
        assert!((world.scroll_speed - tuning.base_speed * 1.5).abs() < 1e-3);
        assert!((world.distance - tuning.base_speed * 1.5).abs() < 1e-2);

        world.advance(DT, false, &tuning);
        assert_eq!(world.scroll_speed, world.speed);
    }

    #[test]
    fn test_invulnerability_runs_out() {
        let tuning = Tuning::default();
        let (mut player, _) = grounded_player(&tuning);
        player.invulnerable = true;
        player.invulnerable_remaining = tuning.invulnerability_time;

        player.tick_timers(tuning.invulnerability_time - 0.1);
        assert!(player.invulnerable);
        player.tick_timers(0.2);
        assert!(!player.invulnerable);
        assert_eq!(player.invulnerable_remaining, 0.0);
    }

    #[test]
    fn test_refresh_never_shortens() {
        let mut effect = TimedEffect::default();
        effect.activate(8.0);
        effect.tick(3.0);
        assert_eq!(effect.remaining, 5.0);

        effect.activate(8.0);
        assert_eq!(effect.remaining, 8.0);

        effect.remaining = 20.0;
        effect.activate(8.0);
        assert_eq!(effect.remaining, 20.0);
        assert!(effect.active);
    }

    #[test]
    fn test_timed_powerups_switch_off() {
        let tuning = Tuning::default();
        let (mut player, _) = grounded_player(&tuning);
        player.powerups.shield.activate(tuning.shield_duration);
        player.powerups.magnet.activate(tuning.magnet_duration);
        player.powerups.boost.activate(tuning.boost_duration);

        player.tick_timers(tuning.boost_duration + 0.1);
        assert!(!player.powerups.boost.active);
        assert!(player.powerups.shield.active);
        assert!(player.powerups.magnet.active);

        player.tick_timers(tuning.magnet_duration);
        assert!(!player.powerups.shield.active);
        assert!(!player.powerups.magnet.active);
        assert_eq!(player.powerups.magnet.remaining, 0.0);
    }

    #[test]
    fn test_center_follows_slide() {
        let tuning = Tuning::default();
        let (mut player, _) = grounded_player(&tuning);
        let standing = player.center();
        player.start_slide(&tuning);
        let sliding = player.center();
        assert_eq!(sliding.x, standing.x);
        assert!((sliding.y - (standing.y + PLAYER_HEIGHT * 0.25)).abs() < 1e-3);
    }
}
