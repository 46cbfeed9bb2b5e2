//! Per-frame simulation step
//!
//! Stage order is fixed: clock, input, physics, spawner, grid, collisions,
//! scoring, particles, achievements.

use super::collision;
use super::events::GameEvent;
use super::pool::Burst;
use super::progress;
use super::scoring;
use super::spawner;
use super::state::{GamePhase, GameState};

/// Input intents latched by the host since the previous frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickInput {
    /// Jump key/touch went down
    pub jump_pressed: bool,
    /// Jump key/touch went up
    pub jump_released: bool,
    pub slide_pressed: bool,
    /// Start a run (menu) or leave the game-over screen
    pub start: bool,
    /// Pause toggle
    pub pause: bool,
    /// Idle/demo mode - autopilot plays the game
    pub idle_mode: bool,
}

impl TickInput {
    /// Anything other than idle mode requested
    pub fn is_empty(&self) -> bool {
        !(self.jump_pressed || self.jump_released || self.slide_pressed || self.start || self.pause)
    }
}

/// Advance the game by one frame of `raw_dt` host seconds.
/// Returns the simulated step (0 when nothing ran).
pub fn tick(state: &mut GameState, input: &TickInput, raw_dt: f32) -> f32 {
    if input.pause {
        state.toggle_pause();
    }
    if input.start {
        match state.phase {
            GamePhase::Menu => state.start_run(),
            GamePhase::GameOver => state.to_menu(),
            _ => {}
        }
    }

    if state.phase != GamePhase::Playing {
        // Releases still land so a held jump cannot outlive a pause
        if input.jump_released {
            state.player.release_jump();
        }
        return 0.0;
    }

    let dt = state.clock.advance(raw_dt);

    let mut input = input.clone();
    if input.idle_mode {
        autopilot(state, &mut input);
    }
    apply_intents(state, &input);

    // Physics
    let boost = state.player.powerups.boost.active;
    state.world.advance(dt, boost, &state.tuning);
    state.player.tick_timers(dt);
    let floor = state.world.player_floor();
    if state.player.step(dt, &state.tuning, floor) {
        on_jump(state);
    }

    // Spawner
    spawner::advance_entities(state, dt);
    spawner::update(state, dt);

    // Broad + narrow phase
    state.grid.rebuild(&state.entities);
    collision::resolve(state);
    if state.phase != GamePhase::Playing {
        return dt;
    }

    scoring::finalize(state, dt);
    state.particles.update(dt, state.tuning.particle_gravity);
    progress::update(state, dt);

    dt
}

fn apply_intents(state: &mut GameState, input: &TickInput) {
    if input.jump_pressed && state.player.press_jump(&state.tuning) {
        on_jump(state);
    }
    if input.jump_released {
        state.player.release_jump();
    }
    if input.slide_pressed && !state.player.sliding && state.player.start_slide(&state.tuning) {
        let body = state.player.body();
        let at = glam::Vec2::new(body.x, body.bottom());
        state.particles.emit(&Burst::slide(at), &mut state.rng);
        state.emit(GameEvent::Slid);
    }
}

fn on_jump(state: &mut GameState) {
    let body = state.player.body();
    let at = glam::Vec2::new(body.center().x, body.bottom());
    state.particles.emit(&Burst::jump(at), &mut state.rng);
    state.emit(GameEvent::Jumped);
}

/// Seconds of look-ahead before the autopilot jumps
const AUTOPILOT_LEAD_TIME: f32 = 0.3;

/// Jump over whatever obstacle is about to arrive
fn autopilot(state: &GameState, input: &mut TickInput) {
    let player = &state.player;
    if !player.grounded {
        return;
    }
    let front = player.body().right();
    let lead = state.world.scroll_speed * AUTOPILOT_LEAD_TIME;
    let threat = state
        .entities
        .iter()
        .filter(|e| e.is_obstacle())
        .any(|e| {
            let b = e.bounds();
            b.right() > player.pos.x && b.x - front < lead
        });
    if threat {
        input.jump_pressed = true;
    }
}
