//! Achievement progress polling
//!
//! The simulation only reports raw progress values; unlocking and rewards
//! belong to the records layer.

use serde::{Deserialize, Serialize};

use super::events::{AchievementId, GameEvent};
use super::state::GameState;

/// Game-time seconds between progress reports
pub const POLL_INTERVAL: f64 = 2.0;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgressTracker {
    /// Last value reported per achievement
    reported: [u64; AchievementId::ALL.len()],
    next_poll: f64,
    /// Seconds since the last hit
    clean_time: f32,
    /// Longest hit-free stretch this run
    best_clean_time: f32,
}

impl ProgressTracker {
    pub fn advance(&mut self, dt: f32) {
        self.clean_time += dt;
        self.best_clean_time = self.best_clean_time.max(self.clean_time);
    }

    pub fn note_damage(&mut self) {
        self.clean_time = 0.0;
    }

    #[inline]
    pub fn best_clean_time(&self) -> f32 {
        self.best_clean_time
    }

    /// True once per poll interval of game time
    pub fn poll_due(&mut self, game_time: f64) -> bool {
        if game_time >= self.next_poll {
            self.next_poll = game_time + POLL_INTERVAL;
            return true;
        }
        false
    }
}

/// Current progress value for an achievement
pub fn value_of(state: &GameState, id: AchievementId, run_finished: bool) -> u64 {
    match id {
        AchievementId::FirstRun => run_finished as u64,
        AchievementId::CoinCollector => state.scoring.coins_collected as u64,
        AchievementId::DistanceRunner => state.distance_metres() as u64,
        AchievementId::ScoreMaster => state.scoring.score_points(),
        AchievementId::Survivor => state.progress.best_clean_time().floor() as u64,
    }
}

/// Emit progress for every achievement whose value grew since the last report
pub fn report(state: &mut GameState, run_finished: bool) {
    for id in AchievementId::ALL {
        let value = value_of(state, id, run_finished);
        let slot = &mut state.progress.reported[id.index()];
        if value > *slot {
            *slot = value;
            state.emit(GameEvent::AchievementProgress { id, value });
        }
    }
}

/// Per-frame bookkeeping plus the periodic report
pub fn update(state: &mut GameState, dt: f32) {
    state.progress.advance(dt);
    if state.progress.poll_due(state.clock.game_time) {
        report(state, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress_events(state: &GameState) -> Vec<(AchievementId, u64)> {
        state
            .events()
            .iter()
            .filter_map(|e| match e {
                GameEvent::AchievementProgress { id, value } => Some((*id, *value)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_reports_only_growth() {
        let mut state = GameState::new(5);
        state.scoring.coins_collected = 4;
        report(&mut state, false);
        report(&mut state, false);
        assert_eq!(
            progress_events(&state),
            vec![(AchievementId::CoinCollector, 4)]
        );
    }

    #[test]
    fn test_first_run_on_finish() {
        let mut state = GameState::new(5);
        report(&mut state, true);
        assert!(progress_events(&state).contains(&(AchievementId::FirstRun, 1)));
    }

    #[test]
    fn test_clean_stretch_survives_damage() {
        let mut tracker = ProgressTracker::default();
        tracker.advance(10.0);
        tracker.note_damage();
        tracker.advance(3.0);
        assert_eq!(tracker.best_clean_time(), 10.0);
    }

    #[test]
    fn test_poll_interval() {
        let mut tracker = ProgressTracker::default();
        assert!(tracker.poll_due(0.0));
        assert!(!tracker.poll_due(1.9));
        assert!(tracker.poll_due(2.0));
    }
}
