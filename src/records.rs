//! Persistent player records
//!
//! Best score, best distance, currency and achievement progress. Fed from
//! drained simulation events; written back when a run ends.

use serde::{Deserialize, Serialize};

use crate::persistence::{
    KeyValueStore, StoreError, read_json, read_u64, write_json, write_u64,
};
use crate::sim::{AchievementId, GameEvent};

/// Currency earned per coin collected
pub const CURRENCY_PER_COIN: u64 = 5;

pub const KEY_BEST_SCORE: &str = "parkour_best_score";
pub const KEY_BEST_DISTANCE: &str = "parkour_best_distance";
pub const KEY_CURRENCY: &str = "parkour_currency";
pub const KEY_ACHIEVEMENTS: &str = "parkour_achievements";

/// One achievement's progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub name: String,
    pub target: u64,
    pub reward: u64,
    #[serde(default)]
    pub progress: u64,
    #[serde(default)]
    pub unlocked: bool,
}

impl Achievement {
    fn new(id: AchievementId, name: &str, target: u64, reward: u64) -> Self {
        Self {
            id: id.as_str().to_string(),
            name: name.to_string(),
            target,
            reward,
            progress: 0,
            unlocked: false,
        }
    }

    /// Built-in achievement list
    pub fn catalog() -> Vec<Achievement> {
        vec![
            Self::new(AchievementId::FirstRun, "First Steps", 1, 100),
            Self::new(AchievementId::CoinCollector, "Coin Collector", 100, 200),
            Self::new(AchievementId::DistanceRunner, "Distance Runner", 1000, 300),
            Self::new(AchievementId::ScoreMaster, "Score Master", 10_000, 500),
            Self::new(AchievementId::Survivor, "Survivor", 60, 400),
        ]
    }
}

/// Outcome of recording a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOutcome {
    pub new_best_score: bool,
    pub new_best_distance: bool,
    pub currency_earned: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Records {
    pub best_score: u64,
    /// Metres
    pub best_distance: u64,
    pub currency: u64,
    pub achievements: Vec<Achievement>,
}

impl Default for Records {
    fn default() -> Self {
        Self {
            best_score: 0,
            best_distance: 0,
            currency: 0,
            achievements: Achievement::catalog(),
        }
    }
}

impl Records {
    /// Load from the store. Missing or malformed entries use the baseline.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let stored: Vec<Achievement> = read_json(store, KEY_ACHIEVEMENTS);
        let mut achievements = Achievement::catalog();
        for a in &mut achievements {
            if let Some(saved) = stored.iter().find(|s| s.id == a.id) {
                a.progress = saved.progress;
                a.unlocked = saved.unlocked;
            }
        }

        let records = Self {
            best_score: read_u64(store, KEY_BEST_SCORE),
            best_distance: read_u64(store, KEY_BEST_DISTANCE),
            currency: read_u64(store, KEY_CURRENCY),
            achievements,
        };
        log::info!(
            "Loaded records: best {} / {} m, {} currency",
            records.best_score,
            records.best_distance,
            records.currency
        );
        records
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<(), StoreError> {
        write_u64(store, KEY_BEST_SCORE, self.best_score)?;
        write_u64(store, KEY_BEST_DISTANCE, self.best_distance)?;
        write_u64(store, KEY_CURRENCY, self.currency)?;
        write_json(store, KEY_ACHIEVEMENTS, &self.achievements)?;
        log::debug!("Records saved");
        Ok(())
    }

    /// Fold a finished run into the bests and pay out coin currency
    pub fn record_run(&mut self, score: u64, distance_m: u64, coins: u64) -> RunOutcome {
        let new_best_score = score > self.best_score;
        let new_best_distance = distance_m > self.best_distance;
        if new_best_score {
            log::info!("New best score: {}", score);
            self.best_score = score;
        }
        if new_best_distance {
            self.best_distance = distance_m;
        }
        let currency_earned = coins.saturating_mul(CURRENCY_PER_COIN);
        self.currency = self.currency.saturating_add(currency_earned);
        RunOutcome {
            new_best_score,
            new_best_distance,
            currency_earned,
        }
    }

    /// Apply a progress report. Returns the achievement if it unlocked just now.
    pub fn apply_progress(&mut self, id: AchievementId, value: u64) -> Option<&Achievement> {
        let index = self.achievements.iter().position(|a| a.id == id.as_str())?;
        let achievement = &mut self.achievements[index];
        achievement.progress = achievement.progress.max(value);
        if achievement.unlocked || achievement.progress < achievement.target {
            return None;
        }
        achievement.unlocked = true;
        self.currency = self.currency.saturating_add(achievement.reward);
        log::info!(
            "Achievement unlocked: {} (+{})",
            achievement.name,
            achievement.reward
        );
        Some(&self.achievements[index])
    }

    /// Feed one drained simulation event. Returns true if anything changed
    /// that should be written back.
    pub fn handle_event(&mut self, event: &GameEvent) -> bool {
        match *event {
            GameEvent::RunEnded {
                final_score,
                final_distance,
                final_coins,
            } => {
                self.record_run(final_score, final_distance as u64, final_coins as u64);
                true
            }
            GameEvent::AchievementProgress { id, value } => {
                self.apply_progress(id, value).is_some()
            }
            _ => false,
        }
    }

    pub fn unlocked_count(&self) -> usize {
        self.achievements.iter().filter(|a| a.unlocked).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn test_empty_store_is_baseline() {
        let records = Records::load(&MemoryStore::new());
        assert_eq!(records, Records::default());
        assert_eq!(records.achievements.len(), 5);
    }

    #[test]
    fn test_malformed_values_read_as_zero() {
        let mut store = MemoryStore::new();
        store.set(KEY_BEST_SCORE, "lots").unwrap();
        store.set(KEY_CURRENCY, "250").unwrap();
        store.set(KEY_ACHIEVEMENTS, "not json").unwrap();
        let records = Records::load(&store);
        assert_eq!(records.best_score, 0);
        assert_eq!(records.currency, 250);
        assert_eq!(records.unlocked_count(), 0);
    }

    #[test]
    fn test_record_run() {
        let mut records = Records::default();
        let outcome = records.record_run(1200, 300, 10);
        assert!(outcome.new_best_score);
        assert!(outcome.new_best_distance);
        assert_eq!(outcome.currency_earned, 50);

        let outcome = records.record_run(800, 400, 0);
        assert!(!outcome.new_best_score);
        assert!(outcome.new_best_distance);
        assert_eq!(records.best_score, 1200);
        assert_eq!(records.best_distance, 400);
        assert_eq!(records.currency, 50);
    }

    #[test]
    fn test_unlock_once() {
        let mut records = Records::default();
        assert!(records.apply_progress(AchievementId::CoinCollector, 50).is_none());
        let unlocked = records
            .apply_progress(AchievementId::CoinCollector, 100)
            .cloned();
        assert_eq!(unlocked.map(|a| a.reward), Some(200));
        assert_eq!(records.currency, 200);

        assert!(records.apply_progress(AchievementId::CoinCollector, 150).is_none());
        assert_eq!(records.currency, 200);
    }

    #[test]
    fn test_progress_never_regresses() {
        let mut records = Records::default();
        records.apply_progress(AchievementId::DistanceRunner, 700);
        records.apply_progress(AchievementId::DistanceRunner, 20);
        assert_eq!(records.achievements[2].progress, 700);
    }

    #[test]
    fn test_save_load_round_trip() {
        let mut store = MemoryStore::new();
        let mut records = Records::default();
        records.record_run(5000, 120, 3);
        records.handle_event(&GameEvent::AchievementProgress {
            id: AchievementId::FirstRun,
            value: 1,
        });
        records.save(&mut store).unwrap();

        let loaded = Records::load(&store);
        assert_eq!(loaded, records);
        assert_eq!(loaded.unlocked_count(), 1);
        assert_eq!(store.get(KEY_BEST_SCORE).as_deref(), Some("5000"));
    }

    #[test]
    fn test_run_ended_event() {
        let mut records = Records::default();
        let changed = records.handle_event(&GameEvent::RunEnded {
            final_score: 900,
            final_distance: 42,
            final_coins: 2,
        });
        assert!(changed);
        assert_eq!(records.best_score, 900);
        assert_eq!(records.best_distance, 42);
        assert_eq!(records.currency, 10);
    }
}
