//! Frame events
//!
//! The simulation never calls out. Everything the outer layers care about
//! (records, sound, HUD flashes) is pushed here and drained once per frame.

use serde::{Deserialize, Serialize};

use super::state::{GamePhase, PowerUpKind};

/// What was picked up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PickupKind {
    Coin,
    PowerUp(PowerUpKind),
}

/// Tracked achievements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AchievementId {
    FirstRun,
    CoinCollector,
    DistanceRunner,
    ScoreMaster,
    Survivor,
}

impl AchievementId {
    pub const ALL: [AchievementId; 5] = [
        AchievementId::FirstRun,
        AchievementId::CoinCollector,
        AchievementId::DistanceRunner,
        AchievementId::ScoreMaster,
        AchievementId::Survivor,
    ];

    /// Stable storage key
    pub fn as_str(&self) -> &'static str {
        match self {
            AchievementId::FirstRun => "first_run",
            AchievementId::CoinCollector => "coin_collector",
            AchievementId::DistanceRunner => "distance_runner",
            AchievementId::ScoreMaster => "score_master",
            AchievementId::Survivor => "survivor",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.as_str() == s)
    }

    #[inline]
    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// Events emitted by the simulation during a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    RunStarted,
    RunEnded {
        final_score: u64,
        /// Metres
        final_distance: u32,
        final_coins: u32,
    },
    DamageTaken {
        lives_left: u8,
    },
    ShieldBroken,
    PickupCollected {
        kind: PickupKind,
        /// Points awarded (0 for power-ups)
        value: u64,
    },
    PowerUpActivated {
        kind: PowerUpKind,
    },
    ComboMilestone {
        count: u32,
    },
    Jumped,
    Slid,
    AchievementProgress {
        id: AchievementId,
        value: u64,
    },
    PhaseChanged {
        from: GamePhase,
        to: GamePhase,
    },
}
