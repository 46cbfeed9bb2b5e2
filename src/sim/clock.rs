//! Frame clock: clamps raw frame time and applies slow motion

use serde::{Deserialize, Serialize};

use crate::tuning::Tuning;

/// Floor for a raw frame delta so every step moves time forward
pub const MIN_FRAME_DT: f32 = 1.0e-4;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimClock {
    pub frame_cap: f32,
    pub time_scale: f32,
    /// Real seconds of slow motion left
    pub slow_motion_remaining: f32,
    slow_motion_scale: f32,
    slow_motion_duration: f32,
    /// Simulated seconds since the run started
    pub game_time: f64,
    pub frame_count: u64,
}

impl SimClock {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            frame_cap: tuning.frame_cap,
            time_scale: 1.0,
            slow_motion_remaining: 0.0,
            slow_motion_scale: tuning.slow_motion_scale,
            slow_motion_duration: tuning.slow_motion_duration,
            game_time: 0.0,
            frame_count: 0,
        }
    }

    /// Clamp a raw host delta into `[MIN_FRAME_DT, frame_cap]`.
    ///
    /// NaN and negative deltas land on the floor, +inf on the cap.
    #[inline]
    pub fn clamp_raw(&self, raw: f32) -> f32 {
        raw.max(MIN_FRAME_DT).min(self.frame_cap)
    }

    /// Turn a raw frame delta into the step to simulate
    pub fn advance(&mut self, raw: f32) -> f32 {
        let real = self.clamp_raw(raw);
        let dt = real * self.time_scale;

        // Slow motion runs on real time so it always lasts the same wall-clock span
        if self.slow_motion_remaining > 0.0 {
            self.slow_motion_remaining -= real;
            if self.slow_motion_remaining <= 0.0 {
                self.slow_motion_remaining = 0.0;
                self.time_scale = 1.0;
            }
        }

        self.game_time += dt as f64;
        self.frame_count += 1;
        dt
    }

    pub fn start_slow_motion(&mut self) {
        self.time_scale = self.slow_motion_scale;
        self.slow_motion_remaining = self.slow_motion_duration;
    }

    #[inline]
    pub fn is_slow_motion(&self) -> bool {
        self.slow_motion_remaining > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_long_stall_is_capped() {
        let mut clock = SimClock::new(&Tuning::default());
        let dt = clock.advance(0.5);
        assert!((dt - 1.0 / 30.0).abs() < 1e-6);
    }

    #[test]
    fn test_bad_deltas_move_forward() {
        let mut clock = SimClock::new(&Tuning::default());
        for raw in [0.0, -1.0, f32::NAN, f32::NEG_INFINITY] {
            let dt = clock.advance(raw);
            assert!(dt > 0.0, "raw {raw} gave {dt}");
        }
        assert!((clock.advance(f32::INFINITY) - clock.frame_cap).abs() < 1e-6);
    }

    #[test]
    fn test_slow_motion_expires_on_real_time() {
        let tuning = Tuning::default();
        let mut clock = SimClock::new(&tuning);
        clock.start_slow_motion();

        let dt = clock.advance(1.0 / 60.0);
        assert!((dt - tuning.slow_motion_scale / 60.0).abs() < 1e-6);

        // 0.5 s of real frames ends it regardless of the scale
        for _ in 0..30 {
            clock.advance(1.0 / 60.0);
        }
        assert!(!clock.is_slow_motion());
        assert_eq!(clock.time_scale, 1.0);
    }

    proptest! {
        #[test]
        fn prop_dt_bounded(raw in proptest::num::f32::ANY, slow in any::<bool>()) {
            let mut clock = SimClock::new(&Tuning::default());
            if slow {
                clock.start_slow_motion();
            }
            let scale = clock.time_scale;
            let dt = clock.advance(raw);
            prop_assert!(dt > 0.0);
            prop_assert!(dt <= clock.frame_cap * scale + 1e-7);
        }
    }
}
