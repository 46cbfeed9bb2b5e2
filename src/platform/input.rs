//! Keyboard and touch mapping to game intents
//!
//! Host listeners translate raw events into `Intent`s and latch them into
//! the next `TickInput`. Nothing here touches the DOM, so it runs in tests.

use crate::sim::TickInput;

/// Minimum vertical travel for a swipe (CSS pixels)
pub const SWIPE_MIN_DISTANCE: f32 = 50.0;
/// Maximum duration of a swipe (milliseconds)
pub const SWIPE_MAX_MS: f64 = 300.0;

/// Abstract player intent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    JumpPressed,
    JumpReleased,
    SlidePressed,
    Pause,
    Start,
}

/// Map a `KeyboardEvent.code` to an intent
pub fn key_intent(code: &str, pressed: bool) -> Option<Intent> {
    match (code, pressed) {
        ("Space" | "ArrowUp" | "KeyW", true) => Some(Intent::JumpPressed),
        ("Space" | "ArrowUp" | "KeyW", false) => Some(Intent::JumpReleased),
        ("ArrowDown" | "KeyS", true) => Some(Intent::SlidePressed),
        ("KeyP" | "Escape", true) => Some(Intent::Pause),
        ("Enter", true) => Some(Intent::Start),
        _ => None,
    }
}

/// Keys whose default browser action (scrolling) should be suppressed
pub fn is_game_key(code: &str) -> bool {
    matches!(code, "Space" | "ArrowUp" | "ArrowDown")
}

/// Tracks one touch for tap zones and vertical swipes
#[derive(Debug, Clone, Default)]
pub struct TouchTracker {
    start: Option<(f32, f64)>,
    /// A swipe already fired for the current touch
    swiped: bool,
}

impl TouchTracker {
    /// Touch began at `y` of a surface `height` tall
    pub fn touch_start(&mut self, y: f32, height: f32, time_ms: f64) -> Intent {
        self.start = Some((y, time_ms));
        self.swiped = false;
        if y < height * 0.5 {
            Intent::JumpPressed
        } else {
            Intent::SlidePressed
        }
    }

    /// Touch moved; fires at most one swipe per touch
    pub fn touch_move(&mut self, y: f32, time_ms: f64) -> Option<Intent> {
        let (y0, t0) = self.start?;
        if self.swiped || time_ms - t0 > SWIPE_MAX_MS {
            return None;
        }
        let dy = y - y0;
        if dy.abs() < SWIPE_MIN_DISTANCE {
            return None;
        }
        self.swiped = true;
        Some(if dy < 0.0 {
            Intent::JumpPressed
        } else {
            Intent::SlidePressed
        })
    }

    pub fn touch_end(&mut self) -> Intent {
        self.start = None;
        self.swiped = false;
        Intent::JumpReleased
    }
}

/// Latch an intent into the pending input
pub fn apply_intent(input: &mut TickInput, intent: Intent) {
    match intent {
        Intent::JumpPressed => input.jump_pressed = true,
        Intent::JumpReleased => input.jump_released = true,
        Intent::SlidePressed => input.slide_pressed = true,
        Intent::Pause => input.pause = !input.pause,
        Intent::Start => input.start = true,
    }
}

/// Take the latched intents for this frame, keeping sticky modes
pub fn take_input(pending: &mut TickInput) -> TickInput {
    let idle_mode = pending.idle_mode;
    let input = std::mem::take(pending);
    pending.idle_mode = idle_mode;
    input
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyboard_mapping() {
        assert_eq!(key_intent("Space", true), Some(Intent::JumpPressed));
        assert_eq!(key_intent("KeyW", false), Some(Intent::JumpReleased));
        assert_eq!(key_intent("ArrowDown", true), Some(Intent::SlidePressed));
        assert_eq!(key_intent("ArrowDown", false), None);
        assert_eq!(key_intent("Escape", true), Some(Intent::Pause));
        assert_eq!(key_intent("Enter", true), Some(Intent::Start));
        assert_eq!(key_intent("KeyQ", true), None);
    }

    #[test]
    fn test_touch_zones() {
        let mut touch = TouchTracker::default();
        assert_eq!(touch.touch_start(100.0, 600.0, 0.0), Intent::JumpPressed);
        assert_eq!(touch.touch_end(), Intent::JumpReleased);
        assert_eq!(touch.touch_start(500.0, 600.0, 0.0), Intent::SlidePressed);
    }

    #[test]
    fn test_swipes() {
        let mut touch = TouchTracker::default();
        touch.touch_start(300.0, 600.0, 0.0);
        assert_eq!(touch.touch_move(280.0, 50.0), None);
        assert_eq!(touch.touch_move(240.0, 100.0), Some(Intent::JumpPressed));
        assert_eq!(touch.touch_move(100.0, 150.0), None, "one swipe per touch");

        touch.touch_end();
        touch.touch_start(300.0, 600.0, 1000.0);
        assert_eq!(touch.touch_move(400.0, 1100.0), Some(Intent::SlidePressed));

        touch.touch_end();
        touch.touch_start(300.0, 600.0, 2000.0);
        assert_eq!(touch.touch_move(400.0, 2400.0), None, "too slow");
    }

    #[test]
    fn test_latching() {
        let mut pending = TickInput {
            idle_mode: true,
            ..Default::default()
        };
        apply_intent(&mut pending, Intent::JumpPressed);
        apply_intent(&mut pending, Intent::JumpReleased);
        apply_intent(&mut pending, Intent::Pause);
        apply_intent(&mut pending, Intent::Pause);

        let input = take_input(&mut pending);
        assert!(input.jump_pressed && input.jump_released);
        assert!(!input.pause, "double pause cancels out");
        assert!(pending.is_empty());
        assert!(pending.idle_mode);
    }
}
