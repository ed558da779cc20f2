//! Animation state engine
//!
//! Owns the per-side press state and the visible [`DisplayPhase`], and applies
//! the transition rules for key events and timer ticks.
//!
//! ```text
//!            press                      release (none down)
//!  Resting ─────────► LeftOnly ◄──► Both ◄──► RightOnly ─────────► Settled
//!     ▲                                                               │
//!     └──────────────────── tick, cooldown elapsed ───────────────────┘
//! ```
//!
//! A release never returns straight to `Resting`; only the idle timeout does.

use std::fmt;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::classifier::{ActivitySide, KeyEvent};

/// Externally visible animation state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayPhase {
    /// No recent activity (idle pose)
    Resting,
    /// Recently active, nothing held, cooldown still running
    Settled,
    LeftOnly,
    RightOnly,
    Both,
}

impl DisplayPhase {
    pub const ALL: [DisplayPhase; 5] = [
        DisplayPhase::Resting,
        DisplayPhase::Settled,
        DisplayPhase::LeftOnly,
        DisplayPhase::RightOnly,
        DisplayPhase::Both,
    ];

    /// Phase for a pair of held sides, or `None` when neither is held
    pub fn from_sides(left_down: bool, right_down: bool) -> Option<Self> {
        match (left_down, right_down) {
            (true, true) => Some(DisplayPhase::Both),
            (true, false) => Some(DisplayPhase::LeftOnly),
            (false, true) => Some(DisplayPhase::RightOnly),
            (false, false) => None,
        }
    }

    /// True for the phases shown while at least one side is held
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            DisplayPhase::LeftOnly | DisplayPhase::RightOnly | DisplayPhase::Both
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayPhase::Resting => "resting",
            DisplayPhase::Settled => "settled",
            DisplayPhase::LeftOnly => "left",
            DisplayPhase::RightOnly => "right",
            DisplayPhase::Both => "both",
        }
    }
}

impl fmt::Display for DisplayPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Result of applying an event or tick
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChange {
    /// Visible phase is the same; no redraw needed
    Unchanged,
    /// Visible phase moved; the display should redraw
    Changed {
        from: DisplayPhase,
        to: DisplayPhase,
    },
}

impl StateChange {
    fn between(from: DisplayPhase, to: DisplayPhase) -> Self {
        if from == to {
            StateChange::Unchanged
        } else {
            StateChange::Changed { from, to }
        }
    }

    pub fn is_changed(&self) -> bool {
        matches!(self, StateChange::Changed { .. })
    }
}

/// Inputs to frame selection, copied out of the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseSnapshot {
    pub phase: DisplayPhase,
    pub ever_active: bool,
}

/// The engine's mutable state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationState {
    left_down: bool,
    right_down: bool,
    phase: DisplayPhase,
    last_activity: Instant,
    ever_active: bool,
}

impl AnimationState {
    /// Power-on state: resting, never used
    pub fn new(created: Instant) -> Self {
        Self {
            left_down: false,
            right_down: false,
            phase: DisplayPhase::Resting,
            last_activity: created,
            ever_active: false,
        }
    }

    pub fn left_down(&self) -> bool {
        self.left_down
    }

    pub fn right_down(&self) -> bool {
        self.right_down
    }

    pub fn phase(&self) -> DisplayPhase {
        self.phase
    }

    pub fn last_activity(&self) -> Instant {
        self.last_activity
    }

    pub fn ever_active(&self) -> bool {
        self.ever_active
    }

    pub fn any_down(&self) -> bool {
        self.left_down || self.right_down
    }

    fn side_mut(&mut self, side: ActivitySide) -> &mut bool {
        match side {
            ActivitySide::Left => &mut self.left_down,
            ActivitySide::Right => &mut self.right_down,
        }
    }

    /// Check the phase/press-state invariants
    pub fn is_consistent(&self) -> bool {
        match self.phase {
            DisplayPhase::Both => self.left_down && self.right_down,
            DisplayPhase::LeftOnly => self.left_down && !self.right_down,
            DisplayPhase::RightOnly => !self.left_down && self.right_down,
            DisplayPhase::Resting | DisplayPhase::Settled => !self.any_down(),
        }
    }
}

/// Applies key events and ticks to an [`AnimationState`]
#[derive(Debug, Clone)]
pub struct AnimationEngine {
    state: AnimationState,
    cooldown: Duration,
}

impl AnimationEngine {
    pub fn new(cooldown: Duration, created: Instant) -> Self {
        Self {
            state: AnimationState::new(created),
            cooldown,
        }
    }

    pub fn state(&self) -> &AnimationState {
        &self.state
    }

    pub fn phase(&self) -> DisplayPhase {
        self.state.phase
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn snapshot(&self) -> PhaseSnapshot {
        PhaseSnapshot {
            phase: self.state.phase,
            ever_active: self.state.ever_active,
        }
    }

    /// Apply one press or release
    pub fn on_key_event(&mut self, event: KeyEvent) -> StateChange {
        let held = self.state.side_mut(event.side);
        if !event.pressed && !*held {
            debug!("Ignoring release of idle {} half", event.side);
            return StateChange::Unchanged;
        }
        *held = event.pressed;

        self.observe_activity(event.timestamp);
        self.state.ever_active = true;

        let from = self.state.phase;
        let to = DisplayPhase::from_sides(self.state.left_down, self.state.right_down)
            .unwrap_or(DisplayPhase::Settled);
        self.state.phase = to;

        let change = StateChange::between(from, to);
        if change.is_changed() {
            debug!(
                "{} {} half: {} -> {}",
                if event.pressed { "Press" } else { "Release" },
                event.side,
                from,
                to
            );
        }
        change
    }

    /// Re-evaluate idle decay at `now`
    pub fn on_tick(&mut self, now: Instant) -> StateChange {
        if self.state.any_down() || self.state.phase != DisplayPhase::Settled {
            return StateChange::Unchanged;
        }

        let idle = match now.checked_duration_since(self.state.last_activity) {
            Some(elapsed) => elapsed,
            None => {
                warn!(
                    "Clock regression on tick: {:?} before last activity",
                    self.state.last_activity - now
                );
                Duration::ZERO
            }
        };

        if idle < self.cooldown {
            return StateChange::Unchanged;
        }

        self.state.phase = DisplayPhase::Resting;
        debug!("Idle for {:?}: settled -> resting", idle);
        StateChange::Changed {
            from: DisplayPhase::Settled,
            to: DisplayPhase::Resting,
        }
    }

    fn observe_activity(&mut self, timestamp: Instant) {
        if timestamp < self.state.last_activity {
            warn!(
                "Clock regression on key event: {:?} before last activity",
                self.state.last_activity - timestamp
            );
            return;
        }
        self.state.last_activity = timestamp;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COOLDOWN: Duration = Duration::from_millis(3000);

    fn ms(base: Instant, n: u64) -> Instant {
        base + Duration::from_millis(n)
    }

    #[test]
    fn test_initial_state() {
        let t0 = Instant::now();
        let engine = AnimationEngine::new(COOLDOWN, t0);
        assert_eq!(engine.phase(), DisplayPhase::Resting);
        assert!(!engine.state().ever_active());
        assert_eq!(engine.state().last_activity(), t0);
        assert!(engine.state().is_consistent());
    }

    #[test]
    fn test_press_from_resting() {
        let t0 = Instant::now();
        let mut engine = AnimationEngine::new(COOLDOWN, t0);
        let change = engine.on_key_event(KeyEvent::press(ActivitySide::Right, ms(t0, 1)));
        assert_eq!(
            change,
            StateChange::Changed {
                from: DisplayPhase::Resting,
                to: DisplayPhase::RightOnly
            }
        );
        assert!(engine.state().ever_active());
        assert_eq!(engine.state().last_activity(), ms(t0, 1));
    }

    #[test]
    fn test_release_settles_not_rests() {
        let t0 = Instant::now();
        let mut engine = AnimationEngine::new(COOLDOWN, t0);
        let _ = engine.on_key_event(KeyEvent::press(ActivitySide::Left, t0));
        let change = engine.on_key_event(KeyEvent::release(ActivitySide::Left, ms(t0, 5)));
        assert_eq!(
            change,
            StateChange::Changed {
                from: DisplayPhase::LeftOnly,
                to: DisplayPhase::Settled
            }
        );
    }

    #[test]
    fn test_repeat_press_same_side_is_unchanged() {
        let t0 = Instant::now();
        let mut engine = AnimationEngine::new(COOLDOWN, t0);
        let _ = engine.on_key_event(KeyEvent::press(ActivitySide::Left, t0));
        let change = engine.on_key_event(KeyEvent::press(ActivitySide::Left, ms(t0, 40)));
        assert_eq!(change, StateChange::Unchanged);
        // Still counts as activity
        assert_eq!(engine.state().last_activity(), ms(t0, 40));
    }

    #[test]
    fn test_release_of_idle_side_is_noop() {
        let t0 = Instant::now();
        let mut engine = AnimationEngine::new(COOLDOWN, t0);
        let before = engine.state().clone();
        let change = engine.on_key_event(KeyEvent::release(ActivitySide::Left, ms(t0, 7)));
        assert_eq!(change, StateChange::Unchanged);
        assert_eq!(engine.state(), &before);
        assert!(!engine.state().ever_active());
    }

    #[test]
    fn test_tick_before_cooldown_is_unchanged() {
        let t0 = Instant::now();
        let mut engine = AnimationEngine::new(COOLDOWN, t0);
        let _ = engine.on_key_event(KeyEvent::press(ActivitySide::Left, t0));
        let _ = engine.on_key_event(KeyEvent::release(ActivitySide::Left, ms(t0, 10)));
        assert_eq!(engine.on_tick(ms(t0, 3009)), StateChange::Unchanged);
        assert_eq!(engine.phase(), DisplayPhase::Settled);
    }

    #[test]
    fn test_tick_at_cooldown_decays_once() {
        let t0 = Instant::now();
        let mut engine = AnimationEngine::new(COOLDOWN, t0);
        let _ = engine.on_key_event(KeyEvent::press(ActivitySide::Left, t0));
        let _ = engine.on_key_event(KeyEvent::release(ActivitySide::Left, ms(t0, 10)));
        assert_eq!(
            engine.on_tick(ms(t0, 3010)),
            StateChange::Changed {
                from: DisplayPhase::Settled,
                to: DisplayPhase::Resting
            }
        );
        assert_eq!(engine.on_tick(ms(t0, 9000)), StateChange::Unchanged);
        assert!(engine.state().ever_active());
    }

    #[test]
    fn test_cold_resting_never_decays() {
        let t0 = Instant::now();
        let mut engine = AnimationEngine::new(COOLDOWN, t0);
        assert_eq!(engine.on_tick(ms(t0, 60_000)), StateChange::Unchanged);
        assert!(!engine.state().ever_active());
    }

    #[test]
    fn test_tick_clock_regression_is_tolerated() {
        let t0 = Instant::now();
        let mut engine = AnimationEngine::new(COOLDOWN, ms(t0, 100));
        let _ = engine.on_key_event(KeyEvent::press(ActivitySide::Left, ms(t0, 100)));
        let _ = engine.on_key_event(KeyEvent::release(ActivitySide::Left, ms(t0, 200)));
        assert_eq!(engine.on_tick(t0), StateChange::Unchanged);
        assert_eq!(engine.phase(), DisplayPhase::Settled);
    }

    #[test]
    fn test_event_clock_regression_keeps_last_activity() {
        let t0 = Instant::now();
        let mut engine = AnimationEngine::new(COOLDOWN, t0);
        let _ = engine.on_key_event(KeyEvent::press(ActivitySide::Left, ms(t0, 500)));
        let change = engine.on_key_event(KeyEvent::press(ActivitySide::Right, ms(t0, 100)));
        assert_eq!(
            change,
            StateChange::Changed {
                from: DisplayPhase::LeftOnly,
                to: DisplayPhase::Both
            }
        );
        assert_eq!(engine.state().last_activity(), ms(t0, 500));
    }

    #[test]
    fn test_from_sides() {
        assert_eq!(DisplayPhase::from_sides(false, false), None);
        assert_eq!(
            DisplayPhase::from_sides(true, true),
            Some(DisplayPhase::Both)
        );
        assert!(DisplayPhase::LeftOnly.is_active());
        assert!(!DisplayPhase::Settled.is_active());
    }
}
