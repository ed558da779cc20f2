//! Raw key position to keyboard half classification
//!
//! Split keyboards report a single flat position index for both halves. The
//! left half owns the first `left_key_count` positions; everything at or above
//! that boundary came from the right half.

use std::fmt;
use std::time::Instant;

use crate::error::ConfigError;

/// Which physical half of a split keyboard produced an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivitySide {
    Left,
    Right,
}

impl ActivitySide {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivitySide::Left => "left",
            ActivitySide::Right => "right",
        }
    }

    /// Numeric side index as shown on the key-info display (0 = left)
    pub fn index(&self) -> u8 {
        match self {
            ActivitySide::Left => 0,
            ActivitySide::Right => 1,
        }
    }
}

impl fmt::Display for ActivitySide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Key state transition as delivered by the event source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressedOrReleased {
    Pressed,
    Released,
}

impl PressedOrReleased {
    pub fn is_pressed(&self) -> bool {
        matches!(self, PressedOrReleased::Pressed)
    }
}

impl From<bool> for PressedOrReleased {
    fn from(pressed: bool) -> Self {
        if pressed {
            PressedOrReleased::Pressed
        } else {
            PressedOrReleased::Released
        }
    }
}

/// A classified key transition, consumed once by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub side: ActivitySide,
    pub pressed: bool,
    pub timestamp: Instant,
}

impl KeyEvent {
    pub fn press(side: ActivitySide, timestamp: Instant) -> Self {
        Self {
            side,
            pressed: true,
            timestamp,
        }
    }

    pub fn release(side: ActivitySide, timestamp: Instant) -> Self {
        Self {
            side,
            pressed: false,
            timestamp,
        }
    }
}

/// Partition of the flat position space into two halves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplitBoundary {
    /// No boundary configured. Every position is treated as the left half.
    #[default]
    Unsplit,
    /// Positions below `left_key_count` belong to the left half.
    At { left_key_count: u32 },
}

impl SplitBoundary {
    /// Build a boundary after `left_key_count` keys.
    ///
    /// Zero is rejected: it would silently route every key to the right half.
    pub fn at(left_key_count: u32) -> Result<Self, ConfigError> {
        if left_key_count == 0 {
            return Err(ConfigError::InvalidThreshold(left_key_count));
        }
        Ok(SplitBoundary::At { left_key_count })
    }

    /// Boundary from an optional setting (`None` means unsplit)
    pub fn from_setting(left_key_count: Option<u32>) -> Result<Self, ConfigError> {
        match left_key_count {
            Some(n) => Self::at(n),
            None => Ok(SplitBoundary::Unsplit),
        }
    }

    /// Which half a raw position belongs to
    pub fn side_of(&self, raw_position: u32) -> ActivitySide {
        match *self {
            SplitBoundary::Unsplit => ActivitySide::Left,
            SplitBoundary::At { left_key_count } if raw_position < left_key_count => {
                ActivitySide::Left
            }
            SplitBoundary::At { .. } => ActivitySide::Right,
        }
    }

    /// Position of the first key on `side` (used for row/column offsets)
    pub fn first_position(&self, side: ActivitySide) -> u32 {
        match (*self, side) {
            (SplitBoundary::At { left_key_count }, ActivitySide::Right) => left_key_count,
            _ => 0,
        }
    }
}

/// Maps raw `(position, pressed)` notifications to [`KeyEvent`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct ActivityClassifier {
    boundary: SplitBoundary,
}

impl ActivityClassifier {
    pub fn new(boundary: SplitBoundary) -> Self {
        Self { boundary }
    }

    pub fn boundary(&self) -> SplitBoundary {
        self.boundary
    }

    /// Classify a transition observed now
    pub fn classify(&self, raw_position: u32, transition: PressedOrReleased) -> KeyEvent {
        self.classify_at(raw_position, transition, Instant::now())
    }

    /// Classify a transition observed at `timestamp`
    pub fn classify_at(
        &self,
        raw_position: u32,
        transition: PressedOrReleased,
        timestamp: Instant,
    ) -> KeyEvent {
        KeyEvent {
            side: self.boundary.side_of(raw_position),
            pressed: transition.is_pressed(),
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_partitions_positions() {
        let boundary = SplitBoundary::at(36).unwrap();
        assert_eq!(boundary.side_of(0), ActivitySide::Left);
        assert_eq!(boundary.side_of(35), ActivitySide::Left);
        assert_eq!(boundary.side_of(36), ActivitySide::Right);
        assert_eq!(boundary.side_of(71), ActivitySide::Right);
    }

    #[test]
    fn test_out_of_range_positions_still_classify() {
        let boundary = SplitBoundary::at(18).unwrap();
        assert_eq!(boundary.side_of(u32::MAX), ActivitySide::Right);
        assert_eq!(SplitBoundary::Unsplit.side_of(u32::MAX), ActivitySide::Left);
    }

    #[test]
    fn test_zero_threshold_rejected() {
        assert_eq!(
            SplitBoundary::at(0),
            Err(ConfigError::InvalidThreshold(0))
        );
        assert_eq!(
            SplitBoundary::from_setting(None),
            Ok(SplitBoundary::Unsplit)
        );
    }

    #[test]
    fn test_first_position() {
        let boundary = SplitBoundary::at(36).unwrap();
        assert_eq!(boundary.first_position(ActivitySide::Left), 0);
        assert_eq!(boundary.first_position(ActivitySide::Right), 36);
        assert_eq!(SplitBoundary::Unsplit.first_position(ActivitySide::Right), 0);
    }

    #[test]
    fn test_classify_carries_transition_and_timestamp() {
        let classifier = ActivityClassifier::new(SplitBoundary::at(18).unwrap());
        let ts = Instant::now();
        let ev = classifier.classify_at(20, PressedOrReleased::Pressed, ts);
        assert_eq!(ev, KeyEvent::press(ActivitySide::Right, ts));

        let ev = classifier.classify_at(3, false.into(), ts);
        assert_eq!(ev, KeyEvent::release(ActivitySide::Left, ts));
    }
}
