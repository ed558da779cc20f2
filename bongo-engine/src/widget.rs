//! Shared engine and display fan-out
//!
//! One [`AnimationWidget`] per keyboard. Any number of display sinks (one per
//! screen) can register with it; they all show the same animation.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::classifier::{ActivityClassifier, KeyEvent, PressedOrReleased};
use crate::config::EngineConfig;
use crate::engine::{AnimationEngine, PhaseSnapshot, StateChange};
use crate::frames::{AssetId, FrameTable};

/// Something that can put an animation frame on a screen
pub trait DisplaySink: Send + Sync {
    fn show(&self, frame: AssetId);
}

/// Engine handle shared by the event path and the timer path.
///
/// Every mutation takes the same lock, so a key event and a tick never
/// interleave inside a transition.
#[derive(Debug, Clone)]
pub struct SharedEngine {
    inner: Arc<Mutex<AnimationEngine>>,
}

impl SharedEngine {
    pub fn new(engine: AnimationEngine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    /// Apply a key event; returns the change and the state it produced
    pub fn on_key_event(&self, event: KeyEvent) -> (StateChange, PhaseSnapshot) {
        let mut engine = self.inner.lock();
        let change = engine.on_key_event(event);
        (change, engine.snapshot())
    }

    /// Evaluate decay at `now`; returns the change and the state it produced
    pub fn on_tick(&self, now: Instant) -> (StateChange, PhaseSnapshot) {
        let mut engine = self.inner.lock();
        let change = engine.on_tick(now);
        (change, engine.snapshot())
    }

    pub fn snapshot(&self) -> PhaseSnapshot {
        self.inner.lock().snapshot()
    }

    /// Run `f` against the engine while holding the lock
    pub fn with_engine<R>(&self, f: impl FnOnce(&AnimationEngine) -> R) -> R {
        f(&self.inner.lock())
    }
}

/// Classifier, engine, frame table and the sinks showing the result
pub struct AnimationWidget {
    classifier: ActivityClassifier,
    engine: SharedEngine,
    frames: FrameTable,
    sinks: RwLock<Vec<Arc<dyn DisplaySink>>>,
    // Serializes redraws so the last frame pushed to a sink is never stale
    redraw_lock: Mutex<()>,
}

impl AnimationWidget {
    pub fn new(config: &EngineConfig, frames: FrameTable) -> Self {
        Self::with_start_time(config, frames, Instant::now())
    }

    pub fn with_start_time(config: &EngineConfig, frames: FrameTable, created: Instant) -> Self {
        Self {
            classifier: ActivityClassifier::new(config.boundary()),
            engine: SharedEngine::new(AnimationEngine::new(config.cooldown(), created)),
            frames,
            sinks: RwLock::new(Vec::new()),
            redraw_lock: Mutex::new(()),
        }
    }

    pub fn engine(&self) -> &SharedEngine {
        &self.engine
    }

    pub fn classifier(&self) -> &ActivityClassifier {
        &self.classifier
    }

    pub fn frames(&self) -> &FrameTable {
        &self.frames
    }

    /// Register a display; it immediately receives the current frame
    pub fn add_sink(&self, sink: Arc<dyn DisplaySink>) {
        let _guard = self.redraw_lock.lock();
        sink.show(self.current_frame());
        self.sinks.write().push(sink);
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.read().len()
    }

    /// Frame a display should show right now
    pub fn current_frame(&self) -> AssetId {
        self.frames.select_snapshot(self.engine.snapshot())
    }

    /// Raw position notification from the event source, observed now
    pub fn handle_position(&self, raw_position: u32, pressed: bool) -> StateChange {
        self.handle_position_at(raw_position, pressed, Instant::now())
    }

    pub fn handle_position_at(
        &self,
        raw_position: u32,
        pressed: bool,
        timestamp: Instant,
    ) -> StateChange {
        let event = self.classifier.classify_at(
            raw_position,
            PressedOrReleased::from(pressed),
            timestamp,
        );
        self.handle_event(event)
    }

    pub fn handle_event(&self, event: KeyEvent) -> StateChange {
        let (change, _) = self.engine.on_key_event(event);
        if change.is_changed() {
            self.redraw();
        }
        change
    }

    /// Timer entry point
    pub fn tick(&self, now: Instant) -> StateChange {
        let (change, _) = self.engine.on_tick(now);
        if change.is_changed() {
            self.redraw();
        }
        change
    }

    fn redraw(&self) {
        let _guard = self.redraw_lock.lock();
        let frame = self.current_frame();
        let sinks = self.sinks.read();
        debug!("Redraw {} on {} display(s)", frame, sinks.len());
        for sink in sinks.iter() {
            sink.show(frame);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::SplitBoundary;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingSink {
        frames: Mutex<Vec<AssetId>>,
    }

    impl DisplaySink for RecordingSink {
        fn show(&self, frame: AssetId) {
            self.frames.lock().push(frame);
        }
    }

    fn widget(t0: Instant) -> AnimationWidget {
        let config = EngineConfig::new(
            SplitBoundary::at(36).unwrap(),
            Duration::from_millis(1000),
            Duration::from_millis(100),
        )
        .unwrap();
        AnimationWidget::with_start_time(&config, FrameTable::default(), t0)
    }

    #[test]
    fn test_sink_gets_initial_frame() {
        let w = widget(Instant::now());
        let sink = Arc::new(RecordingSink::default());
        w.add_sink(sink.clone());
        assert_eq!(*sink.frames.lock(), vec![AssetId::Both1Open]);
    }

    #[test]
    fn test_all_sinks_redraw_on_change() {
        let t0 = Instant::now();
        let w = widget(t0);
        let a = Arc::new(RecordingSink::default());
        let b = Arc::new(RecordingSink::default());
        w.add_sink(a.clone());
        w.add_sink(b.clone());
        assert_eq!(w.sink_count(), 2);

        assert!(w.handle_position_at(40, true, t0).is_changed());
        assert!(!w.handle_position_at(41, true, t0).is_changed());

        for sink in [&a, &b] {
            assert_eq!(
                *sink.frames.lock(),
                vec![AssetId::Both1Open, AssetId::Right1]
            );
        }
    }

    #[test]
    fn test_tick_redraws_decayed_idle() {
        let t0 = Instant::now();
        let w = widget(t0);
        let sink = Arc::new(RecordingSink::default());
        w.add_sink(sink.clone());

        let _ = w.handle_position_at(2, true, t0);
        let _ = w.handle_position_at(2, false, t0 + Duration::from_millis(10));
        assert!(!w.tick(t0 + Duration::from_millis(500)).is_changed());
        assert!(w.tick(t0 + Duration::from_millis(1010)).is_changed());

        assert_eq!(
            *sink.frames.lock(),
            vec![
                AssetId::Both1Open,
                AssetId::Left1,
                AssetId::Both1,
                AssetId::None
            ]
        );
        assert_eq!(w.current_frame(), AssetId::None);
    }
}
