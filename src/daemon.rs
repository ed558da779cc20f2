//! Bongo cat daemon: event source + tick timer + displays.
//!
//! Two entry points share one [`Session`]:
//! - [`run`] reads events from stdin until EOF or Ctrl-C
//! - [`replay`] plays a script, honoring its `wait` lines
//!
//! The tick timer runs as its own task; it and the event loop both go through
//! the widget's engine lock.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use bongo_engine::{
    AnimationWidget, AssetId, DisplaySink, EngineConfig, StateChange, TimerDriver,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::input::{self, InputLine};
use crate::key_info::{KeyInfo, KeyInfoLabels};
use crate::sink::{LogSink, StdoutSink, TimelineSink};

/// How often the key-info hold timer refreshes while a key is down
const KEY_INFO_REFRESH: Duration = Duration::from_millis(100);

/// Display and telemetry options shared by `run` and `replay`
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    /// Number of stdout displays showing the animation
    pub displays: usize,
    /// Show the key-info labels
    pub key_info: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            displays: 1,
            key_info: false,
        }
    }
}

/// Result of feeding one input line to a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Applied {
    pub animation: StateChange,
    pub key_info_changed: bool,
}

/// Widget, timer and optional key-info state for one keyboard
pub struct Session {
    widget: Arc<AnimationWidget>,
    timer: TimerDriver,
    key_info: Option<KeyInfo>,
}

impl Session {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let engine = config.engine_config().context("invalid configuration")?;
        let layout = config.key_layout().context("invalid configuration")?;
        Ok(Self::from_parts(&engine, config, Some(KeyInfo::new(layout))))
    }

    fn from_parts(engine: &EngineConfig, config: &AppConfig, key_info: Option<KeyInfo>) -> Self {
        Self {
            widget: Arc::new(AnimationWidget::new(engine, config.frames)),
            timer: TimerDriver::new(engine.tick_period()),
            key_info,
        }
    }

    pub fn widget(&self) -> &Arc<AnimationWidget> {
        &self.widget
    }

    pub fn key_info(&self) -> Option<&KeyInfo> {
        self.key_info.as_ref()
    }

    pub fn without_key_info(mut self) -> Self {
        self.key_info = None;
        self
    }

    pub fn add_display(&self, sink: Arc<dyn DisplaySink>) {
        self.widget.add_sink(sink);
    }

    /// Start periodic decay checks (needs a tokio runtime)
    pub fn start_timer(&self) -> bool {
        self.timer.drive(Arc::clone(&self.widget))
    }

    pub async fn stop_timer(&self) {
        self.timer.stop().await;
    }

    /// Apply one input line observed at `now`. `wait` lines are not events
    /// and are ignored here.
    pub fn apply(&mut self, line: InputLine, now: Instant) -> Applied {
        let mut applied = Applied {
            animation: StateChange::Unchanged,
            key_info_changed: false,
        };
        match line {
            InputLine::Position { position, pressed } => {
                applied.animation = self.widget.handle_position_at(position, pressed, now);
                if let Some(info) = self.key_info.as_mut() {
                    info.on_position(position, pressed, now);
                    applied.key_info_changed = true;
                }
            }
            InputLine::Keycode(code) => {
                if let Some(info) = self.key_info.as_mut() {
                    // Keycode events follow the position press that produced them
                    let pressed = info.is_pressed();
                    info.on_keycode(code, pressed);
                    applied.key_info_changed = true;
                }
            }
            InputLine::Layer(layer) => {
                if let Some(info) = self.key_info.as_mut() {
                    info.on_layer(layer, true);
                    applied.key_info_changed = true;
                }
            }
            InputLine::Modifiers(bits) => {
                if let Some(info) = self.key_info.as_mut() {
                    info.on_modifiers(bits);
                    applied.key_info_changed = true;
                }
            }
            InputLine::Wait(_) => {}
        }
        applied
    }

    /// Hold-time refresh; returns fresh labels if the timing changed
    pub fn refresh_key_info(&mut self, now: Instant) -> Option<KeyInfoLabels> {
        let info = self.key_info.as_mut()?;
        info.refresh(now).then(|| info.labels())
    }

    fn key_info_held(&self) -> bool {
        self.key_info.as_ref().is_some_and(KeyInfo::is_pressed)
    }
}

fn print_key_info(labels: &KeyInfoLabels) {
    println!("  {}", labels.lines().join(" | "));
}

fn attach_displays(session: &Session, options: SessionOptions) {
    for idx in 0..options.displays {
        session.add_display(Arc::new(StdoutSink::new(format!("display-{idx}"))));
    }
    session.add_display(Arc::new(LogSink));
}

enum SourceMessage {
    Line(usize, String),
    Eof,
    Interrupted,
}

/// Run the daemon on stdin events (blocking until EOF or Ctrl-C)
pub async fn run(config: &AppConfig, options: SessionOptions) -> anyhow::Result<()> {
    let mut session = Session::new(config)?;
    if !options.key_info {
        session = session.without_key_info();
    }
    attach_displays(&session, options);

    let (tx, mut rx) = mpsc::channel::<SourceMessage>(64);

    // Set up Ctrl-C handler
    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        let tx = tx.clone();
        ctrlc::set_handler(move || {
            running.store(false, Ordering::SeqCst);
            let _ = tx.try_send(SourceMessage::Interrupted);
        })
        .context("failed to install Ctrl-C handler")?;
    }

    // Event source: one line per key transition
    let reader = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut line_no = 0;
        loop {
            match lines.next_line().await {
                Ok(Some(text)) => {
                    line_no += 1;
                    if tx.send(SourceMessage::Line(line_no, text)).await.is_err() {
                        break;
                    }
                }
                Ok(None) => {
                    let _ = tx.send(SourceMessage::Eof).await;
                    break;
                }
                Err(e) => {
                    warn!("stdin read error: {}", e);
                    let _ = tx.send(SourceMessage::Eof).await;
                    break;
                }
            }
        }
    });

    session.start_timer();
    info!("Ready. Reading events from stdin, Ctrl+C to stop.");

    let mut refresh = tokio::time::interval(KEY_INFO_REFRESH);
    refresh.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    while running.load(Ordering::SeqCst) {
        tokio::select! {
            msg = rx.recv() => match msg {
                Some(SourceMessage::Line(line_no, text)) => match input::parse_line(&text) {
                    Ok(Some(InputLine::Wait(_))) => {
                        warn!("line {}: wait is only supported in replay scripts", line_no);
                    }
                    Ok(Some(line)) => {
                        let applied = session.apply(line, Instant::now());
                        if applied.key_info_changed {
                            if let Some(info) = session.key_info() {
                                print_key_info(&info.labels());
                            }
                        }
                    }
                    Ok(None) => {}
                    Err(e) => warn!("line {}: {}", line_no, e),
                },
                Some(SourceMessage::Eof) | None => {
                    debug!("Event source closed");
                    break;
                }
                Some(SourceMessage::Interrupted) => break,
            },
            _ = refresh.tick(), if session.key_info_held() => {
                if let Some(labels) = session.refresh_key_info(Instant::now()) {
                    print_key_info(&labels);
                }
            }
        }
    }

    info!("Stopping...");
    session.stop_timer().await;
    reader.abort();
    Ok(())
}

/// Options specific to script replay
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplayOptions {
    /// Keep running after the last line until the idle pose is reached
    pub settle: bool,
    /// Print a frame timeline when done
    pub summary: bool,
}

/// Play a script of timed events through a live session.
///
/// Returns every frame shown during the replay as
/// `(milliseconds since start, frame)`.
pub async fn replay(
    config: &AppConfig,
    script: &Path,
    options: SessionOptions,
    replay_options: ReplayOptions,
) -> anyhow::Result<Vec<(u128, AssetId)>> {
    let text = std::fs::read_to_string(script)
        .with_context(|| format!("failed to read {}", script.display()))?;
    let lines = input::parse_script(&text)
        .with_context(|| format!("failed to parse {}", script.display()))?;

    let mut session = Session::new(config)?;
    if !options.key_info {
        session = session.without_key_info();
    }
    let started = tokio::time::Instant::now().into_std();
    let timeline = Arc::new(TimelineSink::new(started));
    attach_displays(&session, options);
    session.add_display(timeline.clone());

    session.start_timer();
    info!("Replaying {} events from {}", lines.len(), script.display());

    for line in lines {
        match line {
            InputLine::Wait(delay) => tokio::time::sleep(delay).await,
            other => {
                let applied = session.apply(other, tokio::time::Instant::now().into_std());
                if applied.key_info_changed {
                    if let Some(info) = session.key_info() {
                        print_key_info(&info.labels());
                    }
                }
            }
        }
    }

    if replay_options.settle {
        let engine = config.engine_config()?;
        // One extra tick covers the polling lag after the cooldown
        tokio::time::sleep(engine.cooldown() + engine.tick_period()).await;
    }

    session.stop_timer().await;

    let frames = timeline.timeline();
    if replay_options.summary {
        println!("Timeline:");
        for (ms, frame) in &frames {
            println!("  {ms:>8} ms  {frame}");
        }
    }
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bongo_engine::{AssetId, DisplayPhase};

    fn session() -> Session {
        Session::new(&AppConfig::template()).unwrap()
    }

    #[test]
    fn test_session_requires_timing() {
        let err = Session::new(&AppConfig::default()).err().unwrap();
        assert!(format!("{err:#}").contains("timing.cooldown_ms"));
    }

    #[test]
    fn test_apply_position_updates_both_widgets() {
        let mut s = session();
        let t0 = Instant::now();
        let applied = s.apply(
            InputLine::Position {
                position: 3,
                pressed: true,
            },
            t0,
        );
        assert!(applied.animation.is_changed());
        assert!(applied.key_info_changed);
        assert_eq!(s.widget().current_frame(), AssetId::Left1);

        let _ = s.apply(InputLine::Keycode(0x04), t0);
        let labels = s.key_info().unwrap().labels();
        assert_eq!(labels.keycode, "Key: A (0x0004)");
    }

    #[test]
    fn test_telemetry_lines_do_not_touch_animation() {
        let mut s = session();
        let t0 = Instant::now();
        for line in [
            InputLine::Keycode(0x05),
            InputLine::Layer(1),
            InputLine::Modifiers(0x02),
        ] {
            let applied = s.apply(line, t0);
            assert_eq!(applied.animation, StateChange::Unchanged);
        }
        assert_eq!(
            s.widget().engine().snapshot().phase,
            DisplayPhase::Resting
        );
        assert_eq!(s.key_info().unwrap().labels().layer, "Layer: 1");
    }

    #[test]
    fn test_without_key_info() {
        let mut s = session().without_key_info();
        let applied = s.apply(InputLine::Layer(3), Instant::now());
        assert!(!applied.key_info_changed);
        assert!(s.refresh_key_info(Instant::now()).is_none());
    }
}
