//! Host-side display sinks
//!
//! There is no screen on the host: frames go to stdout, to the log, or into a
//! timeline for replay summaries.

use std::time::Instant;

use bongo_engine::{AssetId, DisplaySink};
use parking_lot::Mutex;
use tracing::info;

/// Prints each frame change on stdout, tagged with the display name
pub struct StdoutSink {
    name: String,
}

impl StdoutSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl DisplaySink for StdoutSink {
    fn show(&self, frame: AssetId) {
        println!("[{}] {}", self.name, frame);
    }
}

/// Logs frame changes at info level
pub struct LogSink;

impl DisplaySink for LogSink {
    fn show(&self, frame: AssetId) {
        info!(frame = frame.as_str(), "Frame changed");
    }
}

/// Records every frame with the time it was shown
pub struct TimelineSink {
    started: Instant,
    entries: Mutex<Vec<(Instant, AssetId)>>,
}

impl TimelineSink {
    pub fn new(started: Instant) -> Self {
        Self {
            started,
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn frames(&self) -> Vec<AssetId> {
        self.entries.lock().iter().map(|&(_, f)| f).collect()
    }

    /// `(milliseconds since start, frame)` pairs
    pub fn timeline(&self) -> Vec<(u128, AssetId)> {
        self.entries
            .lock()
            .iter()
            .map(|&(at, frame)| {
                let ms = at
                    .checked_duration_since(self.started)
                    .map(|d| d.as_millis())
                    .unwrap_or(0);
                (ms, frame)
            })
            .collect()
    }
}

impl DisplaySink for TimelineSink {
    fn show(&self, frame: AssetId) {
        self.entries
            .lock()
            .push((tokio::time::Instant::now().into_std(), frame));
    }
}
