//! Periodic tick driver
//!
//! Polls the engine for idle decay at a fixed period on the tokio runtime.
//! Decay is checked at tick granularity, so the idle pose can appear up to one
//! period after the cooldown has elapsed.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::widget::AnimationWidget;

struct RunningTimer {
    stop_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// Fixed-period timer with idempotent start/stop
pub struct TimerDriver {
    period: Duration,
    running: Mutex<Option<RunningTimer>>,
}

impl TimerDriver {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            running: Mutex::new(None),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        self.running.lock().is_some()
    }

    /// Start calling `on_tick` every period. Must be called inside a tokio
    /// runtime. Returns `false` if the timer was already running.
    pub fn start<F>(&self, mut on_tick: F) -> bool
    where
        F: FnMut(Instant) + Send + 'static,
    {
        let mut slot = self.running.lock();
        if slot.is_some() {
            warn!("Tick timer already running");
            return false;
        }

        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let period = self.period;
        let first = time::Instant::now() + period;
        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(first, period);
            // A slow tick pushes the schedule back instead of bursting to catch up
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = &mut stop_rx => break,
                    // The tick's deadline may already be in the past when we get polled
                    _ = interval.tick() => on_tick(time::Instant::now().into_std()),
                }
            }
            debug!("Tick loop exited");
        });

        *slot = Some(RunningTimer { stop_tx, handle });
        info!("Tick timer started ({:?} period)", period);
        true
    }

    /// Tick `widget` every period
    pub fn drive(&self, widget: Arc<AnimationWidget>) -> bool {
        self.start(move |now| {
            let _ = widget.tick(now);
        })
    }

    /// Stop the timer and wait for an in-flight tick to finish.
    /// Stopping a stopped timer does nothing.
    pub async fn stop(&self) {
        let Some(timer) = self.running.lock().take() else {
            return;
        };
        let _ = timer.stop_tx.send(());
        if let Err(e) = timer.handle.await {
            warn!("Tick task ended abnormally: {}", e);
        }
        info!("Tick timer stopped");
    }
}

impl Drop for TimerDriver {
    fn drop(&mut self) {
        // Dropping the sender ends the loop at its next select
        self.running.get_mut().take();
    }
}
