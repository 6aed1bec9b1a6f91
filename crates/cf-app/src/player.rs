//! Playback driver: one run, one cursor, one timer.

use std::time::{Duration, Instant};

use cf_results::{MAX_FRAMES, Playback, RunMetrics, SimulationRun, aggregate};
use tracing::info;

use crate::config::DEFAULT_TICK_INTERVAL;

/// Owned, cancellable periodic deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickTimer {
    interval: Duration,
    next_due: Option<Instant>,
}

impl TickTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_due: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn arm(&mut self, now: Instant) {
        self.next_due = Some(now + self.interval);
    }

    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    pub fn is_armed(&self) -> bool {
        self.next_due.is_some()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.next_due
    }

    /// True when the deadline has passed; re-arms for the next period.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                self.next_due = Some(now + self.interval);
                true
            }
            _ => false,
        }
    }
}

pub struct Player {
    run: Option<SimulationRun>,
    playback: Playback,
    timer: TickTimer,
    max_frames: usize,
}

impl Default for Player {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_INTERVAL)
    }
}

impl Player {
    pub fn new(interval: Duration) -> Self {
        Self {
            run: None,
            playback: Playback::idle(),
            timer: TickTimer::new(interval),
            max_frames: MAX_FRAMES,
        }
    }

    /// Replace whatever was playing with `run` and start revealing it.
    pub fn load(&mut self, run: SimulationRun, now: Instant) {
        self.timer.cancel();
        self.playback = Playback::start(run.total_readings(), self.max_frames);
        info!(
            jurisdiction = %run.jurisdiction_used,
            readings = self.playback.total(),
            step = self.playback.step(),
            "playback started"
        );
        self.run = Some(run);
        if self.playback.is_playing() {
            self.timer.arm(now);
        } else {
            info!(cursor = self.playback.cursor(), "playback finished");
        }
    }

    /// Advance one step if the tick is due. Returns whether the cursor moved.
    pub fn advance(&mut self, now: Instant) -> bool {
        if !self.timer.fire(now) {
            return false;
        }
        let moved = self.playback.tick();
        if self.playback.is_done() {
            self.timer.cancel();
            info!(cursor = self.playback.cursor(), "playback finished");
        }
        moved
    }

    /// Reveal everything at once.
    pub fn finish(&mut self) {
        self.playback.finish();
        self.timer.cancel();
    }

    pub fn clear(&mut self) {
        self.timer.cancel();
        self.playback.reset();
        self.run = None;
    }

    pub fn run(&self) -> Option<&SimulationRun> {
        self.run.as_ref()
    }

    pub fn playback(&self) -> &Playback {
        &self.playback
    }

    pub fn timer(&self) -> &TickTimer {
        &self.timer
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timer.next_deadline()
    }

    /// Metrics over the revealed prefix.
    pub fn metrics(&self) -> Option<RunMetrics> {
        self.run
            .as_ref()
            .map(|run| aggregate(run, self.playback.cursor()))
    }
}
