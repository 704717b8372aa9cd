//! Wall-clock countdown that only elapses while running
//!
//! Banners, rotations and exit slides all freeze gameplay timers. Rather than
//! shifting an absolute deadline on every pause, remaining time is accounted
//! lazily: `remaining` is only debited when the countdown stops, and `get`
//! subtracts the in-flight run segment on the fly. Repeated pause/resume
//! cycles therefore cannot drift.

use serde::{Deserialize, Serialize};

/// Remaining time that elapses only between `resume` and `stop`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PausableCountdown {
    /// Seconds left as of the last stop (or set)
    remaining: f64,
    running: bool,
    /// Wall-clock instant of the last resume; meaningless while stopped
    resume_at: f64,
}

impl PausableCountdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the countdown with `seconds` and leave it stopped
    pub fn set(&mut self, seconds: f64) {
        self.remaining = seconds.max(0.0);
        self.running = false;
    }

    /// Load and immediately start running
    pub fn start(&mut self, now: f64, seconds: f64) {
        self.set(seconds);
        self.resume(now);
    }

    /// Freeze the countdown, banking elapsed time. Idempotent while stopped.
    pub fn stop(&mut self, now: f64) {
        if self.running {
            self.remaining = (self.remaining - (now - self.resume_at)).max(0.0);
            self.running = false;
        }
    }

    /// Continue an earlier countdown. No-op when already running or expired.
    pub fn resume(&mut self, now: f64) {
        if !self.running && self.remaining > 0.0 {
            self.resume_at = now;
            self.running = true;
        }
    }

    /// Seconds remaining at `now`
    pub fn get(&self, now: f64) -> f64 {
        if self.running {
            (self.remaining - (now - self.resume_at)).max(0.0)
        } else {
            self.remaining
        }
    }

    pub fn expired(&self, now: f64) -> bool {
        self.get(now) <= 0.0
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Add (or with a negative amount, deduct) seconds without disturbing the
    /// run/stop state. Used for timed-mode gain and penalty.
    pub fn adjust(&mut self, now: f64, seconds: f64) {
        let was_running = self.running;
        self.stop(now);
        self.remaining = (self.remaining + seconds).max(0.0);
        if was_running {
            self.resume(now);
        }
    }
}
