//! Three-phase announcement banner timing
//!
//! One stopwatch-driven state machine serves every announcement overlay (rule
//! change, modifier change). There is no idle state to manage: activity and
//! phase are derived purely from timestamps, so `start` safely re-arms the
//! banner no matter what it was doing before.

use serde::{Deserialize, Serialize};

/// Which leg of the in/hold/out animation a banner is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BannerPhase {
    In,
    Hold,
    Out,
}

/// Timing state for a single announcement overlay
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BannerManager {
    in_sec: f64,
    hold_sec: f64,
    out_sec: f64,
    /// Wall-clock start of the most recent `start`; negative infinity before the first
    anim_start: f64,
    active_until: f64,
    /// Entry animation originates from the docked position rather than off-screen.
    /// Affects only visual interpolation, never timing.
    from_pinned: bool,
}

impl BannerManager {
    pub fn new(in_sec: f64, hold_sec: f64, out_sec: f64) -> Self {
        Self {
            in_sec,
            hold_sec,
            out_sec,
            anim_start: f64::NEG_INFINITY,
            active_until: f64::NEG_INFINITY,
            from_pinned: false,
        }
    }

    /// Total wall-clock lifetime of one announcement
    pub fn total(&self) -> f64 {
        self.in_sec + self.hold_sec + self.out_sec
    }

    /// Arm (or re-arm) the banner starting at `now`
    pub fn start(&mut self, now: f64, from_pinned: bool) {
        self.anim_start = now;
        self.active_until = now + self.total();
        self.from_pinned = from_pinned;
    }

    pub fn is_active(&self, now: f64) -> bool {
        now < self.active_until
    }

    pub fn from_pinned(&self) -> bool {
        self.from_pinned
    }

    /// Current phase and its 0..=1 progress
    ///
    /// Exactly `t == in_sec` counts as the start of Hold. Elapsed time is
    /// clamped into `[0, total]`, so the query is total even outside the
    /// active window.
    pub fn phase(&self, now: f64) -> (BannerPhase, f64) {
        let t = (now - self.anim_start).clamp(0.0, self.total());
        if t < self.in_sec {
            (BannerPhase::In, t / self.in_sec)
        } else if t <= self.in_sec + self.hold_sec {
            (BannerPhase::Hold, 1.0)
        } else if self.out_sec > 0.0 {
            (BannerPhase::Out, ((t - self.in_sec - self.hold_sec) / self.out_sec).min(1.0))
        } else {
            (BannerPhase::Out, 1.0)
        }
    }
}
