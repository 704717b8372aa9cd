//! Ring Reflex - a reflex/memory arcade game core
//!
//! A central target symbol must be matched against one of four positions on a
//! surrounding ring, under rules that can be remapped, rotated, hidden
//! (memory mode), or control-inverted.
//!
//! Core modules:
//! - `session`: Deterministic game logic (timers, rules, ring, modifiers, orchestrator)
//! - `settings`: Immutable configuration passed into the orchestrator
//! - `highscores`: Leaderboard logic (persistence handled by the host)
//!
//! Rendering, audio and persistence are external collaborators: the session
//! exposes a presentation snapshot and a drained event stream, nothing more.

pub mod highscores;
pub mod session;
pub mod settings;

pub use highscores::HighScores;
pub use session::{Orchestrator, Scene, Symbol};
pub use settings::{Difficulty, GameMode, Settings};

/// Game configuration constants
pub mod consts {
    /// Fixed update cadence for hosts that drive the session on a frame clock (Hz)
    pub const TICK_HZ: f64 = 60.0;

    /// Banner phase defaults (seconds)
    pub const BANNER_IN_SEC: f64 = 0.35;
    pub const BANNER_HOLD_SEC: f64 = 2.0;
    pub const BANNER_OUT_SEC: f64 = 0.35;

    /// Ring rotation defaults
    pub const ROTATION_DURATION_SEC: f64 = 1.2;
    pub const ROTATION_SPINS: f64 = 2.0;
    /// Fraction of raw elapsed rotation time at which the layout swap commits
    pub const ROTATION_SWAP_FRACTION: f64 = 0.5;

    /// Speed-up mode per-target deadline schedule (seconds)
    pub const DEADLINE_INITIAL_SEC: f64 = 3.0;
    pub const DEADLINE_FLOOR_SEC: f64 = 0.8;
    pub const DEADLINE_STEP_SEC: f64 = 0.05;

    /// Timed mode budget and adjustments (seconds)
    pub const TIMED_BUDGET_SEC: f64 = 60.0;
    pub const TIMED_GAIN_SEC: f64 = 1.0;
    pub const TIMED_PENALTY_SEC: f64 = 3.0;

    /// Memory mode preview window (seconds)
    pub const MEMORY_PREVIEW_SEC: f64 = 2.0;

    /// Target exit animation (seconds)
    pub const TARGET_EXIT_SEC: f64 = 0.25;
}

/// Cubic ease-out: fast start, gentle landing
#[inline]
pub fn ease_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    let inv = 1.0 - t;
    1.0 - inv * inv * inv
}
