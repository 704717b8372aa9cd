//! Game configuration
//!
//! One immutable struct handed to the orchestrator at construction. The host
//! owns where it comes from (file, UI, defaults); the core only computes with
//! it. The single mutation path is [`Settings::apply_settings`].

use serde::{Deserialize, Serialize};

use crate::consts;
use crate::session::ModifierId;
use crate::session::ring::RotationParams;

/// The two game modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GameMode {
    /// Per-target countdown that shrinks each hit, with lives
    #[default]
    SpeedUp,
    /// One shared time budget with score-based gain/loss and rolling modifiers
    Timed,
}

/// Difficulty selects how many modifier slots a timed run carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
        }
    }
}

/// Immutable game configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub mode: GameMode,
    pub difficulty: Difficulty,

    // === Speed-up mode ===
    /// Starting per-target deadline (seconds)
    pub deadline_initial_sec: f64,
    /// Per-target deadline never shrinks below this
    pub deadline_floor_sec: f64,
    /// Deadline reduction per correct answer
    pub deadline_step_sec: f64,
    /// Lives; 0 disables the lives system in favor of time-only failure
    pub lives: u32,

    // === Timed mode ===
    /// Total time budget (seconds)
    pub timed_budget_sec: f64,
    /// Time gained per correct answer
    pub timed_gain_sec: f64,
    /// Time lost per wrong answer
    pub timed_penalty_sec: f64,
    /// Modifier set reroll cadence (correct answers); 0 disables rerolling
    pub mods_reroll_every: u32,

    // === Rules ===
    /// Default periodic mapping threshold for the remap modifier
    pub mapping_every_hits: u32,

    // === Modifiers ===
    pub allow_remap: bool,
    pub allow_spin: bool,
    pub allow_memory: bool,
    pub allow_joystick: bool,
    /// Spin modifier rotates the ring every this many correct answers
    pub spin_every_hits: u32,

    // === Animation timing ===
    pub banner_in_sec: f64,
    pub banner_hold_sec: f64,
    pub banner_out_sec: f64,
    pub rotation_duration_sec: f64,
    pub rotation_spins: f64,
    pub rotation_swap_fraction: f64,
    /// Memory-mode preview window before icons hide
    pub memory_preview_sec: f64,
    /// Target exit slide after a correct answer
    pub target_exit_sec: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: GameMode::default(),
            difficulty: Difficulty::default(),

            deadline_initial_sec: consts::DEADLINE_INITIAL_SEC,
            deadline_floor_sec: consts::DEADLINE_FLOOR_SEC,
            deadline_step_sec: consts::DEADLINE_STEP_SEC,
            lives: 3,

            timed_budget_sec: consts::TIMED_BUDGET_SEC,
            timed_gain_sec: consts::TIMED_GAIN_SEC,
            timed_penalty_sec: consts::TIMED_PENALTY_SEC,
            mods_reroll_every: 10,

            mapping_every_hits: 10,

            allow_remap: true,
            allow_spin: true,
            allow_memory: true,
            allow_joystick: true,
            spin_every_hits: 3,

            banner_in_sec: consts::BANNER_IN_SEC,
            banner_hold_sec: consts::BANNER_HOLD_SEC,
            banner_out_sec: consts::BANNER_OUT_SEC,
            rotation_duration_sec: consts::ROTATION_DURATION_SEC,
            rotation_spins: consts::ROTATION_SPINS,
            rotation_swap_fraction: consts::ROTATION_SWAP_FRACTION,
            memory_preview_sec: consts::MEMORY_PREVIEW_SEC,
            target_exit_sec: consts::TARGET_EXIT_SEC,
        }
    }
}

impl Settings {
    /// Replace the configuration wholesale (the settings screen's apply button)
    pub fn apply_settings(&mut self, new_values: Settings) {
        *self = new_values;
    }

    /// Modifiers not disabled in configuration, in canonical order
    pub fn allowed_pool(&self) -> Vec<ModifierId> {
        let mut pool = Vec::new();
        if self.allow_remap {
            pool.push(ModifierId::Remap);
        }
        if self.allow_spin {
            pool.push(ModifierId::Spin);
        }
        if self.allow_memory {
            pool.push(ModifierId::Memory);
        }
        if self.allow_joystick {
            pool.push(ModifierId::Joystick);
        }
        pool
    }

    /// Modifier slot count for a timed run
    pub fn slot_count(&self) -> usize {
        match self.difficulty {
            Difficulty::Easy => 1,
            Difficulty::Normal => 2,
            Difficulty::Hard => 3,
        }
    }

    pub fn rotation_params(&self) -> RotationParams {
        RotationParams {
            duration: self.rotation_duration_sec,
            spins: self.rotation_spins,
            swap_fraction: self.rotation_swap_fraction,
        }
    }

    /// JSON helpers for the persistence collaborator
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
