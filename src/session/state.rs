//! Shared session types: symbols, ring positions, levels and the session aggregate
//!
//! All state that must survive a whole run (score, streak, flags, rule state)
//! lives in [`Session`]; animation state lives with the component that owns it.

use serde::{Deserialize, Serialize};

use super::countdown::PausableCountdown;
use super::rules::RuleManager;

/// The closed set of target/ring symbols
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbol {
    Triangle,
    Circle,
    Square,
    Cross,
}

impl Symbol {
    pub const ALL: [Symbol; 4] = [
        Symbol::Triangle,
        Symbol::Circle,
        Symbol::Square,
        Symbol::Cross,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Symbol::Triangle => "triangle",
            Symbol::Circle => "circle",
            Symbol::Square => "square",
            Symbol::Cross => "cross",
        }
    }
}

/// The four fixed ring positions surrounding the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RingPosition {
    Top,
    Right,
    Left,
    Bottom,
}

impl RingPosition {
    pub const ALL: [RingPosition; 4] = [
        RingPosition::Top,
        RingPosition::Right,
        RingPosition::Left,
        RingPosition::Bottom,
    ];

    /// Index into layout arrays
    #[inline]
    pub fn index(&self) -> usize {
        match self {
            RingPosition::Top => 0,
            RingPosition::Right => 1,
            RingPosition::Left => 2,
            RingPosition::Bottom => 3,
        }
    }

    /// Mirrored position, used when joystick inversion is active
    pub fn opposite(&self) -> RingPosition {
        match self {
            RingPosition::Top => RingPosition::Bottom,
            RingPosition::Bottom => RingPosition::Top,
            RingPosition::Left => RingPosition::Right,
            RingPosition::Right => RingPosition::Left,
        }
    }
}

/// Identifier for a pluggable gameplay modifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModifierId {
    /// Periodic symbol substitution rule
    Remap,
    /// Ring rotation every few correct answers
    Spin,
    /// Ring icons hidden after a short preview
    Memory,
    /// Inverted directional controls
    Joystick,
}

impl ModifierId {
    pub const ALL: [ModifierId; 4] = [
        ModifierId::Remap,
        ModifierId::Spin,
        ModifierId::Memory,
        ModifierId::Joystick,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModifierId::Remap => "remap",
            ModifierId::Spin => "spin",
            ModifierId::Memory => "memory",
            ModifierId::Joystick => "joystick",
        }
    }
}

/// A static rule attached to an authored level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LevelRule {
    /// Install a periodic symbol substitution, rerolled every `every_hits` correct answers
    Mapping { every_hits: u32 },
    /// Ring icons are hidden after the preview window
    Memory,
    /// Directional input is mirrored
    Invert,
}

/// An authored level: a hit goal plus static rules and modifiers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level {
    /// Correct answers required to clear the level
    pub goal_hits: u32,
    pub rules: Vec<LevelRule>,
    pub mods: Vec<ModifierId>,
}

impl Level {
    pub fn new(goal_hits: u32) -> Self {
        Self {
            goal_hits,
            rules: Vec::new(),
            mods: Vec::new(),
        }
    }

    pub fn with_mods(goal_hits: u32, mods: &[ModifierId]) -> Self {
        Self {
            goal_hits,
            rules: Vec::new(),
            mods: mods.to_vec(),
        }
    }

    /// Default campaign: plain warm-up, then each modifier alone, then combinations
    pub fn campaign() -> Vec<Level> {
        use ModifierId::*;
        vec![
            Level::new(10),
            Level::with_mods(10, &[Remap]),
            Level::with_mods(10, &[Spin]),
            Level::with_mods(10, &[Memory]),
            Level::with_mods(10, &[Joystick]),
            Level::with_mods(15, &[Remap, Spin]),
            Level::with_mods(15, &[Memory, Joystick]),
            Level::with_mods(20, &[Remap, Spin, Memory]),
        ]
    }
}

/// Discrete triggers for the audio collaborator, drained each tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    Correct,
    Incorrect,
    MappingChanged,
    ModsChanged,
    LevelUp,
    LifeLost,
    GameOver,
}

/// A deferred consequence requested by a modifier hook
///
/// Hooks never mutate animation state directly; they queue an action and the
/// orchestrator sequences it behind any banner that must play first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModAction {
    /// Start (or queue) a ring rotation
    Rotate,
    /// Roll a new substitution mapping and announce it
    RerollMapping,
    /// Re-arm the memory preview-then-hide window
    MemoryPreview,
}

/// Live session aggregate: everything scoring and rules, nothing animated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Run seed for reproducibility
    pub seed: u64,
    pub score: u64,
    pub streak: u32,
    pub best_streak: u32,
    /// Remaining lives (speed-up mode; 0 at config time disables the lives system)
    pub lives: u32,
    /// Current level index into the campaign (speed-up mode)
    pub level_index: usize,
    /// Correct answers within the current level
    pub hits_in_level: u32,
    /// Correct answers across the whole run
    pub total_hits: u32,
    /// Active substitution rule state
    pub rules: RuleManager,
    /// Ring icons hidden outside the preview window
    pub memory_mode: bool,
    /// Directional input mirrored
    pub invert_controls: bool,
    /// Correct answers since the last spin-triggered rotation
    pub spin_hits: u32,
    /// Current per-target deadline (speed-up mode, shrinks per correct answer)
    pub deadline_sec: f64,
    /// Per-target countdown (speed-up mode)
    pub target_clock: PausableCountdown,
    /// Shared time budget (timed mode)
    pub time_left: PausableCountdown,
    /// Gameplay countdowns stay frozen until this wall-clock instant
    pub pause_until: f64,
    /// Currently displayed target, if one is live
    pub target: Option<Symbol>,
    /// Most recent target; the next spawn must differ from it
    pub last_target: Option<Symbol>,
}

impl Session {
    pub fn new(seed: u64, lives: u32, deadline_sec: f64) -> Self {
        Self {
            seed,
            score: 0,
            streak: 0,
            best_streak: 0,
            lives,
            level_index: 0,
            hits_in_level: 0,
            total_hits: 0,
            rules: RuleManager::new(),
            memory_mode: false,
            invert_controls: false,
            spin_hits: 0,
            deadline_sec,
            target_clock: PausableCountdown::new(),
            time_left: PausableCountdown::new(),
            pause_until: 0.0,
            target: None,
            last_target: None,
        }
    }

    /// Clear per-level runtime flags and rule state (level transitions, mod set swaps)
    pub fn reset_runtime_flags(&mut self) {
        self.rules.install(&[]);
        self.memory_mode = false;
        self.invert_controls = false;
        self.spin_hits = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposite_is_involution() {
        for pos in RingPosition::ALL {
            assert_eq!(pos.opposite().opposite(), pos);
            assert_ne!(pos.opposite(), pos);
        }
    }

    #[test]
    fn test_position_indices_distinct() {
        let mut seen = [false; 4];
        for pos in RingPosition::ALL {
            assert!(!seen[pos.index()]);
            seen[pos.index()] = true;
        }
    }

    #[test]
    fn test_campaign_has_warmup_first() {
        let levels = Level::campaign();
        assert!(!levels.is_empty());
        assert!(levels[0].mods.is_empty());
        assert!(levels.iter().all(|l| l.goal_hits > 0));
    }
}
