//! Symbol substitution rules
//!
//! A mapping (A, B) means "a press of B is required when the displayed target
//! is A". At most one mapping is live at a time; without one the identity rule
//! applies. All operations are total over the fixed symbol set.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::{LevelRule, Symbol};

/// An active substitution: target `from` requires a press of `to`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleMapping {
    pub from: Symbol,
    pub to: Symbol,
}

/// Holds the current mapping and the periodic re-roll counter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleManager {
    mapping: Option<RuleMapping>,
    /// Correct answers between re-rolls; 0 disables periodic rerolling
    every_hits: u32,
    hits: u32,
}

impl RuleManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a level's static rules: clears any live mapping, resets the hit
    /// counter, and picks up the periodic threshold from a `Mapping` rule.
    pub fn install(&mut self, rules: &[LevelRule]) {
        self.mapping = None;
        self.hits = 0;
        self.every_hits = 0;
        for rule in rules {
            if let LevelRule::Mapping { every_hits } = rule {
                self.every_hits = *every_hits;
            }
        }
    }

    /// Enable periodic rerolling without touching the live mapping (runtime
    /// activation in timed mode)
    pub fn configure_periodic(&mut self, every_hits: u32) {
        self.every_hits = every_hits;
        self.hits = 0;
    }

    pub fn mapping(&self) -> Option<RuleMapping> {
        self.mapping
    }

    pub fn has_periodic(&self) -> bool {
        self.every_hits > 0
    }

    /// Count a correct answer; true exactly when the periodic threshold is hit
    /// (the counter then restarts). Always false without a periodic mapping.
    pub fn on_correct(&mut self) -> bool {
        if self.every_hits == 0 {
            return false;
        }
        self.hits += 1;
        if self.hits >= self.every_hits {
            self.hits = 0;
            true
        } else {
            false
        }
    }

    /// Roll and install a fresh mapping
    ///
    /// A is uniform over all symbols, B uniform over the rest. If the pair
    /// lands on the previous mapping, B is re-picked outside {A, B} so the
    /// change is always visible to the player.
    pub fn roll_mapping<R: Rng>(&mut self, rng: &mut R) -> RuleMapping {
        let prev = self.mapping;
        let symbols = Symbol::ALL;

        let from = symbols[rng.random_range(0..symbols.len())];
        let others: Vec<Symbol> = symbols.iter().copied().filter(|s| *s != from).collect();
        let mut to = others[rng.random_range(0..others.len())];

        if let Some(prev) = prev {
            if prev.from == from && prev.to == to {
                let rest: Vec<Symbol> = others.iter().copied().filter(|s| *s != to).collect();
                to = rest[rng.random_range(0..rest.len())];
            }
        }

        let mapping = RuleMapping { from, to };
        log::debug!("rule mapping rolled: {} -> {}", from.as_str(), to.as_str());
        self.mapping = Some(mapping);
        mapping
    }

    /// Resolve the required press for a displayed target (identity fallback)
    pub fn apply(&self, stimulus: Symbol) -> Symbol {
        match self.mapping {
            Some(m) if m.from == stimulus => m.to,
            _ => stimulus,
        }
    }
}
