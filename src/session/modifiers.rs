//! Pluggable gameplay modifiers
//!
//! Each modifier implements a common capability interface with no-op defaults
//! and never touches animation state directly: consequences that need
//! sequencing (a rotation, a mapping reroll, a memory preview) are queued as
//! [`ModAction`]s for the orchestrator to schedule behind banners.
//!
//! The slot logic keeps a rolling FIFO set for timed mode: rerolls drop the
//! oldest active modifier and top up with random distinct picks from the
//! allowed pool. A new set is staged as `pending` and only committed once its
//! announcement banner has finished, so the player never plays under rules
//! that have not been shown yet.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::settings::Settings;

use super::state::{Level, LevelRule, ModAction, ModifierId, Session};

/// Capability interface for a gameplay modifier. Every hook defaults to a no-op.
pub trait Modifier {
    fn id(&self) -> ModifierId;

    /// Mutate a level's static rule list at authoring time
    fn on_apply_level(&self, _cfg: &Settings, _level: &mut Level) {}

    /// Mutate live session flags when activated outside static levels (timed mode)
    fn apply_runtime_flags(&self, _cfg: &Settings, _session: &mut Session) {}

    /// Invoked once after a batch of modifiers becomes active
    fn on_mods_applied(&self, _cfg: &Settings, _session: &mut Session, _out: &mut Vec<ModAction>) {}

    fn on_level_start(&self, _cfg: &Settings, _session: &mut Session, _out: &mut Vec<ModAction>) {}

    fn on_correct(&self, _cfg: &Settings, _session: &mut Session, _out: &mut Vec<ModAction>) {}

    fn on_wrong(&self, _cfg: &Settings, _session: &mut Session, _out: &mut Vec<ModAction>) {}
}

/// Periodic symbol substitution
struct Remap;

impl Modifier for Remap {
    fn id(&self) -> ModifierId {
        ModifierId::Remap
    }

    fn on_apply_level(&self, cfg: &Settings, level: &mut Level) {
        level.rules.push(LevelRule::Mapping {
            every_hits: cfg.mapping_every_hits,
        });
    }

    fn apply_runtime_flags(&self, cfg: &Settings, session: &mut Session) {
        session.rules.configure_periodic(cfg.mapping_every_hits);
    }

    fn on_mods_applied(&self, _cfg: &Settings, session: &mut Session, out: &mut Vec<ModAction>) {
        if session.rules.mapping().is_none() {
            out.push(ModAction::RerollMapping);
        }
    }

    fn on_correct(&self, _cfg: &Settings, session: &mut Session, out: &mut Vec<ModAction>) {
        if session.rules.on_correct() {
            out.push(ModAction::RerollMapping);
        }
    }
}

/// Ring rotation every few correct answers
struct Spin;

impl Modifier for Spin {
    fn id(&self) -> ModifierId {
        ModifierId::Spin
    }

    fn on_mods_applied(&self, _cfg: &Settings, _session: &mut Session, out: &mut Vec<ModAction>) {
        out.push(ModAction::Rotate);
    }

    fn on_correct(&self, cfg: &Settings, session: &mut Session, out: &mut Vec<ModAction>) {
        if cfg.spin_every_hits == 0 {
            return;
        }
        session.spin_hits += 1;
        if session.spin_hits >= cfg.spin_every_hits {
            session.spin_hits = 0;
            out.push(ModAction::Rotate);
        }
    }
}

/// Ring icons hidden after a short preview
struct Memory;

impl Modifier for Memory {
    fn id(&self) -> ModifierId {
        ModifierId::Memory
    }

    fn on_apply_level(&self, _cfg: &Settings, level: &mut Level) {
        level.rules.push(LevelRule::Memory);
    }

    fn apply_runtime_flags(&self, _cfg: &Settings, session: &mut Session) {
        session.memory_mode = true;
    }

    fn on_mods_applied(&self, _cfg: &Settings, _session: &mut Session, out: &mut Vec<ModAction>) {
        out.push(ModAction::MemoryPreview);
    }

    fn on_level_start(&self, _cfg: &Settings, _session: &mut Session, out: &mut Vec<ModAction>) {
        out.push(ModAction::MemoryPreview);
    }
}

/// Mirrored directional controls
struct Joystick;

impl Modifier for Joystick {
    fn id(&self) -> ModifierId {
        ModifierId::Joystick
    }

    fn on_apply_level(&self, _cfg: &Settings, level: &mut Level) {
        level.rules.push(LevelRule::Invert);
    }

    fn apply_runtime_flags(&self, _cfg: &Settings, session: &mut Session) {
        session.invert_controls = true;
    }
}

/// Registry lookup by id
pub fn modifier(id: ModifierId) -> &'static dyn Modifier {
    match id {
        ModifierId::Remap => &Remap,
        ModifierId::Spin => &Spin,
        ModifierId::Memory => &Memory,
        ModifierId::Joystick => &Joystick,
    }
}

/// Active modifier set plus the staged set awaiting its announcement banner
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModifierSystem {
    /// Active modifiers, oldest first
    active: Vec<ModifierId>,
    /// Next set, committed when the announcement banner completes
    pending: Option<Vec<ModifierId>>,
}

impl ModifierSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> &[ModifierId] {
        &self.active
    }

    pub fn is_active(&self, id: ModifierId) -> bool {
        self.active.contains(&id)
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<&[ModifierId]> {
        self.pending.as_deref()
    }

    /// Replace the active set directly (level entry; no banner involved)
    pub fn set_active(&mut self, mods: &[ModifierId]) {
        self.active = mods.to_vec();
        self.pending = None;
    }

    /// Stage the next rolling set: keep survivors of the allowed pool, drop
    /// the oldest when already full, and top up with random distinct picks.
    /// An empty pool degrades to an empty set (plain rules). Returns false
    /// and stages nothing when the roll leaves the set unchanged, so callers
    /// never announce a no-op change.
    pub fn reroll<R: Rng>(
        &mut self,
        allowed: &[ModifierId],
        slots: usize,
        rng: &mut R,
    ) -> bool {
        let mut next: Vec<ModifierId> = self
            .active
            .iter()
            .copied()
            .filter(|m| allowed.contains(m))
            .collect();

        // Slot count shrank since the last roll
        while next.len() > slots {
            next.remove(0);
        }

        let mut dropped = None;
        if !next.is_empty() && next.len() == slots {
            dropped = Some(next.remove(0));
        }

        let mut candidates: Vec<ModifierId> = allowed
            .iter()
            .copied()
            .filter(|m| !next.contains(m) && Some(*m) != dropped)
            .collect();
        // The dropped modifier comes back into play only when nothing else can fill the slot
        if candidates.is_empty() {
            candidates = dropped.into_iter().collect();
        }

        while next.len() < slots && !candidates.is_empty() {
            let pick = candidates.swap_remove(rng.random_range(0..candidates.len()));
            next.push(pick);
        }

        if next == self.active {
            log::debug!("modifier reroll left the set unchanged");
            self.pending = None;
            return false;
        }

        log::debug!(
            "modifier reroll staged: {:?}",
            next.iter().map(|m| m.as_str()).collect::<Vec<_>>()
        );
        self.pending = Some(next);
        true
    }

    /// Commit the staged set: reset runtime flags, re-apply each modifier's
    /// flags, then fire the batch `on_mods_applied` hooks. Returns false when
    /// nothing was staged.
    pub fn commit_pending(
        &mut self,
        cfg: &Settings,
        session: &mut Session,
        out: &mut Vec<ModAction>,
    ) -> bool {
        let Some(next) = self.pending.take() else {
            return false;
        };
        self.active = next;
        session.reset_runtime_flags();
        for id in &self.active {
            modifier(*id).apply_runtime_flags(cfg, session);
        }
        for id in &self.active {
            modifier(*id).on_mods_applied(cfg, session, out);
        }
        log::info!(
            "modifier set active: {:?}",
            self.active.iter().map(|m| m.as_str()).collect::<Vec<_>>()
        );
        true
    }
}
