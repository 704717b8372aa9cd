//! Top-level session driver
//!
//! Resolves input through the rule mapping, fans events out to modifier
//! hooks, and sequences banners, rotations and pause windows. The per-tick
//! ordering inside [`Orchestrator::update`] is load-bearing:
//!
//! 1. a just-finished banner commits its queued consequence (new modifier
//!    set, pending rotation) before anything else looks at the rules,
//! 2. the freeze check stops gameplay countdowns while any animation window
//!    is open (inputs arriving during a freeze are dropped, not buffered),
//! 3. only then do countdowns tick and expire,
//! 4. a new target spawns only when nothing is animating.
//!
//! This guarantees a banner always fully plays out before the change it
//! announces is enforced, and that no input is ever resolved against a rule
//! the player has not been shown.

use rand::Rng;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::settings::{GameMode, Settings};

use super::banner::{BannerManager, BannerPhase};
use super::modifiers::{ModifierSystem, modifier};
use super::ring::{RingController, RingLayout};
use super::state::{GameEvent, Level, LevelRule, ModAction, RingPosition, Session, Symbol};

/// Top-level scenes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scene {
    Menu,
    /// Level intro card (speed-up mode); waits for a confirm
    Instruction,
    Game,
    Over,
    Settings,
}

/// What the announcement banner currently on screen is for; drives the
/// overlay text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    RuleChange,
    ModsChange,
}

/// Target exit slide toward its ring position
#[derive(Debug, Clone, Copy)]
struct TargetExit {
    symbol: Symbol,
    t0: f64,
    duration: f64,
}

/// Snapshot for the rendering collaborator
#[derive(Debug, Clone)]
pub struct View {
    pub scene: Scene,
    /// Committed ring layout (never mid-rotation)
    pub layout: RingLayout,
    /// Visual spin angle in degrees
    pub ring_angle_deg: f64,
    /// Active announcement: what it is for, phase, progress, entry-from-dock flag
    pub banner: Option<(BannerKind, BannerPhase, f64, bool)>,
    /// Live target, if one is resolvable right now
    pub target: Option<Symbol>,
    /// Symbol currently sliding out toward its ring position
    pub exiting: Option<(Symbol, f64)>,
    /// False while memory mode hides the ring icons
    pub icons_visible: bool,
    pub score: u64,
    pub streak: u32,
    pub lives: u32,
    pub level: usize,
    /// Mode countdown: per-target deadline (speed-up) or shared budget (timed)
    pub time_remaining: f64,
}

/// The session state machine and timing engine
#[derive(Debug)]
pub struct Orchestrator {
    cfg: Settings,
    seed: u64,
    rng: Pcg32,
    scene: Scene,
    session: Session,
    mods: ModifierSystem,
    ring: RingController,
    banner: BannerManager,
    banner_kind: Option<BannerKind>,
    /// Once an announcement has docked, later ones animate in from the dock
    banner_docked: bool,
    levels: Vec<Level>,
    exit_anim: Option<TargetExit>,
    /// Memory-mode icons stay visible until this instant
    preview_until: f64,
    /// Last computed rotation angle, for the view
    ring_angle_deg: f64,
    events: Vec<GameEvent>,
}

impl Orchestrator {
    pub fn new(cfg: Settings, seed: u64) -> Self {
        let banner = BannerManager::new(cfg.banner_in_sec, cfg.banner_hold_sec, cfg.banner_out_sec);
        let session = Session::new(seed, cfg.lives, cfg.deadline_initial_sec);
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            scene: Scene::Menu,
            session,
            mods: ModifierSystem::new(),
            ring: RingController::new(),
            banner,
            banner_kind: None,
            banner_docked: false,
            levels: Level::campaign(),
            exit_anim: None,
            preview_until: 0.0,
            ring_angle_deg: 0.0,
            events: Vec::new(),
            cfg,
        }
    }

    pub fn scene(&self) -> Scene {
        self.scene
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn active_mods(&self) -> &[super::state::ModifierId] {
        self.mods.active()
    }

    /// Narrow configuration mutation path (settings screen apply)
    pub fn apply_settings(&mut self, new_values: Settings) {
        self.cfg.apply_settings(new_values);
        self.banner = BannerManager::new(
            self.cfg.banner_in_sec,
            self.cfg.banner_hold_sec,
            self.cfg.banner_out_sec,
        );
    }

    pub fn open_settings(&mut self) {
        if self.scene == Scene::Menu {
            self.scene = Scene::Settings;
        }
    }

    pub fn close_settings(&mut self) {
        if self.scene == Scene::Settings {
            self.scene = Scene::Menu;
        }
    }

    pub fn back_to_menu(&mut self) {
        if self.scene == Scene::Over {
            self.scene = Scene::Menu;
        }
    }

    /// Begin a fresh run
    pub fn start_game(&mut self, now: f64) {
        self.session = Session::new(self.seed, self.cfg.lives, self.cfg.deadline_initial_sec);
        self.mods = ModifierSystem::new();
        self.ring = RingController::new();
        self.banner_kind = None;
        self.banner_docked = false;
        self.exit_anim = None;
        self.preview_until = 0.0;
        self.ring_angle_deg = 0.0;
        self.events.clear();
        log::info!("game started (mode {:?}, seed {})", self.cfg.mode, self.seed);

        match self.cfg.mode {
            GameMode::SpeedUp => {
                self.session.level_index = 0;
                self.prepare_level();
                self.scene = Scene::Instruction;
            }
            GameMode::Timed => {
                // Loaded but stopped: the first unfrozen update starts it running
                self.session.time_left.set(self.cfg.timed_budget_sec);
                self.scene = Scene::Game;
                // The opening modifier set is announced like any other change
                self.stage_mod_reroll(now);
            }
        }
    }

    /// Confirm the level intro card and enter gameplay
    pub fn confirm_instruction(&mut self, now: f64) {
        if self.scene != Scene::Instruction {
            return;
        }
        self.scene = Scene::Game;

        let mut actions = Vec::new();
        for id in self.mods.active().to_vec() {
            modifier(id).on_mods_applied(&self.cfg, &mut self.session, &mut actions);
        }
        for id in self.mods.active().to_vec() {
            modifier(id).on_level_start(&self.cfg, &mut self.session, &mut actions);
        }
        // Level entry announces nothing; the intro card already did
        self.process_actions(now, actions, false);
    }

    /// A directional press from the player
    pub fn handle_input(&mut self, now: f64, pos: RingPosition) {
        if self.scene != Scene::Game {
            return;
        }
        // No buffering across a freeze: the press is simply lost
        if self.frozen(now) {
            return;
        }
        let Some(target) = self.session.target else {
            return;
        };

        let pos = if self.session.invert_controls {
            pos.opposite()
        } else {
            pos
        };
        let pressed = self.ring.layout().symbol_at(pos);
        let required = self.session.rules.apply(target);

        if pressed == required {
            self.on_correct_answer(now, target);
        } else {
            self.on_wrong_answer(now);
        }
    }

    /// Advance all timing state to `now`
    pub fn update(&mut self, now: f64) {
        if self.scene != Scene::Game {
            return;
        }

        // 1. A finished banner commits what it announced. A same-hit mapping
        // reroll shares the announcement window with a staged set change, so
        // the commit keys on the staged set itself, not on which of the two
        // started the banner last.
        if self.banner_kind.is_some() && !self.banner.is_active(now) {
            self.banner_kind = None;
            let mut actions = Vec::new();
            if self
                .mods
                .commit_pending(&self.cfg, &mut self.session, &mut actions)
            {
                self.events.push(GameEvent::ModsChanged);
                self.process_actions(now, actions, true);
            }
        }
        // A rotation queued behind the banner may start now
        if !self.banner.is_active(now) && !self.ring.is_rotating() {
            if let Some(params) = self.ring.start_pending(now, &mut self.rng) {
                self.session.pause_until = now + params.duration;
            }
        }

        // 2. Freeze window: gameplay countdowns hold still
        if self.frozen(now) {
            self.session.target_clock.stop(now);
            self.session.time_left.stop(now);
        } else {
            // 3. Countdowns run and may expire
            match self.cfg.mode {
                GameMode::SpeedUp => {
                    if self.session.target.is_some() {
                        self.session.target_clock.resume(now);
                        if self.session.target_clock.expired(now) {
                            self.on_target_timeout();
                            if self.scene != Scene::Game {
                                return;
                            }
                        }
                    }
                }
                GameMode::Timed => {
                    self.session.time_left.resume(now);
                    if self.session.time_left.expired(now) {
                        self.game_over();
                        return;
                    }
                }
            }
        }

        // Advance the ring spin; completion re-arms the memory preview
        let upd = self.ring.update(now);
        self.ring_angle_deg = upd.angle_deg;
        if upd.just_finished && self.session.memory_mode {
            self.preview_until = now + self.cfg.memory_preview_sec;
        }

        // Retire a finished exit slide
        if let Some(exit) = self.exit_anim {
            if now - exit.t0 >= exit.duration {
                self.exit_anim = None;
            }
        }

        // 4. Spawn a target once nothing is animating
        if self.session.target.is_none() && !self.frozen(now) {
            self.spawn_target(now);
        }
    }

    /// Take the audio/feedback triggers accumulated since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Presentation snapshot; read-only
    pub fn view(&self, now: f64) -> View {
        let banner = match self.banner_kind {
            Some(kind) if self.banner.is_active(now) => {
                let (phase, progress) = self.banner.phase(now);
                Some((kind, phase, progress, self.banner.from_pinned()))
            }
            _ => None,
        };
        let exiting = self.exit_anim.map(|e| {
            let p = ((now - e.t0) / e.duration).clamp(0.0, 1.0);
            (e.symbol, p)
        });
        View {
            scene: self.scene,
            layout: *self.ring.layout(),
            ring_angle_deg: self.ring_angle_deg,
            banner,
            target: self.session.target,
            exiting,
            icons_visible: self.icons_visible(now),
            score: self.session.score,
            streak: self.session.streak,
            lives: self.session.lives,
            level: self.session.level_index,
            time_remaining: match self.cfg.mode {
                GameMode::SpeedUp => self.session.target_clock.get(now),
                GameMode::Timed => self.session.time_left.get(now),
            },
        }
    }

    /// True while memory mode allows the ring icons to be drawn
    pub fn icons_visible(&self, now: f64) -> bool {
        !self.session.memory_mode || now < self.preview_until
    }

    /// Any open animation window that freezes gameplay timers and eats input
    fn frozen(&self, now: f64) -> bool {
        self.banner.is_active(now)
            || self.ring.is_rotating()
            || self.exit_anim.is_some()
            || now < self.session.pause_until
    }

    /// Stop gameplay countdowns at the exact instant a freeze window opens,
    /// rather than waiting for the next tick to notice.
    fn freeze_clocks(&mut self, now: f64) {
        self.session.target_clock.stop(now);
        self.session.time_left.stop(now);
    }

    fn on_correct_answer(&mut self, now: f64, target: Symbol) {
        self.session.score += 10;
        self.session.streak += 1;
        self.session.best_streak = self.session.best_streak.max(self.session.streak);
        self.session.total_hits += 1;
        self.session.hits_in_level += 1;
        self.events.push(GameEvent::Correct);

        match self.cfg.mode {
            GameMode::SpeedUp => {
                self.session.deadline_sec = (self.session.deadline_sec
                    - self.cfg.deadline_step_sec)
                    .max(self.cfg.deadline_floor_sec);
                self.session.target_clock.stop(now);
            }
            GameMode::Timed => {
                self.session.time_left.adjust(now, self.cfg.timed_gain_sec);
            }
        }

        let mut actions = Vec::new();
        for id in self.mods.active().to_vec() {
            modifier(id).on_correct(&self.cfg, &mut self.session, &mut actions);
        }

        self.process_actions(now, actions, true);

        // Timed mode rolls a fresh modifier set on a fixed cadence. Staged
        // after the per-hit actions so that when a mapping reroll lands on
        // the same answer, the set announcement is the banner left showing.
        if self.cfg.mode == GameMode::Timed
            && self.cfg.mods_reroll_every > 0
            && self.session.total_hits % self.cfg.mods_reroll_every == 0
        {
            self.stage_mod_reroll(now);
        }

        self.session.last_target = Some(target);
        self.session.target = None;

        if self.cfg.mode == GameMode::SpeedUp {
            let goal = self.current_level_goal();
            if self.session.hits_in_level >= goal {
                self.advance_level();
                return;
            }
        }

        // Slide the answered target out toward its ring position
        self.exit_anim = Some(TargetExit {
            symbol: target,
            t0: now,
            duration: self.cfg.target_exit_sec,
        });
    }

    fn on_wrong_answer(&mut self, now: f64) {
        self.session.streak = 0;
        self.events.push(GameEvent::Incorrect);

        let mut actions = Vec::new();
        for id in self.mods.active().to_vec() {
            modifier(id).on_wrong(&self.cfg, &mut self.session, &mut actions);
        }
        self.process_actions(now, actions, true);

        match self.cfg.mode {
            GameMode::SpeedUp => self.lose_life(),
            GameMode::Timed => {
                self.session
                    .time_left
                    .adjust(now, -self.cfg.timed_penalty_sec);
                if self.session.time_left.expired(now) {
                    self.game_over();
                }
            }
        }
    }

    /// Per-target deadline ran out (speed-up mode)
    fn on_target_timeout(&mut self) {
        self.session.streak = 0;
        self.events.push(GameEvent::Incorrect);
        self.session.last_target = self.session.target.take();
        self.session.target_clock.set(0.0);
        self.lose_life();
    }

    fn lose_life(&mut self) {
        // Lives disabled: failure comes from the clock alone
        if self.cfg.lives == 0 {
            return;
        }
        self.session.lives = self.session.lives.saturating_sub(1);
        self.events.push(GameEvent::LifeLost);
        if self.session.lives == 0 {
            self.game_over();
        }
    }

    fn game_over(&mut self) {
        log::info!(
            "game over: score {} best streak {}",
            self.session.score,
            self.session.best_streak
        );
        self.scene = Scene::Over;
        self.events.push(GameEvent::GameOver);
    }

    fn current_level_goal(&self) -> u32 {
        let idx = self.session.level_index.min(self.levels.len() - 1);
        self.levels[idx].goal_hits
    }

    fn advance_level(&mut self) {
        self.session.level_index += 1;
        self.events.push(GameEvent::LevelUp);
        log::info!("level {} reached", self.session.level_index + 1);
        self.prepare_level();
        self.scene = Scene::Instruction;
    }

    /// Install the (possibly repeated last) campaign level: author its rules
    /// through the modifier hooks, reset runtime flags, roll the starting
    /// mapping if the level carries one.
    fn prepare_level(&mut self) {
        let idx = self.session.level_index.min(self.levels.len() - 1);
        let mut level = self.levels[idx].clone();
        for id in level.mods.clone() {
            modifier(id).on_apply_level(&self.cfg, &mut level);
        }

        self.session.hits_in_level = 0;
        self.session.reset_runtime_flags();
        self.session.rules.install(&level.rules);
        for rule in &level.rules {
            match rule {
                LevelRule::Memory => self.session.memory_mode = true,
                LevelRule::Invert => self.session.invert_controls = true,
                LevelRule::Mapping { .. } => {}
            }
        }
        if self.session.rules.has_periodic() {
            self.session.rules.roll_mapping(&mut self.rng);
        }

        self.mods.set_active(&level.mods);
        self.session.target = None;
        self.session.last_target = None;
        self.exit_anim = None;
        self.banner_kind = None;
        self.banner_docked = false;
        // Any announcement left over from the previous level is void
        self.banner = BannerManager::new(
            self.cfg.banner_in_sec,
            self.cfg.banner_hold_sec,
            self.cfg.banner_out_sec,
        );
    }

    /// Stage a rolling modifier set change and announce it. A roll that leaves
    /// the set as-is (empty pool, pool of one) announces nothing.
    fn stage_mod_reroll(&mut self, now: f64) {
        let pool = self.cfg.allowed_pool();
        if !self.mods.reroll(&pool, self.cfg.slot_count(), &mut self.rng) {
            return;
        }
        self.banner.start(now, self.banner_docked);
        self.banner_docked = true;
        self.banner_kind = Some(BannerKind::ModsChange);
        self.freeze_clocks(now);
    }

    /// Run deferred modifier consequences. `announce` is false on paths where
    /// an intro card or a just-finished banner already covers the change.
    fn process_actions(&mut self, now: f64, actions: Vec<ModAction>, announce: bool) {
        for action in actions {
            match action {
                ModAction::RerollMapping => {
                    self.session.rules.roll_mapping(&mut self.rng);
                    self.events.push(GameEvent::MappingChanged);
                    if announce {
                        self.banner.start(now, self.banner_docked);
                        self.banner_docked = true;
                        self.banner_kind = Some(BannerKind::RuleChange);
                        self.freeze_clocks(now);
                    }
                }
                ModAction::Rotate => {
                    let params = self.cfg.rotation_params();
                    let blocked = self.banner.is_active(now) || self.banner_kind.is_some();
                    self.ring.request_rotation(now, params, blocked, &mut self.rng);
                    if self.ring.is_rotating() {
                        self.session.pause_until = now + params.duration;
                        self.freeze_clocks(now);
                    }
                }
                ModAction::MemoryPreview => {
                    self.preview_until = now + self.cfg.memory_preview_sec;
                }
            }
        }
    }

    fn spawn_target(&mut self, now: f64) {
        let candidates: Vec<Symbol> = Symbol::ALL
            .iter()
            .copied()
            .filter(|s| Some(*s) != self.session.last_target)
            .collect();
        let symbol = candidates[self.rng.random_range(0..candidates.len())];
        self.session.target = Some(symbol);
        if self.cfg.mode == GameMode::SpeedUp {
            self.session
                .target_clock
                .start(now, self.session.deadline_sec);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::state::ModifierId;
    use crate::settings::Difficulty;

    const DT: f64 = 1.0 / 60.0;

    fn speedup() -> Orchestrator {
        Orchestrator::new(Settings::default(), 12345)
    }

    fn timed() -> Orchestrator {
        let mut cfg = Settings::default();
        cfg.mode = GameMode::Timed;
        Orchestrator::new(cfg, 12345)
    }

    /// Timed mode with only the joystick modifier allowed: the opening set
    /// banner plays, but no cascade (extra banners, rotations) follows its
    /// commit
    fn timed_plain(budget: f64) -> Orchestrator {
        let mut cfg = Settings::default();
        cfg.mode = GameMode::Timed;
        cfg.timed_budget_sec = budget;
        cfg.allow_remap = false;
        cfg.allow_spin = false;
        cfg.allow_memory = false;
        cfg.mods_reroll_every = 0;
        Orchestrator::new(cfg, 5)
    }

    /// Drive `update` in small steps up to `until`
    fn run_until(orc: &mut Orchestrator, from: f64, until: f64) -> f64 {
        let mut now = from;
        while now < until {
            now += DT;
            orc.update(now);
        }
        now
    }

    /// Press the correct position for the current target
    fn answer_correctly(orc: &mut Orchestrator, now: f64) {
        let target = orc.session().target.expect("a target should be live");
        let required = orc.session().rules.apply(target);
        let mut pos = orc.ring.layout().position_of(required);
        if orc.session().invert_controls {
            pos = pos.opposite();
        }
        orc.handle_input(now, pos);
    }

    /// Press a position that resolves to the wrong symbol
    fn answer_wrongly(orc: &mut Orchestrator, now: f64) {
        let target = orc.session().target.expect("a target should be live");
        let required = orc.session().rules.apply(target);
        let wrong = Symbol::ALL
            .iter()
            .copied()
            .find(|s| *s != required)
            .unwrap();
        let mut pos = orc.ring.layout().position_of(wrong);
        if orc.session().invert_controls {
            pos = pos.opposite();
        }
        orc.handle_input(now, pos);
    }

    #[test]
    fn test_speedup_flow_menu_to_game() {
        let mut orc = speedup();
        assert_eq!(orc.scene(), Scene::Menu);
        orc.start_game(0.0);
        assert_eq!(orc.scene(), Scene::Instruction);
        orc.confirm_instruction(0.0);
        assert_eq!(orc.scene(), Scene::Game);

        orc.update(DT);
        assert!(orc.session().target.is_some());
    }

    #[test]
    fn test_correct_answer_scores_and_exits_target() {
        let mut orc = speedup();
        orc.start_game(0.0);
        orc.confirm_instruction(0.0);
        orc.update(DT);

        answer_correctly(&mut orc, DT);
        assert_eq!(orc.session().score, 10);
        assert_eq!(orc.session().streak, 1);
        assert!(orc.session().target.is_none());
        let events = orc.drain_events();
        assert!(events.contains(&GameEvent::Correct));

        // Exit slide holds the spawn; afterwards a fresh target appears
        let prev = orc.session().last_target;
        let now = run_until(&mut orc, DT, DT + 0.5);
        assert!(orc.session().target.is_some());
        assert_ne!(orc.session().target, prev);
        let _ = now;
    }

    #[test]
    fn test_wrong_answer_costs_life_and_streak() {
        let mut orc = speedup();
        orc.start_game(0.0);
        orc.confirm_instruction(0.0);
        orc.update(DT);

        answer_correctly(&mut orc, DT);
        let now = run_until(&mut orc, DT, 1.0);
        answer_wrongly(&mut orc, now);
        assert_eq!(orc.session().streak, 0);
        assert_eq!(orc.session().lives, 2);
        let events = orc.drain_events();
        assert!(events.contains(&GameEvent::LifeLost));
    }

    #[test]
    fn test_out_of_lives_ends_game() {
        let mut orc = speedup();
        orc.start_game(0.0);
        orc.confirm_instruction(0.0);
        let mut now = DT;
        orc.update(now);
        for _ in 0..3 {
            answer_wrongly(&mut orc, now);
            now = run_until(&mut orc, now, now + 0.1);
        }
        assert_eq!(orc.scene(), Scene::Over);
        assert!(orc.drain_events().contains(&GameEvent::GameOver));
    }

    #[test]
    fn test_target_timeout_loses_life() {
        let mut orc = speedup();
        orc.start_game(0.0);
        orc.confirm_instruction(0.0);
        orc.update(DT);
        assert!(orc.session().target.is_some());

        // Sit past the initial 3s deadline
        run_until(&mut orc, DT, 3.5);
        assert_eq!(orc.session().lives, 2);
        assert_eq!(orc.session().streak, 0);
    }

    #[test]
    fn test_deadline_shrinks_to_floor() {
        let mut cfg = Settings::default();
        cfg.deadline_initial_sec = 1.0;
        cfg.deadline_floor_sec = 0.9;
        cfg.deadline_step_sec = 0.06;
        let mut orc = Orchestrator::new(cfg, 7);
        orc.start_game(0.0);
        orc.confirm_instruction(0.0);
        let mut now = DT;
        orc.update(now);
        for _ in 0..5 {
            answer_correctly(&mut orc, now);
            now = run_until(&mut orc, now, now + 0.4);
        }
        assert!((orc.session().deadline_sec - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_level_advance_reenters_instruction() {
        let mut orc = speedup();
        orc.start_game(0.0);
        orc.confirm_instruction(0.0);
        let mut now = DT;
        orc.update(now);

        // Level 1 goal is 10 hits
        for _ in 0..10 {
            answer_correctly(&mut orc, now);
            now = run_until(&mut orc, now, now + 0.4);
        }
        assert_eq!(orc.scene(), Scene::Instruction);
        assert_eq!(orc.session().level_index, 1);
        assert!(orc.drain_events().contains(&GameEvent::LevelUp));
        // Level 2 carries the remap modifier with a starting mapping
        orc.confirm_instruction(now);
        assert!(orc.active_mods().contains(&ModifierId::Remap));
        assert!(orc.session().rules.mapping().is_some());
    }

    #[test]
    fn test_mapping_reroll_announced_after_threshold() {
        let mut cfg = Settings::default();
        cfg.mapping_every_hits = 10;
        let mut orc = Orchestrator::new(cfg, 99);
        orc.start_game(0.0);
        // Skip to the remap level; a high goal keeps level advancement out of the picture
        orc.levels[1].goal_hits = 100;
        orc.session.level_index = 1;
        orc.prepare_level();
        orc.confirm_instruction(0.0);

        let start_mapping = orc.session().rules.mapping().expect("level rolls a mapping");
        let mut now = DT;
        orc.update(now);

        for i in 0..10 {
            answer_correctly(&mut orc, now);
            if i < 9 {
                // Mapping untouched before the threshold
                assert_eq!(orc.session().rules.mapping(), Some(start_mapping));
                now = run_until(&mut orc, now, now + 0.4);
            }
        }

        // Tenth hit: new mapping rolled and announced
        let new_mapping = orc.session().rules.mapping().unwrap();
        assert_ne!(new_mapping, start_mapping);
        assert!(orc.drain_events().contains(&GameEvent::MappingChanged));
        assert!(orc.banner.is_active(now));

        // Banner wall-clock lifetime is in+hold+out
        let total = orc.banner.total();
        assert!(orc.banner.is_active(now + total - 0.01));
        assert!(!orc.banner.is_active(now + total + 0.01));
    }

    #[test]
    fn test_input_dropped_while_banner_active() {
        let mut orc = timed();
        orc.start_game(0.0);
        // Opening mod announcement is live; presses must be eaten
        assert!(orc.frozen(0.1));
        orc.update(0.1);
        orc.handle_input(0.1, RingPosition::Top);
        assert_eq!(orc.session().score, 0);
        assert!(orc.session().target.is_none());
    }

    #[test]
    fn test_timed_mods_commit_after_banner() {
        let mut orc = timed();
        orc.start_game(0.0);
        assert!(orc.mods.has_pending());
        assert!(orc.active_mods().is_empty());

        let total = orc.banner.total();
        let now = run_until(&mut orc, 0.0, total + 0.1);
        assert!(!orc.mods.has_pending());
        // Normal difficulty carries two slots
        assert_eq!(orc.active_mods().len(), 2);
        assert!(orc.drain_events().contains(&GameEvent::ModsChanged));
        let _ = now;
    }

    #[test]
    fn test_same_hit_mapping_and_set_reroll_still_commits_mods() {
        let mut cfg = Settings::default();
        cfg.mode = GameMode::Timed;
        cfg.difficulty = Difficulty::Easy; // one slot
        cfg.allow_spin = false;
        cfg.allow_memory = false;
        cfg.mapping_every_hits = 3;
        cfg.mods_reroll_every = 3;
        let mut orc = Orchestrator::new(cfg, 11);
        orc.start_game(0.0);
        // Pin the opening set to remap so the mapping reroll and the set
        // reroll land on the same correct answer
        orc.mods.set_active(&[ModifierId::Remap]);
        orc.session.rules.configure_periodic(3);
        orc.session.rules.roll_mapping(&mut orc.rng);

        let total = orc.banner.total();
        let mut now = run_until(&mut orc, 0.0, total + 0.2);
        assert!(orc.session().target.is_some());

        for i in 0..3 {
            answer_correctly(&mut orc, now);
            if i < 2 {
                now = run_until(&mut orc, now, now + 0.5);
            }
        }

        // Third hit: mapping rerolled immediately, new set staged behind the
        // shared announcement window
        assert!(orc.mods.has_pending());
        assert_eq!(orc.active_mods(), &[ModifierId::Remap]);
        assert!(orc.banner.is_active(now));

        // Banner completion must still commit the staged set
        run_until(&mut orc, now, now + total + 0.2);
        assert!(!orc.mods.has_pending());
        assert_eq!(orc.active_mods(), &[ModifierId::Joystick]);
        assert!(orc.session().invert_controls);
        let events = orc.drain_events();
        assert!(events.contains(&GameEvent::MappingChanged));
        assert!(events.contains(&GameEvent::ModsChanged));
    }

    #[test]
    fn test_timed_empty_pool_reroll_skips_banner() {
        let mut cfg = Settings::default();
        cfg.mode = GameMode::Timed;
        cfg.allow_remap = false;
        cfg.allow_spin = false;
        cfg.allow_memory = false;
        cfg.allow_joystick = false;
        cfg.mods_reroll_every = 2;
        let mut orc = Orchestrator::new(cfg, 5);
        orc.start_game(0.0);
        // Empty-to-empty roll: no banner, the clock starts right away
        assert!(!orc.frozen(DT));
        let mut now = run_until(&mut orc, 0.0, 0.2);
        assert!(orc.session().target.is_some());
        assert!(orc.session().time_left.is_running());

        for _ in 0..2 {
            answer_correctly(&mut orc, now);
            now = run_until(&mut orc, now, now + 0.5);
        }
        // Cadence hit with nothing to change: still no announcement
        assert!(!orc.banner.is_active(now));
        assert!(orc.banner_kind.is_none());
        assert!(orc.session().time_left.is_running());
        assert!(!orc.drain_events().contains(&GameEvent::ModsChanged));
    }

    #[test]
    fn test_timed_clock_freezes_during_banner() {
        let mut orc = timed_plain(60.0);
        orc.start_game(0.0);
        let budget = orc.session().time_left.get(0.0);

        // Through the whole opening banner the budget must not tick
        let total = orc.banner.total();
        run_until(&mut orc, 0.0, total - 0.2);
        assert!((orc.session().time_left.get(total - 0.2) - budget).abs() < 1e-6);

        // After the banner the clock runs again
        let now = run_until(&mut orc, total - 0.2, total + 2.0);
        assert!(orc.session().time_left.get(now) < budget - 1.0);
    }

    #[test]
    fn test_timed_gain_and_penalty() {
        let mut orc = timed_plain(60.0);
        orc.start_game(0.0);
        let total = orc.banner.total();
        let mut now = run_until(&mut orc, 0.0, total + 0.2);
        assert!(orc.session().target.is_some());

        let before = orc.session().time_left.get(now);
        answer_correctly(&mut orc, now);
        assert!(orc.session().time_left.get(now) > before);

        now = run_until(&mut orc, now, now + 0.5);
        let before = orc.session().time_left.get(now);
        answer_wrongly(&mut orc, now);
        assert!(orc.session().time_left.get(now) < before - 2.0);
    }

    #[test]
    fn test_timed_expiry_ends_game() {
        let mut orc = timed_plain(1.0);
        orc.start_game(0.0);
        let total = orc.banner.total();
        run_until(&mut orc, 0.0, total + 1.5);
        assert_eq!(orc.scene(), Scene::Over);
    }

    #[test]
    fn test_rotation_freezes_target_clock() {
        let mut cfg = Settings::default();
        cfg.spin_every_hits = 1; // every correct answer spins the ring
        let mut orc = Orchestrator::new(cfg, 21);
        orc.start_game(0.0);
        orc.session.level_index = 2; // spin level
        orc.prepare_level();
        orc.confirm_instruction(0.0);
        let mut now = DT;
        orc.update(now);
        // confirm_instruction triggered spin's on_mods_applied rotation
        assert!(orc.ring.is_rotating());
        let layout_before = *orc.ring.layout();

        let rotation_end = orc.cfg.rotation_duration_sec + 0.5;
        now = run_until(&mut orc, now, rotation_end);
        assert!(!orc.ring.is_rotating());
        assert_ne!(*orc.ring.layout(), layout_before);
        assert!(orc.session().target.is_some());

        // Answer; the resulting spin rotation opens a freeze window
        answer_correctly(&mut orc, now);
        assert!(orc.ring.is_rotating());
        assert!(!orc.session().target_clock.is_running());
        orc.update(now + DT);
        assert!(orc.frozen(now + DT));
    }

    #[test]
    fn test_memory_level_hides_icons_after_preview() {
        let mut orc = speedup();
        orc.start_game(0.0);
        orc.session.level_index = 3; // memory level
        orc.prepare_level();
        orc.confirm_instruction(0.0);
        assert!(orc.session().memory_mode);
        // Preview armed at level entry
        assert!(orc.icons_visible(0.1));
        let after = orc.cfg.memory_preview_sec + 0.1;
        run_until(&mut orc, 0.0, after);
        assert!(!orc.icons_visible(after));
    }

    #[test]
    fn test_joystick_level_inverts_input() {
        let mut orc = speedup();
        orc.start_game(0.0);
        orc.session.level_index = 4; // joystick level
        orc.prepare_level();
        orc.confirm_instruction(0.0);
        assert!(orc.session().invert_controls);
        orc.update(DT);

        let target = orc.session().target.unwrap();
        let required = orc.session().rules.apply(target);
        let straight = orc.ring.layout().position_of(required);
        // Pressing the un-mirrored position is wrong under inversion
        orc.handle_input(DT, straight);
        assert_eq!(orc.session().streak, 0);
        assert_eq!(orc.session().lives, 2);
    }

    #[test]
    fn test_view_reports_hud() {
        let mut orc = speedup();
        orc.start_game(0.0);
        orc.confirm_instruction(0.0);
        orc.update(DT);
        let view = orc.view(DT);
        assert_eq!(view.scene, Scene::Game);
        assert_eq!(view.lives, 3);
        assert!(view.target.is_some());
        assert!(view.banner.is_none());
        assert!(view.icons_visible);
        assert!(view.time_remaining > 0.0);
    }

    #[test]
    fn test_determinism_same_seed_same_run() {
        let mut a = speedup();
        let mut b = speedup();
        for orc in [&mut a, &mut b] {
            orc.start_game(0.0);
            orc.confirm_instruction(0.0);
            let mut now = DT;
            orc.update(now);
            for _ in 0..8 {
                answer_correctly(orc, now);
                now = run_until(orc, now, now + 0.4);
            }
        }
        assert_eq!(a.session().score, b.session().score);
        assert_eq!(a.session().target, b.session().target);
        assert_eq!(a.ring.layout(), b.ring.layout());
    }
}
