//! Deterministic session core
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Every query is a function of wall-clock `now` and stored state
//! - Seeded RNG only
//! - No rendering, audio or platform dependencies
//!
//! Nothing in here blocks or sleeps; animations and countdowns are elapsed-time
//! arithmetic over timestamps, so the host can drive `update` at any cadence.

pub mod banner;
pub mod countdown;
pub mod modifiers;
pub mod orchestrator;
pub mod ring;
pub mod rules;
pub mod state;

pub use banner::{BannerManager, BannerPhase};
pub use countdown::PausableCountdown;
pub use modifiers::{Modifier, ModifierSystem, modifier};
pub use orchestrator::{BannerKind, Orchestrator, Scene, View};
pub use ring::{RingController, RingLayout, RotationParams};
pub use rules::{RuleManager, RuleMapping};
pub use state::{GameEvent, Level, LevelRule, ModAction, ModifierId, RingPosition, Session, Symbol};
