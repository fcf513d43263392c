//! Challenge rules for a timed, randomized game mode.
//!
//! Provides the challenge registry (goals, randomizers, modifiers), the
//! randomized outcome assignment, goal evaluation over domain events, and
//! [`ChallengeEngine`], which ties them to a session clock behind a single
//! owner.

pub mod catalog;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod entry;
pub mod error;
pub mod goal;
pub mod randomizer;
pub mod registry;

pub use catalog::default_catalog;
pub use config::RulesConfig;
pub use dispatch::{DispatchSlot, EventDispatcher, Handler};
pub use engine::{ChallengeEngine, EngineState, ShutdownReason, ShutdownSnapshot, TickReport};
pub use entry::{
    ChallengeEntry, ChallengeVariant, GoalPredicate, GoalSpec, GoalState, ModifierSpec, RandomizerSpec,
    SettingRange,
};
pub use error::{RulesError, RulesResult};
pub use goal::GoalReached;
pub use randomizer::{Population, RandomizationEngine, distribute};
pub use registry::{ChallengeRegistry, GamestateSnapshot, SettingRecord, SettingsSnapshot};
