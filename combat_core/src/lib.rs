//! combat_core - Turn-based combat engine for tabletop-style encounters
//!
//! This library provides:
//! - Combatant: a live creature instance with hit points, conditions and death saves
//! - Attack resolution: advantage, criticals, damage packets and reactive traits
//! - Encounter: the round and turn state machine, driven by an expected-value agent
//! - TrialRunner: many seeded encounters in parallel, tallied into a TrialReport
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use combat_core::prelude::*;
//! use bestiary_core::Bestiary;
//!
//! let bestiary = Bestiary::builtin()?;
//! let spec = EncounterSpec::duel("orc", "hobgoblin");
//! let runner = TrialRunner::new(&bestiary, spec, SimConfig::default())?;
//! let report = runner.run(10_000, 12345);
//! println!("orc wins {:.1}%", 100.0 * report.win_rate("orc").unwrap_or(0.0));
//! ```

pub mod agent;
pub mod combat;
pub mod config;
pub mod creature;
pub mod damage;
pub mod defense;
pub mod encounter;
pub mod error;
pub mod events;
pub mod prelude;
pub mod trials;

// Core API - what most users need
pub use encounter::{Encounter, EncounterResult, EncounterSpec, OutcomeRecord, SideSpec};
pub use error::SimError;
pub use trials::{CancelToken, OutcomeSink, TrialReport, TrialRunner};

// Configuration
pub use config::{ConfigError, SimConfig};

// Lower level: driving a battle by hand
pub use combat::{resolve_attack, AttackResult};
pub use creature::{Combatant, CombatantId, LifeState};
pub use encounter::Battle;
pub use events::CombatEvent;
