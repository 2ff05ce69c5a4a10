//! Prelude module for convenient imports
//!
//! ```rust
//! use combat_core::prelude::*;
//! ```

// Encounters
pub use crate::encounter::{Battle, Encounter, EncounterResult, EncounterSpec, OutcomeRecord, SideSpec};

// Trials
pub use crate::trials::{CancelToken, OutcomeSink, TrialReport, TrialRunner};

// Creatures
pub use crate::creature::{Combatant, CombatantId, Condition, ConditionKind, LifeState};

// Combat
pub use crate::combat::{resolve_attack, AttackOutcome, AttackResult};
pub use crate::damage::{DamagePacket, DamageReport};
pub use crate::events::CombatEvent;

// Config and errors
pub use crate::config::SimConfig;
pub use crate::error::SimError;

// Re-exports from the catalog and rules crates
pub use bestiary_core::{Bestiary, Catalog, CreatureTemplate, HitPoints};
pub use rules_core::{Ability, AbilityScores, DamageType, Size, Weapon};
