//! rules_core - Shared rules vocabulary for the combat simulator
//!
//! Value types used by both the creature catalog and the combat engine:
//! - Ability scores, damage types and creature sizes
//! - Dice expressions and d20 rolls
//! - Closed-form hit and check probabilities
//! - Weapons and natural attacks
//! - Creature and weapon traits

pub mod dice;
pub mod probability;
pub mod traits;
pub mod types;
pub mod weapon;

pub use dice::{roll_d20, D20Roll, DiceExpr, RollMode};
pub use probability::{
    check_probability, critical_probability, hit_probability, hit_probability_with_mode,
};
pub use traits::{CreatureTrait, TraitTrigger, WeaponTrait};
pub use types::{ability_modifier, Ability, AbilityScores, DamageType, Size};
pub use weapon::{DamageRoll, Weapon, WeaponProperties};

use thiserror::Error;

/// Error parsing a dice or damage expression
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceError {
    #[error("Invalid dice expression: '{0}'")]
    InvalidExpression(String),
}
