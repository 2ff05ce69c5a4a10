//! Resistance - Damage mitigation by damage type
//!
//! Per damage part:
//! - immune: damage_taken = 0 (wins over everything else)
//! - resistant: damage_taken = floor(damage / 2)
//! - vulnerable: damage_taken = damage * 2, applied after resistance

use rules_core::DamageType;
use serde::{Deserialize, Serialize};

/// Apply resistance, vulnerability and immunity to one damage part
///
/// # Arguments
/// * `damage` - The incoming damage of a single type
/// * `resistant` - Whether the defender resists the type
/// * `vulnerable` - Whether the defender is vulnerable to the type
/// * `immune` - Whether the defender is immune to the type
pub fn apply_damage_modifiers(damage: i32, resistant: bool, vulnerable: bool, immune: bool) -> i32 {
    if damage <= 0 || immune {
        return 0;
    }

    let mut taken = damage;
    if resistant {
        taken /= 2;
    }
    if vulnerable {
        taken = taken.saturating_mul(2);
    }
    taken
}

/// The damage types a creature resists, is vulnerable to, or ignores
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Defenses {
    #[serde(default)]
    pub resistances: Vec<DamageType>,
    #[serde(default)]
    pub vulnerabilities: Vec<DamageType>,
    #[serde(default)]
    pub immunities: Vec<DamageType>,
}

impl Defenses {
    pub fn is_resistant(&self, damage_type: DamageType) -> bool {
        self.resistances.contains(&damage_type)
    }

    pub fn is_vulnerable(&self, damage_type: DamageType) -> bool {
        self.vulnerabilities.contains(&damage_type)
    }

    pub fn is_immune(&self, damage_type: DamageType) -> bool {
        self.immunities.contains(&damage_type)
    }

    /// Damage actually taken from `damage` points of one type
    pub fn apply(&self, damage: i32, damage_type: DamageType) -> i32 {
        apply_damage_modifiers(
            damage,
            self.is_resistant(damage_type),
            self.is_vulnerable(damage_type),
            self.is_immune(damage_type),
        )
    }

    /// Average scaling of damage of one type, for expected-value estimates
    pub fn expected_multiplier(&self, damage_type: DamageType) -> f64 {
        if self.is_immune(damage_type) {
            return 0.0;
        }
        let mut multiplier = 1.0;
        if self.is_resistant(damage_type) {
            multiplier *= 0.5;
        }
        if self.is_vulnerable(damage_type) {
            multiplier *= 2.0;
        }
        multiplier
    }
}
