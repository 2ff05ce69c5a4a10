use super::CombatantId;
use rules_core::{Ability, WeaponTrait};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kinds of temporary condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    Grappled,
    Restrained,
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionKind::Grappled => write!(f, "grappled"),
            ConditionKind::Restrained => write!(f, "restrained"),
        }
    }
}

/// How a creature can break free of a condition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Escape {
    pub dc: i32,
    /// The check uses the best of these abilities
    pub abilities: Vec<Ability>,
    pub disadvantage: bool,
    /// Attempting the escape takes the creature's action
    pub uses_action: bool,
}

/// A temporary condition on a combatant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub kind: ConditionKind,
    /// Creature that imposed the condition; its death always ends it
    pub causer: Option<CombatantId>,
    pub escape: Option<Escape>,
    /// Also ends as soon as the causer is incapacitated
    pub ends_when_causer_incapacitated: bool,
    /// Ends as soon as the affected creature is incapacitated
    pub ends_when_target_incapacitated: bool,
}

impl Condition {
    /// Held fast by an adhesive creature
    pub fn grappled(causer: CombatantId, dc: i32) -> Self {
        Condition {
            kind: ConditionKind::Grappled,
            causer: Some(causer),
            escape: Some(Escape {
                dc,
                abilities: vec![Ability::Strength, Ability::Dexterity],
                disadvantage: true,
                uses_action: true,
            }),
            ends_when_causer_incapacitated: true,
            ends_when_target_incapacitated: true,
        }
    }

    /// Caught in a net
    pub fn restrained(causer: CombatantId, dc: i32) -> Self {
        Condition {
            kind: ConditionKind::Restrained,
            causer: Some(causer),
            escape: Some(Escape {
                dc,
                abilities: vec![Ability::Strength],
                disadvantage: false,
                uses_action: true,
            }),
            ends_when_causer_incapacitated: false,
            ends_when_target_incapacitated: true,
        }
    }

    /// The condition a weapon trait applies on hit, if any
    pub fn from_weapon_trait(weapon_trait: WeaponTrait, causer: CombatantId) -> Option<Self> {
        let dc = weapon_trait.escape_dc()?;
        match weapon_trait {
            WeaponTrait::Adhesive => Some(Condition::grappled(causer, dc)),
            WeaponTrait::Net => Some(Condition::restrained(causer, dc)),
            WeaponTrait::Lance => None,
        }
    }

    /// Attack rolls against the creature have advantage
    pub fn grants_advantage_to_attackers(&self) -> bool {
        self.kind == ConditionKind::Restrained
    }

    /// The creature's own attack rolls have disadvantage
    pub fn imposes_attack_disadvantage(&self) -> bool {
        self.kind == ConditionKind::Restrained
    }

    /// Same kind from the same causer
    pub fn duplicates(&self, other: &Condition) -> bool {
        self.kind == other.kind && self.causer == other.causer
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.causer {
            Some(causer) => write!(f, "{} by {}", self.kind, causer),
            None => write!(f, "{}", self.kind),
        }
    }
}
