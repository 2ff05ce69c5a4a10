//! Combat results - What an attack or escape attempt did

use super::advantage::AttackModifiers;
use crate::creature::{CombatantId, ConditionKind};
use crate::damage::DamageReport;
use crate::events::CombatEvent;
use rules_core::D20Roll;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackOutcome {
    Miss,
    Hit,
    CriticalHit,
}

impl AttackOutcome {
    pub fn is_hit(&self) -> bool {
        !matches!(self, AttackOutcome::Miss)
    }
}

impl fmt::Display for AttackOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttackOutcome::Miss => write!(f, "miss"),
            AttackOutcome::Hit => write!(f, "hit"),
            AttackOutcome::CriticalHit => write!(f, "critical hit"),
        }
    }
}

/// Result of one attack
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttackResult {
    pub attacker: CombatantId,
    pub target: CombatantId,
    pub weapon: String,
    pub modifiers: AttackModifiers,
    pub roll: D20Roll,
    pub attack_bonus: i32,
    pub outcome: AttackOutcome,
    /// Damage dice were doubled (critical hit, or a hit on a downed target)
    pub critical_damage: bool,
    /// `None` on a miss or a hit that carried no damage
    pub damage: Option<DamageReport>,
    pub events: Vec<CombatEvent>,
    /// The attack set off rampage, earning a bonus attack
    pub rampage: bool,
}

impl AttackResult {
    pub fn total(&self) -> i32 {
        self.roll.natural + self.attack_bonus
    }

    /// Damage that got through the target's defenses
    pub fn damage_dealt(&self) -> i32 {
        self.damage.as_ref().map_or(0, |d| d.dealt)
    }
}

/// Result of an attempt to break free of a condition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EscapeResult {
    pub creature: CombatantId,
    pub kind: ConditionKind,
    pub roll: D20Roll,
    pub modifier: i32,
    pub dc: i32,
    pub escaped: bool,
    pub events: Vec<CombatEvent>,
}
