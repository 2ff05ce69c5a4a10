//! Damage system - Rolling weapon damage into packets and reporting what landed

mod calculation;

pub use calculation::{
    expected_attack_damage, roll_attack_damage, roll_extra_damage, MARTIAL_ADVANTAGE_DICE,
};

use crate::creature::{CombatantId, LifeState};
use crate::events::CombatEvent;
use rules_core::DamageType;
use serde::{Deserialize, Serialize};

/// Damage of a single type, before the target's defenses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalDamage {
    pub damage_type: DamageType,
    pub amount: i32,
}

/// Everything one hit or effect delivers to a target
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamagePacket {
    pub source: Option<CombatantId>,
    /// At most one entry per damage type
    pub damages: Vec<FinalDamage>,
    pub is_critical: bool,
}

impl DamagePacket {
    pub fn new(source: Option<CombatantId>) -> Self {
        DamagePacket {
            source,
            damages: Vec::new(),
            is_critical: false,
        }
    }

    /// A packet with a single damage part
    pub fn single(source: Option<CombatantId>, damage_type: DamageType, amount: i32) -> Self {
        let mut packet = DamagePacket::new(source);
        packet.push(damage_type, amount);
        packet
    }

    /// Add damage, merging it with any existing part of the same type
    pub fn push(&mut self, damage_type: DamageType, amount: i32) {
        let amount = amount.max(0);
        match self.damages.iter_mut().find(|d| d.damage_type == damage_type) {
            Some(existing) => existing.amount = existing.amount.saturating_add(amount),
            None => self.damages.push(FinalDamage {
                damage_type,
                amount,
            }),
        }
    }

    /// Total before resistances
    pub fn total(&self) -> i32 {
        self.damages
            .iter()
            .fold(0i32, |total, d| total.saturating_add(d.amount))
    }

    pub fn has_type(&self, damage_type: DamageType) -> bool {
        self.damages
            .iter()
            .any(|d| d.damage_type == damage_type && d.amount > 0)
    }
}

/// What a damage packet did to its target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DamageReport {
    pub target: CombatantId,
    /// Total before resistances
    pub raw: i32,
    /// Total after resistances, vulnerabilities and immunities
    pub dealt: i32,
    pub hp_before: i32,
    pub hp_after: i32,
    pub life_before: LifeState,
    pub life_after: LifeState,
    pub events: Vec<CombatEvent>,
}

impl DamageReport {
    /// The target was conscious before and is not anymore
    pub fn dropped(&self) -> bool {
        self.life_before.is_conscious() && !self.life_after.is_conscious()
    }

    /// The target died from this damage
    pub fn killed(&self) -> bool {
        self.life_before.is_alive() && self.life_after.is_dead()
    }
}
