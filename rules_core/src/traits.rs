//! Permanent creature and weapon traits
//!
//! Traits are tagged variants. Each one reacts to exactly one kind of combat
//! event, and the engine dispatches on [`TraitTrigger`] rather than checking
//! individual traits all over the resolution pipeline.

use crate::types::{Ability, Size};
use crate::weapon::DamageRoll;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The combat event a trait listens for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraitTrigger {
    /// Consulted when the attack roll is made (advantage and disadvantage)
    OnRollAttack,
    /// Consulted when damage for a hit is rolled
    OnRollDamage,
    OnHitDelivered,
    OnDamageTaken,
    OnKill,
    OnDeath,
}

/// A permanent creature trait
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreatureTrait {
    /// Advantage on attacks while a conscious ally is present
    PackTactics,
    /// Advantage on attacks against a creature it is grappling
    Grappler,
    /// Once per turn, +2d6 on a weapon hit while a conscious ally is present
    MartialAdvantage,
    /// Reducing a creature to 0 HP with a melee attack grants a bonus attack
    Rampage,
    /// CON save (DC 5 + damage) to drop to 1 HP instead of 0
    UndeadFortitude,
    /// Reaction: the attacker makes a DEX save or takes the damage
    HellishRebuke { damage: DamageRoll, save_dc: i32 },
    /// On death, every hostile creature saves or takes the damage
    DeathBurst {
        damage: DamageRoll,
        save_dc: i32,
        save_ability: Ability,
    },
}

impl CreatureTrait {
    pub fn trigger(&self) -> TraitTrigger {
        match self {
            CreatureTrait::PackTactics | CreatureTrait::Grappler => TraitTrigger::OnRollAttack,
            CreatureTrait::MartialAdvantage => TraitTrigger::OnRollDamage,
            CreatureTrait::Rampage => TraitTrigger::OnKill,
            CreatureTrait::UndeadFortitude | CreatureTrait::HellishRebuke { .. } => {
                TraitTrigger::OnDamageTaken
            }
            CreatureTrait::DeathBurst { .. } => TraitTrigger::OnDeath,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CreatureTrait::PackTactics => "pack tactics",
            CreatureTrait::Grappler => "grappler",
            CreatureTrait::MartialAdvantage => "martial advantage",
            CreatureTrait::Rampage => "rampage",
            CreatureTrait::UndeadFortitude => "undead fortitude",
            CreatureTrait::HellishRebuke { .. } => "hellish rebuke",
            CreatureTrait::DeathBurst { .. } => "death burst",
        }
    }
}

impl fmt::Display for CreatureTrait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A trait carried by a weapon or natural attack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponTrait {
    /// On hit, grapples a Huge or smaller target (escape DC 13, checks at disadvantage)
    Adhesive,
    /// On hit, restrains a Large or smaller target (escape DC 10 STR)
    Net,
    /// Disadvantage when the target is within 5 feet
    Lance,
}

impl WeaponTrait {
    pub fn trigger(&self) -> TraitTrigger {
        match self {
            WeaponTrait::Adhesive | WeaponTrait::Net => TraitTrigger::OnHitDelivered,
            WeaponTrait::Lance => TraitTrigger::OnRollAttack,
        }
    }

    /// Largest target the trait's condition can affect
    pub fn max_target_size(&self) -> Option<Size> {
        match self {
            WeaponTrait::Adhesive => Some(Size::Huge),
            WeaponTrait::Net => Some(Size::Large),
            WeaponTrait::Lance => None,
        }
    }

    /// DC to escape the condition the trait imposes
    pub fn escape_dc(&self) -> Option<i32> {
        match self {
            WeaponTrait::Adhesive => Some(13),
            WeaponTrait::Net => Some(10),
            WeaponTrait::Lance => None,
        }
    }
}

impl fmt::Display for WeaponTrait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeaponTrait::Adhesive => write!(f, "adhesive"),
            WeaponTrait::Net => write!(f, "net"),
            WeaponTrait::Lance => write!(f, "lance"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DamageType;

    #[derive(Deserialize)]
    struct Holder {
        traits: Vec<CreatureTrait>,
    }

    #[test]
    fn test_parse_mixed_trait_list() {
        let holder: Holder = toml::from_str(
            r#"
traits = [
    "pack_tactics",
    { death_burst = { damage = "2d4 slashing", save_dc = 10, save_ability = "dexterity" } },
]
"#,
        )
        .unwrap();

        assert_eq!(holder.traits[0], CreatureTrait::PackTactics);
        match &holder.traits[1] {
            CreatureTrait::DeathBurst {
                damage,
                save_dc,
                save_ability,
            } => {
                assert_eq!(damage.damage_type, DamageType::Slashing);
                assert_eq!(*save_dc, 10);
                assert_eq!(*save_ability, Ability::Dexterity);
            }
            other => panic!("Expected death burst, got {:?}", other),
        }
    }

    #[test]
    fn test_triggers() {
        assert_eq!(CreatureTrait::UndeadFortitude.trigger(), TraitTrigger::OnDamageTaken);
        assert_eq!(CreatureTrait::PackTactics.trigger(), TraitTrigger::OnRollAttack);
        assert_eq!(WeaponTrait::Net.trigger(), TraitTrigger::OnHitDelivered);
        assert_eq!(WeaponTrait::Adhesive.max_target_size(), Some(Size::Huge));
    }
}
