//! Damage calculation - turning a weapon hit into a DamagePacket

use super::DamagePacket;
use crate::creature::Combatant;
use crate::defense::Defenses;
use rand::Rng;
use rules_core::{DamageRoll, DiceExpr, Weapon};

/// Extra damage dealt by martial advantage
pub const MARTIAL_ADVANTAGE_DICE: DiceExpr = DiceExpr {
    count: 2,
    sides: 6,
    modifier: 0,
};

/// Roll damage for a weapon hit
///
/// Critical hits roll every damage die twice; modifiers are added once.
pub fn roll_attack_damage(
    attacker: &Combatant,
    weapon: &Weapon,
    critical: bool,
    rng: &mut impl Rng,
) -> DamagePacket {
    let mut packet = DamagePacket::new(Some(attacker.id));
    packet.is_critical = critical;

    // Step 1: Primary damage, the only part that gets the ability modifier
    if let Some(roll) = weapon.damage_for(attacker.free_hand) {
        let rolled = roll_extra_damage(roll.dice, critical, rng) + attacker.damage_modifier(weapon);
        packet.push(roll.damage_type, rolled);
    }

    // Step 2: Bonus damage (acid bite, fiery claws)
    if let Some(bonus) = &weapon.bonus_damage {
        packet.push(bonus.damage_type, roll_extra_damage(bonus.dice, critical, rng));
    }

    packet
}

/// Roll dice that ride along with a hit, doubling them on a critical
pub fn roll_extra_damage(dice: DiceExpr, critical: bool, rng: &mut impl Rng) -> i32 {
    let rolled = if critical {
        dice.roll_critical(rng)
    } else {
        dice.roll(rng)
    };
    rolled.max(0)
}

/// Mean damage of one hit after the target's defenses
pub fn expected_attack_damage(
    attacker: &Combatant,
    weapon: &Weapon,
    target: &Defenses,
    critical: bool,
) -> f64 {
    let part = |roll: &DamageRoll, modifier: i32| {
        let dice_multiplier = if critical { 2.0 } else { 1.0 };
        let mean = roll.dice.expected_dice() * dice_multiplier + (roll.dice.modifier + modifier) as f64;
        mean.max(0.0) * target.expected_multiplier(roll.damage_type)
    };

    let primary = weapon
        .damage_for(attacker.free_hand)
        .map_or(0.0, |roll| part(roll, attacker.damage_modifier(weapon)));
    let bonus = weapon.bonus_damage.as_ref().map_or(0.0, |roll| part(roll, 0));
    primary + bonus
}
