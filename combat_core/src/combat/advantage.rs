//! Advantage and disadvantage on attack rolls
//!
//! Sources are collected before the d20 is rolled. Any number of advantage
//! sources together with any number of disadvantage sources cancel out.

use crate::config::SimConfig;
use crate::creature::{CombatantId, ConditionKind};
use crate::encounter::Battle;
use rules_core::{CreatureTrait, RollMode, TraitTrigger, Weapon, WeaponTrait};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvantageSource {
    PackTactics,
    Grappler,
    TargetRestrained,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DisadvantageSource {
    Lance,
    AttackerRestrained,
    RangedInMelee,
}

/// Everything affecting one attack roll
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttackModifiers {
    pub advantage: Vec<AdvantageSource>,
    pub disadvantage: Vec<DisadvantageSource>,
}

impl AttackModifiers {
    pub fn mode(&self) -> RollMode {
        RollMode::from_flags(!self.advantage.is_empty(), !self.disadvantage.is_empty())
    }
}

/// Collect the advantage state of an attack without rolling anything
pub fn attack_modifiers(
    battle: &Battle,
    attacker: CombatantId,
    weapon: &Weapon,
    target: CombatantId,
    config: &SimConfig,
) -> AttackModifiers {
    let mut modifiers = AttackModifiers::default();
    let actor = &battle[attacker];
    let defender = &battle[target];

    for creature_trait in actor.traits_for(TraitTrigger::OnRollAttack) {
        match creature_trait {
            CreatureTrait::PackTactics if battle.has_conscious_ally(attacker) => {
                modifiers.advantage.push(AdvantageSource::PackTactics);
            }
            CreatureTrait::Grappler
                if defender.conditions.iter().any(|c| {
                    c.kind == ConditionKind::Grappled && c.causer == Some(attacker)
                }) =>
            {
                modifiers.advantage.push(AdvantageSource::Grappler);
            }
            _ => {}
        }
    }

    for weapon_trait in weapon.traits.iter().filter(|t| t.trigger() == TraitTrigger::OnRollAttack) {
        if *weapon_trait == WeaponTrait::Lance {
            modifiers.disadvantage.push(DisadvantageSource::Lance);
        }
    }

    if defender.conditions.iter().any(|c| c.grants_advantage_to_attackers()) {
        modifiers.advantage.push(AdvantageSource::TargetRestrained);
    }
    if actor.conditions.iter().any(|c| c.imposes_attack_disadvantage()) {
        modifiers.disadvantage.push(DisadvantageSource::AttackerRestrained);
    }
    if weapon.is_ranged() && config.ranged_in_melee_disadvantage && battle.has_conscious_hostile(attacker) {
        modifiers.disadvantage.push(DisadvantageSource::RangedInMelee);
    }

    modifiers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creature::{Combatant, Condition};
    use bestiary_core::{CreatureTemplate, HitPoints};
    use rules_core::AbilityScores;

    fn club() -> Weapon {
        Weapon::new("club", "1d4 bludgeoning".parse().unwrap())
    }

    fn setup(attacker: CreatureTemplate, allies: usize) -> Battle {
        let config = SimConfig::default();
        let target = CreatureTemplate::new("dummy", 10, HitPoints::Fixed(10), AbilityScores::default())
            .with_attack(club());
        let mut battle = Battle::new(vec!["a".to_string(), "b".to_string()]);
        battle.add(Combatant::with_hit_points(CombatantId(0), 0, &attacker, 10, &config));
        battle.add(Combatant::with_hit_points(CombatantId(0), 1, &target, 10, &config));
        for _ in 0..allies {
            battle.add(Combatant::with_hit_points(CombatantId(0), 0, &target, 10, &config));
        }
        battle
    }

    fn plain() -> CreatureTemplate {
        CreatureTemplate::new("attacker", 10, HitPoints::Fixed(10), AbilityScores::default())
            .with_attack(club())
    }

    #[test]
    fn test_no_sources() {
        let battle = setup(plain(), 0);
        let modifiers = attack_modifiers(&battle, CombatantId(0), &club(), CombatantId(1), &SimConfig::default());
        assert_eq!(modifiers.mode(), RollMode::Normal);
    }

    #[test]
    fn test_pack_tactics_needs_ally() {
        let wolf = plain().with_trait(CreatureTrait::PackTactics);
        let config = SimConfig::default();

        let alone = setup(wolf.clone(), 0);
        assert_eq!(
            attack_modifiers(&alone, CombatantId(0), &club(), CombatantId(1), &config).mode(),
            RollMode::Normal
        );

        let pack = setup(wolf, 1);
        let modifiers = attack_modifiers(&pack, CombatantId(0), &club(), CombatantId(1), &config);
        assert_eq!(modifiers.advantage, vec![AdvantageSource::PackTactics]);
        assert_eq!(modifiers.mode(), RollMode::Advantage);
    }

    #[test]
    fn test_grappler() {
        let mimic = plain().with_trait(CreatureTrait::Grappler);
        let config = SimConfig::default();
        let mut battle = setup(mimic, 0);
        battle[CombatantId(1)].add_condition(Condition::grappled(CombatantId(0), 13));

        let modifiers = attack_modifiers(&battle, CombatantId(0), &club(), CombatantId(1), &config);
        assert_eq!(modifiers.advantage, vec![AdvantageSource::Grappler]);
    }

    #[test]
    fn test_restrained_both_ways_cancels() {
        let config = SimConfig::default();
        let mut battle = setup(plain(), 0);
        battle[CombatantId(0)].add_condition(Condition::restrained(CombatantId(1), 10));
        battle[CombatantId(1)].add_condition(Condition::restrained(CombatantId(0), 10));

        let modifiers = attack_modifiers(&battle, CombatantId(0), &club(), CombatantId(1), &config);
        assert_eq!(modifiers.advantage, vec![AdvantageSource::TargetRestrained]);
        assert_eq!(modifiers.disadvantage, vec![DisadvantageSource::AttackerRestrained]);
        assert_eq!(modifiers.mode(), RollMode::Normal);
    }

    #[test]
    fn test_ranged_in_melee() {
        let mut bow = Weapon::new("shortbow", "1d6 piercing".parse().unwrap());
        bow.properties.ranged = true;
        let battle = setup(plain(), 0);

        let modifiers = attack_modifiers(&battle, CombatantId(0), &bow, CombatantId(1), &SimConfig::default());
        assert_eq!(modifiers.mode(), RollMode::Disadvantage);

        let lenient = SimConfig {
            ranged_in_melee_disadvantage: false,
            ..SimConfig::default()
        };
        let modifiers = attack_modifiers(&battle, CombatantId(0), &bow, CombatantId(1), &lenient);
        assert_eq!(modifiers.mode(), RollMode::Normal);
    }

    #[test]
    fn test_lance() {
        let mut lance = Weapon::new("lance", "1d12 piercing".parse().unwrap());
        lance.traits.push(WeaponTrait::Lance);
        let battle = setup(plain(), 0);
        let modifiers = attack_modifiers(&battle, CombatantId(0), &lance, CombatantId(1), &SimConfig::default());
        assert_eq!(modifiers.disadvantage, vec![DisadvantageSource::Lance]);
    }
}
