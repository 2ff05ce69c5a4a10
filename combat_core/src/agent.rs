//! Decision agent - Greedy expected-value action selection
//!
//! The agent only reads the battle; it never rolls dice or mutates state, so
//! the same state always yields the same decision.

use crate::combat::attack_modifiers;
use crate::config::SimConfig;
use crate::creature::{CombatantId, ConditionKind};
use crate::damage::expected_attack_damage;
use crate::encounter::Battle;
use rules_core::{check_probability, hit_probability_with_mode, RollMode};
use serde::Serialize;

/// One attack the agent intends to make
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlannedAttack {
    pub attack_index: usize,
    pub target: CombatantId,
    pub expected_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// A full attack action, one entry per attack of the multiattack
    Attack { attacks: Vec<PlannedAttack> },
    Escape { kind: ConditionKind },
    Pass,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub action: Action,
    pub expected_value: f64,
}

/// Targets worth attacking
///
/// Downed hostiles are only considered once no hostile is left standing.
pub fn candidate_targets(battle: &Battle, actor: CombatantId) -> Vec<CombatantId> {
    let conscious: Vec<CombatantId> = battle
        .hostiles_of(actor)
        .filter(|c| c.is_conscious())
        .map(|c| c.id)
        .collect();
    if !conscious.is_empty() {
        return conscious;
    }
    battle.hostiles_of(actor).map(|c| c.id).collect()
}

/// Expected damage of one attack: hit probability times mean damage
pub fn attack_expected_value(
    battle: &Battle,
    actor: CombatantId,
    attack_index: usize,
    target: CombatantId,
    config: &SimConfig,
) -> f64 {
    let attacker = &battle[actor];
    let Some(attack) = attacker.attacks.get(attack_index) else {
        return 0.0;
    };
    let weapon = &attack.weapon;
    let defender = &battle[target];

    let mode = attack_modifiers(battle, actor, weapon, target, config).mode();
    let p_hit = hit_probability_with_mode(attacker.attack_bonus(weapon), defender.armor_class, mode);
    let damage = expected_attack_damage(attacker, weapon, &defender.defenses, defender.is_down());
    p_hit * damage
}

/// Best single attack given the attacks already planned this action
pub fn choose_attack(
    battle: &Battle,
    actor: CombatantId,
    used: &[usize],
    config: &SimConfig,
) -> Option<PlannedAttack> {
    best_attack(battle, actor, used, config, false)
}

/// Best melee attack for a bonus attack
pub fn choose_melee_attack(
    battle: &Battle,
    actor: CombatantId,
    config: &SimConfig,
) -> Option<PlannedAttack> {
    best_attack(battle, actor, &[], config, true)
}

fn best_attack(
    battle: &Battle,
    actor: CombatantId,
    used: &[usize],
    config: &SimConfig,
    melee_only: bool,
) -> Option<PlannedAttack> {
    let attacker = &battle[actor];
    let targets = candidate_targets(battle, actor);
    let mut best: Option<PlannedAttack> = None;

    for attack_index in attacker.usable_attacks() {
        let attack = &attacker.attacks[attack_index];
        if melee_only && !attack.weapon.is_melee() {
            continue;
        }
        let times_used = used.iter().filter(|i| **i == attack_index).count() as u32;
        if attacker.different_attacks && times_used > 0 {
            continue;
        }
        if attack.remaining.is_some_and(|left| times_used >= left) {
            continue;
        }
        for &target in &targets {
            let expected_value = attack_expected_value(battle, actor, attack_index, target, config);
            // Strictly greater, so ties keep the first declared candidate
            if best.map_or(true, |b| expected_value > b.expected_value) {
                best = Some(PlannedAttack {
                    attack_index,
                    target,
                    expected_value,
                });
            }
        }
    }
    best
}

/// Greedy attack plan for a full attack action
fn plan_attacks(battle: &Battle, actor: CombatantId, config: &SimConfig) -> Vec<PlannedAttack> {
    let mut used = Vec::new();
    let mut plan = Vec::new();
    for _ in 0..battle[actor].num_attacks {
        let Some(attack) = choose_attack(battle, actor, &used, config) else {
            break;
        };
        used.push(attack.attack_index);
        plan.push(attack);
    }
    plan
}

fn plan_value(plan: &[PlannedAttack]) -> f64 {
    plan.iter().map(|a| a.expected_value).sum()
}

/// Expected damage a creature's full attack would do to one target
fn threat_against(battle: &Battle, attacker: CombatantId, target: CombatantId, config: &SimConfig) -> f64 {
    let creature = &battle[attacker];
    let best = creature
        .usable_attacks()
        .map(|index| attack_expected_value(battle, attacker, index, target, config))
        .fold(0.0, f64::max);
    best * creature.num_attacks as f64
}

/// Value of trying to break free of the first escapable condition
///
/// Success probability times what the actor gains in attack value plus what
/// its captors lose against it.
fn escape_value(battle: &Battle, actor: CombatantId, config: &SimConfig) -> Option<(ConditionKind, f64)> {
    let creature = &battle[actor];
    let (kind, escape) = creature
        .conditions
        .iter()
        .find_map(|c| c.escape.as_ref().map(|e| (c.kind, e)))?;

    let mode = if escape.disadvantage {
        RollMode::Disadvantage
    } else {
        RollMode::Normal
    };
    let p_escape = check_probability(creature.best_check_modifier(&escape.abilities), escape.dc, mode);

    let mut freed = battle.clone();
    freed[actor].remove_condition(kind);

    let own_gain =
        plan_value(&plan_attacks(&freed, actor, config)) - plan_value(&plan_attacks(battle, actor, config));
    let denied: f64 = battle
        .hostiles_of(actor)
        .filter(|h| h.is_conscious())
        .map(|h| threat_against(battle, h.id, actor, config) - threat_against(&freed, h.id, actor, config))
        .sum();

    Some((kind, p_escape * (own_gain + denied).max(0.0)))
}

/// Pick the action with the highest expected value
pub fn choose_action(battle: &Battle, actor: CombatantId, config: &SimConfig) -> Decision {
    let plan = plan_attacks(battle, actor, config);
    let mut decision = if plan.is_empty() {
        Decision {
            action: Action::Pass,
            expected_value: 0.0,
        }
    } else {
        Decision {
            expected_value: plan_value(&plan),
            action: Action::Attack { attacks: plan },
        }
    };

    if let Some((kind, value)) = escape_value(battle, actor, config) {
        if value > decision.expected_value {
            decision = Decision {
                action: Action::Escape { kind },
                expected_value: value,
            };
        }
    }

    decision
}
