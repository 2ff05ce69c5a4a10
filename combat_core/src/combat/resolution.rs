//! Attack resolution - One attack from the d20 to the damage dealt

use super::advantage::attack_modifiers;
use super::hooks::deal_damage;
use super::result::{AttackOutcome, AttackResult, EscapeResult};
use crate::config::SimConfig;
use crate::creature::{CombatantId, Condition, ConditionKind};
use crate::damage::{roll_attack_damage, roll_extra_damage, MARTIAL_ADVANTAGE_DICE};
use crate::encounter::Battle;
use crate::error::SimError;
use crate::events::CombatEvent;
use rand::Rng;
use rules_core::{roll_d20, CreatureTrait, RollMode, TraitTrigger};
use std::sync::Arc;
use tracing::debug;

/// Resolve one attack with one of the attacker's weapons
///
/// The steps are:
/// 1. Collect advantage sources and roll the d20
/// 2. Natural 20 is a critical hit, natural 1 a miss, otherwise compare to AC
/// 3. Roll damage, with critical dice against a downed target
/// 4. Run on-hit hooks (martial advantage, grapples, nets)
/// 5. Deliver damage, running reactions
/// 6. Check for rampage
pub fn resolve_attack(
    battle: &mut Battle,
    attacker: CombatantId,
    attack_index: usize,
    target: CombatantId,
    config: &SimConfig,
    rng: &mut impl Rng,
) -> Result<AttackResult, SimError> {
    battle[attacker].ensure_can_act()?;
    if battle[target].is_dead() {
        return Err(SimError::illegal(
            &battle[attacker].name,
            format!("cannot attack {} while it is {}", battle[target], battle[target].life),
        ));
    }
    let weapon = battle[attacker]
        .attacks
        .get(attack_index)
        .map(|a| Arc::clone(&a.weapon))
        .ok_or_else(|| {
            SimError::illegal(&battle[attacker].name, format!("has no attack #{}", attack_index))
        })?;
    battle[attacker].spend_supply(attack_index)?;

    // Step 1: Advantage sources, then the attack roll
    let modifiers = attack_modifiers(battle, attacker, &weapon, target, config);
    let roll = roll_d20(rng, modifiers.mode());
    let attack_bonus = battle[attacker].attack_bonus(&weapon);

    // Step 2: Natural 20 always hits, natural 1 always misses
    let outcome = if roll.is_natural_20() {
        AttackOutcome::CriticalHit
    } else if roll.is_natural_1() || roll.natural + attack_bonus < battle[target].armor_class {
        AttackOutcome::Miss
    } else {
        AttackOutcome::Hit
    };

    debug!(
        attacker = %battle[attacker],
        defender = %battle[target],
        weapon = %weapon,
        natural = roll.natural,
        mode = %roll.mode,
        total = roll.natural + attack_bonus,
        armor_class = battle[target].armor_class,
        outcome = %outcome,
        "attack"
    );

    let mut result = AttackResult {
        attacker,
        target,
        weapon: weapon.name.clone(),
        modifiers,
        roll,
        attack_bonus,
        outcome,
        critical_damage: false,
        damage: None,
        events: Vec::new(),
        rampage: false,
    };
    if !outcome.is_hit() {
        return Ok(result);
    }

    // Step 3: Damage dice; any hit on a downed creature rolls critical damage
    let critical = outcome == AttackOutcome::CriticalHit || battle[target].is_down();
    result.critical_damage = critical;
    let mut packet = roll_attack_damage(&battle[attacker], &weapon, critical, rng);

    // Step 4: On-hit hooks
    let primary_type = weapon
        .damage_for(battle[attacker].free_hand)
        .map(|d| d.damage_type);
    if let Some(damage_type) = primary_type {
        if let Some(extra) = martial_advantage(battle, attacker, critical, rng) {
            packet.push(damage_type, extra);
            result.events.push(CombatEvent::MartialAdvantage {
                creature: attacker,
                damage: extra,
            });
        }
    }

    for weapon_trait in weapon
        .traits
        .iter()
        .filter(|t| t.trigger() == TraitTrigger::OnHitDelivered)
    {
        let fits = weapon_trait
            .max_target_size()
            .map_or(true, |max| battle[target].size <= max);
        let Some(condition) = Condition::from_weapon_trait(*weapon_trait, attacker) else {
            continue;
        };
        let kind = condition.kind;
        if fits && battle[target].add_condition(condition) {
            debug!(creature = %battle[target], condition = %kind, causer = %attacker, "condition applied");
            result.events.push(CombatEvent::ConditionApplied {
                target,
                kind,
                causer: attacker,
            });
        }
    }

    // Step 5: Deliver damage
    if packet.total() > 0 {
        let mut report = deal_damage(battle, target, &packet, rng)?;
        result.events.append(&mut report.events);

        // Step 6: Rampage on a melee drop
        let actor = &battle[attacker];
        if report.dropped()
            && weapon.is_melee()
            && actor.has_trait(&CreatureTrait::Rampage)
            && actor.is_conscious()
            && !actor.resources.bonus_action_used
        {
            result.rampage = true;
            result.events.push(CombatEvent::Rampage { creature: attacker });
        }
        result.damage = Some(report);
    }

    Ok(result)
}

/// Extra 2d6 once per turn while an ally is conscious
fn martial_advantage(
    battle: &mut Battle,
    attacker: CombatantId,
    critical: bool,
    rng: &mut impl Rng,
) -> Option<i32> {
    let actor = &battle[attacker];
    if !actor.has_trait(&CreatureTrait::MartialAdvantage)
        || actor.resources.martial_advantage_used
        || !battle.has_conscious_ally(attacker)
    {
        return None;
    }
    battle[attacker].resources.martial_advantage_used = true;
    Some(roll_extra_damage(MARTIAL_ADVANTAGE_DICE, critical, rng))
}

/// Attempt to break free of a condition
pub fn resolve_escape(
    battle: &mut Battle,
    creature: CombatantId,
    kind: ConditionKind,
    rng: &mut impl Rng,
) -> Result<EscapeResult, SimError> {
    let actor = &battle[creature];
    actor.ensure_can_act()?;
    let Some((causer, escape)) = actor
        .conditions
        .iter()
        .filter(|c| c.kind == kind)
        .find_map(|c| c.escape.clone().map(|e| (c.causer, e)))
    else {
        return Err(SimError::illegal(
            &actor.name,
            format!("has no {} condition to escape", kind),
        ));
    };

    let modifier = actor.best_check_modifier(&escape.abilities);
    let mode = if escape.disadvantage {
        RollMode::Disadvantage
    } else {
        RollMode::Normal
    };
    let roll = roll_d20(rng, mode);
    let escaped = roll.natural + modifier >= escape.dc;
    debug!(creature = %actor, condition = %kind, natural = roll.natural, modifier, dc = escape.dc, escaped, "escape attempt");

    let mut events = Vec::new();
    if escaped {
        let released = battle[creature].remove_conditions_where(|c| c.kind == kind && c.causer == causer);
        events.extend(released.into_iter().map(|c| CombatEvent::ConditionReleased {
            target: creature,
            kind: c.kind,
            causer: c.causer,
        }));
    }

    Ok(EscapeResult {
        creature,
        kind,
        roll,
        modifier,
        dc: escape.dc,
        escaped,
        events,
    })
}
