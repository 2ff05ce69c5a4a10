//! Reactive trait dispatch
//!
//! Damage can set off further damage (a rebuke, an explosion on death), so
//! delivery recurses until nothing else triggers.

use crate::creature::{CombatantId, LifeState};
use crate::damage::{DamagePacket, DamageReport};
use crate::encounter::Battle;
use crate::error::SimError;
use crate::events::CombatEvent;
use rand::Rng;
use rules_core::{roll_d20, Ability, CreatureTrait, DamageRoll, RollMode, TraitTrigger};
use tracing::debug;

/// Deliver a damage packet and run every reaction it sets off
///
/// The returned report holds the events of the whole chain.
pub fn deal_damage(
    battle: &mut Battle,
    target: CombatantId,
    packet: &DamagePacket,
    rng: &mut impl Rng,
) -> Result<DamageReport, SimError> {
    let mut report = battle[target].take_hit(packet, rng)?;

    // on-damage-taken
    if report.dealt > 0 {
        if let Some(attacker) = packet.source {
            hellish_rebuke(battle, target, attacker, &mut report.events, rng)?;
        }
    }

    if report.killed() {
        report.events.push(CombatEvent::Died {
            creature: target,
            instantly: battle[target].life == LifeState::InstantlyDead,
        });
        report.events.extend(battle.release_stale_conditions());
        // on-death
        death_burst(battle, target, &mut report.events, rng)?;
    } else if report.dropped() {
        report.events.push(CombatEvent::Downed { creature: target });
        report.events.extend(battle.release_stale_conditions());
    }

    Ok(report)
}

/// Save for half damage against an effect
fn roll_save_damage(
    battle: &Battle,
    target: CombatantId,
    damage: DamageRoll,
    dc: i32,
    ability: Ability,
    rng: &mut impl Rng,
) -> (i32, bool) {
    let save = roll_d20(rng, RollMode::Normal).natural + battle[target].save_modifier(ability);
    let saved = save >= dc;
    let rolled = damage.dice.roll(rng).max(0);
    (if saved { rolled / 2 } else { rolled }, saved)
}

/// Once per round, a damaged creature that is still conscious strikes back
fn hellish_rebuke(
    battle: &mut Battle,
    creature: CombatantId,
    attacker: CombatantId,
    events: &mut Vec<CombatEvent>,
    rng: &mut impl Rng,
) -> Result<(), SimError> {
    let rebuker = &battle[creature];
    if !rebuker.is_conscious()
        || rebuker.resources.reaction_used
        || rebuker.side == battle[attacker].side
        || battle[attacker].is_dead()
    {
        return Ok(());
    }
    let Some((damage, save_dc)) = rebuker
        .traits_for(TraitTrigger::OnDamageTaken)
        .find_map(|t| match t {
            CreatureTrait::HellishRebuke { damage, save_dc } => Some((*damage, *save_dc)),
            _ => None,
        })
    else {
        return Ok(());
    };

    battle[creature].resources.reaction_used = true;
    let (amount, saved) = roll_save_damage(battle, attacker, damage, save_dc, Ability::Dexterity, rng);
    debug!(creature = %creature, attacker = %attacker, amount, saved, "hellish rebuke");
    events.push(CombatEvent::HellishRebuke {
        creature,
        target: attacker,
        damage: amount,
        saved,
    });

    if amount > 0 {
        let packet = DamagePacket::single(Some(creature), damage.damage_type, amount);
        let report = deal_damage(battle, attacker, &packet, rng)?;
        events.extend(report.events);
    }
    Ok(())
}

/// A creature explodes on death, hurting every living hostile
fn death_burst(
    battle: &mut Battle,
    creature: CombatantId,
    events: &mut Vec<CombatEvent>,
    rng: &mut impl Rng,
) -> Result<(), SimError> {
    let bursts: Vec<(DamageRoll, i32, Ability)> = battle[creature]
        .traits_for(TraitTrigger::OnDeath)
        .filter_map(|t| match t {
            CreatureTrait::DeathBurst {
                damage,
                save_dc,
                save_ability,
            } => Some((*damage, *save_dc, *save_ability)),
            _ => None,
        })
        .collect();

    for (damage, save_dc, save_ability) in bursts {
        let targets: Vec<CombatantId> = battle.hostiles_of(creature).map(|c| c.id).collect();
        for target in targets {
            // An earlier explosion in the chain may have finished it
            if battle[target].is_dead() {
                continue;
            }
            let (amount, saved) = roll_save_damage(battle, target, damage, save_dc, save_ability, rng);
            debug!(creature = %creature, victim = %target, amount, saved, "death burst");
            events.push(CombatEvent::DeathBurst {
                creature,
                target,
                damage: amount,
                saved,
            });
            if amount > 0 {
                let packet = DamagePacket::single(Some(creature), damage.damage_type, amount);
                let report = deal_damage(battle, target, &packet, rng)?;
                events.extend(report.events);
            }
        }
    }
    Ok(())
}
