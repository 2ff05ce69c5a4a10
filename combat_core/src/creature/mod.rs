//! Creature model - Runtime combatants built from catalog templates

mod conditions;
mod death;

pub use conditions::{Condition, ConditionKind, Escape};
pub use death::{damaged_while_down, death_save, DeathSaveOutcome, LifeState, DEATH_SAVES_NEEDED};

use crate::config::SimConfig;
use crate::damage::{DamagePacket, DamageReport};
use crate::defense::Defenses;
use crate::error::SimError;
use crate::events::CombatEvent;
use bestiary_core::CreatureTemplate;
use rand::Rng;
use rules_core::{
    roll_d20, Ability, AbilityScores, CreatureTrait, DamageType, RollMode, Size, TraitTrigger,
    Weapon,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Index of a combatant within its battle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CombatantId(pub usize);

impl fmt::Display for CombatantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A weapon in hand, with what is left of its supply
#[derive(Debug, Clone)]
pub struct EquippedAttack {
    pub weapon: Arc<Weapon>,
    /// `None` for weapons that never run out
    pub remaining: Option<u32>,
}

impl EquippedAttack {
    pub fn is_available(&self) -> bool {
        self.remaining != Some(0)
    }
}

/// Once-per-turn and once-per-round resources
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TurnResources {
    pub martial_advantage_used: bool,
    pub reaction_used: bool,
    pub bonus_action_used: bool,
}

/// A creature taking part in an encounter
#[derive(Debug, Clone)]
pub struct Combatant {
    pub id: CombatantId,
    pub name: String,
    pub side: usize,
    pub abilities: AbilityScores,
    pub armor_class: i32,
    pub max_hp: i32,
    pub hp: i32,
    pub speed: u32,
    pub size: Size,
    pub proficiency_bonus: i32,
    /// Fixed attack bonus that replaces the derived one
    pub attack_bonus: Option<i32>,
    pub attacks: Vec<EquippedAttack>,
    pub num_attacks: u32,
    pub different_attacks: bool,
    pub free_hand: bool,
    pub defenses: Defenses,
    pub traits: Vec<CreatureTrait>,
    pub make_death_saves: bool,
    pub save_proficiencies: Vec<Ability>,
    pub conditions: Vec<Condition>,
    pub life: LifeState,
    pub resources: TurnResources,
}

impl Combatant {
    /// Instantiate a template, rolling its hit points
    pub fn from_template(
        id: CombatantId,
        side: usize,
        template: &CreatureTemplate,
        config: &SimConfig,
        rng: &mut impl Rng,
    ) -> Self {
        let hp = template
            .hit_points
            .roll(template.abilities.modifier(Ability::Constitution), rng);
        Self::with_hit_points(id, side, template, hp, config)
    }

    /// Instantiate a template with a known hit point total
    pub fn with_hit_points(
        id: CombatantId,
        side: usize,
        template: &CreatureTemplate,
        hp: i32,
        config: &SimConfig,
    ) -> Self {
        let hp = hp.max(1);
        Combatant {
            id,
            name: template.name.clone(),
            side,
            abilities: template.abilities,
            armor_class: template.armor_class,
            max_hp: hp,
            hp,
            speed: template.speed,
            size: template.size,
            proficiency_bonus: template.proficiency_bonus,
            attack_bonus: template.attack_bonus,
            attacks: template
                .attacks
                .iter()
                .map(|weapon| EquippedAttack {
                    remaining: config.supply_for(weapon),
                    weapon: Arc::clone(weapon),
                })
                .collect(),
            num_attacks: template.num_attacks,
            different_attacks: template.different_attacks,
            free_hand: template.free_hand(),
            defenses: Defenses {
                resistances: template.resistances.clone(),
                vulnerabilities: template.vulnerabilities.clone(),
                immunities: template.immunities.clone(),
            },
            traits: template.traits.clone(),
            make_death_saves: template.make_death_saves,
            save_proficiencies: template.save_proficiencies.clone(),
            conditions: Vec::new(),
            life: LifeState::Active,
            resources: TurnResources::default(),
        }
    }

    // ---- Status ----

    pub fn is_conscious(&self) -> bool {
        self.life.is_conscious()
    }

    pub fn is_down(&self) -> bool {
        self.life.is_down()
    }

    pub fn is_dead(&self) -> bool {
        self.life.is_dead()
    }

    pub fn is_alive(&self) -> bool {
        self.life.is_alive()
    }

    /// Error unless the creature is able to take an action
    pub fn ensure_can_act(&self) -> Result<(), SimError> {
        if self.is_conscious() {
            Ok(())
        } else {
            Err(SimError::illegal(
                &self.name,
                format!("cannot act while {}", self.life),
            ))
        }
    }

    pub fn has_trait(&self, creature_trait: &CreatureTrait) -> bool {
        self.traits.contains(creature_trait)
    }

    pub fn traits_for(&self, trigger: TraitTrigger) -> impl Iterator<Item = &CreatureTrait> {
        self.traits.iter().filter(move |t| t.trigger() == trigger)
    }

    pub fn has_condition(&self, kind: ConditionKind) -> bool {
        self.conditions.iter().any(|c| c.kind == kind)
    }

    // ---- Derived stats ----

    /// Attack bonus with a weapon
    pub fn attack_bonus(&self, weapon: &Weapon) -> i32 {
        self.attack_bonus.unwrap_or_else(|| {
            self.abilities.modifier(weapon.attack_ability(&self.abilities)) + self.proficiency_bonus
        })
    }

    /// Modifier added once to a weapon's primary damage
    pub fn damage_modifier(&self, weapon: &Weapon) -> i32 {
        self.abilities
            .modifier(weapon.attack_ability(&self.abilities))
    }

    pub fn save_modifier(&self, ability: Ability) -> i32 {
        let proficiency = if self.save_proficiencies.contains(&ability) {
            self.proficiency_bonus
        } else {
            0
        };
        self.abilities.modifier(ability) + proficiency
    }

    /// Best ability check modifier among the given abilities
    pub fn best_check_modifier(&self, abilities: &[Ability]) -> i32 {
        abilities
            .iter()
            .map(|a| self.abilities.modifier(*a))
            .max()
            .unwrap_or(0)
    }

    /// Indices of attacks that can be made right now
    pub fn usable_attacks(&self) -> impl Iterator<Item = usize> + '_ {
        self.attacks.iter().enumerate().filter_map(move |(index, attack)| {
            let wieldable = !attack.weapon.requires_two_hands() || self.free_hand;
            (attack.is_available() && wieldable).then_some(index)
        })
    }

    /// Use up one piece of ammunition or one thrown weapon
    pub fn spend_supply(&mut self, attack_index: usize) -> Result<(), SimError> {
        let Some(attack) = self.attacks.get_mut(attack_index) else {
            return Err(SimError::illegal(
                &self.name,
                format!("has no attack #{}", attack_index),
            ));
        };
        match attack.remaining {
            Some(0) => Err(SimError::illegal(
                &self.name,
                format!("{} is out of ammunition", attack.weapon),
            )),
            Some(ref mut remaining) => {
                *remaining -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }

    // ---- Mutators ----

    /// Take damage of a single type
    pub fn apply_damage(
        &mut self,
        amount: i32,
        damage_type: DamageType,
        rng: &mut impl Rng,
    ) -> Result<DamageReport, SimError> {
        self.take_hit(&DamagePacket::single(None, damage_type, amount), rng)
    }

    /// Take a damage packet: defenses, hit points and the dying transitions
    pub fn take_hit(
        &mut self,
        packet: &DamagePacket,
        rng: &mut impl Rng,
    ) -> Result<DamageReport, SimError> {
        if self.is_dead() {
            return Err(SimError::illegal(
                &self.name,
                format!("cannot take damage while {}", self.life),
            ));
        }

        let dealt: i32 = packet
            .damages
            .iter()
            .map(|d| self.defenses.apply(d.amount, d.damage_type))
            .fold(0i32, i32::saturating_add);
        let mut report = DamageReport {
            target: self.id,
            raw: packet.total(),
            dealt,
            hp_before: self.hp,
            hp_after: self.hp,
            life_before: self.life,
            life_after: self.life,
            events: Vec::new(),
        };
        if dealt <= 0 {
            return Ok(report);
        }

        match self.life {
            LifeState::Active => {
                let overflow = dealt - self.hp;
                if overflow >= self.max_hp {
                    self.hp = 0;
                    self.life = LifeState::InstantlyDead;
                } else if overflow >= 0 {
                    let fortitude = self.undead_fortitude(dealt, packet, rng);
                    let survived = matches!(fortitude, Some(CombatEvent::UndeadFortitude { saved: true, .. }));
                    report.events.extend(fortitude);
                    if survived {
                        self.hp = 1;
                    } else {
                        self.hp = 0;
                        self.life = if self.make_death_saves {
                            LifeState::Dying {
                                successes: 0,
                                failures: 0,
                            }
                        } else {
                            LifeState::Dead
                        };
                    }
                } else {
                    self.hp -= dealt;
                }
            }
            LifeState::Dying { .. } | LifeState::Stabilized => {
                // Already at 0, so the whole hit is overflow
                self.life = if dealt >= self.max_hp {
                    LifeState::InstantlyDead
                } else {
                    damaged_while_down(self.life)
                };
            }
            LifeState::Dead | LifeState::InstantlyDead => {}
        }

        if self.is_dead() {
            self.conditions.clear();
        }
        report.hp_after = self.hp;
        report.life_after = self.life;
        Ok(report)
    }

    /// CON save to stay at 1 hit point instead of dropping
    fn undead_fortitude(
        &self,
        dealt: i32,
        packet: &DamagePacket,
        rng: &mut impl Rng,
    ) -> Option<CombatEvent> {
        if !self.has_trait(&CreatureTrait::UndeadFortitude)
            || packet.is_critical
            || packet.has_type(DamageType::Radiant)
        {
            return None;
        }
        let dc = 5 + dealt;
        let roll = roll_d20(rng, RollMode::Normal).natural + self.save_modifier(Ability::Constitution);
        Some(CombatEvent::UndeadFortitude {
            creature: self.id,
            dc,
            roll,
            saved: roll >= dc,
        })
    }

    /// Regain hit points, returning how many were restored
    ///
    /// A creature at 0 hit points gets back up.
    pub fn heal(&mut self, amount: i32) -> Result<i32, SimError> {
        if self.is_dead() {
            return Err(SimError::illegal(
                &self.name,
                format!("cannot heal while {}", self.life),
            ));
        }
        if amount <= 0 {
            return Ok(0);
        }
        let before = self.hp;
        self.hp = self.hp.saturating_add(amount).min(self.max_hp);
        if self.is_down() {
            self.life = LifeState::Active;
        }
        Ok(self.hp - before)
    }

    /// Roll a death save at the start of a dying creature's turn
    pub fn roll_death_save(
        &mut self,
        dc: i32,
        rng: &mut impl Rng,
    ) -> Result<(i32, DeathSaveOutcome), SimError> {
        let natural = roll_d20(rng, RollMode::Normal).natural;
        let (state, outcome) = death_save(self.life, natural, dc).ok_or_else(|| {
            SimError::illegal(
                &self.name,
                format!("cannot roll a death save while {}", self.life),
            )
        })?;
        self.life = state;
        match outcome {
            DeathSaveOutcome::Stabilized { hit_points } => self.hp = hit_points,
            DeathSaveOutcome::Died => self.conditions.clear(),
            _ => {}
        }
        Ok((natural, outcome))
    }

    /// Add a condition unless an identical one is already active
    pub fn add_condition(&mut self, condition: Condition) -> bool {
        if self.is_dead() || self.conditions.iter().any(|c| c.duplicates(&condition)) {
            return false;
        }
        self.conditions.push(condition);
        true
    }

    /// Remove every condition of a kind
    pub fn remove_condition(&mut self, kind: ConditionKind) -> Vec<Condition> {
        self.remove_conditions_where(|c| c.kind == kind)
    }

    pub fn remove_conditions_where(
        &mut self,
        mut predicate: impl FnMut(&Condition) -> bool,
    ) -> Vec<Condition> {
        let (removed, kept): (Vec<Condition>, Vec<Condition>) = std::mem::take(&mut self.conditions)
            .into_iter()
            .partition(|c| predicate(c));
        self.conditions = kept;
        removed
    }

    /// Reset per-turn resources at the start of the creature's turn
    pub fn start_turn(&mut self) {
        self.resources = TurnResources::default();
    }
}

impl fmt::Display for Combatant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.id)
    }
}
