use crate::config::SimConfig;
use crate::creature::{Combatant, CombatantId};
use crate::events::CombatEvent;
use bestiary_core::CreatureTemplate;
use rand::Rng;
use std::ops::{Index, IndexMut};

/// Every participant of an encounter, grouped into sides
///
/// Combatants are never removed; the dead stay in the table so ids remain
/// valid for the whole encounter.
#[derive(Debug, Clone, Default)]
pub struct Battle {
    combatants: Vec<Combatant>,
    sides: Vec<String>,
}

impl Battle {
    pub fn new(sides: Vec<String>) -> Self {
        Battle {
            combatants: Vec::new(),
            sides,
        }
    }

    /// Add a combatant, assigning it the next id
    pub fn add(&mut self, mut combatant: Combatant) -> CombatantId {
        let id = CombatantId(self.combatants.len());
        combatant.id = id;
        self.combatants.push(combatant);
        id
    }

    /// Instantiate a template on a side
    pub fn spawn(
        &mut self,
        side: usize,
        template: &CreatureTemplate,
        config: &SimConfig,
        rng: &mut impl Rng,
    ) -> CombatantId {
        let id = CombatantId(self.combatants.len());
        self.add(Combatant::from_template(id, side, template, config, rng))
    }

    pub fn combatants(&self) -> &[Combatant] {
        &self.combatants
    }

    pub fn get(&self, id: CombatantId) -> Option<&Combatant> {
        self.combatants.get(id.0)
    }

    pub fn ids(&self) -> impl Iterator<Item = CombatantId> {
        (0..self.combatants.len()).map(CombatantId)
    }

    pub fn side_count(&self) -> usize {
        self.sides.len()
    }

    pub fn side_name(&self, side: usize) -> &str {
        self.sides.get(side).map_or("unknown", |s| s.as_str())
    }

    /// Living creatures on other sides
    pub fn hostiles_of(&self, id: CombatantId) -> impl Iterator<Item = &Combatant> {
        let side = self[id].side;
        self.combatants
            .iter()
            .filter(move |c| c.side != side && c.is_alive())
    }

    /// Some other creature on the same side is conscious
    pub fn has_conscious_ally(&self, id: CombatantId) -> bool {
        let side = self[id].side;
        self.combatants
            .iter()
            .any(|c| c.id != id && c.side == side && c.is_conscious())
    }

    /// Some hostile creature is conscious, so the creature is in melee
    pub fn has_conscious_hostile(&self, id: CombatantId) -> bool {
        self.hostiles_of(id).any(|c| c.is_conscious())
    }

    /// Release every condition that no longer has a reason to exist
    ///
    /// Conditions end when their causer dies or the affected creature is
    /// incapacitated, and grapples also when the causer is incapacitated.
    pub fn release_stale_conditions(&mut self) -> Vec<CombatEvent> {
        let states: Vec<(bool, bool)> = self
            .combatants
            .iter()
            .map(|c| (c.is_dead(), c.is_conscious()))
            .collect();

        let mut events = Vec::new();
        for combatant in &mut self.combatants {
            let target = combatant.id;
            let incapacitated = !combatant.is_conscious();
            let released = combatant.remove_conditions_where(|condition| {
                if incapacitated && condition.ends_when_target_incapacitated {
                    return true;
                }
                condition.causer.is_some_and(|causer| {
                    let (dead, conscious) = states.get(causer.0).copied().unwrap_or((true, false));
                    dead || (!conscious && condition.ends_when_causer_incapacitated)
                })
            });
            events.extend(released.into_iter().map(|condition| {
                tracing::debug!(creature = %target, condition = %condition, "condition released");
                CombatEvent::ConditionReleased {
                    target,
                    kind: condition.kind,
                    causer: condition.causer,
                }
            }));
        }
        events
    }

    /// Sides that are still in the fight
    ///
    /// To the death, a side stands while any member is alive; otherwise it
    /// needs a conscious member.
    pub fn standing_sides(&self, to_the_death: bool) -> Vec<usize> {
        (0..self.sides.len())
            .filter(|side| {
                self.combatants.iter().any(|c| {
                    c.side == *side && if to_the_death { c.is_alive() } else { c.is_conscious() }
                })
            })
            .collect()
    }
}

impl Index<CombatantId> for Battle {
    type Output = Combatant;

    fn index(&self, id: CombatantId) -> &Combatant {
        &self.combatants[id.0]
    }
}

impl IndexMut<CombatantId> for Battle {
    fn index_mut(&mut self, id: CombatantId) -> &mut Combatant {
        &mut self.combatants[id.0]
    }
}
