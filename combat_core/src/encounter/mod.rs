//! Encounter orchestration - Initiative, rounds and turns
//!
//! An encounter is a state machine:
//!
//! ```text
//! RollInitiative → StartRound → StartTurn → ChooseAction → ResolveAction → EndTurn
//!                      ▲            ▲                                         │
//!                      │            └──────────── next participant ───────────┤
//!                      └──────────────── EndRound ◀── last participant ───────┘
//! ```
//!
//! Termination is checked after every turn; the round cap ends the encounter
//! in a draw.

mod battle;
mod outcome;

pub use battle::Battle;
pub use outcome::{EncounterResult, OutcomeRecord, ParticipantSummary};

use crate::agent::{self, Action};
use crate::combat::{resolve_attack, resolve_escape, AttackResult};
use crate::config::{ConfigError, SimConfig};
use crate::creature::{CombatantId, LifeState};
use crate::error::SimError;
use crate::events::CombatEvent;
use bestiary_core::Catalog;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rules_core::{roll_d20, Ability, RollMode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span};

/// A named group of catalog creatures fighting together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideSpec {
    pub name: String,
    pub members: Vec<String>,
}

impl SideSpec {
    pub fn new(name: impl Into<String>, members: &[&str]) -> Self {
        SideSpec {
            name: name.into(),
            members: members.iter().map(|m| m.to_string()).collect(),
        }
    }
}

/// Who fights whom
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterSpec {
    pub sides: Vec<SideSpec>,
}

impl EncounterSpec {
    pub fn new(sides: Vec<SideSpec>) -> Self {
        EncounterSpec { sides }
    }

    /// One creature against another
    pub fn duel(first: &str, second: &str) -> Self {
        let (a, b) = if first == second {
            (format!("{} #1", first), format!("{} #2", second))
        } else {
            (first.to_string(), second.to_string())
        };
        EncounterSpec::new(vec![SideSpec::new(a, &[first]), SideSpec::new(b, &[second])])
    }

    /// Check the shape of the encounter and that every creature exists
    pub fn validate(&self, catalog: &impl Catalog) -> Result<(), SimError> {
        if self.sides.len() < 2 {
            return Err(ConfigError::ValidationError(
                "an encounter needs at least two sides".to_string(),
            )
            .into());
        }
        for side in &self.sides {
            if side.members.is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "side '{}' has no members",
                    side.name
                ))
                .into());
            }
            for member in &side.members {
                catalog.get_creature_template(member)?;
            }
        }
        Ok(())
    }

    pub fn side_names(&self) -> Vec<String> {
        self.sides.iter().map(|s| s.name.clone()).collect()
    }
}

/// Phases of the encounter state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    RollInitiative,
    StartRound,
    StartTurn,
    ChooseAction,
    ResolveAction,
    EndTurn,
    EndRound,
    Finished,
}

/// A participant's place in the turn order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InitiativeEntry {
    pub combatant: CombatantId,
    pub roll: i32,
    pub dexterity: i32,
}

/// A single fight, driven one phase at a time
pub struct Encounter {
    battle: Battle,
    config: SimConfig,
    seed: u64,
    rng: ChaCha8Rng,
    phase: Phase,
    order: Vec<InitiativeEntry>,
    round: u32,
    turn: usize,
    pending: Option<agent::Decision>,
    result: Option<EncounterResult>,
    events: Vec<CombatEvent>,
}

impl Encounter {
    /// Start an encounter over an already populated battle
    pub fn new(battle: Battle, config: SimConfig, seed: u64) -> Self {
        Self::with_rng(battle, config, seed, ChaCha8Rng::seed_from_u64(seed))
    }

    /// Build an encounter from catalog names
    ///
    /// Hit points are rolled from the same seeded generator that drives the
    /// fight.
    pub fn from_catalog(
        catalog: &impl Catalog,
        spec: &EncounterSpec,
        config: &SimConfig,
        seed: u64,
    ) -> Result<Self, SimError> {
        spec.validate(catalog)?;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut battle = Battle::new(spec.side_names());
        for (side, side_spec) in spec.sides.iter().enumerate() {
            for member in &side_spec.members {
                let template = catalog.get_creature_template(member)?;
                battle.spawn(side, template, config, &mut rng);
            }
        }
        Ok(Self::with_rng(battle, config.clone(), seed, rng))
    }

    fn with_rng(battle: Battle, config: SimConfig, seed: u64, rng: ChaCha8Rng) -> Self {
        Encounter {
            battle,
            config,
            seed,
            rng,
            phase: Phase::RollInitiative,
            order: Vec::new(),
            round: 0,
            turn: 0,
            pending: None,
            result: None,
            events: Vec::new(),
        }
    }

    pub fn battle(&self) -> &Battle {
        &self.battle
    }

    pub fn battle_mut(&mut self) -> &mut Battle {
        &mut self.battle
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn order(&self) -> &[InitiativeEntry] {
        &self.order
    }

    /// Trait and condition notifications so far
    pub fn events(&self) -> &[CombatEvent] {
        &self.events
    }

    pub fn result(&self) -> Option<EncounterResult> {
        self.result
    }

    /// Run the encounter to the end
    pub fn run(mut self) -> Result<OutcomeRecord, SimError> {
        self.run_to_end()
    }

    /// Step until finished, keeping the encounter around for inspection
    pub fn run_to_end(&mut self) -> Result<OutcomeRecord, SimError> {
        let span = info_span!("encounter", seed = self.seed);
        let _enter = span.enter();

        while self.phase != Phase::Finished {
            self.step()?;
        }
        self.outcome()
            .ok_or_else(|| SimError::illegal("encounter", "finished without a result"))
    }

    /// Advance the state machine by one phase
    pub fn step(&mut self) -> Result<Phase, SimError> {
        let next = match self.phase {
            Phase::RollInitiative => {
                self.roll_initiative();
                Phase::StartRound
            }
            Phase::StartRound if self.order.is_empty() => {
                let result = self.check_termination().unwrap_or(EncounterResult::Draw);
                self.finish(result);
                Phase::Finished
            }
            Phase::StartRound => {
                self.round += 1;
                self.turn = 0;
                debug!(round = self.round, "round start");
                Phase::StartTurn
            }
            Phase::StartTurn => self.start_turn()?,
            Phase::ChooseAction => self.choose_action()?,
            Phase::ResolveAction => self.resolve_action()?,
            Phase::EndTurn => self.end_turn(),
            Phase::EndRound => self.end_round(),
            Phase::Finished => Phase::Finished,
        };
        self.phase = next;
        Ok(next)
    }

    /// Outcome record, once the encounter has finished
    pub fn outcome(&self) -> Option<OutcomeRecord> {
        let result = self.result?;
        let winner = match result {
            EncounterResult::Victory { side } => Some(self.battle.side_name(side).to_string()),
            EncounterResult::Draw => None,
        };
        Some(OutcomeRecord {
            seed: self.seed,
            winner,
            result,
            rounds: self.round,
            participants: self
                .battle
                .combatants()
                .iter()
                .map(|c| ParticipantSummary {
                    name: c.name.clone(),
                    side: self.battle.side_name(c.side).to_string(),
                    hit_points: c.hp,
                    max_hit_points: c.max_hp,
                    life: c.life,
                })
                .collect(),
        })
    }

    fn current_actor(&self) -> CombatantId {
        self.order[self.turn].combatant
    }

    /// Higher total first, then higher DEX score, then declaration order
    fn roll_initiative(&mut self) {
        let mut order = Vec::with_capacity(self.battle.combatants().len());
        for combatant in self.battle.combatants() {
            let roll = roll_d20(&mut self.rng, RollMode::Normal).natural
                + combatant.abilities.modifier(Ability::Dexterity);
            order.push(InitiativeEntry {
                combatant: combatant.id,
                roll,
                dexterity: combatant.abilities.dexterity,
            });
        }
        order.sort_by(|a, b| {
            b.roll
                .cmp(&a.roll)
                .then(b.dexterity.cmp(&a.dexterity))
                .then(a.combatant.cmp(&b.combatant))
        });
        for entry in &order {
            debug!(creature = %self.battle[entry.combatant], roll = entry.roll, "initiative");
        }
        self.order = order;
    }

    /// Death saves and condition upkeep; only conscious creatures act
    fn start_turn(&mut self) -> Result<Phase, SimError> {
        let actor = self.current_actor();
        let creature = &mut self.battle[actor];
        if creature.is_dead() {
            return Ok(Phase::EndTurn);
        }
        creature.start_turn();

        if matches!(creature.life, LifeState::Dying { .. }) {
            let (natural, outcome) = creature.roll_death_save(self.config.death_save_dc, &mut self.rng)?;
            debug!(creature = %creature, natural, outcome = ?outcome, "death save");
        }
        let released = self.battle.release_stale_conditions();
        self.events.extend(released);

        Ok(if self.battle[actor].is_conscious() {
            Phase::ChooseAction
        } else {
            Phase::EndTurn
        })
    }

    fn choose_action(&mut self) -> Result<Phase, SimError> {
        let actor = self.current_actor();
        self.battle[actor].ensure_can_act()?;
        let decision = agent::choose_action(&self.battle, actor, &self.config);
        debug!(
            creature = %self.battle[actor],
            action = ?decision.action,
            expected_value = decision.expected_value,
            "decision"
        );
        self.pending = Some(decision);
        Ok(Phase::ResolveAction)
    }

    fn resolve_action(&mut self) -> Result<Phase, SimError> {
        let actor = self.current_actor();
        let Some(decision) = self.pending.take() else {
            return Err(SimError::illegal(&self.battle[actor].name, "resolving without a chosen action"));
        };
        match decision.action {
            Action::Attack { attacks } => self.resolve_attacks(actor, attacks.len())?,
            Action::Escape { kind } => {
                let result = resolve_escape(&mut self.battle, actor, kind, &mut self.rng)?;
                self.events.extend(result.events);
            }
            Action::Pass => debug!(creature = %self.battle[actor], "pass"),
        }
        Ok(Phase::EndTurn)
    }

    /// Each attack re-picks its target, since an earlier one may have downed it
    fn resolve_attacks(&mut self, actor: CombatantId, count: usize) -> Result<(), SimError> {
        let mut used = Vec::new();
        for _ in 0..count {
            if !self.battle[actor].is_conscious() || self.check_termination().is_some() {
                break;
            }
            let Some(planned) = agent::choose_attack(&self.battle, actor, &used, &self.config) else {
                break;
            };
            used.push(planned.attack_index);
            let result = resolve_attack(
                &mut self.battle,
                actor,
                planned.attack_index,
                planned.target,
                &self.config,
                &mut self.rng,
            )?;
            let rampage = result.rampage;
            self.record(result);
            if rampage {
                self.bonus_attack(actor)?;
            }
        }
        Ok(())
    }

    /// Rampage: one melee attack as a bonus action
    fn bonus_attack(&mut self, actor: CombatantId) -> Result<(), SimError> {
        if self.battle[actor].resources.bonus_action_used {
            return Ok(());
        }
        self.battle[actor].resources.bonus_action_used = true;
        if !self.battle[actor].is_conscious() || self.check_termination().is_some() {
            return Ok(());
        }
        if let Some(planned) = agent::choose_melee_attack(&self.battle, actor, &self.config) {
            let result = resolve_attack(
                &mut self.battle,
                actor,
                planned.attack_index,
                planned.target,
                &self.config,
                &mut self.rng,
            )?;
            self.record(result);
        }
        Ok(())
    }

    fn record(&mut self, result: AttackResult) {
        for event in &result.events {
            debug!(event = event.name(), details = ?event, "trait triggered");
        }
        self.events.extend(result.events);
    }

    fn end_turn(&mut self) -> Phase {
        let released = self.battle.release_stale_conditions();
        self.events.extend(released);

        if let Some(result) = self.check_termination() {
            self.finish(result);
            return Phase::Finished;
        }
        self.turn += 1;
        if self.turn >= self.order.len() {
            Phase::EndRound
        } else {
            Phase::StartTurn
        }
    }

    fn end_round(&mut self) -> Phase {
        if self.round >= self.config.max_rounds {
            self.finish(EncounterResult::Draw);
            Phase::Finished
        } else {
            Phase::StartRound
        }
    }

    fn check_termination(&self) -> Option<EncounterResult> {
        let standing = self.battle.standing_sides(self.config.to_the_death);
        match standing.as_slice() {
            [] => Some(EncounterResult::Draw),
            [side] => Some(EncounterResult::Victory { side: *side }),
            _ => None,
        }
    }

    fn finish(&mut self, result: EncounterResult) {
        let winner = match result {
            EncounterResult::Victory { side } => self.battle.side_name(side),
            EncounterResult::Draw => "none",
        };
        info!(seed = self.seed, rounds = self.round, winner, "encounter finished");
        self.result = Some(result);
    }
}
