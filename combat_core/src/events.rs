//! Notifications emitted while resolving actions
//!
//! Reactive traits and condition changes report what they did through these
//! events, so the orchestrator can log them without knowing the rules.

use crate::creature::{CombatantId, ConditionKind};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CombatEvent {
    MartialAdvantage {
        creature: CombatantId,
        damage: i32,
    },
    ConditionApplied {
        target: CombatantId,
        kind: ConditionKind,
        causer: CombatantId,
    },
    ConditionReleased {
        target: CombatantId,
        kind: ConditionKind,
        causer: Option<CombatantId>,
    },
    UndeadFortitude {
        creature: CombatantId,
        dc: i32,
        roll: i32,
        saved: bool,
    },
    HellishRebuke {
        creature: CombatantId,
        target: CombatantId,
        damage: i32,
        saved: bool,
    },
    DeathBurst {
        creature: CombatantId,
        target: CombatantId,
        damage: i32,
        saved: bool,
    },
    Rampage {
        creature: CombatantId,
    },
    Downed {
        creature: CombatantId,
    },
    Died {
        creature: CombatantId,
        instantly: bool,
    },
}

impl CombatEvent {
    /// Short event name for log lines
    pub fn name(&self) -> &'static str {
        match self {
            CombatEvent::MartialAdvantage { .. } => "martial_advantage",
            CombatEvent::ConditionApplied { .. } => "condition_applied",
            CombatEvent::ConditionReleased { .. } => "condition_released",
            CombatEvent::UndeadFortitude { .. } => "undead_fortitude",
            CombatEvent::HellishRebuke { .. } => "hellish_rebuke",
            CombatEvent::DeathBurst { .. } => "death_burst",
            CombatEvent::Rampage { .. } => "rampage",
            CombatEvent::Downed { .. } => "downed",
            CombatEvent::Died { .. } => "died",
        }
    }
}
