use crate::creature::LifeState;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How an encounter ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum EncounterResult {
    Victory { side: usize },
    /// Round cap reached, or every side fell at once
    Draw,
}

impl fmt::Display for EncounterResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncounterResult::Victory { side } => write!(f, "victory for side {}", side),
            EncounterResult::Draw => write!(f, "draw"),
        }
    }
}

/// Final state of one participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantSummary {
    pub name: String,
    pub side: String,
    pub hit_points: i32,
    pub max_hit_points: i32,
    pub life: LifeState,
}

/// Everything recorded about a finished encounter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub seed: u64,
    /// Name of the winning side, `None` for a draw
    pub winner: Option<String>,
    pub result: EncounterResult,
    /// Round in which the encounter ended
    pub rounds: u32,
    pub participants: Vec<ParticipantSummary>,
}

impl OutcomeRecord {
    pub fn is_draw(&self) -> bool {
        self.result == EncounterResult::Draw
    }
}
