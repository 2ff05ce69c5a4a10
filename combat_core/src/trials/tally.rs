use super::OutcomeSink;
use crate::encounter::{EncounterResult, OutcomeRecord};
use serde::Serialize;

/// Wins recorded for one side
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SideTally {
    pub name: String,
    pub wins: usize,
}

/// A trial that aborted with an error
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrialFailure {
    pub index: usize,
    pub seed: u64,
    pub message: String,
}

/// Aggregated results of a batch of trials
///
/// Failed and cancelled trials are counted separately and never touch the
/// tallies of completed ones.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TrialReport {
    pub base_seed: u64,
    pub requested: usize,
    pub sides: Vec<SideTally>,
    pub draws: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub failures: Vec<TrialFailure>,
    total_rounds: u64,
    /// Completed outcomes, in trial order
    pub outcomes: Vec<OutcomeRecord>,
}

impl TrialReport {
    pub fn new(side_names: Vec<String>, requested: usize, base_seed: u64) -> Self {
        TrialReport {
            base_seed,
            requested,
            sides: side_names
                .into_iter()
                .map(|name| SideTally { name, wins: 0 })
                .collect(),
            ..TrialReport::default()
        }
    }

    pub fn record_failure(&mut self, index: usize, seed: u64, message: String) {
        self.failures.push(TrialFailure {
            index,
            seed,
            message,
        });
    }

    pub fn record_cancelled(&mut self) {
        self.cancelled += 1;
    }

    pub fn wins(&self, side: &str) -> Option<usize> {
        self.sides.iter().find(|s| s.name == side).map(|s| s.wins)
    }

    /// Share of completed trials won by a side
    pub fn win_rate(&self, side: &str) -> Option<f64> {
        let wins = self.wins(side)?;
        if self.completed == 0 {
            return Some(0.0);
        }
        Some(wins as f64 / self.completed as f64)
    }

    pub fn draw_rate(&self) -> f64 {
        if self.completed == 0 {
            return 0.0;
        }
        self.draws as f64 / self.completed as f64
    }

    /// Mean number of rounds over completed trials
    pub fn mean_rounds(&self) -> f64 {
        if self.completed == 0 {
            return 0.0;
        }
        self.total_rounds as f64 / self.completed as f64
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl OutcomeSink for TrialReport {
    fn record(&mut self, _index: usize, outcome: &OutcomeRecord) {
        match outcome.result {
            EncounterResult::Victory { side } => {
                if let Some(tally) = self.sides.get_mut(side) {
                    tally.wins += 1;
                }
            }
            EncounterResult::Draw => self.draws += 1,
        }
        self.completed += 1;
        self.total_rounds += u64::from(outcome.rounds);
        self.outcomes.push(outcome.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(result: EncounterResult, rounds: u32) -> OutcomeRecord {
        OutcomeRecord {
            seed: 0,
            winner: match result {
                EncounterResult::Victory { side: 0 } => Some("red".to_string()),
                EncounterResult::Victory { .. } => Some("blue".to_string()),
                EncounterResult::Draw => None,
            },
            result,
            rounds,
            participants: Vec::new(),
        }
    }

    #[test]
    fn test_tally() {
        let mut report = TrialReport::new(vec!["red".to_string(), "blue".to_string()], 5, 100);
        report.record(0, &outcome(EncounterResult::Victory { side: 0 }, 2));
        report.record(1, &outcome(EncounterResult::Victory { side: 1 }, 4));
        report.record(2, &outcome(EncounterResult::Victory { side: 0 }, 3));
        report.record(3, &outcome(EncounterResult::Draw, 100));
        report.record_failure(4, 104, "broken".to_string());

        assert_eq!(report.wins("red"), Some(2));
        assert_eq!(report.completed, 4);
        assert!((report.win_rate("red").unwrap() - 0.5).abs() < f64::EPSILON);
        assert!((report.draw_rate() - 0.25).abs() < f64::EPSILON);
        assert!((report.mean_rounds() - 27.25).abs() < f64::EPSILON);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.win_rate("green"), None);
    }

    #[test]
    fn test_empty_report() {
        let report = TrialReport::new(vec!["red".to_string()], 0, 0);
        assert!((report.mean_rounds() - 0.0).abs() < f64::EPSILON);
        assert_eq!(report.win_rate("red"), Some(0.0));
    }

    #[test]
    fn test_to_json() {
        let mut report = TrialReport::new(vec!["red".to_string(), "blue".to_string()], 1, 7);
        report.record(0, &outcome(EncounterResult::Victory { side: 1 }, 3));
        let json = report.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["sides"][1]["wins"], 1);
        assert_eq!(value["outcomes"][0]["winner"], "blue");
        assert_eq!(value["outcomes"][0]["result"]["result"], "victory");
    }
}
