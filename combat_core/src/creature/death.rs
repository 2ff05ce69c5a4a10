//! Death & dying state machine
//!
//! ```text
//! Active ──0 HP──▶ Dying(s, f) ──3 successes──▶ Stabilized
//!   │                 │  │                          │
//!   │                 │  └──nat 20──▶ Active (1 HP) │ damage
//!   │                 └──3 failures──▶ Dead ◀───────┘ (via Dying)
//!   └──massive damage──▶ InstantlyDead
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Successes or failures needed to end the dying state
pub const DEATH_SAVES_NEEDED: u8 = 3;

/// Where a creature stands between fighting fit and dead
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LifeState {
    #[default]
    Active,
    /// At 0 hit points, rolling death saves
    Dying { successes: u8, failures: u8 },
    /// At 0 hit points and unconscious, but no longer rolling
    Stabilized,
    Dead,
    /// Killed by massive damage; never passes through `Dying`
    InstantlyDead,
}

impl LifeState {
    pub fn is_conscious(&self) -> bool {
        matches!(self, LifeState::Active)
    }

    /// At 0 hit points but not dead
    pub fn is_down(&self) -> bool {
        matches!(self, LifeState::Dying { .. } | LifeState::Stabilized)
    }

    pub fn is_dead(&self) -> bool {
        matches!(self, LifeState::Dead | LifeState::InstantlyDead)
    }

    pub fn is_alive(&self) -> bool {
        !self.is_dead()
    }
}

impl fmt::Display for LifeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifeState::Active => write!(f, "active"),
            LifeState::Dying {
                successes,
                failures,
            } => write!(f, "dying ({} successes, {} failures)", successes, failures),
            LifeState::Stabilized => write!(f, "stabilized"),
            LifeState::Dead => write!(f, "dead"),
            LifeState::InstantlyDead => write!(f, "instantly dead"),
        }
    }
}

/// What a single death save did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeathSaveOutcome {
    Success { successes: u8 },
    Failure { failures: u8 },
    /// Natural 20 (back up at 1 HP) or a third success (stable at 0 HP)
    Stabilized { hit_points: i32 },
    Died,
}

/// Apply a natural d20 death save to a dying creature
///
/// Returns `None` when the creature is not dying.
pub fn death_save(state: LifeState, natural: i32, dc: i32) -> Option<(LifeState, DeathSaveOutcome)> {
    let LifeState::Dying {
        successes,
        failures,
    } = state
    else {
        return None;
    };

    if natural == 20 {
        return Some((LifeState::Active, DeathSaveOutcome::Stabilized { hit_points: 1 }));
    }

    if natural != 1 && natural >= dc {
        let successes = successes + 1;
        if successes >= DEATH_SAVES_NEEDED {
            return Some((LifeState::Stabilized, DeathSaveOutcome::Stabilized { hit_points: 0 }));
        }
        return Some((
            LifeState::Dying {
                successes,
                failures,
            },
            DeathSaveOutcome::Success { successes },
        ));
    }

    // A natural 1 counts twice
    let failures = failures + if natural == 1 { 2 } else { 1 };
    if failures >= DEATH_SAVES_NEEDED {
        return Some((LifeState::Dead, DeathSaveOutcome::Died));
    }
    Some((
        LifeState::Dying {
            successes,
            failures,
        },
        DeathSaveOutcome::Failure { failures },
    ))
}

/// A damaging hit taken while at 0 hit points counts as one failed save
pub fn damaged_while_down(state: LifeState) -> LifeState {
    match state {
        LifeState::Dying {
            successes,
            failures,
        } => {
            let failures = failures + 1;
            if failures >= DEATH_SAVES_NEEDED {
                LifeState::Dead
            } else {
                LifeState::Dying {
                    successes,
                    failures,
                }
            }
        }
        LifeState::Stabilized => LifeState::Dying {
            successes: 0,
            failures: 1,
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const DYING: LifeState = LifeState::Dying {
        successes: 0,
        failures: 0,
    };

    #[test]
    fn test_not_dying() {
        assert_eq!(death_save(LifeState::Active, 15, 10), None);
        assert_eq!(death_save(LifeState::Dead, 20, 10), None);
        assert_eq!(death_save(LifeState::Stabilized, 5, 10), None);
    }

    #[test]
    fn test_three_failures_is_dead() {
        let (state, _) = death_save(DYING, 5, 10).unwrap();
        let (state, _) = death_save(state, 9, 10).unwrap();
        let (state, outcome) = death_save(state, 2, 10).unwrap();
        assert_eq!(state, LifeState::Dead);
        assert_eq!(outcome, DeathSaveOutcome::Died);
    }

    #[test]
    fn test_natural_one_counts_twice() {
        let (state, outcome) = death_save(DYING, 1, 10).unwrap();
        assert_eq!(outcome, DeathSaveOutcome::Failure { failures: 2 });
        let (state, _) = death_save(state, 1, 10).unwrap();
        assert_eq!(state, LifeState::Dead);
    }

    #[test]
    fn test_three_successes_stabilize_at_zero() {
        let (state, _) = death_save(DYING, 10, 10).unwrap();
        let (state, _) = death_save(state, 14, 10).unwrap();
        let (state, outcome) = death_save(state, 19, 10).unwrap();
        assert_eq!(state, LifeState::Stabilized);
        assert_eq!(outcome, DeathSaveOutcome::Stabilized { hit_points: 0 });
        assert!(state.is_down());
    }

    #[test]
    fn test_natural_twenty_stabilizes_at_one() {
        let almost_dead = LifeState::Dying {
            successes: 0,
            failures: 2,
        };
        let (state, outcome) = death_save(almost_dead, 20, 10).unwrap();
        assert_eq!(state, LifeState::Active);
        assert_eq!(outcome, DeathSaveOutcome::Stabilized { hit_points: 1 });
    }

    #[test]
    fn test_damage_while_down() {
        assert_eq!(
            damaged_while_down(DYING),
            LifeState::Dying {
                successes: 0,
                failures: 1
            }
        );
        assert_eq!(
            damaged_while_down(LifeState::Dying {
                successes: 2,
                failures: 2
            }),
            LifeState::Dead
        );
        assert_eq!(
            damaged_while_down(LifeState::Stabilized),
            LifeState::Dying {
                successes: 0,
                failures: 1
            }
        );
        assert_eq!(damaged_while_down(LifeState::Active), LifeState::Active);
    }

    proptest! {
        #[test]
        fn prop_three_failures_before_successes_is_dead(rolls in prop::collection::vec(1i32..=20, 1..12)) {
            let mut state = DYING;
            let mut successes = 0u8;
            let mut failures = 0u8;
            for natural in rolls {
                let Some((next, outcome)) = death_save(state, natural, 10) else { break };
                state = next;
                if natural == 20 {
                    prop_assert_eq!(outcome, DeathSaveOutcome::Stabilized { hit_points: 1 });
                    prop_assert_eq!(state, LifeState::Active);
                    break;
                }
                if natural >= 10 {
                    successes += 1;
                } else {
                    failures += if natural == 1 { 2 } else { 1 };
                }
                if failures >= 3 {
                    prop_assert_eq!(state, LifeState::Dead);
                    break;
                }
                if successes >= 3 {
                    prop_assert_eq!(state, LifeState::Stabilized);
                    break;
                }
                prop_assert_eq!(state, LifeState::Dying { successes, failures });
            }
        }
    }
}
