//! Closed-form probabilities for d20 rolls
//!
//! These are pure functions: the decision agent relies on them returning the
//! same answer for the same inputs.

use crate::dice::RollMode;

/// Chance of a single natural d20 face
const FACE: f64 = 1.0 / 20.0;

/// Probability that an attack roll hits the target's armor class
///
/// A natural 1 always misses and a natural 20 always hits, so the result is
/// clamped to [0.05, 0.95].
pub fn hit_probability(attack_bonus: i32, target_ac: i32) -> f64 {
    let needed = target_ac - attack_bonus;
    let hitting_faces = (21 - needed).clamp(1, 19);
    hitting_faces as f64 * FACE
}

/// Hit probability when rolling with advantage or disadvantage
pub fn hit_probability_with_mode(attack_bonus: i32, target_ac: i32, mode: RollMode) -> f64 {
    apply_mode(hit_probability(attack_bonus, target_ac), mode)
}

/// Probability of a natural 20
pub fn critical_probability(mode: RollMode) -> f64 {
    apply_mode(FACE, mode)
}

/// Probability that `d20 + modifier >= dc` for a check or saving throw
///
/// Natural 1s and 20s carry no special meaning here.
pub fn check_probability(modifier: i32, dc: i32, mode: RollMode) -> f64 {
    let needed = dc - modifier;
    let passing_faces = (21 - needed).clamp(0, 20);
    apply_mode(passing_faces as f64 * FACE, mode)
}

/// Convert a single-die success chance into the chance under a roll mode
fn apply_mode(p: f64, mode: RollMode) -> f64 {
    match mode {
        RollMode::Normal => p,
        RollMode::Advantage => 1.0 - (1.0 - p) * (1.0 - p),
        RollMode::Disadvantage => p * p,
    }
}
