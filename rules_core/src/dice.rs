//! Dice expressions and d20 rolls
//!
//! Expressions use the usual tabletop notation: `NdS`, `NdS+M`, `NdS-M`, `dS`
//! or a flat integer. Whitespace and case are ignored.

use crate::DiceError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MAX_DICE: u32 = 1000;
const MAX_SIDES: u32 = 1000;

/// A parsed dice expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DiceExpr {
    pub count: u32,
    pub sides: u32,
    pub modifier: i32,
}

impl DiceExpr {
    pub fn new(count: u32, sides: u32, modifier: i32) -> Self {
        DiceExpr {
            count,
            sides,
            modifier,
        }
    }

    /// A constant with no dice
    pub fn flat(modifier: i32) -> Self {
        DiceExpr::new(0, 0, modifier)
    }

    /// Roll the expression
    pub fn roll(&self, rng: &mut impl Rng) -> i32 {
        self.roll_dice(self.count, rng) + self.modifier
    }

    /// Roll with every die doubled and the modifier counted once
    pub fn roll_critical(&self, rng: &mut impl Rng) -> i32 {
        self.roll_dice(self.count * 2, rng) + self.modifier
    }

    /// Sum of `count` dice of this expression's size, without the modifier
    pub fn roll_dice(&self, count: u32, rng: &mut impl Rng) -> i32 {
        if self.sides == 0 {
            return 0;
        }
        (0..count)
            .map(|_| rng.gen_range(1..=self.sides) as i32)
            .sum()
    }

    /// Exact mean of the expression
    pub fn expected_value(&self) -> f64 {
        self.expected_dice() + self.modifier as f64
    }

    /// Exact mean of the dice alone
    pub fn expected_dice(&self) -> f64 {
        if self.sides == 0 {
            return 0.0;
        }
        self.count as f64 * (self.sides as f64 + 1.0) / 2.0
    }

    pub fn min(&self) -> i32 {
        self.count as i32 + self.modifier
    }

    pub fn max(&self) -> i32 {
        (self.count * self.sides) as i32 + self.modifier
    }

    /// Same expression with the dice count multiplied
    pub fn scaled(&self, multiplier: u32) -> Self {
        DiceExpr::new(self.count * multiplier, self.sides, self.modifier)
    }

    pub fn with_modifier(&self, modifier: i32) -> Self {
        DiceExpr::new(self.count, self.sides, modifier)
    }
}

impl FromStr for DiceExpr {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DiceError::InvalidExpression(s.to_string());
        let compact: String = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();

        if compact.is_empty() {
            return Err(invalid());
        }

        let Some((count_part, rest)) = compact.split_once('d') else {
            let modifier = compact.parse::<i32>().map_err(|_| invalid())?;
            return Ok(DiceExpr::flat(modifier));
        };

        let count = if count_part.is_empty() {
            1
        } else {
            count_part.parse::<u32>().map_err(|_| invalid())?
        };

        let (sides_part, modifier) = match rest.find(|c: char| c == '+' || c == '-') {
            Some(pos) => {
                let (sides, modifier) = rest.split_at(pos);
                (sides, modifier.parse::<i32>().map_err(|_| invalid())?)
            }
            None => (rest, 0),
        };

        let sides = sides_part.parse::<u32>().map_err(|_| invalid())?;
        if count == 0 || sides == 0 || count > MAX_DICE || sides > MAX_SIDES {
            return Err(invalid());
        }

        Ok(DiceExpr::new(count, sides, modifier))
    }
}

impl TryFrom<String> for DiceExpr {
    type Error = DiceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DiceExpr> for String {
    fn from(expr: DiceExpr) -> Self {
        expr.to_string()
    }
}

impl fmt::Display for DiceExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count == 0 {
            return write!(f, "{}", self.modifier);
        }
        write!(f, "{}d{}", self.count, self.sides)?;
        match self.modifier {
            0 => Ok(()),
            m if m > 0 => write!(f, "+{}", m),
            m => write!(f, "{}", m),
        }
    }
}

/// Roll a dice expression given as text
pub fn roll(expression: &str, rng: &mut impl Rng) -> Result<i32, DiceError> {
    Ok(expression.parse::<DiceExpr>()?.roll(rng))
}

/// Analytic mean of a dice expression given as text
pub fn expected_value(expression: &str) -> Result<f64, DiceError> {
    Ok(expression.parse::<DiceExpr>()?.expected_value())
}

/// How a d20 is rolled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RollMode {
    #[default]
    Normal,
    Advantage,
    Disadvantage,
}

impl RollMode {
    /// Advantage and disadvantage from any number of sources cancel out
    pub fn from_flags(advantage: bool, disadvantage: bool) -> Self {
        match (advantage, disadvantage) {
            (true, false) => RollMode::Advantage,
            (false, true) => RollMode::Disadvantage,
            _ => RollMode::Normal,
        }
    }
}

impl fmt::Display for RollMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RollMode::Normal => write!(f, "normal"),
            RollMode::Advantage => write!(f, "advantage"),
            RollMode::Disadvantage => write!(f, "disadvantage"),
        }
    }
}

/// Result of a d20 roll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct D20Roll {
    /// The die that counts
    pub natural: i32,
    /// The die that was discarded under advantage or disadvantage
    pub discarded: Option<i32>,
    pub mode: RollMode,
}

impl D20Roll {
    pub fn is_natural_20(&self) -> bool {
        self.natural == 20
    }

    pub fn is_natural_1(&self) -> bool {
        self.natural == 1
    }
}

/// Roll a d20, taking the higher or lower of two under advantage or disadvantage
pub fn roll_d20(rng: &mut impl Rng, mode: RollMode) -> D20Roll {
    let first = rng.gen_range(1..=20);
    if mode == RollMode::Normal {
        return D20Roll {
            natural: first,
            discarded: None,
            mode,
        };
    }

    let second = rng.gen_range(1..=20);
    let (kept, discarded) = match mode {
        RollMode::Advantage => (first.max(second), first.min(second)),
        _ => (first.min(second), first.max(second)),
    };
    D20Roll {
        natural: kept,
        discarded: Some(discarded),
        mode,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_parse_full_expression() {
        let expr: DiceExpr = "2d6+3".parse().unwrap();
        assert_eq!(expr, DiceExpr::new(2, 6, 3));

        let expr: DiceExpr = " 1D8 - 1 ".parse().unwrap();
        assert_eq!(expr, DiceExpr::new(1, 8, -1));
    }

    #[test]
    fn test_parse_shorthand_and_flat() {
        assert_eq!("d20".parse::<DiceExpr>().unwrap(), DiceExpr::new(1, 20, 0));
        assert_eq!("7".parse::<DiceExpr>().unwrap(), DiceExpr::flat(7));
        assert_eq!("-2".parse::<DiceExpr>().unwrap(), DiceExpr::flat(-2));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", "d", "2d", "xd6", "2d6+", "2d6+1+1", "0d6", "2d0", "1d6*2", "dd6"] {
            assert!(
                matches!(bad.parse::<DiceExpr>(), Err(DiceError::InvalidExpression(_))),
                "expected '{}' to be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_display_round_trips_notation() {
        assert_eq!(DiceExpr::new(2, 6, 3).to_string(), "2d6+3");
        assert_eq!(DiceExpr::new(1, 8, -1).to_string(), "1d8-1");
        assert_eq!(DiceExpr::new(1, 12, 0).to_string(), "1d12");
        assert_eq!(DiceExpr::flat(4).to_string(), "4");
    }

    #[test]
    fn test_expected_value_is_exact() {
        assert!((expected_value("1d8+3").unwrap() - 7.5).abs() < f64::EPSILON);
        assert!((expected_value("2d6").unwrap() - 7.0).abs() < f64::EPSILON);
        assert!((expected_value("5").unwrap() - 5.0).abs() < f64::EPSILON);
        assert!(expected_value("banana").is_err());
    }

    #[test]
    fn test_roll_within_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(12345);
        let expr = DiceExpr::new(3, 6, 2);
        for _ in 0..1000 {
            let value = expr.roll(&mut rng);
            assert!(value >= expr.min() && value <= expr.max());
        }
    }

    #[test]
    fn test_critical_doubles_dice_not_modifier() {
        let mut rng = ChaCha8Rng::seed_from_u64(12345);
        let expr = DiceExpr::new(1, 6, 10);
        for _ in 0..1000 {
            let value = expr.roll_critical(&mut rng);
            assert!((12..=22).contains(&value), "critical roll was {}", value);
        }
    }

    #[test]
    fn test_roll_average_converges() {
        let mut rng = ChaCha8Rng::seed_from_u64(12345);
        let iterations = 10000;
        let total: i64 = (0..iterations)
            .map(|_| roll("1d8+3", &mut rng).unwrap() as i64)
            .sum();
        let avg = total as f64 / iterations as f64;
        assert!(avg > 7.3 && avg < 7.7, "Average was {}", avg);
    }

    #[test]
    fn test_roll_mode_cancels() {
        assert_eq!(RollMode::from_flags(true, true), RollMode::Normal);
        assert_eq!(RollMode::from_flags(true, false), RollMode::Advantage);
        assert_eq!(RollMode::from_flags(false, true), RollMode::Disadvantage);
    }

    #[test]
    fn test_advantage_keeps_higher() {
        let mut rng = ChaCha8Rng::seed_from_u64(12345);
        for _ in 0..500 {
            let adv = roll_d20(&mut rng, RollMode::Advantage);
            assert!(adv.natural >= adv.discarded.unwrap());
            let dis = roll_d20(&mut rng, RollMode::Disadvantage);
            assert!(dis.natural <= dis.discarded.unwrap());
        }
    }

    #[test]
    fn test_deserialize_from_string() {
        #[derive(Deserialize)]
        struct Holder {
            hp: DiceExpr,
        }
        let holder: Holder = toml::from_str(r#"hp = "4d10+8""#).unwrap();
        assert_eq!(holder.hp, DiceExpr::new(4, 10, 8));
        assert!(toml::from_str::<Holder>(r#"hp = "4x10""#).is_err());
    }
}
