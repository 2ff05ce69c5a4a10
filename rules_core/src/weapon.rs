use crate::dice::DiceExpr;
use crate::traits::WeaponTrait;
use crate::types::{Ability, AbilityScores, DamageType, Size};
use crate::DiceError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Dice plus the type of damage they deal, written as `"1d8 piercing"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DamageRoll {
    pub dice: DiceExpr,
    pub damage_type: DamageType,
}

impl DamageRoll {
    pub fn new(dice: DiceExpr, damage_type: DamageType) -> Self {
        DamageRoll { dice, damage_type }
    }

    pub fn scaled(&self, multiplier: u32) -> Self {
        DamageRoll::new(self.dice.scaled(multiplier), self.damage_type)
    }
}

impl FromStr for DamageRoll {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (dice, damage_type) = trimmed
            .rsplit_once(char::is_whitespace)
            .ok_or_else(|| DiceError::InvalidExpression(s.to_string()))?;
        let damage_type = damage_type
            .parse::<DamageType>()
            .map_err(|_| DiceError::InvalidExpression(s.to_string()))?;
        Ok(DamageRoll::new(dice.parse()?, damage_type))
    }
}

impl TryFrom<String> for DamageRoll {
    type Error = DiceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DamageRoll> for String {
    fn from(roll: DamageRoll) -> Self {
        roll.to_string()
    }
}

impl fmt::Display for DamageRoll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.dice, self.damage_type)
    }
}

/// Weapon property flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WeaponProperties {
    #[serde(default)]
    pub finesse: bool,
    #[serde(default)]
    pub light: bool,
    #[serde(default)]
    pub heavy: bool,
    #[serde(default)]
    pub reach: bool,
    #[serde(default)]
    pub thrown: bool,
    #[serde(default)]
    pub ammunition: bool,
    #[serde(default)]
    pub loading: bool,
    /// Attacks are ranged attacks (bows, crossbows, slings, nets)
    #[serde(default)]
    pub ranged: bool,
}

/// A weapon or natural attack
///
/// Weapons are immutable once loaded and shared between every creature that
/// wields them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    pub id: String,
    /// Display name, derived from the id when left empty
    #[serde(default)]
    pub name: String,
    /// One-handed damage
    #[serde(default)]
    pub damage: Option<DamageRoll>,
    /// Damage when wielded with two hands (versatile or two-handed weapons)
    #[serde(default)]
    pub two_handed_damage: Option<DamageRoll>,
    /// Extra damage that never receives the ability modifier
    #[serde(default)]
    pub bonus_damage: Option<DamageRoll>,
    #[serde(flatten)]
    pub properties: WeaponProperties,
    /// Claws, bites and other attacks that are part of the creature
    #[serde(default)]
    pub natural: bool,
    #[serde(default)]
    pub traits: Vec<WeaponTrait>,
}

impl Weapon {
    pub fn new(id: impl Into<String>, damage: DamageRoll) -> Self {
        let id = id.into();
        Weapon {
            name: id.replace('_', " "),
            id,
            damage: Some(damage),
            two_handed_damage: None,
            bonus_damage: None,
            properties: WeaponProperties::default(),
            natural: false,
            traits: Vec::new(),
        }
    }

    pub fn is_ranged(&self) -> bool {
        self.properties.ranged
    }

    pub fn is_melee(&self) -> bool {
        !self.properties.ranged
    }

    /// Ammunition and thrown weapons run out
    pub fn has_limited_supply(&self) -> bool {
        self.properties.ammunition || (self.properties.thrown && self.is_ranged())
    }

    pub fn has_trait(&self, weapon_trait: WeaponTrait) -> bool {
        self.traits.contains(&weapon_trait)
    }

    /// Whether the weapon can only be used with two hands
    pub fn requires_two_hands(&self) -> bool {
        self.damage.is_none() && self.two_handed_damage.is_some()
    }

    /// Ability used for attack and damage rolls
    ///
    /// Finesse weapons use the better of STR and DEX, other melee weapons STR,
    /// ranged weapons DEX.
    pub fn attack_ability(&self, scores: &AbilityScores) -> Ability {
        if self.properties.finesse {
            if scores.dexterity > scores.strength {
                Ability::Dexterity
            } else {
                Ability::Strength
            }
        } else if self.is_ranged() {
            Ability::Dexterity
        } else {
            Ability::Strength
        }
    }

    /// The damage roll used, given whether a second hand is free
    pub fn damage_for(&self, free_hand: bool) -> Option<&DamageRoll> {
        if free_hand {
            self.two_handed_damage.as_ref().or(self.damage.as_ref())
        } else {
            self.damage.as_ref()
        }
    }

    /// Copy of the weapon sized for a wielder of the given size
    ///
    /// Manufactured weapons of Large and bigger creatures roll extra dice.
    /// Natural attacks already describe the creature's own size.
    pub fn scaled_for(&self, size: Size) -> Weapon {
        let multiplier = size.weapon_dice_multiplier();
        if self.natural || multiplier == 1 {
            return self.clone();
        }
        Weapon {
            damage: self.damage.map(|d| d.scaled(multiplier)),
            two_handed_damage: self.two_handed_damage.map(|d| d.scaled(multiplier)),
            bonus_damage: self.bonus_damage.map(|d| d.scaled(multiplier)),
            ..self.clone()
        }
    }
}

impl fmt::Display for Weapon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn longsword() -> Weapon {
        Weapon {
            two_handed_damage: Some("1d10 slashing".parse().unwrap()),
            ..Weapon::new("longsword", "1d8 slashing".parse().unwrap())
        }
    }

    #[test]
    fn test_parse_damage_roll() {
        let roll: DamageRoll = "2d6+1 bludgeoning".parse().unwrap();
        assert_eq!(roll.dice, DiceExpr::new(2, 6, 1));
        assert_eq!(roll.damage_type, DamageType::Bludgeoning);

        assert!("2d6".parse::<DamageRoll>().is_err());
        assert!("2d6 physical".parse::<DamageRoll>().is_err());
    }

    #[test]
    fn test_attack_ability() {
        let agile = AbilityScores::new([8, 14, 10, 10, 8, 8]);
        let strong = AbilityScores::new([16, 12, 16, 7, 11, 10]);

        let mut scimitar = Weapon::new("scimitar", "1d6 slashing".parse().unwrap());
        scimitar.properties.finesse = true;
        assert_eq!(scimitar.attack_ability(&agile), Ability::Dexterity);
        assert_eq!(scimitar.attack_ability(&strong), Ability::Strength);

        let mut shortbow = Weapon::new("shortbow", "1d6 piercing".parse().unwrap());
        shortbow.properties.ranged = true;
        assert_eq!(shortbow.attack_ability(&strong), Ability::Dexterity);

        assert_eq!(longsword().attack_ability(&agile), Ability::Strength);
    }

    #[test]
    fn test_versatile_damage() {
        let sword = longsword();
        assert_eq!(sword.damage_for(true).unwrap().dice.sides, 10);
        assert_eq!(sword.damage_for(false).unwrap().dice.sides, 8);
        assert!(!sword.requires_two_hands());

        let greataxe = Weapon {
            damage: None,
            two_handed_damage: Some("1d12 slashing".parse().unwrap()),
            ..Weapon::new("greataxe", "1d12 slashing".parse().unwrap())
        };
        assert!(greataxe.requires_two_hands());
        assert!(greataxe.damage_for(false).is_none());
    }

    #[test]
    fn test_large_wielder_doubles_dice() {
        let scaled = longsword().scaled_for(Size::Large);
        assert_eq!(scaled.damage.unwrap().dice, DiceExpr::new(2, 8, 0));
        assert_eq!(scaled.two_handed_damage.unwrap().dice, DiceExpr::new(2, 10, 0));

        let mut bite = Weapon::new("bite", "1d8 piercing".parse().unwrap());
        bite.natural = true;
        assert_eq!(bite.scaled_for(Size::Huge), bite);
    }
}
