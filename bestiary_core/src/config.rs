use crate::template::HitPoints;
use rules_core::{Ability, AbilityScores, CreatureTrait, DamageType, Size, Weapon};
use serde::Deserialize;

/// TOML configuration for a catalog file
///
/// A file may define weapons, creatures, or both.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogFileConfig {
    #[serde(default)]
    pub weapons: Vec<Weapon>,
    #[serde(default)]
    pub creatures: Vec<CreatureConfig>,
}

/// Stat block of a creature as written in a catalog file
#[derive(Debug, Clone, Deserialize)]
pub struct CreatureConfig {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub armor_class: i32,
    /// Either a fixed number or hit dice such as `"2d8"`
    pub hit_points: HitPoints,
    /// STR, DEX, CON, INT, WIS, CHA
    pub abilities: AbilityScores,
    #[serde(default)]
    pub challenge_rating: f64,
    /// Overrides the attack bonus derived from abilities and proficiency
    #[serde(default)]
    pub attack_bonus: Option<i32>,
    #[serde(default = "default_speed")]
    pub speed: u32,
    #[serde(default)]
    pub size: Size,
    /// Weapon ids, in the order the creature prefers to declare them
    pub attacks: Vec<String>,
    #[serde(default = "default_num_attacks")]
    pub num_attacks: u32,
    /// Each attack of a multiattack must use a different weapon
    #[serde(default)]
    pub different_attacks: bool,
    #[serde(default = "default_hands")]
    pub hands: u32,
    #[serde(default)]
    pub shield: bool,
    #[serde(default)]
    pub resistances: Vec<DamageType>,
    #[serde(default)]
    pub vulnerabilities: Vec<DamageType>,
    #[serde(default)]
    pub immunities: Vec<DamageType>,
    #[serde(default)]
    pub traits: Vec<CreatureTrait>,
    /// Without death saves the creature dies as soon as it drops to 0 HP
    #[serde(default)]
    pub make_death_saves: bool,
    #[serde(default)]
    pub save_proficiencies: Vec<Ability>,
}

fn default_speed() -> u32 {
    30
}

fn default_num_attacks() -> u32 {
    1
}

fn default_hands() -> u32 {
    2
}
