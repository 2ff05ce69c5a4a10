use crate::config::CreatureConfig;
use crate::registry::normalize_name;
use crate::TemplateError;
use rand::Rng;
use rules_core::{
    Ability, AbilityScores, CreatureTrait, DamageType, DiceExpr, Size, Weapon,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Hit points of a stat block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HitPoints {
    Fixed(i32),
    /// Hit dice; each die also adds the CON modifier
    Dice(DiceExpr),
}

impl HitPoints {
    /// Roll hit points for a fresh instance (minimum 1)
    pub fn roll(&self, con_modifier: i32, rng: &mut impl Rng) -> i32 {
        match self {
            HitPoints::Fixed(hp) => (*hp).max(1),
            HitPoints::Dice(dice) => {
                (dice.roll(rng) + con_modifier * dice.count as i32).max(1)
            }
        }
    }

    /// Average hit points, as printed in a stat block
    pub fn average(&self, con_modifier: i32) -> i32 {
        match self {
            HitPoints::Fixed(hp) => (*hp).max(1),
            HitPoints::Dice(dice) => {
                let avg = dice.expected_value().floor() as i32;
                (avg + con_modifier * dice.count as i32).max(1)
            }
        }
    }
}

/// Proficiency bonus by challenge rating: 2 up to CR 4, then +1 every 4 CR
pub fn proficiency_for_cr(challenge_rating: f64) -> i32 {
    let cr = challenge_rating.floor() as i32;
    (cr - 1).max(0) / 4 + 2
}

/// A validated stat block, the blueprint for combatant instances
#[derive(Debug, Clone, PartialEq)]
pub struct CreatureTemplate {
    pub id: String,
    pub name: String,
    pub armor_class: i32,
    pub hit_points: HitPoints,
    pub abilities: AbilityScores,
    pub challenge_rating: f64,
    pub proficiency_bonus: i32,
    pub attack_bonus: Option<i32>,
    pub speed: u32,
    pub size: Size,
    /// Weapons already scaled for the creature's size
    pub attacks: Vec<Arc<Weapon>>,
    pub num_attacks: u32,
    pub different_attacks: bool,
    pub hands: u32,
    pub shield: bool,
    pub resistances: Vec<DamageType>,
    pub vulnerabilities: Vec<DamageType>,
    pub immunities: Vec<DamageType>,
    pub traits: Vec<CreatureTrait>,
    pub make_death_saves: bool,
    pub save_proficiencies: Vec<Ability>,
}

impl CreatureTemplate {
    /// A medium creature with one attack per action and no traits
    pub fn new(
        id: impl Into<String>,
        armor_class: i32,
        hit_points: HitPoints,
        abilities: AbilityScores,
    ) -> Self {
        let id = id.into();
        CreatureTemplate {
            name: id.replace('_', " "),
            id,
            armor_class,
            hit_points,
            abilities,
            challenge_rating: 0.0,
            proficiency_bonus: 2,
            attack_bonus: None,
            speed: 30,
            size: Size::Medium,
            attacks: Vec::new(),
            num_attacks: 1,
            different_attacks: false,
            hands: 2,
            shield: false,
            resistances: Vec::new(),
            vulnerabilities: Vec::new(),
            immunities: Vec::new(),
            traits: Vec::new(),
            make_death_saves: false,
            save_proficiencies: Vec::new(),
        }
    }

    pub fn with_attack(mut self, weapon: Weapon) -> Self {
        self.attacks.push(Arc::new(weapon.scaled_for(self.size)));
        self
    }

    pub fn with_attack_bonus(mut self, bonus: i32) -> Self {
        self.attack_bonus = Some(bonus);
        self
    }

    pub fn with_trait(mut self, creature_trait: CreatureTrait) -> Self {
        self.traits.push(creature_trait);
        self
    }

    pub fn with_size(mut self, size: Size) -> Self {
        self.size = size;
        self
    }

    pub fn with_death_saves(mut self, make_death_saves: bool) -> Self {
        self.make_death_saves = make_death_saves;
        self
    }

    /// Build a template from its configuration, resolving weapon references
    pub fn from_config(
        config: CreatureConfig,
        weapons: &HashMap<String, Arc<Weapon>>,
    ) -> Result<Self, TemplateError> {
        let invalid = |message: &str| TemplateError::Invalid {
            creature: config.id.clone(),
            message: message.to_string(),
        };

        if config.attacks.is_empty() {
            return Err(invalid("no attacks"));
        }
        if config.num_attacks == 0 {
            return Err(invalid("num_attacks must be at least 1"));
        }
        if config.armor_class <= 0 {
            return Err(invalid("armor_class must be positive"));
        }
        if let HitPoints::Fixed(hp) = config.hit_points {
            if hp <= 0 {
                return Err(invalid("hit_points must be positive"));
            }
        }
        if config.challenge_rating < 0.0 {
            return Err(invalid("challenge_rating cannot be negative"));
        }

        let attacks = config
            .attacks
            .iter()
            .map(|name| {
                weapons
                    .get(&normalize_name(name))
                    .map(|w| Arc::new(w.scaled_for(config.size)))
                    .ok_or_else(|| TemplateError::UnknownWeapon {
                        creature: config.id.clone(),
                        weapon: name.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let name = config
            .name
            .clone()
            .unwrap_or_else(|| config.id.replace('_', " "));

        Ok(CreatureTemplate {
            id: normalize_name(&config.id),
            name,
            armor_class: config.armor_class,
            hit_points: config.hit_points,
            abilities: config.abilities,
            challenge_rating: config.challenge_rating,
            proficiency_bonus: proficiency_for_cr(config.challenge_rating),
            attack_bonus: config.attack_bonus,
            speed: config.speed,
            size: config.size,
            attacks,
            num_attacks: config.num_attacks,
            different_attacks: config.different_attacks,
            hands: config.hands,
            shield: config.shield,
            resistances: config.resistances,
            vulnerabilities: config.vulnerabilities,
            immunities: config.immunities,
            traits: config.traits,
            make_death_saves: config.make_death_saves,
            save_proficiencies: config.save_proficiencies,
        })
    }

    /// A second hand is free for versatile or two-handed weapons
    pub fn free_hand(&self) -> bool {
        self.hands >= 2 && !self.shield
    }
}
