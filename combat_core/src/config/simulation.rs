//! Simulation settings

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::ConfigError;

/// Tunable settings for an encounter
///
/// Every field has a default, so a TOML file only needs the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Round cap; an encounter still undecided after this many rounds is a draw
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,
    #[serde(default = "default_death_save_dc")]
    pub death_save_dc: i32,
    /// When false, a side with nobody conscious has lost even if members
    /// are still making death saves
    #[serde(default = "default_true")]
    pub to_the_death: bool,
    /// Ranged attacks have disadvantage while a conscious hostile is in reach
    #[serde(default = "default_true")]
    pub ranged_in_melee_disadvantage: bool,
    /// Pieces of ammunition carried per ammunition weapon
    #[serde(default = "default_ammunition")]
    pub ammunition: u32,
    /// Number of copies carried of each thrown weapon
    #[serde(default = "default_thrown_supply")]
    pub thrown_supply: u32,
}

fn default_max_rounds() -> u32 {
    100
}
fn default_death_save_dc() -> i32 {
    10
}
fn default_true() -> bool {
    true
}
fn default_ammunition() -> u32 {
    20
}
fn default_thrown_supply() -> u32 {
    3
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            max_rounds: default_max_rounds(),
            death_save_dc: default_death_save_dc(),
            to_the_death: true,
            ranged_in_melee_disadvantage: true,
            ammunition: default_ammunition(),
            thrown_supply: default_thrown_supply(),
        }
    }
}

impl SimConfig {
    /// Load settings from a TOML file
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let config: SimConfig = super::load_toml(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse settings from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = super::parse_toml(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_rounds == 0 {
            return Err(ConfigError::ValidationError(
                "max_rounds must be at least 1".to_string(),
            ));
        }
        if !(1..=30).contains(&self.death_save_dc) {
            return Err(ConfigError::ValidationError(format!(
                "death_save_dc must be between 1 and 30, got {}",
                self.death_save_dc
            )));
        }
        Ok(())
    }

    /// Starting supply for a weapon, or `None` when it never runs out
    pub fn supply_for(&self, weapon: &rules_core::Weapon) -> Option<u32> {
        if weapon.properties.ammunition {
            Some(self.ammunition)
        } else if weapon.has_limited_supply() {
            Some(self.thrown_supply)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SimConfig::default();
        assert_eq!(config.max_rounds, 100);
        assert_eq!(config.death_save_dc, 10);
        assert!(config.to_the_death);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = SimConfig::from_toml_str("max_rounds = 20\nto_the_death = false\n").unwrap();
        assert_eq!(config.max_rounds, 20);
        assert!(!config.to_the_death);
        assert_eq!(config.death_save_dc, 10);
        assert_eq!(config.ammunition, 20);
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(SimConfig::from_toml_str("").unwrap(), SimConfig::default());
    }

    #[test]
    fn test_rejects_zero_rounds() {
        let result = SimConfig::from_toml_str("max_rounds = 0");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_rejects_bad_dc() {
        assert!(SimConfig::from_toml_str("death_save_dc = 0").is_err());
        assert!(SimConfig::from_toml_str("death_save_dc = 31").is_err());
    }

    #[test]
    fn test_parse_error() {
        let result = SimConfig::from_toml_str("max_rounds = \"many\"");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = SimConfig::load_from_path(Path::new("/nonexistent/sim.toml"));
        assert!(matches!(result, Err(ConfigError::IoError(_))));
    }

    #[test]
    fn test_supply() {
        let config = SimConfig::default();
        let mut bow = rules_core::Weapon::new("shortbow", "1d6 piercing".parse().unwrap());
        bow.properties.ranged = true;
        bow.properties.ammunition = true;
        assert_eq!(config.supply_for(&bow), Some(20));

        let mut javelin = rules_core::Weapon::new("javelin", "1d6 piercing".parse().unwrap());
        javelin.properties.thrown = true;
        javelin.properties.ranged = true;
        assert_eq!(config.supply_for(&javelin), Some(3));

        let club = rules_core::Weapon::new("club", "1d4 bludgeoning".parse().unwrap());
        assert_eq!(config.supply_for(&club), None);
    }
}
