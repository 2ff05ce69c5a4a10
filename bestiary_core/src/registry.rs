use crate::catalog::{Catalog, CatalogError, ContentKind};
use crate::config::CatalogFileConfig;
use crate::template::CreatureTemplate;
use crate::ConfigError;
use rules_core::{DiceError, Weapon};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const BUILTIN_WEAPONS: &str = include_str!("../content/weapons.toml");
const BUILTIN_MONSTERS: &str = include_str!("../content/monsters.toml");

/// Canonical lookup key: lowercase, with spaces and hyphens as underscores
pub fn normalize_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

/// Registry of all creatures and weapons, loaded from TOML files
#[derive(Debug, Default, Clone)]
pub struct Bestiary {
    weapons: HashMap<String, Arc<Weapon>>,
    creatures: HashMap<String, CreatureTemplate>,
}

impl Bestiary {
    /// Create an empty bestiary
    pub fn new() -> Self {
        Self::default()
    }

    /// The content bundled with the crate
    pub fn builtin() -> Result<Self, ConfigError> {
        let mut bestiary = Self::new();
        bestiary.add_files(vec![
            parse_content(BUILTIN_WEAPONS, Path::new("<builtin>/weapons.toml"))?,
            parse_content(BUILTIN_MONSTERS, Path::new("<builtin>/monsters.toml"))?,
        ])?;
        Ok(bestiary)
    }

    /// Load all catalog files from a directory (recursively)
    ///
    /// Creatures may use weapons defined in any file of the directory.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let mut files = Vec::new();
        collect_dir(dir, &mut files)?;
        files.sort_by(|a, b| a.0.cmp(&b.0));

        let mut bestiary = Self::new();
        bestiary.add_files(files)?;
        Ok(bestiary)
    }

    /// Parse a single catalog document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let mut bestiary = Self::new();
        bestiary.add_files(vec![parse_content(content, Path::new("<inline>"))?])?;
        Ok(bestiary)
    }

    /// Merge more catalog files into this bestiary
    ///
    /// Weapons from every file are registered before any creature is built.
    fn add_files(&mut self, files: Vec<(PathBuf, CatalogFileConfig)>) -> Result<(), ConfigError> {
        let mut creatures = Vec::new();

        for (path, config) in files {
            for mut weapon in config.weapons {
                if weapon.damage.is_none()
                    && weapon.two_handed_damage.is_none()
                    && weapon.traits.is_empty()
                {
                    return Err(ConfigError::Validation {
                        message: format!("weapon '{}' has no damage and no traits", weapon.id),
                        path,
                    });
                }
                let id = normalize_name(&weapon.id);
                if self.weapons.contains_key(&id) {
                    return Err(ConfigError::Validation {
                        message: format!("duplicate weapon '{}'", weapon.id),
                        path,
                    });
                }
                if weapon.name.is_empty() {
                    weapon.name = weapon.id.replace('_', " ");
                }
                weapon.id = id.clone();
                self.weapons.insert(id, Arc::new(weapon));
            }
            creatures.extend(config.creatures.into_iter().map(|c| (path.clone(), c)));
        }

        for (path, config) in creatures {
            let template =
                CreatureTemplate::from_config(config, &self.weapons).map_err(|e| {
                    ConfigError::Validation {
                        message: e.to_string(),
                        path: path.clone(),
                    }
                })?;
            if self.creatures.contains_key(&template.id) {
                return Err(ConfigError::Validation {
                    message: format!("duplicate creature '{}'", template.id),
                    path,
                });
            }
            self.creatures.insert(template.id.clone(), template);
        }

        Ok(())
    }

    /// Add or replace a weapon
    pub fn insert_weapon(&mut self, weapon: Weapon) {
        self.weapons
            .insert(normalize_name(&weapon.id), Arc::new(weapon));
    }

    /// Add or replace a creature template
    pub fn insert_creature(&mut self, template: CreatureTemplate) {
        self.creatures.insert(normalize_name(&template.id), template);
    }

    /// Get a creature template by name
    pub fn creature(&self, name: &str) -> Option<&CreatureTemplate> {
        self.creatures.get(&normalize_name(name))
    }

    /// Get a weapon by name
    pub fn weapon(&self, name: &str) -> Option<&Arc<Weapon>> {
        self.weapons.get(&normalize_name(name))
    }

    /// Check if a creature exists
    pub fn contains_creature(&self, name: &str) -> bool {
        self.creatures.contains_key(&normalize_name(name))
    }

    /// List all weapon ids
    pub fn weapon_ids(&self) -> impl Iterator<Item = &str> {
        self.weapons.keys().map(|s| s.as_str())
    }
}

impl Catalog for Bestiary {
    fn get_creature_template(&self, name: &str) -> Result<&CreatureTemplate, CatalogError> {
        self.creature(name)
            .ok_or_else(|| CatalogError::ContentNotFound {
                kind: ContentKind::Creature,
                name: name.to_string(),
            })
    }

    fn get_weapon(&self, name: &str) -> Result<Arc<Weapon>, CatalogError> {
        self.weapon(name)
            .cloned()
            .ok_or_else(|| CatalogError::ContentNotFound {
                kind: ContentKind::Weapon,
                name: name.to_string(),
            })
    }

    fn creature_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.creatures.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

/// Collect catalog files from a directory recursively
fn collect_dir(dir: &Path, files: &mut Vec<(PathBuf, CatalogFileConfig)>) -> Result<(), ConfigError> {
    if !dir.exists() {
        return Ok(());
    }

    let entries = std::fs::read_dir(dir).map_err(|e| ConfigError::Io {
        error: e,
        path: Some(dir.to_path_buf()),
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::Io {
            error: e,
            path: Some(dir.to_path_buf()),
        })?;
        let path = entry.path();

        if path.is_dir() {
            collect_dir(&path, files)?;
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io {
                error: e,
                path: Some(path.clone()),
            })?;
            files.push(parse_content(&content, &path)?);
        }
    }

    Ok(())
}

fn parse_content(content: &str, path: &Path) -> Result<(PathBuf, CatalogFileConfig), ConfigError> {
    let config: CatalogFileConfig = toml::from_str(content).map_err(|e| match dice_error(&e) {
        Some(error) => ConfigError::Dice {
            error,
            path: path.to_path_buf(),
        },
        None => ConfigError::Parse {
            error: e,
            path: path.to_path_buf(),
        },
    })?;
    Ok((path.to_path_buf(), config))
}

/// Recover the dice error serde flattened into the TOML error message
fn dice_error(error: &toml::de::Error) -> Option<DiceError> {
    error
        .message()
        .strip_prefix("Invalid dice expression: '")
        .and_then(|rest| rest.strip_suffix('\''))
        .map(|expression| DiceError::InvalidExpression(expression.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::HitPoints;
    use rules_core::{CreatureTrait, DamageType, Size, WeaponTrait};
    use std::io::Write;
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, name: &str, content: &str) {
        let path = dir.join(format!("{}.toml", name));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Giant Rat"), "giant_rat");
        assert_eq!(normalize_name(" Half-Ogre "), "half_ogre");
        assert_eq!(normalize_name("goblin"), "goblin");
    }

    #[test]
    fn test_load_across_files() {
        let dir = TempDir::new().unwrap();
        create_test_file(
            dir.path(),
            "weapons",
            r#"
[[weapons]]
id = "scimitar"
damage = "1d6 slashing"
finesse = true
light = true
"#,
        );
        std::fs::create_dir(dir.path().join("goblinoids")).unwrap();
        create_test_file(
            &dir.path().join("goblinoids"),
            "goblin",
            r#"
[[creatures]]
id = "goblin"
name = "Goblin"
armor_class = 15
hit_points = "2d6"
abilities = [8, 14, 10, 10, 8, 8]
challenge_rating = 0.25
attacks = ["scimitar"]
"#,
        );

        let bestiary = Bestiary::load(dir.path()).unwrap();
        assert!(bestiary.contains_creature("Goblin"));

        let goblin = bestiary.get_creature_template("goblin").unwrap();
        assert_eq!(goblin.armor_class, 15);
        assert_eq!(goblin.attacks[0].name, "scimitar");
        assert!(goblin.attacks[0].properties.finesse);
    }

    #[test]
    fn test_ignores_non_toml_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not toml at all [").unwrap();
        let bestiary = Bestiary::load(dir.path()).unwrap();
        assert!(bestiary.creature_names().is_empty());
    }

    #[test]
    fn test_parse_error_carries_path() {
        let dir = TempDir::new().unwrap();
        create_test_file(dir.path(), "broken", "[[creatures]\nid = ");
        let result = Bestiary::load(dir.path());
        match result {
            Err(ConfigError::Parse { path, .. }) => {
                assert!(path.ends_with("broken.toml"));
            }
            other => panic!("Expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_weapon_is_validation_error() {
        let result = Bestiary::from_toml_str(
            r#"
[[creatures]]
id = "orc"
armor_class = 13
hit_points = "2d8"
abilities = [16, 12, 16, 7, 11, 10]
attacks = ["greataxe"]
"#,
        );
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_bad_dice_is_dice_error() {
        let result = Bestiary::from_toml_str(
            r#"
[[weapons]]
id = "wet_noodle"
damage = "1q4 bludgeoning"
"#,
        );
        match result {
            Err(ConfigError::Dice { error, path }) => {
                assert_eq!(error, DiceError::InvalidExpression("1q4".to_string()));
                assert_eq!(path, Path::new("<inline>"));
            }
            other => panic!("Expected dice error, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_damage_type_is_dice_error() {
        let result = Bestiary::from_toml_str(
            r#"
[[weapons]]
id = "wet_noodle"
damage = "1d4 soggy"
"#,
        );
        assert!(matches!(result, Err(ConfigError::Dice { .. })));
    }

    #[test]
    fn test_content_not_found() {
        let bestiary = Bestiary::new();
        let result = bestiary.get_creature_template("beholder");
        assert_eq!(
            result.unwrap_err(),
            CatalogError::ContentNotFound {
                kind: ContentKind::Creature,
                name: "beholder".to_string()
            }
        );
        assert!(bestiary.get_weapon("vorpal sword").is_err());
    }

    #[test]
    fn test_builtin_roster() {
        let bestiary = Bestiary::builtin().unwrap();
        for name in [
            "bandit",
            "blink_dog",
            "bullywug",
            "commoner",
            "cultist",
            "flying_sword",
            "giant_rat",
            "gnoll",
            "goblin",
            "guard",
            "half_ogre",
            "hippogriff",
            "hobgoblin",
            "kobold",
            "lizardfolk",
            "magma_mephit",
            "mimic",
            "ogre",
            "orc",
            "skeleton",
            "tiefling_cultist",
            "zombie",
        ] {
            assert!(bestiary.contains_creature(name), "missing {}", name);
        }

        let zombie = bestiary.get_creature_template("Zombie").unwrap();
        assert!(zombie.traits.contains(&CreatureTrait::UndeadFortitude));
        assert_eq!(zombie.hit_points, HitPoints::Dice("3d8".parse().unwrap()));

        let mimic = bestiary.get_creature_template("mimic").unwrap();
        assert!(mimic.attacks[0].has_trait(WeaponTrait::Adhesive));
        assert!(mimic.immunities.contains(&DamageType::Acid));

        let ogre = bestiary.get_creature_template("ogre").unwrap();
        assert_eq!(ogre.size, Size::Large);
        // Greatclub scaled for a Large wielder
        assert_eq!(ogre.attacks[0].two_handed_damage.unwrap().dice.count, 2);
    }
}
