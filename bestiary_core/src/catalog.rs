use crate::template::CreatureTemplate;
use rules_core::Weapon;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// The kind of content that was looked up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Creature,
    Weapon,
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentKind::Creature => write!(f, "creature"),
            ContentKind::Weapon => write!(f, "weapon"),
        }
    }
}

/// Error looking up catalog content
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("Unknown {kind}: '{name}'")]
    ContentNotFound { kind: ContentKind, name: String },
}

/// Read-only access to creature and weapon content by name
///
/// The combat engine only depends on this trait, never on how content is
/// stored or loaded.
pub trait Catalog {
    fn get_creature_template(&self, name: &str) -> Result<&CreatureTemplate, CatalogError>;

    fn get_weapon(&self, name: &str) -> Result<Arc<Weapon>, CatalogError>;

    /// Known creature ids, sorted
    fn creature_names(&self) -> Vec<&str>;
}
