//! bestiary_core - Creature and weapon catalog
//!
//! Stat blocks and weapons are plain TOML data. A [`Bestiary`] is loaded from
//! a directory of catalog files or from the bundled content, and the combat
//! engine queries it by name through the [`Catalog`] trait.

mod catalog;
mod config;
mod registry;
mod template;

pub use catalog::{Catalog, CatalogError, ContentKind};
pub use config::{CatalogFileConfig, CreatureConfig};
pub use registry::{normalize_name, Bestiary};
pub use template::{proficiency_for_cr, CreatureTemplate, HitPoints};

use rules_core::DiceError;
use std::path::PathBuf;
use thiserror::Error;

/// Error loading catalog files
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading '{path:?}': {error}")]
    Io {
        error: std::io::Error,
        path: Option<PathBuf>,
    },
    #[error("Parse error in '{path}': {error}")]
    Parse {
        error: toml::de::Error,
        path: PathBuf,
    },
    #[error("Validation error in '{path}': {message}")]
    Validation { message: String, path: PathBuf },
    /// Malformed damage or hit dice text
    #[error("Invalid dice in '{path}': {error}")]
    Dice { error: DiceError, path: PathBuf },
}

/// Error building a creature template from its configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("Creature '{creature}' uses unknown weapon '{weapon}'")]
    UnknownWeapon { creature: String, weapon: String },
    #[error("Creature '{creature}': {message}")]
    Invalid { creature: String, message: String },
}
