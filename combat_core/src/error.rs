use crate::config::ConfigError;
use bestiary_core::{CatalogError, ContentKind};
use rules_core::DiceError;
use thiserror::Error;

/// Errors raised by the combat engine
#[derive(Debug, Error)]
pub enum SimError {
    /// Unknown creature or weapon name; aborts the requested simulation
    #[error("Unknown {kind}: '{name}'")]
    ContentNotFound { kind: ContentKind, name: String },
    /// Corrupt dice text in content data
    #[error(transparent)]
    InvalidDiceExpression(#[from] DiceError),
    /// The engine was asked to do something its state machine forbids,
    /// such as letting a dead creature act
    #[error("Illegal state transition for '{creature}': {message}")]
    IllegalStateTransition { creature: String, message: String },
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl SimError {
    pub(crate) fn illegal(creature: &str, message: impl Into<String>) -> Self {
        SimError::IllegalStateTransition {
            creature: creature.to_string(),
            message: message.into(),
        }
    }
}

impl From<CatalogError> for SimError {
    fn from(error: CatalogError) -> Self {
        match error {
            CatalogError::ContentNotFound { kind, name } => SimError::ContentNotFound { kind, name },
        }
    }
}

/// A catalog that fails to load is corrupt content: bad dice keep their own
/// kind, everything else is a configuration error
impl From<bestiary_core::ConfigError> for SimError {
    fn from(error: bestiary_core::ConfigError) -> Self {
        use bestiary_core::ConfigError as LoadError;
        match error {
            LoadError::Dice { error, .. } => SimError::InvalidDiceExpression(error),
            LoadError::Io { error, .. } => SimError::Config(ConfigError::IoError(error)),
            LoadError::Parse { error, .. } => SimError::Config(ConfigError::ParseError(error)),
            LoadError::Validation { message, path } => SimError::Config(
                ConfigError::ValidationError(format!("{}: {}", path.display(), message)),
            ),
        }
    }
}
