//! Defense system - Resistances, vulnerabilities and immunities

mod resistance;

pub use resistance::{apply_damage_modifiers, Defenses};
