//! Combat resolution - Attack rolls, damage delivery and reactions

mod advantage;
mod hooks;
mod resolution;
mod result;

pub use advantage::{attack_modifiers, AdvantageSource, AttackModifiers, DisadvantageSource};
pub use hooks::deal_damage;
pub use resolution::{resolve_attack, resolve_escape};
pub use result::{AttackOutcome, AttackResult, EscapeResult};
