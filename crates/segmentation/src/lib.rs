//! Perk classification — metric predicates, a fluent rule builder, and the
//! ordered first-match perk classifier.

pub mod builder;
pub mod engine;
pub mod predicates;

pub use builder::PerkRuleBuilder;
pub use engine::{PerkClassifier, PerkRule};
