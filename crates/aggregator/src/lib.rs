//! Per-user behavioral metrics over travel booking sessions: eligibility
//! filtering, single-pass accumulation, and ratio derivation.

pub mod accumulator;
pub mod eligibility;
pub mod engine;
pub mod geo;
pub mod ratio;

#[cfg(test)]
mod test_support;

pub use accumulator::UserAccumulator;
pub use eligibility::{EligibilityFilter, EligibleGroups};
pub use engine::MetricsAggregator;
