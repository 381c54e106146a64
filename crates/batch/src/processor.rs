//! Per-user pipeline: reduce a user's sessions to metrics, then classify.

use perks_aggregator::MetricsAggregator;
use perks_core::{PerkAssignment, SessionRow};
use perks_segmentation::PerkClassifier;
use std::sync::Arc;
use tracing::debug;

/// Processes a single eligible user group. Holds no mutable state, so one
/// instance is shared by every worker.
pub struct UserProcessor {
    aggregator: Arc<MetricsAggregator>,
    classifier: Arc<PerkClassifier>,
}

impl UserProcessor {
    pub fn new(aggregator: Arc<MetricsAggregator>, classifier: Arc<PerkClassifier>) -> Self {
        Self {
            aggregator,
            classifier,
        }
    }

    pub fn process(&self, user_id: i64, sessions: &[SessionRow]) -> PerkAssignment {
        let metrics = self.aggregator.aggregate_user(user_id, sessions);
        let assignment = self.classifier.assign(metrics);

        metrics::counter!("perks.assigned", "perk" => assignment.perk.label()).increment(1);
        debug!(user_id, perk = %assignment.perk, "Perk assigned");

        assignment
    }

    pub fn aggregator(&self) -> &MetricsAggregator {
        &self.aggregator
    }
}
