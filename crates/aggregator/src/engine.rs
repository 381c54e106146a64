//! Metrics aggregator: eligibility filter followed by a per-user reduction.

use chrono::{NaiveDate, Utc};
use perks_core::config::PerksConfig;
use perks_core::{SessionRow, UserMetrics};
use tracing::{debug, info};

use crate::accumulator::UserAccumulator;
use crate::eligibility::{EligibilityFilter, EligibleGroups};

/// Stateless reduction of session rows into per-user metrics.
pub struct MetricsAggregator {
    filter: EligibilityFilter,
    as_of: NaiveDate,
}

impl MetricsAggregator {
    pub fn new(config: &PerksConfig) -> Self {
        let as_of = config
            .batch
            .reference_date
            .unwrap_or_else(|| Utc::now().date_naive());
        info!(
            cutoff = %config.eligibility.cutoff_date,
            min_sessions = config.eligibility.min_sessions,
            as_of = %as_of,
            "Metrics aggregator initialized"
        );
        Self {
            filter: EligibilityFilter::new(&config.eligibility),
            as_of,
        }
    }

    pub fn with_parts(filter: EligibilityFilter, as_of: NaiveDate) -> Self {
        Self { filter, as_of }
    }

    pub fn as_of(&self) -> NaiveDate {
        self.as_of
    }

    /// Apply the eligibility filter and group surviving rows by user.
    pub fn eligible_groups(&self, rows: impl IntoIterator<Item = SessionRow>) -> EligibleGroups {
        self.filter.partition(rows)
    }

    /// Reduce one user's qualifying sessions.
    pub fn aggregate_user(&self, user_id: i64, sessions: &[SessionRow]) -> UserMetrics {
        let mut acc = UserAccumulator::new(user_id);
        for row in sessions {
            acc.push(row);
        }
        let metrics = acc.finish(self.as_of);
        debug!(
            user_id,
            sessions = acc.sessions(),
            avg_tot_spent = metrics.avg_tot_spent,
            users_no_orders = metrics.users_no_orders,
            "User aggregated"
        );
        metrics
    }

    /// Filter, group and reduce in one call. One record per eligible user,
    /// ordered by user_id.
    pub fn aggregate(&self, rows: impl IntoIterator<Item = SessionRow>) -> Vec<UserMetrics> {
        let eligible = self.eligible_groups(rows);
        eligible
            .groups
            .iter()
            .map(|(user_id, sessions)| self.aggregate_user(*user_id, sessions))
            .collect()
    }
}
