//! Eligibility filter: drops pre-cutoff sessions and users with too few
//! remaining sessions.

use chrono::{NaiveDate, NaiveDateTime};
use perks_core::config::EligibilityConfig;
use perks_core::SessionRow;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Post-cutoff sessions of eligible users, grouped by user and ordered by
/// user_id.
#[derive(Debug, Default)]
pub struct EligibleGroups {
    pub groups: BTreeMap<i64, Vec<SessionRow>>,
    /// Users that had at least one row but did not qualify.
    pub excluded_users: usize,
    /// Rows dropped because they start on or before the cutoff.
    pub pre_cutoff_rows: usize,
}

impl EligibleGroups {
    pub fn user_count(&self) -> usize {
        self.groups.len()
    }
}

pub struct EligibilityFilter {
    cutoff: NaiveDateTime,
    min_sessions: usize,
}

impl EligibilityFilter {
    pub fn new(config: &EligibilityConfig) -> Self {
        Self::with_cutoff(config.cutoff_date, config.min_sessions)
    }

    pub fn with_cutoff(cutoff_date: NaiveDate, min_sessions: usize) -> Self {
        Self {
            cutoff: cutoff_date.and_time(chrono::NaiveTime::MIN),
            min_sessions,
        }
    }

    /// True when the session starts after the cutoff.
    pub fn is_after_cutoff(&self, row: &SessionRow) -> bool {
        row.session_start > self.cutoff
    }

    /// Filter and group rows. Counts use post-cutoff sessions only.
    pub fn partition(&self, rows: impl IntoIterator<Item = SessionRow>) -> EligibleGroups {
        let mut seen = BTreeSet::new();
        let mut groups: BTreeMap<i64, Vec<SessionRow>> = BTreeMap::new();
        let mut pre_cutoff_rows = 0;

        for row in rows {
            seen.insert(row.user_id);
            if self.is_after_cutoff(&row) {
                groups.entry(row.user_id).or_default().push(row);
            } else {
                pre_cutoff_rows += 1;
            }
        }

        groups.retain(|_, sessions| sessions.len() > self.min_sessions);
        let excluded_users = seen.len() - groups.len();

        debug!(
            eligible = groups.len(),
            excluded = excluded_users,
            pre_cutoff_rows,
            "Eligibility filter applied"
        );

        EligibleGroups {
            groups,
            excluded_users,
            pre_cutoff_rows,
        }
    }
}
