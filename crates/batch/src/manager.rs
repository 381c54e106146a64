//! Batch manager — splits eligible user groups across N blocking workers
//! and merges their assignments by user_id.

use perks_aggregator::MetricsAggregator;
use perks_core::config::PerksConfig;
use perks_core::{PerkAssignment, PerkError, PerkResult, SessionRow};
use perks_segmentation::PerkClassifier;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

use crate::processor::UserProcessor;
use crate::summary::RunSummary;

/// Assignments ordered by user_id plus the run summary.
#[derive(Debug, Clone)]
pub struct BatchOutput {
    pub assignments: Vec<PerkAssignment>,
    pub summary: RunSummary,
}

pub struct BatchManager {
    workers: usize,
    processor: Arc<UserProcessor>,
}

impl BatchManager {
    pub fn new(config: &PerksConfig) -> Self {
        let aggregator = Arc::new(MetricsAggregator::new(config));
        let classifier = Arc::new(PerkClassifier::from_thresholds(&config.rules));
        Self::with_processor(
            config.batch.workers,
            Arc::new(UserProcessor::new(aggregator, classifier)),
        )
    }

    pub fn with_processor(workers: usize, processor: Arc<UserProcessor>) -> Self {
        Self {
            workers: workers.max(1),
            processor,
        }
    }

    /// Run the full computation. Either every eligible user gets a row or
    /// the run fails.
    pub async fn run(&self, rows: Vec<SessionRow>) -> PerkResult<BatchOutput> {
        let start = Instant::now();
        let rows_total = rows.len();

        let eligible = self.processor.aggregator().eligible_groups(rows);
        let groups: Vec<(i64, Vec<SessionRow>)> = eligible.groups.into_iter().collect();
        let eligible_users = groups.len();

        metrics::counter!("batch.users_eligible").increment(eligible_users as u64);
        metrics::counter!("batch.users_skipped").increment(eligible.excluded_users as u64);

        let chunk_size = eligible_users.div_ceil(self.workers).max(1);
        let mut handles = Vec::new();
        let mut chunks = groups.into_iter().peekable();
        let mut worker_id = 0;

        while chunks.peek().is_some() {
            let chunk: Vec<(i64, Vec<SessionRow>)> = chunks.by_ref().take(chunk_size).collect();
            let processor = self.processor.clone();
            let id = worker_id;
            handles.push(tokio::task::spawn_blocking(move || {
                let out: Vec<PerkAssignment> = chunk
                    .iter()
                    .map(|(user_id, sessions)| processor.process(*user_id, sessions))
                    .collect();
                tracing::debug!(worker = id, users = out.len(), "Worker finished");
                out
            }));
            worker_id += 1;
        }

        info!(
            workers = handles.len(),
            users = eligible_users,
            chunk_size,
            "Workers spawned"
        );

        let mut assignments = Vec::with_capacity(eligible_users);
        for handle in handles {
            match handle.await {
                Ok(mut part) => assignments.append(&mut part),
                Err(e) => {
                    error!(error = %e, "Worker task failed");
                    return Err(PerkError::Internal(anyhow::anyhow!(
                        "worker task failed: {e}"
                    )));
                }
            }
        }
        assignments.sort_by_key(|a| a.user_id());

        let mut summary = RunSummary {
            rows_total,
            pre_cutoff_rows: eligible.pre_cutoff_rows,
            eligible_users,
            excluded_users: eligible.excluded_users,
            ..Default::default()
        };
        summary.tally(&assignments);

        let elapsed = start.elapsed();
        metrics::histogram!("batch.duration_ms").record(elapsed.as_secs_f64() * 1000.0);
        info!(
            rows = rows_total,
            eligible = eligible_users,
            excluded = summary.excluded_users,
            elapsed_ms = elapsed.as_millis() as u64,
            "Batch complete"
        );

        Ok(BatchOutput {
            assignments,
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{flight, hotel, session};
    use chrono::NaiveDate;
    use perks_core::Perk;

    fn config(workers: usize) -> PerksConfig {
        let mut config = PerksConfig::default();
        config.batch.workers = workers;
        config.batch.reference_date = NaiveDate::from_ymd_opt(2024, 1, 1);
        config
    }

    #[tokio::test]
    async fn test_browsing_only_user_gets_no_cancellation_fees() {
        let rows: Vec<SessionRow> = (0..10).map(|d| session(1, d)).collect();
        let output = BatchManager::new(&config(2)).run(rows).await.unwrap();

        assert_eq!(output.assignments.len(), 1);
        let a = &output.assignments[0];
        assert_eq!(a.metrics.users_no_orders, 1.0);
        assert_eq!(a.metrics.cancellation_ratio, None);
        assert_eq!(a.metrics.bags_ratio, 0.0);
        assert_eq!(a.metrics.age, 44);
        assert_eq!(a.perk, Perk::NoCancellationFees);
    }

    #[tokio::test]
    async fn test_one_hotel_two_flights_gets_free_night() {
        // 8 sessions: 2 flights at 400, 1 hotel at 400, 5 browsing
        // avg_tot_spent = 1200 / 8 = 150
        let mut rows = vec![flight(2, 0, 400.0), flight(2, 1, 400.0), hotel(2, 2, 400.0)];
        rows.extend((3..8).map(|d| session(2, d)));

        let output = BatchManager::new(&config(1)).run(rows).await.unwrap();
        let a = &output.assignments[0];
        assert_eq!(a.metrics.hotel_booked_count, 1);
        assert_eq!(a.metrics.flight_booked_count, 2);
        assert_eq!(a.metrics.avg_tot_spent, 150.0);
        assert_eq!(a.perk, Perk::FreeHotelNightWithFlight);
    }

    #[tokio::test]
    async fn test_ineligible_users_omitted_and_order_kept() {
        let mut rows = Vec::new();
        for user in [9, 3, 5, 7, 1] {
            rows.extend((0..8).map(|d| session(user, d)));
        }
        rows.extend((0..7).map(|d| session(4, d)));
        rows.extend((0..20).map(|d| session(6, d - 100)));

        let output = BatchManager::new(&config(3)).run(rows).await.unwrap();
        let ids: Vec<i64> = output.assignments.iter().map(|a| a.user_id()).collect();
        assert_eq!(ids, vec![1, 3, 5, 7, 9]);
        assert_eq!(output.summary.eligible_users, 5);
        assert_eq!(output.summary.excluded_users, 2);
        assert_eq!(output.summary.pre_cutoff_rows, 20);
        assert_eq!(output.summary.rows_total, 67);
        assert_eq!(output.summary.count(Perk::NoCancellationFees), 5);
    }

    #[tokio::test]
    async fn test_worker_count_does_not_change_results() {
        let mut rows = Vec::new();
        for user in 1..=12 {
            rows.extend((0..9).map(|d| session(user, d)));
            rows.push(flight(user, 20, 100.0 * user as f64));
            rows.push(hotel(user, 21, 50.0 * user as f64));
        }

        let single = BatchManager::new(&config(1)).run(rows.clone()).await.unwrap();
        let many = BatchManager::new(&config(8)).run(rows).await.unwrap();
        assert_eq!(single.assignments, many.assignments);
        assert_eq!(single.summary, many.summary);
    }

    #[tokio::test]
    async fn test_empty_input_produces_empty_output() {
        let output = BatchManager::new(&config(4)).run(Vec::new()).await.unwrap();
        assert!(output.assignments.is_empty());
        assert_eq!(output.summary.eligible_users, 0);
        assert_eq!(output.summary.perks.len(), 5);
    }
}
