use perks_core::{Perk, PerkAssignment};
use serde::Serialize;
use std::collections::BTreeMap;

/// Counts describing one batch run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub rows_total: usize,
    pub rows_rejected: usize,
    pub pre_cutoff_rows: usize,
    pub eligible_users: usize,
    pub excluded_users: usize,
    /// Perk label to number of users, every label present.
    pub perks: BTreeMap<String, usize>,
}

impl RunSummary {
    pub fn tally(&mut self, assignments: &[PerkAssignment]) {
        for perk in Perk::ALL {
            self.perks.entry(perk.label().to_string()).or_insert(0);
        }
        for assignment in assignments {
            *self
                .perks
                .entry(assignment.perk.label().to_string())
                .or_insert(0) += 1;
        }
    }

    pub fn count(&self, perk: Perk) -> usize {
        self.perks.get(perk.label()).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use perks_core::UserMetrics;

    #[test]
    fn test_tally_includes_every_label() {
        let mut summary = RunSummary::default();
        summary.tally(&[
            PerkAssignment {
                metrics: UserMetrics::empty(1),
                perk: Perk::FreeHotelMeal,
            },
            PerkAssignment {
                metrics: UserMetrics::empty(2),
                perk: Perk::FreeHotelMeal,
            },
        ]);
        assert_eq!(summary.perks.len(), 5);
        assert_eq!(summary.count(Perk::FreeHotelMeal), 2);
        assert_eq!(summary.count(Perk::FreeCheckedBag), 0);
    }
}
