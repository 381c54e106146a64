//! Perk classifier — ordered rule list evaluated first-match-wins.

use perks_core::config::RuleThresholds;
use perks_core::{Perk, PerkAssignment, UserMetrics};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::builder::PerkRuleBuilder;
use crate::predicates::{MetricField, PredicateGroup};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerkRule {
    pub name: String,
    pub perk: Perk,
    pub criteria: PredicateGroup,
}

impl PerkRule {
    pub fn matches(&self, metrics: &UserMetrics) -> bool {
        self.criteria.matches(metrics)
    }
}

/// Pure, total classifier: the first matching rule's perk, or the default.
#[derive(Debug, Clone)]
pub struct PerkClassifier {
    rules: Vec<PerkRule>,
    default_perk: Perk,
}

impl PerkClassifier {
    pub fn new(rules: Vec<PerkRule>, default_perk: Perk) -> Self {
        Self {
            rules,
            default_perk,
        }
    }

    /// The standard perk table with the given thresholds.
    pub fn from_thresholds(t: &RuleThresholds) -> Self {
        let rules = vec![
            PerkRuleBuilder::new("inactive_or_low_spend", Perk::NoCancellationFees)
                .with_or()
                .equals(MetricField::UsersNoOrders, t.no_orders_all)
                .lt(MetricField::AvgTotSpent, t.min_avg_spent)
                .build(),
            PerkRuleBuilder::new("single_hotel_many_flights", Perk::FreeHotelNightWithFlight)
                .equals(MetricField::HotelBookedCount, t.single_hotel_count as f64)
                .gt(MetricField::FlightBookedCount, t.min_flight_count as f64)
                .build(),
            PerkRuleBuilder::new("mostly_browsing", Perk::ExclusiveDiscounts)
                .gt(MetricField::UsersNoOrders, t.no_orders_high)
                .build(),
            PerkRuleBuilder::new("family_with_bags", Perk::FreeCheckedBag)
                .lt(MetricField::CancellationRatio, t.max_cancellation_ratio)
                .equals(MetricField::MarriedWithChildren, t.married_with_children)
                .gt(MetricField::BagsRatio, t.min_bags_ratio)
                .build(),
            PerkRuleBuilder::new("frequent_hotel_low_discount", Perk::FreeHotelMeal)
                .lt(MetricField::AverageHotelDiscountPerc, t.max_hotel_discount)
                .gt(MetricField::HotelBookedCount, t.min_hotel_count as f64)
                .build(),
        ];

        info!(rules = rules.len(), "Perk classifier initialized");
        Self::new(rules, Perk::ExclusiveDiscounts)
    }

    /// Index and rule of the first match, if any rule matches.
    pub fn matching_rule(&self, metrics: &UserMetrics) -> Option<(usize, &PerkRule)> {
        self.rules
            .iter()
            .enumerate()
            .find(|(_, rule)| rule.matches(metrics))
    }

    pub fn classify(&self, metrics: &UserMetrics) -> Perk {
        match self.matching_rule(metrics) {
            Some((index, rule)) => {
                debug!(
                    user_id = metrics.user_id,
                    rule = %rule.name,
                    order = index + 1,
                    perk = %rule.perk,
                    "Perk rule matched"
                );
                rule.perk
            }
            None => self.default_perk,
        }
    }

    pub fn assign(&self, metrics: UserMetrics) -> PerkAssignment {
        let perk = self.classify(&metrics);
        PerkAssignment { metrics, perk }
    }

    pub fn rules(&self) -> &[PerkRule] {
        &self.rules
    }

    pub fn default_perk(&self) -> Perk {
        self.default_perk
    }
}

impl Default for PerkClassifier {
    fn default() -> Self {
        Self::from_thresholds(&RuleThresholds::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> PerkClassifier {
        PerkClassifier::default()
    }

    /// Metrics that match none of the rules.
    fn neutral_metrics() -> UserMetrics {
        let mut m = UserMetrics::empty(1);
        m.avg_tot_spent = 500.0;
        m.users_no_orders = 0.5;
        m.cancellation_ratio = Some(0.2);
        m
    }

    #[test]
    fn test_all_undefined_is_total() {
        let mut m = UserMetrics::empty(1);
        m.avg_tot_spent = 200.0;
        assert_eq!(classifier().classify(&m), Perk::ExclusiveDiscounts);
        assert!(classifier().matching_rule(&m).is_none());
    }

    #[test]
    fn test_default_when_nothing_matches() {
        assert_eq!(classifier().classify(&neutral_metrics()), Perk::ExclusiveDiscounts);
    }

    #[test]
    fn test_rule1_no_orders() {
        let mut m = neutral_metrics();
        m.users_no_orders = 1.0;
        assert_eq!(classifier().classify(&m), Perk::NoCancellationFees);
    }

    #[test]
    fn test_rule1_low_spend() {
        let mut m = neutral_metrics();
        m.avg_tot_spent = 79.99;
        assert_eq!(classifier().classify(&m), Perk::NoCancellationFees);
        m.avg_tot_spent = 80.0;
        assert_ne!(classifier().classify(&m), Perk::NoCancellationFees);
    }

    #[test]
    fn test_rule1_beats_rule4() {
        let mut m = neutral_metrics();
        m.avg_tot_spent = 40.0;
        m.cancellation_ratio = Some(0.0);
        m.married_with_children = 1.0;
        m.bags_ratio = 0.8;
        assert!(classifier().rules()[3].matches(&m));
        assert_eq!(classifier().classify(&m), Perk::NoCancellationFees);
    }

    #[test]
    fn test_rule2_hotel_with_flight() {
        let mut m = neutral_metrics();
        m.hotel_booked_count = 1;
        m.flight_booked_count = 2;
        m.avg_tot_spent = 150.0;
        assert_eq!(classifier().classify(&m), Perk::FreeHotelNightWithFlight);

        m.flight_booked_count = 1;
        assert_ne!(classifier().classify(&m), Perk::FreeHotelNightWithFlight);
    }

    #[test]
    fn test_rule3_mostly_browsing() {
        let mut m = neutral_metrics();
        m.users_no_orders = 0.79;
        let (index, rule) = classifier().matching_rule(&m).map(|(i, r)| (i, r.clone())).unwrap();
        assert_eq!(index, 2);
        assert_eq!(rule.perk, Perk::ExclusiveDiscounts);
    }

    #[test]
    fn test_rule4_free_bag() {
        let mut m = neutral_metrics();
        m.cancellation_ratio = Some(0.03);
        m.married_with_children = 1.0;
        m.bags_ratio = 0.5;
        assert_eq!(classifier().classify(&m), Perk::FreeCheckedBag);
    }

    #[test]
    fn test_rule4_undefined_cancellation_skips() {
        let mut m = neutral_metrics();
        m.cancellation_ratio = None;
        m.married_with_children = 1.0;
        m.bags_ratio = 0.5;
        assert_eq!(classifier().classify(&m), Perk::ExclusiveDiscounts);
    }

    #[test]
    fn test_rule5_hotel_meal() {
        let mut m = neutral_metrics();
        m.average_hotel_discount_perc = Some(0.1);
        m.hotel_booked_count = 3;
        assert_eq!(classifier().classify(&m), Perk::FreeHotelMeal);

        m.average_hotel_discount_perc = None;
        assert_eq!(classifier().classify(&m), Perk::ExclusiveDiscounts);
    }

    #[test]
    fn test_custom_thresholds() {
        let thresholds = RuleThresholds {
            min_avg_spent: 600.0,
            ..Default::default()
        };
        let c = PerkClassifier::from_thresholds(&thresholds);
        assert_eq!(c.classify(&neutral_metrics()), Perk::NoCancellationFees);
    }

    #[test]
    fn test_assign_keeps_metrics() {
        let m = neutral_metrics();
        let assignment = classifier().assign(m.clone());
        assert_eq!(assignment.metrics, m);
        assert_eq!(assignment.perk, Perk::ExclusiveDiscounts);
    }

    #[test]
    fn test_rule_table_order() {
        let perks: Vec<Perk> = classifier().rules().iter().map(|r| r.perk).collect();
        assert_eq!(
            perks,
            vec![
                Perk::NoCancellationFees,
                Perk::FreeHotelNightWithFlight,
                Perk::ExclusiveDiscounts,
                Perk::FreeCheckedBag,
                Perk::FreeHotelMeal,
            ]
        );
    }
}
