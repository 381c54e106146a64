//! Predicate types and evaluation logic for perk rule criteria.

use perks_core::UserMetrics;
use serde::{Deserialize, Serialize};

const EQ_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredicateGroup {
    pub operator: LogicalOperator,
    pub predicates: Vec<Predicate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalOperator {
    And,
    Or,
}

/// `metric <operator> value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    pub metric: MetricField,
    pub operator: ComparisonOperator,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOperator {
    Equals,
    NotEquals,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
}

/// Numeric fields of `UserMetrics` a rule can test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricField {
    Age,
    MarriedWithChildren,
    DiscountFlightProportion,
    DiscountHotelProportion,
    AverageFlightDiscountPerc,
    AverageHotelDiscountPerc,
    AdsPerKm,
    MeanSessionTime,
    HotelBookingRatio,
    FlightsBookingRatio,
    AvgTotSpent,
    HotelAndFlightsBookingRatio,
    CancellationRatio,
    BagsRatio,
    HotelBookedCount,
    FlightBookedCount,
    UsersNoOrders,
}

impl MetricField {
    /// Read the field; `None` when the metric is undefined for this user.
    pub fn value(&self, m: &UserMetrics) -> Option<f64> {
        match self {
            MetricField::Age => Some(m.age as f64),
            MetricField::MarriedWithChildren => Some(m.married_with_children),
            MetricField::DiscountFlightProportion => m.discount_flight_proportion,
            MetricField::DiscountHotelProportion => m.discount_hotel_proportion,
            MetricField::AverageFlightDiscountPerc => m.average_flight_discount_perc,
            MetricField::AverageHotelDiscountPerc => m.average_hotel_discount_perc,
            MetricField::AdsPerKm => m.ads_per_km,
            MetricField::MeanSessionTime => Some(m.mean_session_time),
            MetricField::HotelBookingRatio => m.hotel_booking_ratio,
            MetricField::FlightsBookingRatio => m.flights_booking_ratio,
            MetricField::AvgTotSpent => Some(m.avg_tot_spent),
            MetricField::HotelAndFlightsBookingRatio => m.hotel_and_flights_booking_ratio,
            MetricField::CancellationRatio => m.cancellation_ratio,
            MetricField::BagsRatio => Some(m.bags_ratio),
            MetricField::HotelBookedCount => Some(m.hotel_booked_count as f64),
            MetricField::FlightBookedCount => Some(m.flight_booked_count as f64),
            MetricField::UsersNoOrders => Some(m.users_no_orders),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MetricField::Age => "age",
            MetricField::MarriedWithChildren => "married_with_children",
            MetricField::DiscountFlightProportion => "discount_flight_proportion",
            MetricField::DiscountHotelProportion => "discount_hotel_proportion",
            MetricField::AverageFlightDiscountPerc => "average_flight_discount_perc",
            MetricField::AverageHotelDiscountPerc => "average_hotel_discount_perc",
            MetricField::AdsPerKm => "ads_per_km",
            MetricField::MeanSessionTime => "mean_session_time",
            MetricField::HotelBookingRatio => "hotel_booking_ratio",
            MetricField::FlightsBookingRatio => "flights_booking_ratio",
            MetricField::AvgTotSpent => "avg_tot_spent",
            MetricField::HotelAndFlightsBookingRatio => "hotel_and_flights_booking_ratio",
            MetricField::CancellationRatio => "cancellation_ratio",
            MetricField::BagsRatio => "bags_ratio",
            MetricField::HotelBookedCount => "hotel_booked_count",
            MetricField::FlightBookedCount => "flight_booked_count",
            MetricField::UsersNoOrders => "users_no_orders",
        }
    }
}

impl ComparisonOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            ComparisonOperator::Equals => "==",
            ComparisonOperator::NotEquals => "!=",
            ComparisonOperator::GreaterThan => ">",
            ComparisonOperator::GreaterThanOrEqual => ">=",
            ComparisonOperator::LessThan => "<",
            ComparisonOperator::LessThanOrEqual => "<=",
        }
    }
}

impl Predicate {
    pub fn evaluate(&self, metrics: &UserMetrics) -> bool {
        compare_metric(self.metric.value(metrics), &self.operator, self.value)
    }
}

impl PredicateGroup {
    pub fn matches(&self, metrics: &UserMetrics) -> bool {
        match self.operator {
            LogicalOperator::And => self.predicates.iter().all(|p| p.evaluate(metrics)),
            LogicalOperator::Or => self.predicates.iter().any(|p| p.evaluate(metrics)),
        }
    }
}

impl std::fmt::Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.metric.name(),
            self.operator.symbol(),
            self.value
        )
    }
}

impl std::fmt::Display for PredicateGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joiner = match self.operator {
            LogicalOperator::And => " AND ",
            LogicalOperator::Or => " OR ",
        };
        let parts: Vec<String> = self.predicates.iter().map(|p| p.to_string()).collect();
        f.write_str(&parts.join(joiner))
    }
}

/// Compare a possibly undefined metric. Undefined never satisfies any
/// operator, `NotEquals` included.
pub fn compare_metric(actual: Option<f64>, operator: &ComparisonOperator, expected: f64) -> bool {
    let Some(actual) = actual else {
        return false;
    };
    if actual.is_nan() {
        return false;
    }
    match operator {
        ComparisonOperator::Equals => (actual - expected).abs() < EQ_TOLERANCE,
        ComparisonOperator::NotEquals => (actual - expected).abs() >= EQ_TOLERANCE,
        ComparisonOperator::GreaterThan => actual > expected,
        ComparisonOperator::GreaterThanOrEqual => actual >= expected,
        ComparisonOperator::LessThan => actual < expected,
        ComparisonOperator::LessThanOrEqual => actual <= expected,
    }
}
