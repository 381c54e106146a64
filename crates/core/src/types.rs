//! Booking activity records consumed by the aggregator and the per-user
//! records it produces.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Session timestamps in either `2023-01-04 13:05:00` or ISO 8601 form,
/// fractional seconds optional.
pub mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

    pub fn parse(value: &str) -> Option<NaiveDateTime> {
        FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(value.trim(), fmt).ok())
    }

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format("%Y-%m-%d %H:%M:%S%.f"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
    }
}

/// User profile row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: i64,
    pub birthdate: NaiveDate,
    pub married: bool,
    pub has_children: bool,
}

/// Browsing session row. `trip_id` is set when the session touched a trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub user_id: i64,
    #[serde(default)]
    pub trip_id: Option<String>,
    #[serde(with = "timestamp")]
    pub session_start: NaiveDateTime,
    #[serde(with = "timestamp")]
    pub session_end: NaiveDateTime,
    pub flight_booked: bool,
    pub hotel_booked: bool,
    pub cancellation: bool,
    pub flight_discount: bool,
    pub hotel_discount: bool,
    #[serde(default)]
    pub checked_bags: i32,
}

/// Flight booked on a trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flight {
    pub trip_id: String,
    #[serde(default)]
    pub base_fare_usd: Option<f64>,
    /// Fraction in `[0, 1]`.
    #[serde(default)]
    pub flight_discount_amount: Option<f64>,
    #[serde(default)]
    pub home_airport_lat: Option<f64>,
    #[serde(default)]
    pub home_airport_lon: Option<f64>,
    #[serde(default)]
    pub destination_airport_lat: Option<f64>,
    #[serde(default)]
    pub destination_airport_lon: Option<f64>,
}

/// Hotel stay booked on a trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotel {
    pub trip_id: String,
    #[serde(default)]
    pub hotel_per_room_usd: Option<f64>,
    /// Fraction in `[0, 1]`.
    #[serde(default)]
    pub hotel_discount_amount: Option<f64>,
}

/// Denormalized session row: a session with its user profile and the
/// (optional) flight and hotel of its trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRow {
    pub user_id: i64,
    #[serde(default)]
    pub trip_id: Option<String>,
    #[serde(with = "timestamp")]
    pub session_start: NaiveDateTime,
    #[serde(with = "timestamp")]
    pub session_end: NaiveDateTime,
    pub flight_booked: bool,
    pub hotel_booked: bool,
    pub cancellation: bool,
    pub flight_discount: bool,
    pub hotel_discount: bool,
    #[serde(default)]
    pub checked_bags: i32,
    pub birthdate: NaiveDate,
    pub married: bool,
    pub has_children: bool,
    #[serde(default)]
    pub base_fare_usd: Option<f64>,
    #[serde(default)]
    pub flight_discount_amount: Option<f64>,
    #[serde(default)]
    pub home_airport_lat: Option<f64>,
    #[serde(default)]
    pub home_airport_lon: Option<f64>,
    #[serde(default)]
    pub destination_airport_lat: Option<f64>,
    #[serde(default)]
    pub destination_airport_lon: Option<f64>,
    #[serde(default)]
    pub hotel_per_room_usd: Option<f64>,
    #[serde(default)]
    pub hotel_discount_amount: Option<f64>,
}

impl SessionRow {
    /// Join a session with its user and the trip's flight and hotel, if any.
    pub fn join(
        session: &Session,
        user: &User,
        flight: Option<&Flight>,
        hotel: Option<&Hotel>,
    ) -> Self {
        Self {
            user_id: session.user_id,
            trip_id: session.trip_id.clone(),
            session_start: session.session_start,
            session_end: session.session_end,
            flight_booked: session.flight_booked,
            hotel_booked: session.hotel_booked,
            cancellation: session.cancellation,
            flight_discount: session.flight_discount,
            hotel_discount: session.hotel_discount,
            checked_bags: session.checked_bags,
            birthdate: user.birthdate,
            married: user.married,
            has_children: user.has_children,
            base_fare_usd: flight.and_then(|f| f.base_fare_usd),
            flight_discount_amount: flight.and_then(|f| f.flight_discount_amount),
            home_airport_lat: flight.and_then(|f| f.home_airport_lat),
            home_airport_lon: flight.and_then(|f| f.home_airport_lon),
            destination_airport_lat: flight.and_then(|f| f.destination_airport_lat),
            destination_airport_lon: flight.and_then(|f| f.destination_airport_lon),
            hotel_per_room_usd: hotel.and_then(|h| h.hotel_per_room_usd),
            hotel_discount_amount: hotel.and_then(|h| h.hotel_discount_amount),
        }
    }

    /// True when the session booked a flight or a hotel.
    pub fn has_booking(&self) -> bool {
        self.flight_booked || self.hotel_booked
    }

    /// Home and destination coordinates, when all four are present.
    pub fn route(&self) -> Option<((f64, f64), (f64, f64))> {
        Some((
            (self.home_airport_lat?, self.home_airport_lon?),
            (self.destination_airport_lat?, self.destination_airport_lon?),
        ))
    }

    /// Session length in seconds.
    pub fn duration_secs(&self) -> f64 {
        (self.session_end - self.session_start).num_milliseconds() as f64 / 1000.0
    }
}

/// Behavioral metrics for one eligible user. `None` marks a ratio whose
/// denominator was zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserMetrics {
    pub user_id: i64,
    pub age: i32,
    pub married_with_children: f64,
    pub discount_flight_proportion: Option<f64>,
    pub discount_hotel_proportion: Option<f64>,
    pub average_flight_discount_perc: Option<f64>,
    pub average_hotel_discount_perc: Option<f64>,
    pub ads_per_km: Option<f64>,
    /// Seconds.
    pub mean_session_time: f64,
    pub hotel_booking_ratio: Option<f64>,
    pub flights_booking_ratio: Option<f64>,
    pub avg_tot_spent: f64,
    pub hotel_and_flights_booking_ratio: Option<f64>,
    pub cancellation_ratio: Option<f64>,
    pub bags_ratio: f64,
    pub hotel_booked_count: u32,
    pub flight_booked_count: u32,
    pub users_no_orders: f64,
}

impl UserMetrics {
    /// An all-zero record with every optional metric undefined.
    pub fn empty(user_id: i64) -> Self {
        Self {
            user_id,
            age: 0,
            married_with_children: 0.0,
            discount_flight_proportion: None,
            discount_hotel_proportion: None,
            average_flight_discount_perc: None,
            average_hotel_discount_perc: None,
            ads_per_km: None,
            mean_session_time: 0.0,
            hotel_booking_ratio: None,
            flights_booking_ratio: None,
            avg_tot_spent: 0.0,
            hotel_and_flights_booking_ratio: None,
            cancellation_ratio: None,
            bags_ratio: 0.0,
            hotel_booked_count: 0,
            flight_booked_count: 0,
            users_no_orders: 0.0,
        }
    }
}

/// Promotional perk assigned to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Perk {
    #[serde(rename = "No cancellation fees")]
    NoCancellationFees,
    #[serde(rename = "1 night free hotel with flight")]
    FreeHotelNightWithFlight,
    #[serde(rename = "Exclusive discounts")]
    ExclusiveDiscounts,
    #[serde(rename = "Free checked-in bag")]
    FreeCheckedBag,
    #[serde(rename = "Free hotel meal")]
    FreeHotelMeal,
}

impl Perk {
    pub const ALL: [Perk; 5] = [
        Perk::NoCancellationFees,
        Perk::FreeHotelNightWithFlight,
        Perk::ExclusiveDiscounts,
        Perk::FreeCheckedBag,
        Perk::FreeHotelMeal,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Perk::NoCancellationFees => "No cancellation fees",
            Perk::FreeHotelNightWithFlight => "1 night free hotel with flight",
            Perk::ExclusiveDiscounts => "Exclusive discounts",
            Perk::FreeCheckedBag => "Free checked-in bag",
            Perk::FreeHotelMeal => "Free hotel meal",
        }
    }
}

impl std::fmt::Display for Perk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Final output row: a metrics snapshot and the perk derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerkAssignment {
    #[serde(flatten)]
    pub metrics: UserMetrics,
    pub perk: Perk,
}

impl PerkAssignment {
    pub const COLUMNS: [&'static str; 19] = [
        "user_id",
        "age",
        "married_with_children",
        "discount_flight_proportion",
        "discount_hotel_proportion",
        "average_flight_discount_perc",
        "average_hotel_discount_perc",
        "ads_per_km",
        "mean_session_time",
        "hotel_booking_ratio",
        "flights_booking_ratio",
        "avg_tot_spent",
        "hotel_and_flights_booking_ratio",
        "cancellation_ratio",
        "bags_ratio",
        "hotel_booked_count",
        "flight_booked_count",
        "users_no_orders",
        "perk",
    ];

    pub fn user_id(&self) -> i64 {
        self.metrics.user_id
    }

    /// Flat tabular record in `COLUMNS` order; undefined values are empty.
    pub fn to_record(&self) -> Vec<String> {
        fn opt(v: Option<f64>) -> String {
            v.map(|x| x.to_string()).unwrap_or_default()
        }
        let m = &self.metrics;
        vec![
            m.user_id.to_string(),
            m.age.to_string(),
            m.married_with_children.to_string(),
            opt(m.discount_flight_proportion),
            opt(m.discount_hotel_proportion),
            opt(m.average_flight_discount_perc),
            opt(m.average_hotel_discount_perc),
            opt(m.ads_per_km),
            m.mean_session_time.to_string(),
            opt(m.hotel_booking_ratio),
            opt(m.flights_booking_ratio),
            m.avg_tot_spent.to_string(),
            opt(m.hotel_and_flights_booking_ratio),
            opt(m.cancellation_ratio),
            m.bags_ratio.to_string(),
            m.hotel_booked_count.to_string(),
            m.flight_booked_count.to_string(),
            m.users_no_orders.to_string(),
            self.perk.label().to_string(),
        ]
    }
}
