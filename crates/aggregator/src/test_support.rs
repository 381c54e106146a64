//! Row fixtures for unit tests.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use perks_core::SessionRow;

pub fn ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

pub fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

/// A five-minute browsing session with no booking.
pub fn row(user_id: i64, start: &str) -> SessionRow {
    let session_start = ts(start);
    SessionRow {
        user_id,
        trip_id: None,
        session_start,
        session_end: session_start + Duration::minutes(5),
        flight_booked: false,
        hotel_booked: false,
        cancellation: false,
        flight_discount: false,
        hotel_discount: false,
        checked_bags: 0,
        birthdate: NaiveDate::from_ymd_opt(1990, 6, 15).unwrap(),
        married: false,
        has_children: false,
        base_fare_usd: None,
        flight_discount_amount: None,
        home_airport_lat: None,
        home_airport_lon: None,
        destination_airport_lat: None,
        destination_airport_lon: None,
        hotel_per_room_usd: None,
        hotel_discount_amount: None,
    }
}

/// A JFK to LHR flight booking with one checked bag.
pub fn booked_flight(user_id: i64, fare: Option<f64>, discount: Option<f64>) -> SessionRow {
    SessionRow {
        trip_id: Some(format!("trip-{user_id}")),
        flight_booked: true,
        checked_bags: 1,
        base_fare_usd: fare,
        flight_discount_amount: discount,
        home_airport_lat: Some(40.6413),
        home_airport_lon: Some(-73.7781),
        destination_airport_lat: Some(51.47),
        destination_airport_lon: Some(-0.4543),
        ..row(user_id, "2023-02-01 10:00:00")
    }
}

pub fn booked_hotel(user_id: i64, per_room: f64, discount: Option<f64>) -> SessionRow {
    SessionRow {
        trip_id: Some(format!("trip-{user_id}")),
        hotel_booked: true,
        hotel_per_room_usd: Some(per_room),
        hotel_discount_amount: discount,
        ..row(user_id, "2023-02-01 10:00:00")
    }
}
