//! Session-row fixtures shared by the unit tests.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use perks_core::SessionRow;

/// A two-minute browsing session `day` days after 2023-02-01.
pub fn session(user_id: i64, day: i64) -> SessionRow {
    let start = NaiveDateTime::parse_from_str("2023-02-01 09:00:00", "%Y-%m-%d %H:%M:%S")
        .unwrap()
        + Duration::days(day);
    SessionRow {
        user_id,
        trip_id: None,
        session_start: start,
        session_end: start + Duration::minutes(2),
        flight_booked: false,
        hotel_booked: false,
        cancellation: false,
        flight_discount: false,
        hotel_discount: false,
        checked_bags: 0,
        birthdate: NaiveDate::from_ymd_opt(1980, 1, 1).unwrap(),
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

pub fn flight(user_id: i64, day: i64, fare: f64) -> SessionRow {
    SessionRow {
        trip_id: Some(format!("f-{user_id}-{day}")),
        flight_booked: true,
        base_fare_usd: Some(fare),
        ..session(user_id, day)
    }
}

pub fn hotel(user_id: i64, day: i64, per_room: f64) -> SessionRow {
    SessionRow {
        trip_id: Some(format!("h-{user_id}-{day}")),
        hotel_booked: true,
        hotel_per_room_usd: Some(per_room),
        ..session(user_id, day)
    }
}
