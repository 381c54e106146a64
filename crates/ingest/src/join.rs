//! Left-outer join of the four source tables into denormalized session rows.

use perks_core::{Flight, Hotel, RowError, Session, SessionRow, User};
use std::collections::HashMap;
use tracing::{info, warn};

use crate::loader::LoadReport;

/// Join sessions to users (required) and to the flight and hotel of their
/// trip (optional). A trip_id without a matching flight or hotel leaves
/// those columns empty. A session whose user is unknown is a row error.
pub fn join_tables(
    users: &LoadReport<User>,
    sessions: &LoadReport<Session>,
    flights: &LoadReport<Flight>,
    hotels: &LoadReport<Hotel>,
) -> LoadReport<SessionRow> {
    let users_by_id: HashMap<i64, &User> = users.values().map(|u| (u.user_id, u)).collect();
    let flights_by_trip: HashMap<&str, &Flight> =
        flights.values().map(|f| (f.trip_id.as_str(), f)).collect();
    let hotels_by_trip: HashMap<&str, &Hotel> =
        hotels.values().map(|h| (h.trip_id.as_str(), h)).collect();

    let mut records = Vec::with_capacity(sessions.records.len());
    let mut errors = Vec::new();

    for record in &sessions.records {
        let session = &record.value;
        let Some(user) = users_by_id.get(&session.user_id) else {
            errors.push(RowError {
                source: sessions.source.clone(),
                line: record.line,
                reason: format!("unknown user_id {}", session.user_id),
            });
            continue;
        };

        let trip = session.trip_id.as_deref();
        let flight = trip.and_then(|t| flights_by_trip.get(t).copied());
        let hotel = trip.and_then(|t| hotels_by_trip.get(t).copied());

        records.push(crate::loader::LineRecord {
            line: record.line,
            value: SessionRow::join(session, user, flight, hotel),
        });
    }

    if !errors.is_empty() {
        metrics::counter!("ingest.rows_rejected").increment(errors.len() as u64);
        warn!(orphaned = errors.len(), "Sessions without a matching user");
    }
    info!(
        rows = records.len(),
        users = users_by_id.len(),
        flights = flights_by_trip.len(),
        hotels = hotels_by_trip.len(),
        "Tables joined"
    );

    LoadReport {
        source: sessions.source.clone(),
        records,
        errors,
    }
}
