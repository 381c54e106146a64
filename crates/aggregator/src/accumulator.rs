//! Per-user accumulation: one pass over a user's sessions collects counters
//! and sums, then `finish` derives the metric record from them.

use chrono::{Datelike, NaiveDate};
use perks_core::{SessionRow, UserMetrics};

use crate::geo::haversine_km;
use crate::ratio::{count_ratio, ratio, round2};

#[derive(Debug, Clone)]
pub struct UserAccumulator {
    user_id: i64,
    birth_year: Option<i32>,
    sessions: u32,
    married_with_children: u32,
    flight_booked: u32,
    hotel_booked: u32,
    any_booked: u32,
    both_booked: u32,
    flight_discounted: u32,
    hotel_discounted: u32,
    flight_discount_sum: f64,
    flight_discount_n: u32,
    hotel_discount_sum: f64,
    hotel_discount_n: u32,
    net_flight_spend: f64,
    distance_km: f64,
    session_secs: f64,
    total_spent: f64,
    hotel_completed: u32,
    flight_completed: u32,
    cancelled_bookings: u32,
    flights_with_bags: u32,
    no_orders: u32,
}

impl UserAccumulator {
    pub fn new(user_id: i64) -> Self {
        Self {
            user_id,
            birth_year: None,
            sessions: 0,
            married_with_children: 0,
            flight_booked: 0,
            hotel_booked: 0,
            any_booked: 0,
            both_booked: 0,
            flight_discounted: 0,
            hotel_discounted: 0,
            flight_discount_sum: 0.0,
            flight_discount_n: 0,
            hotel_discount_sum: 0.0,
            hotel_discount_n: 0,
            net_flight_spend: 0.0,
            distance_km: 0.0,
            session_secs: 0.0,
            total_spent: 0.0,
            hotel_completed: 0,
            flight_completed: 0,
            cancelled_bookings: 0,
            flights_with_bags: 0,
            no_orders: 0,
        }
    }

    pub fn sessions(&self) -> u32 {
        self.sessions
    }

    pub fn push(&mut self, row: &SessionRow) {
        debug_assert_eq!(row.user_id, self.user_id);

        self.sessions += 1;
        self.birth_year.get_or_insert(row.birthdate.year());
        self.session_secs += row.duration_secs();

        if row.married && row.has_children {
            self.married_with_children += 1;
        }

        if row.flight_booked {
            self.flight_booked += 1;
            if !row.cancellation {
                self.flight_completed += 1;
            }
            if row.checked_bags > 0 {
                self.flights_with_bags += 1;
            }
        }
        if row.hotel_booked {
            self.hotel_booked += 1;
            if !row.cancellation {
                self.hotel_completed += 1;
            }
        }
        if row.has_booking() {
            self.any_booked += 1;
            if row.cancellation {
                self.cancelled_bookings += 1;
            }
        } else {
            self.no_orders += 1;
        }
        if row.flight_booked && row.hotel_booked {
            self.both_booked += 1;
        }

        if row.flight_discount {
            self.flight_discounted += 1;
        }
        if row.hotel_discount {
            self.hotel_discounted += 1;
        }
        if let Some(amount) = row.flight_discount_amount {
            self.flight_discount_sum += amount;
            self.flight_discount_n += 1;
        }
        if let Some(amount) = row.hotel_discount_amount {
            self.hotel_discount_sum += amount;
            self.hotel_discount_n += 1;
        }

        let fare = row.base_fare_usd.unwrap_or(0.0);
        let flight_net = fare * (1.0 - row.flight_discount_amount.unwrap_or(0.0));
        let hotel_net = row.hotel_per_room_usd.unwrap_or(0.0)
            * (1.0 - row.hotel_discount_amount.unwrap_or(0.0));
        self.total_spent += flight_net + hotel_net;

        if let Some((home, destination)) = row.route() {
            self.net_flight_spend += flight_net;
            self.distance_km += haversine_km(home, destination);
        }
    }

    /// Derive the metric record. `as_of` is the date ages are taken at.
    pub fn finish(&self, as_of: NaiveDate) -> UserMetrics {
        let sessions = self.sessions as f64;
        let bags_ratio =
            count_ratio(self.flights_with_bags, self.flight_booked).unwrap_or_default();

        UserMetrics {
            user_id: self.user_id,
            age: self.birth_year.map(|y| as_of.year() - y).unwrap_or_default(),
            married_with_children: count_ratio(self.married_with_children, self.sessions)
                .unwrap_or_default(),
            discount_flight_proportion: count_ratio(self.flight_discounted, self.flight_booked),
            discount_hotel_proportion: count_ratio(self.hotel_discounted, self.hotel_booked),
            average_flight_discount_perc: ratio(
                self.flight_discount_sum,
                self.flight_discount_n as f64,
            )
            .map(round2),
            average_hotel_discount_perc: ratio(
                self.hotel_discount_sum,
                self.hotel_discount_n as f64,
            )
            .map(round2),
            ads_per_km: ratio(self.net_flight_spend, self.distance_km).map(round2),
            mean_session_time: ratio(self.session_secs, sessions)
                .map(round2)
                .unwrap_or_default(),
            hotel_booking_ratio: count_ratio(self.hotel_completed, self.hotel_booked),
            flights_booking_ratio: count_ratio(self.flight_completed, self.flight_booked),
            avg_tot_spent: ratio(self.total_spent, sessions)
                .map(round2)
                .unwrap_or_default(),
            hotel_and_flights_booking_ratio: count_ratio(self.both_booked, self.any_booked),
            cancellation_ratio: count_ratio(self.cancelled_bookings, self.any_booked),
            bags_ratio,
            hotel_booked_count: self.hotel_completed,
            flight_booked_count: self.flight_completed,
            users_no_orders: count_ratio(self.no_orders, self.sessions).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{as_of, booked_flight, booked_hotel, row};

    fn accumulate(rows: &[SessionRow]) -> UserMetrics {
        let mut acc = UserAccumulator::new(rows[0].user_id);
        for r in rows {
            acc.push(r);
        }
        acc.finish(as_of())
    }

    #[test]
    fn test_no_bookings_guards() {
        let rows: Vec<SessionRow> = (0..10).map(|_| row(1, "2023-02-01 10:00:00")).collect();
        let m = accumulate(&rows);
        assert_eq!(m.users_no_orders, 1.0);
        assert_eq!(m.cancellation_ratio, None);
        assert_eq!(m.bags_ratio, 0.0);
        assert_eq!(m.flights_booking_ratio, None);
        assert_eq!(m.hotel_booking_ratio, None);
        assert_eq!(m.discount_flight_proportion, None);
        assert_eq!(m.hotel_and_flights_booking_ratio, None);
        assert_eq!(m.ads_per_km, None);
        assert_eq!(m.hotel_booked_count, 0);
        assert_eq!(m.flight_booked_count, 0);
    }

    #[test]
    fn test_hotel_only_keeps_bags_ratio_zero() {
        let mut rows = vec![booked_hotel(1, 100.0, None)];
        rows.push(row(1, "2023-02-01 10:00:00"));
        let m = accumulate(&rows);
        assert_eq!(m.bags_ratio, 0.0);
        assert_eq!(m.cancellation_ratio, Some(0.0));
        assert_eq!(m.hotel_booked_count, 1);
    }

    #[test]
    fn test_avg_tot_spent_coalesces_missing_fares() {
        let mut a = booked_flight(1, Some(100.0), Some(0.0));
        let mut b = booked_flight(1, Some(200.0), Some(0.0));
        let c = booked_flight(1, None, Some(0.0));
        a.home_airport_lat = None;
        b.home_airport_lat = None;
        let m = accumulate(&[a, b, c]);
        assert_eq!(m.avg_tot_spent, 100.0);
    }

    #[test]
    fn test_spend_applies_discounts() {
        let flight = booked_flight(1, Some(200.0), Some(0.25));
        let hotel = booked_hotel(1, 100.0, Some(0.5));
        let m = accumulate(&[flight, hotel]);
        // (150 + 50) / 2
        assert_eq!(m.avg_tot_spent, 100.0);
        assert_eq!(m.average_flight_discount_perc, Some(0.25));
        assert_eq!(m.average_hotel_discount_perc, Some(0.5));
    }

    #[test]
    fn test_ads_per_km_zero_distance_is_undefined() {
        let mut r = booked_flight(1, Some(300.0), None);
        r.destination_airport_lat = r.home_airport_lat;
        r.destination_airport_lon = r.home_airport_lon;
        let m = accumulate(&[r]);
        assert_eq!(m.ads_per_km, None);
    }

    #[test]
    fn test_ads_per_km() {
        // one degree of longitude on the equator
        let mut r = booked_flight(1, Some(222.39), Some(0.0));
        r.home_airport_lat = Some(0.0);
        r.home_airport_lon = Some(0.0);
        r.destination_airport_lat = Some(0.0);
        r.destination_airport_lon = Some(1.0);
        let m = accumulate(&[r]);
        assert_eq!(m.ads_per_km, Some(2.0));
    }

    #[test]
    fn test_cancellation_and_completion() {
        let mut cancelled = booked_flight(1, Some(100.0), None);
        cancelled.cancellation = true;
        let rows = vec![
            booked_flight(1, Some(100.0), None),
            booked_flight(1, Some(100.0), None),
            booked_flight(1, Some(100.0), None),
            cancelled,
        ];
        let m = accumulate(&rows);
        assert_eq!(m.flight_booked_count, 3);
        assert_eq!(m.flights_booking_ratio, Some(0.75));
        assert_eq!(m.cancellation_ratio, Some(0.25));
        assert_eq!(m.users_no_orders, 0.0);
    }

    #[test]
    fn test_count_ratios_round_exact_halves_up() {
        // 29 of 200 sessions without an order is exactly 0.145
        let mut rows: Vec<SessionRow> = (0..171).map(|_| booked_hotel(1, 100.0, None)).collect();
        rows.extend((0..29).map(|_| row(1, "2023-02-01 10:00:00")));
        let m = accumulate(&rows);
        assert_eq!(m.users_no_orders, 0.15);
        assert_eq!(m.avg_tot_spent, 85.5);
    }

    #[test]
    fn test_bags_ratio_over_flight_bookings() {
        let mut no_bags = booked_flight(1, Some(100.0), None);
        no_bags.checked_bags = 0;
        let rows = vec![booked_flight(1, Some(100.0), None), no_bags.clone(), no_bags];
        let m = accumulate(&rows);
        assert_eq!(m.bags_ratio, 0.33);
    }

    #[test]
    fn test_flight_and_hotel_in_one_session() {
        let mut both = booked_flight(1, Some(100.0), None);
        both.hotel_booked = true;
        both.hotel_per_room_usd = Some(50.0);
        let rows = vec![both, booked_hotel(1, 80.0, None)];
        let m = accumulate(&rows);
        assert_eq!(m.hotel_and_flights_booking_ratio, Some(0.5));
        assert_eq!(m.hotel_booked_count, 2);
        assert_eq!(m.flight_booked_count, 1);
    }

    #[test]
    fn test_profile_metrics() {
        let mut rows: Vec<SessionRow> = (0..4).map(|_| row(1, "2023-02-01 10:00:00")).collect();
        for r in rows.iter_mut() {
            r.married = true;
            r.has_children = true;
        }
        let m = accumulate(&rows);
        assert_eq!(m.married_with_children, 1.0);
        // born 1990, ages taken at 2024-06-01
        assert_eq!(m.age, 34);
        assert_eq!(m.mean_session_time, 300.0);
    }

    #[test]
    fn test_discount_proportions() {
        let mut discounted = booked_flight(1, Some(100.0), Some(0.1));
        discounted.flight_discount = true;
        let rows = vec![discounted, booked_flight(1, Some(100.0), None)];
        let m = accumulate(&rows);
        assert_eq!(m.discount_flight_proportion, Some(0.5));
        assert_eq!(m.discount_hotel_proportion, None);
        assert_eq!(m.average_flight_discount_perc, Some(0.1));
        assert_eq!(m.average_hotel_discount_perc, None);
    }
}
