use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Duration, Utc};

/// A single transport departure offering. `available_seats` is owned by the
/// inventory ledger; nothing else writes it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Route {
    pub id: Uuid,
    pub departure_city: String,
    pub arrival_city: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub transport_type: String,
    pub vehicle_name: String,
    pub vehicle_number: String,
    pub price: i64,
    pub capacity: i32,
    pub available_seats: i32,
}

impl Route {
    pub fn has_seats_for(&self, passengers: i32) -> bool {
        passengers >= 1 && self.available_seats >= passengers
    }

    pub fn travel_time(&self) -> Duration {
        self.arrival_time - self.departure_time
    }

    /// Whole hours left before departure, truncated toward zero.
    pub fn hours_until_departure(&self, now: DateTime<Utc>) -> i64 {
        (self.departure_time - now).num_hours()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn route_departing(at: DateTime<Utc>) -> Route {
        Route {
            id: Uuid::new_v4(),
            departure_city: "Dhaka".to_string(),
            arrival_city: "Sylhet".to_string(),
            departure_time: at,
            arrival_time: at + Duration::hours(6),
            transport_type: "Bus".to_string(),
            vehicle_name: "Green Line".to_string(),
            vehicle_number: "DHA-11-2233".to_string(),
            price: 500,
            capacity: 40,
            available_seats: 40,
        }
    }

    #[test]
    fn test_hours_truncate() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();

        let route = route_departing(now + Duration::hours(2) + Duration::minutes(59));
        assert_eq!(route.hours_until_departure(now), 2);

        let route = route_departing(now + Duration::hours(3));
        assert_eq!(route.hours_until_departure(now), 3);

        let route = route_departing(now + Duration::days(1) + Duration::hours(1));
        assert_eq!(route.hours_until_departure(now), 25);

        let route = route_departing(now - Duration::hours(4));
        assert_eq!(route.hours_until_departure(now), -4);
    }

    #[test]
    fn test_seat_check() {
        let mut route = route_departing(Utc::now());
        route.available_seats = 2;

        assert!(route.has_seats_for(2));
        assert!(!route.has_seats_for(3));
        assert!(!route.has_seats_for(0));
        assert_eq!(route.travel_time(), Duration::hours(6));
    }
}
