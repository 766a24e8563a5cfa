use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use crate::payment::Payment;
use crate::route::Route;

/// Booking status in the lifecycle. `Cancelled` is terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(format!("unknown booking status: {}", other)),
        }
    }
}

/// A user's reservation of seats on a route.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub route_id: Uuid,
    pub passengers: i32,
    pub total_amount: i64,
    pub status: BookingStatus,
    pub seat_numbers: Option<String>,
    pub booking_date: DateTime<Utc>,
}

impl Booking {
    pub fn new(
        user_id: Uuid,
        route_id: Uuid,
        passengers: i32,
        total_amount: i64,
        seat_numbers: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            route_id,
            passengers,
            total_amount,
            status: BookingStatus::Confirmed,
            seat_numbers,
            booking_date: Utc::now(),
        }
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == BookingStatus::Cancelled
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PassengerDetail {
    pub full_name: String,
    #[serde(default)]
    pub seat_number: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingRequest {
    pub route_id: Uuid,
    pub passenger_count: i32,
    #[serde(default)]
    pub passengers: Vec<PassengerDetail>,
}

/// Booking joined with its route and payment, as shown on booking pages.
#[derive(Debug, Clone, Serialize)]
pub struct BookingDetails {
    pub booking: Booking,
    pub route: Route,
    pub payment: Option<Payment>,
}
