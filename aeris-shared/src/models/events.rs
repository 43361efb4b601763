use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::class::{PerClass, TravelClass};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingEventKind {
    Confirmed,
    Cancelled,
    Amended,
}

impl BookingEventKind {
    pub fn topic(&self) -> &'static str {
        match self {
            BookingEventKind::Confirmed => "booking.confirmed",
            BookingEventKind::Cancelled => "booking.cancelled",
            BookingEventKind::Amended => "booking.amended",
        }
    }
}

/// Emitted after a booking transaction commits. Carries the flight's
/// post-commit availability so subscribers never need to re-read it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingEvent {
    pub kind: BookingEventKind,
    pub booking_id: Uuid,
    pub flight_id: Uuid,
    pub user_id: Uuid,
    pub travel_class: TravelClass,
    pub seat_count: i32,
    pub available_seats: PerClass<i32>,
    pub timestamp: i64,
}
