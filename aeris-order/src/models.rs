use aeris_core::Identity;
use aeris_shared::{BookingStatus, TravellerDetails};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

/// Request to book `seat_count` seats of one class on one flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBooking {
    pub flight_id: Uuid,
    /// Parsed by the engine so an unknown class surfaces as `InvalidTravelClass`.
    pub travel_class: String,
    #[serde(alias = "seats")]
    pub seat_count: i32,
    pub travellers: Vec<TravellerDetails>,
}

/// Replacement allocation for an existing booking. A traveller list is
/// required whenever the seat count changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmendBooking {
    pub travel_class: String,
    #[serde(alias = "seats")]
    pub seat_count: i32,
    #[serde(default)]
    pub travellers: Option<Vec<TravellerDetails>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingReceipt {
    pub booking_id: Uuid,
    pub is_premium: bool,
    pub total_price: i64,
    pub status: BookingStatus,
}

/// Knobs of the transaction engine that are not pricing or status rules.
#[derive(Debug, Clone, Copy)]
pub struct EngineSettings {
    /// Longest wait for a flight's lock.
    pub lock_timeout: Duration,
    pub max_seats_per_booking: i32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_millis(5000),
            max_seats_per_booking: 9,
        }
    }
}

/// Who is asking, and optionally how long they are willing to wait.
#[derive(Debug, Clone, Copy)]
pub struct OperationContext {
    pub identity: Identity,
    pub deadline: Option<Instant>,
}

impl OperationContext {
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }
}

impl From<Identity> for OperationContext {
    fn from(identity: Identity) -> Self {
        Self::new(identity)
    }
}
