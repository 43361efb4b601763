pub mod clock;
pub mod events;
pub mod identity;
pub mod repository;
pub mod search;

use aeris_catalog::{FlightError, InventoryError, PricingError};
use aeris_shared::{TravelClass, UnknownTravelClass};

pub use clock::{Clock, FixedClock, SystemClock};
pub use events::{CompositeSink, EventSink, NoopEventSink};
pub use identity::{Identity, Role};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid travel class: {0}")]
    InvalidTravelClass(String),

    #[error("Booking window closed: bookings close {cutoff_minutes} minutes before departure")]
    BookingWindowClosed { cutoff_minutes: i64 },

    #[error("Insufficient {class} seats: requested {requested}, available {available}")]
    InsufficientSeats {
        class: TravelClass,
        requested: i32,
        available: i32,
    },

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Storage error: {0}")]
    StorageError(String),
}

impl CoreError {
    /// Only lock/deadline expiry is worth retrying; every other failure is
    /// terminal for the request that produced it.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::Timeout(_))
    }

    /// Stable machine-readable name, used as the `code` of API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            CoreError::ValidationError(_) => "VALIDATION_ERROR",
            CoreError::NotFound(_) => "NOT_FOUND",
            CoreError::InvalidTravelClass(_) => "INVALID_TRAVEL_CLASS",
            CoreError::BookingWindowClosed { .. } => "BOOKING_WINDOW_CLOSED",
            CoreError::InsufficientSeats { .. } => "INSUFFICIENT_SEATS",
            CoreError::Timeout(_) => "TIMEOUT",
            CoreError::Conflict(_) => "CONFLICT",
            CoreError::Forbidden(_) => "FORBIDDEN",
            CoreError::Unauthorized(_) => "UNAUTHORIZED",
            CoreError::StorageError(_) => "STORAGE_ERROR",
        }
    }
}

impl From<InventoryError> for CoreError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::InsufficientSeats {
                class,
                requested,
                available,
            } => CoreError::InsufficientSeats {
                class,
                requested,
                available,
            },
            InventoryError::InvalidQuantity(_)
            | InventoryError::NegativeCapacity(_)
            | InventoryError::NoCapacity => CoreError::ValidationError(err.to_string()),
            InventoryError::OverRelease { .. } | InventoryError::Inconsistent { .. } => {
                CoreError::Conflict(err.to_string())
            }
        }
    }
}

impl From<PricingError> for CoreError {
    fn from(err: PricingError) -> Self {
        match err {
            PricingError::BookingWindowClosed { cutoff_minutes } => {
                CoreError::BookingWindowClosed { cutoff_minutes }
            }
            PricingError::InvalidSeatCount(_) | PricingError::NegativeFare(_) => {
                CoreError::ValidationError(err.to_string())
            }
            PricingError::Overflow => CoreError::ValidationError(err.to_string()),
        }
    }
}

impl From<FlightError> for CoreError {
    fn from(err: FlightError) -> Self {
        match err {
            FlightError::Inventory(inner) => inner.into(),
            other => CoreError::ValidationError(other.to_string()),
        }
    }
}

impl From<UnknownTravelClass> for CoreError {
    fn from(err: UnknownTravelClass) -> Self {
        CoreError::InvalidTravelClass(err.0)
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
