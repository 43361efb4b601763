pub mod models;
pub mod pii;

pub use models::{
    Booking, BookingEvent, BookingEventKind, BookingStatus, PerClass, TravelClass, Traveller,
    TravellerDetails, UnknownTravelClass, User,
};
pub use pii::Masked;
