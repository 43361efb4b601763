pub mod booking;
pub mod class;
pub mod events;
pub mod user;

pub use booking::{Booking, BookingStatus, Traveller, TravellerDetails};
pub use class::{PerClass, TravelClass, UnknownTravelClass};
pub use events::{BookingEvent, BookingEventKind};
pub use user::User;
