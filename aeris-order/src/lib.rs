pub mod changes;
pub mod engine;
pub mod flights;
pub mod models;
pub mod validation;

pub use engine::BookingEngine;
pub use flights::{ClassAvailability, FlightAdmin, FlightDetails};
pub use models::{AmendBooking, BookingReceipt, CreateBooking, EngineSettings, OperationContext};
