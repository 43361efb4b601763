pub mod flight;
pub mod pricing;
pub mod inventory;
pub mod status;

pub use flight::{Flight, FlightError, FlightUpdate, NewFlight};
pub use pricing::{PricingError, PricingPolicy, Quote};
pub use inventory::{InventoryError, SeatInventory};
pub use status::{FlightStatus, StatusPolicy};
