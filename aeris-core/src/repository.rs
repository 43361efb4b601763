use aeris_catalog::Flight;
use aeris_shared::{Booking, User};
use async_trait::async_trait;
use uuid::Uuid;

use crate::search::{FlightQuery, Locations, Page, PageRequest};
use crate::CoreResult;

/// Read side of the flight catalog.
#[async_trait]
pub trait FlightRepository: Send + Sync {
    async fn insert_flight(&self, flight: &Flight) -> CoreResult<()>;

    /// Soft-deleted flights are reported as absent.
    async fn get_flight(&self, id: Uuid) -> CoreResult<Option<Flight>>;

    async fn search_flights(&self, query: &FlightQuery) -> CoreResult<Page<Flight>>;

    async fn list_locations(&self) -> CoreResult<Locations>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn get_booking(&self, id: Uuid) -> CoreResult<Option<Booking>>;

    /// Newest first.
    async fn list_bookings_for_user(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> CoreResult<Page<Booking>>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `Conflict` when the (normalized) email is taken.
    async fn insert_user(&self, user: &User) -> CoreResult<()>;

    async fn find_user_by_email(&self, email: &str) -> CoreResult<Option<User>>;

    async fn get_user(&self, id: Uuid) -> CoreResult<Option<User>>;
}

/// Opens units of work. Everything done through one `StoreTransaction`
/// becomes visible atomically on `commit`, or not at all.
#[async_trait]
pub trait TransactionalStore: Send + Sync {
    async fn begin(&self) -> CoreResult<Box<dyn StoreTransaction>>;
}

/// One open transaction.
///
/// `lock_flight` takes the flight's exclusive lock and holds it until the
/// transaction ends; concurrent lockers of the same flight wait. Dropping a
/// transaction without committing rolls it back.
#[async_trait]
pub trait StoreTransaction: Send {
    /// Returns the row even if soft-deleted; callers decide what that means.
    async fn lock_flight(&mut self, flight_id: Uuid) -> CoreResult<Option<Flight>>;

    async fn save_flight(&mut self, flight: &Flight) -> CoreResult<()>;

    async fn get_booking(&mut self, booking_id: Uuid) -> CoreResult<Option<Booking>>;

    async fn insert_booking(&mut self, booking: &Booking) -> CoreResult<()>;

    /// Writes booking fields; replaces the traveller rows too when asked.
    async fn update_booking(&mut self, booking: &Booking, replace_travellers: bool) -> CoreResult<()>;

    async fn count_confirmed_bookings(&mut self, flight_id: Uuid) -> CoreResult<i64>;

    async fn commit(self: Box<Self>) -> CoreResult<()>;

    async fn rollback(self: Box<Self>) -> CoreResult<()>;
}

/// Everything a full backend provides.
pub trait AerisStore:
    FlightRepository + BookingRepository + UserRepository + TransactionalStore
{
}

impl<T> AerisStore for T where
    T: FlightRepository + BookingRepository + UserRepository + TransactionalStore
{
}
