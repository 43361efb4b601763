use aeris_catalog::Flight;
use aeris_core::repository::{
    BookingRepository, FlightRepository, StoreTransaction, TransactionalStore, UserRepository,
};
use aeris_core::search::{FlightQuery, Locations, Page, PageRequest};
use aeris_core::{CoreError, CoreResult};
use aeris_shared::models::user::normalize_email;
use aeris_shared::{Booking, User};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

#[derive(Default)]
struct State {
    flights: HashMap<Uuid, Flight>,
    bookings: HashMap<Uuid, Booking>,
    users: HashMap<Uuid, User>,
}

/// Process-local store with the same transactional contract as Postgres:
/// one async mutex per flight stands in for the row lock, and writes are
/// staged until commit.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
    flight_locks: LockTable,
}

type LockTable = Arc<Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>>;

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn flight_lock(&self, flight_id: Uuid) -> Arc<AsyncMutex<()>> {
        let mut locks = self
            .flight_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        locks.entry(flight_id).or_default().clone()
    }

    #[cfg(test)]
    fn tracked_locks(&self) -> usize {
        self.flight_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Flight locks held by one transaction. Releasing them also forgets any
/// lock nobody else is holding or waiting on, so the table only tracks
/// contended flights.
struct HeldLocks {
    table: LockTable,
    guards: HashMap<Uuid, OwnedMutexGuard<()>>,
}

impl HeldLocks {
    fn new(table: LockTable) -> Self {
        Self {
            table,
            guards: HashMap::new(),
        }
    }

    fn holds(&self, flight_id: &Uuid) -> bool {
        self.guards.contains_key(flight_id)
    }
}

impl Drop for HeldLocks {
    fn drop(&mut self) {
        if self.guards.is_empty() {
            return;
        }
        let released: Vec<Uuid> = self.guards.drain().map(|(id, _guard)| id).collect();

        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        for id in released {
            if table.get(&id).is_some_and(|lock| Arc::strong_count(lock) == 1) {
                table.remove(&id);
            }
        }
    }
}

#[async_trait]
impl FlightRepository for InMemoryStore {
    async fn insert_flight(&self, flight: &Flight) -> CoreResult<()> {
        let mut state = self.write();
        if state.flights.contains_key(&flight.id) {
            return Err(CoreError::Conflict(format!("flight {} already exists", flight.id)));
        }
        state.flights.insert(flight.id, flight.clone());
        Ok(())
    }

    async fn get_flight(&self, id: Uuid) -> CoreResult<Option<Flight>> {
        Ok(self
            .read()
            .flights
            .get(&id)
            .filter(|flight| !flight.is_deleted())
            .cloned())
    }

    async fn search_flights(&self, query: &FlightQuery) -> CoreResult<Page<Flight>> {
        let mut matches: Vec<Flight> = self
            .read()
            .flights
            .values()
            .filter(|flight| query.matches(flight))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matches.len() as i64;
        let page = query.page_or_all(total);
        let data = match query.page {
            Some(page) => matches
                .into_iter()
                .skip(page.offset() as usize)
                .take(page.limit as usize)
                .collect(),
            None => matches,
        };

        Ok(Page::new(data, total, page))
    }

    async fn list_locations(&self) -> CoreResult<Locations> {
        let state = self.read();
        let live = state.flights.values().filter(|flight| !flight.is_deleted());

        let mut origins = BTreeSet::new();
        let mut destinations = BTreeSet::new();
        for flight in live {
            origins.insert(flight.origin.clone());
            destinations.insert(flight.destination.clone());
        }

        Ok(Locations {
            origins: origins.into_iter().collect(),
            destinations: destinations.into_iter().collect(),
        })
    }
}

#[async_trait]
impl BookingRepository for InMemoryStore {
    async fn get_booking(&self, id: Uuid) -> CoreResult<Option<Booking>> {
        Ok(self.read().bookings.get(&id).cloned())
    }

    async fn list_bookings_for_user(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> CoreResult<Page<Booking>> {
        let mut bookings: Vec<Booking> = self
            .read()
            .bookings
            .values()
            .filter(|booking| booking.user_id == user_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.booking_date.cmp(&a.booking_date).then(b.id.cmp(&a.id)));

        let total = bookings.len() as i64;
        let data = bookings
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .collect();

        Ok(Page::new(data, total, page))
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn insert_user(&self, user: &User) -> CoreResult<()> {
        let mut state = self.write();
        let email = normalize_email(user.email.expose());
        if state
            .users
            .values()
            .any(|existing| normalize_email(existing.email.expose()) == email)
        {
            return Err(CoreError::Conflict("email is already registered".to_string()));
        }
        state.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> CoreResult<Option<User>> {
        let email = normalize_email(email);
        Ok(self
            .read()
            .users
            .values()
            .find(|user| user.is_active() && normalize_email(user.email.expose()) == email)
            .cloned())
    }

    async fn get_user(&self, id: Uuid) -> CoreResult<Option<User>> {
        Ok(self
            .read()
            .users
            .get(&id)
            .filter(|user| user.is_active())
            .cloned())
    }
}

#[async_trait]
impl TransactionalStore for InMemoryStore {
    async fn begin(&self) -> CoreResult<Box<dyn StoreTransaction>> {
        Ok(Box::new(MemoryTransaction {
            store: self.clone(),
            locks: HeldLocks::new(self.flight_locks.clone()),
            flights: HashMap::new(),
            bookings: HashMap::new(),
        }))
    }
}

/// Staged writes plus the flight locks taken so far. Dropping it discards
/// the writes and releases the locks.
pub struct MemoryTransaction {
    store: InMemoryStore,
    locks: HeldLocks,
    flights: HashMap<Uuid, Flight>,
    bookings: HashMap<Uuid, Booking>,
}

impl MemoryTransaction {
    fn current_booking(&self, booking_id: Uuid) -> Option<Booking> {
        self.bookings
            .get(&booking_id)
            .cloned()
            .or_else(|| self.store.read().bookings.get(&booking_id).cloned())
    }
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn lock_flight(&mut self, flight_id: Uuid) -> CoreResult<Option<Flight>> {
        if !self.locks.holds(&flight_id) {
            let guard = self.store.flight_lock(flight_id).lock_owned().await;
            self.locks.guards.insert(flight_id, guard);
        }

        if let Some(staged) = self.flights.get(&flight_id) {
            return Ok(Some(staged.clone()));
        }
        Ok(self.store.read().flights.get(&flight_id).cloned())
    }

    async fn save_flight(&mut self, flight: &Flight) -> CoreResult<()> {
        if !self.locks.holds(&flight.id) {
            return Err(CoreError::StorageError(format!(
                "flight {} written without holding its lock",
                flight.id
            )));
        }
        self.flights.insert(flight.id, flight.clone());
        Ok(())
    }

    async fn get_booking(&mut self, booking_id: Uuid) -> CoreResult<Option<Booking>> {
        Ok(self.current_booking(booking_id))
    }

    async fn insert_booking(&mut self, booking: &Booking) -> CoreResult<()> {
        if self.current_booking(booking.id).is_some() {
            return Err(CoreError::Conflict(format!("booking {} already exists", booking.id)));
        }
        self.bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn update_booking(&mut self, booking: &Booking, replace_travellers: bool) -> CoreResult<()> {
        let mut updated = booking.clone();
        if !replace_travellers {
            if let Some(existing) = self.current_booking(booking.id) {
                updated.travellers = existing.travellers;
            }
        }
        self.bookings.insert(booking.id, updated);
        Ok(())
    }

    async fn count_confirmed_bookings(&mut self, flight_id: Uuid) -> CoreResult<i64> {
        let state = self.store.read();
        let mut confirmed: HashMap<Uuid, bool> = state
            .bookings
            .values()
            .filter(|b| b.flight_id == flight_id)
            .map(|b| (b.id, b.is_confirmed()))
            .collect();
        for booking in self.bookings.values().filter(|b| b.flight_id == flight_id) {
            confirmed.insert(booking.id, booking.is_confirmed());
        }
        Ok(confirmed.values().filter(|c| **c).count() as i64)
    }

    async fn commit(self: Box<Self>) -> CoreResult<()> {
        let MemoryTransaction {
            store,
            locks,
            flights,
            bookings,
        } = *self;

        {
            let mut state = store.write();
            state.flights.extend(flights);
            state.bookings.extend(bookings);
        }

        // Locks are released only once the writes are visible.
        drop(locks);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> CoreResult<()> {
        Ok(())
    }
}
