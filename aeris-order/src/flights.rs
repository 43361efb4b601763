use aeris_catalog::{Flight, FlightStatus, FlightUpdate, NewFlight, StatusPolicy};
use aeris_core::repository::{FlightRepository, StoreTransaction, TransactionalStore};
use aeris_core::{Clock, CoreError, CoreResult, Identity};
use aeris_shared::PerClass;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::engine::finish;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClassAvailability {
    pub price: i64,
    pub booked: i32,
    pub available: i32,
    pub total: i32,
}

/// Admin view of a flight with its seat breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct FlightDetails {
    #[serde(flatten)]
    pub flight: Flight,
    pub status: FlightStatus,
    pub classes: PerClass<ClassAvailability>,
    pub total_flight_seats: i32,
    pub total_available_seats: i32,
}

impl FlightDetails {
    pub fn new(flight: Flight, status: FlightStatus) -> Self {
        let classes = flight.fares.map(|class, price| ClassAvailability {
            price: *price,
            booked: flight.inventory.booked(class),
            available: flight.inventory.available(class),
            total: flight.inventory.total(class),
        });
        let total_flight_seats = flight.inventory.total_capacity();
        let total_available_seats = flight.inventory.total_available();

        Self {
            flight,
            status,
            classes,
            total_flight_seats,
            total_available_seats,
        }
    }
}

/// Publishes and maintains flights. Writes to an existing flight take the
/// same per-flight lock as bookings.
pub struct FlightAdmin {
    flights: Arc<dyn FlightRepository>,
    store: Arc<dyn TransactionalStore>,
    clock: Arc<dyn Clock>,
    status: StatusPolicy,
    lock_timeout: Duration,
}

impl FlightAdmin {
    pub fn new(
        flights: Arc<dyn FlightRepository>,
        store: Arc<dyn TransactionalStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            flights,
            store,
            clock,
            status: StatusPolicy::default(),
            lock_timeout: Duration::from_millis(5000),
        }
    }

    pub fn with_status_policy(mut self, status: StatusPolicy) -> Self {
        self.status = status;
        self
    }

    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    pub async fn create_flight(&self, identity: &Identity, new_flight: NewFlight) -> CoreResult<Flight> {
        identity.require_admin()?;

        let flight = new_flight.into_flight(Uuid::new_v4(), self.clock.now())?;
        self.flights.insert_flight(&flight).await?;

        tracing::info!(
            "Flight {} published: {} -> {} departing {}",
            flight.id,
            flight.origin,
            flight.destination,
            flight.departure_time
        );
        Ok(flight)
    }

    pub async fn update_flight(
        &self,
        identity: &Identity,
        flight_id: Uuid,
        update: FlightUpdate,
    ) -> CoreResult<Flight> {
        identity.require_admin()?;

        let mut tx = self.store.begin().await?;
        let result: CoreResult<Flight> = async {
            let mut flight = self.lock_live_flight(tx.as_mut(), flight_id).await?;
            flight.apply_update(update, self.clock.now())?;
            tx.save_flight(&flight).await?;
            Ok(flight)
        }
        .await;
        let flight = finish(tx, result).await?;

        tracing::info!("Flight {} updated", flight.id);
        Ok(flight)
    }

    /// Soft delete. Refused while any confirmed booking still holds seats.
    pub async fn delete_flight(&self, identity: &Identity, flight_id: Uuid) -> CoreResult<()> {
        identity.require_admin()?;

        let mut tx = self.store.begin().await?;
        let result: CoreResult<()> = async {
            let mut flight = self.lock_live_flight(tx.as_mut(), flight_id).await?;
            let now = self.clock.now();

            let confirmed = tx.count_confirmed_bookings(flight_id).await?;
            if confirmed > 0 {
                return Err(CoreError::Conflict(format!(
                    "flight {} still has {} confirmed bookings",
                    flight_id, confirmed
                )));
            }

            flight.deleted_at = Some(now);
            flight.updated_at = now;
            tx.save_flight(&flight).await?;
            Ok(())
        }
        .await;
        finish(tx, result).await?;

        tracing::info!("Flight {} deleted", flight_id);
        Ok(())
    }

    pub async fn get_flight_details(&self, identity: &Identity, flight_id: Uuid) -> CoreResult<FlightDetails> {
        identity.require_admin()?;

        let flight = self
            .flights
            .get_flight(flight_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("flight {}", flight_id)))?;
        let status = flight.status(self.clock.now(), &self.status);

        Ok(FlightDetails::new(flight, status))
    }

    async fn lock_live_flight(&self, tx: &mut dyn StoreTransaction, flight_id: Uuid) -> CoreResult<Flight> {
        tokio::time::timeout(self.lock_timeout, tx.lock_flight(flight_id))
            .await
            .map_err(|_| CoreError::Timeout(format!("waiting for lock on flight {}", flight_id)))??
            .filter(|flight| !flight.is_deleted())
            .ok_or_else(|| CoreError::NotFound(format!("flight {}", flight_id)))
    }
}
