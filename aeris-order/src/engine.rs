use aeris_catalog::{Flight, PricingPolicy, StatusPolicy};
use aeris_core::repository::{StoreTransaction, TransactionalStore};
use aeris_core::{Clock, CoreError, CoreResult, EventSink, NoopEventSink};
use aeris_shared::{Booking, BookingEvent, BookingEventKind, BookingStatus, TravelClass};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{BookingReceipt, CreateBooking, EngineSettings, OperationContext};
use crate::validation::{validate_seat_count, validate_travellers};

/// Seat allocation engine.
///
/// Every operation runs as one store transaction that holds the affected
/// flight's exclusive lock from the first read of its inventory until commit
/// or rollback. Availability is never checked and decremented in separate
/// transactions.
pub struct BookingEngine {
    pub(crate) store: Arc<dyn TransactionalStore>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) pricing: PricingPolicy,
    pub(crate) status: StatusPolicy,
    pub(crate) settings: EngineSettings,
    pub(crate) events: Arc<dyn EventSink>,
}

impl BookingEngine {
    pub fn new(store: Arc<dyn TransactionalStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            pricing: PricingPolicy::default(),
            status: StatusPolicy::default(),
            settings: EngineSettings::default(),
            events: Arc::new(NoopEventSink),
        }
    }

    pub fn with_pricing(mut self, pricing: PricingPolicy) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn with_status_policy(mut self, status: StatusPolicy) -> Self {
        self.status = status;
        self
    }

    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn pricing(&self) -> &PricingPolicy {
        &self.pricing
    }

    pub fn status_policy(&self) -> &StatusPolicy {
        &self.status
    }

    /// Reserve seats and record a confirmed booking in one step.
    pub async fn create_booking(
        &self,
        ctx: impl Into<OperationContext>,
        request: CreateBooking,
    ) -> CoreResult<BookingReceipt> {
        let ctx = ctx.into();

        let class: TravelClass = request.travel_class.parse()?;
        validate_seat_count(request.seat_count, self.settings.max_seats_per_booking)?;
        validate_travellers(
            &request.travellers,
            request.seat_count,
            self.clock.now().date_naive(),
        )?;

        let work = async {
            let mut tx = self.store.begin().await?;
            let result = self.create_in_tx(tx.as_mut(), &ctx, class, request).await;
            finish(tx, result).await
        };
        let (booking, flight) = self.within_deadline(&ctx, work).await?;

        tracing::info!(
            "Booking {} confirmed: {} x {} on flight {} for {}",
            booking.id,
            booking.seat_count,
            booking.travel_class,
            booking.flight_id,
            booking.total_price
        );
        self.publish(BookingEventKind::Confirmed, &booking, &flight).await;

        Ok(receipt(&booking))
    }

    async fn create_in_tx(
        &self,
        tx: &mut dyn StoreTransaction,
        ctx: &OperationContext,
        class: TravelClass,
        request: CreateBooking,
    ) -> CoreResult<(Booking, Flight)> {
        let mut flight = self.lock_live_flight(tx, request.flight_id).await?;
        // Priced at the moment the lock is held, not when the request arrived.
        let now = self.clock.now();

        self.ensure_bookable(&flight, now)?;
        let quote = self.pricing.quote_for(&flight, class, request.seat_count, now)?;

        flight.inventory.reserve(class, request.seat_count)?;
        flight.updated_at = now;
        tx.save_flight(&flight).await?;

        let mut booking = Booking {
            id: Uuid::new_v4(),
            user_id: ctx.identity.user_id,
            flight_id: flight.id,
            travel_class: class,
            seat_count: request.seat_count,
            is_premium: quote.is_premium,
            total_price: quote.total_price,
            status: BookingStatus::Confirmed,
            booking_date: now,
            updated_at: now,
            cancelled_at: None,
            travellers: Vec::new(),
        };
        booking.replace_travellers(request.travellers);
        tx.insert_booking(&booking).await?;

        Ok((booking, flight))
    }

    /// Give the booking's seats back and mark it cancelled. Travellers stay
    /// attached as history.
    pub async fn cancel_booking(
        &self,
        ctx: impl Into<OperationContext>,
        booking_id: Uuid,
    ) -> CoreResult<()> {
        let ctx = ctx.into();

        let work = async {
            let mut tx = self.store.begin().await?;
            let result = self.cancel_in_tx(tx.as_mut(), &ctx, booking_id).await;
            finish(tx, result).await
        };
        let (booking, flight) = self.within_deadline(&ctx, work).await?;

        tracing::info!(
            "Booking {} cancelled: released {} x {} on flight {}",
            booking.id,
            booking.seat_count,
            booking.travel_class,
            booking.flight_id
        );
        self.publish(BookingEventKind::Cancelled, &booking, &flight).await;

        Ok(())
    }

    async fn cancel_in_tx(
        &self,
        tx: &mut dyn StoreTransaction,
        ctx: &OperationContext,
        booking_id: Uuid,
    ) -> CoreResult<(Booking, Flight)> {
        let (mut booking, mut flight) = self.lock_booking(tx, ctx, booking_id).await?;
        let now = self.clock.now();

        flight.inventory.release(booking.travel_class, booking.seat_count)?;
        flight.updated_at = now;
        tx.save_flight(&flight).await?;

        booking.cancel(now);
        tx.update_booking(&booking, false).await?;

        Ok((booking, flight))
    }

    /// Locks the flight a booking belongs to, then re-reads the booking under
    /// that lock so its allocation cannot change underneath us.
    pub(crate) async fn lock_booking(
        &self,
        tx: &mut dyn StoreTransaction,
        ctx: &OperationContext,
        booking_id: Uuid,
    ) -> CoreResult<(Booking, Flight)> {
        let unlocked = tx
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("booking {}", booking_id)))?;

        if !ctx.identity.can_manage(unlocked.user_id) {
            return Err(CoreError::Forbidden(
                "booking belongs to another user".to_string(),
            ));
        }

        let flight = self
            .lock_flight(tx, unlocked.flight_id)
            .await?
            .ok_or_else(|| {
                CoreError::StorageError(format!(
                    "flight {} of booking {} is missing",
                    unlocked.flight_id, booking_id
                ))
            })?;

        let booking = tx
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("booking {}", booking_id)))?;

        if booking.status == BookingStatus::Cancelled {
            return Err(CoreError::Conflict(format!(
                "booking {} is already cancelled",
                booking_id
            )));
        }

        Ok((booking, flight))
    }

    /// Bounded wait for the flight lock.
    pub(crate) async fn lock_flight(
        &self,
        tx: &mut dyn StoreTransaction,
        flight_id: Uuid,
    ) -> CoreResult<Option<Flight>> {
        tokio::time::timeout(self.settings.lock_timeout, tx.lock_flight(flight_id))
            .await
            .map_err(|_| {
                CoreError::Timeout(format!("waiting for lock on flight {}", flight_id))
            })?
    }

    pub(crate) async fn lock_live_flight(
        &self,
        tx: &mut dyn StoreTransaction,
        flight_id: Uuid,
    ) -> CoreResult<Flight> {
        self.lock_flight(tx, flight_id)
            .await?
            .filter(|flight| !flight.is_deleted())
            .ok_or_else(|| CoreError::NotFound(format!("flight {}", flight_id)))
    }

    /// Only `Scheduled` flights take bookings.
    pub(crate) fn ensure_bookable(&self, flight: &Flight, now: DateTime<Utc>) -> CoreResult<()> {
        if flight.status(now, &self.status).is_bookable() {
            Ok(())
        } else {
            Err(CoreError::BookingWindowClosed {
                cutoff_minutes: self.pricing.booking_cutoff.num_minutes(),
            })
        }
    }

    pub(crate) async fn within_deadline<T>(
        &self,
        ctx: &OperationContext,
        operation: impl Future<Output = CoreResult<T>>,
    ) -> CoreResult<T> {
        match ctx.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, operation)
                .await
                .map_err(|_| CoreError::Timeout("operation deadline exceeded".to_string()))?,
            None => operation.await,
        }
    }

    /// Event delivery is best effort; the booking is already committed.
    /// The event carries the time the booking was last written under the lock.
    pub(crate) async fn publish(&self, kind: BookingEventKind, booking: &Booking, flight: &Flight) {
        let event = BookingEvent {
            kind,
            booking_id: booking.id,
            flight_id: flight.id,
            user_id: booking.user_id,
            travel_class: booking.travel_class,
            seat_count: booking.seat_count,
            available_seats: *flight.inventory.available_seats(),
            timestamp: booking.updated_at.timestamp(),
        };

        if let Err(e) = self.events.emit(&event).await {
            tracing::warn!("Failed to publish {:?} for booking {}: {}", kind, booking.id, e);
        }
    }
}

pub(crate) fn receipt(booking: &Booking) -> BookingReceipt {
    BookingReceipt {
        booking_id: booking.id,
        is_premium: booking.is_premium,
        total_price: booking.total_price,
        status: booking.status,
    }
}

/// Commit on `Ok`, rollback on `Err`. A transaction dropped before reaching
/// here (deadline expiry) rolls back on drop.
pub(crate) async fn finish<T>(tx: Box<dyn StoreTransaction>, result: CoreResult<T>) -> CoreResult<T> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!("Rollback failed after {}: {}", e, rollback_err);
            }
            Err(e)
        }
    }
}
