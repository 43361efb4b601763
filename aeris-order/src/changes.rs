use aeris_catalog::{Flight, InventoryError};
use aeris_core::repository::StoreTransaction;
use aeris_core::{CoreError, CoreResult};
use aeris_shared::{Booking, BookingEventKind, TravelClass};
use uuid::Uuid;

use crate::engine::{finish, receipt, BookingEngine};
use crate::models::{AmendBooking, BookingReceipt, OperationContext};
use crate::validation::{validate_seat_count, validate_travellers};

impl BookingEngine {
    /// Move a confirmed booking to a new class and/or seat count.
    ///
    /// The old allocation is released before the new one is reserved, so a
    /// booking may grow into its own seats. If the new allocation does not
    /// fit, nothing changes and the caller gets `Conflict`. The price is
    /// recomputed from the current time to departure.
    pub async fn amend_booking(
        &self,
        ctx: impl Into<OperationContext>,
        booking_id: Uuid,
        request: AmendBooking,
    ) -> CoreResult<BookingReceipt> {
        let ctx = ctx.into();

        let class: TravelClass = request.travel_class.parse()?;
        validate_seat_count(request.seat_count, self.settings.max_seats_per_booking)?;
        if let Some(travellers) = &request.travellers {
            validate_travellers(travellers, request.seat_count, self.clock.now().date_naive())?;
        }

        let work = async {
            let mut tx = self.store.begin().await?;
            let result = self
                .amend_in_tx(tx.as_mut(), &ctx, booking_id, class, request)
                .await;
            finish(tx, result).await
        };
        let (booking, flight) = self.within_deadline(&ctx, work).await?;

        tracing::info!(
            "Booking {} amended: now {} x {} on flight {} for {}",
            booking.id,
            booking.seat_count,
            booking.travel_class,
            booking.flight_id,
            booking.total_price
        );
        self.publish(BookingEventKind::Amended, &booking, &flight).await;

        Ok(receipt(&booking))
    }

    async fn amend_in_tx(
        &self,
        tx: &mut dyn StoreTransaction,
        ctx: &OperationContext,
        booking_id: Uuid,
        class: TravelClass,
        request: AmendBooking,
    ) -> CoreResult<(Booking, Flight)> {
        let (mut booking, mut flight) = self.lock_booking(tx, ctx, booking_id).await?;
        let now = self.clock.now();

        if request.travellers.is_none() && request.seat_count != booking.seat_count {
            return Err(CoreError::ValidationError(
                "a new traveller list is required when the seat count changes".to_string(),
            ));
        }
        if flight.is_deleted() {
            return Err(CoreError::NotFound(format!("flight {}", flight.id)));
        }

        flight.inventory.release(booking.travel_class, booking.seat_count)?;
        flight
            .inventory
            .reserve(class, request.seat_count)
            .map_err(|e| match e {
                InventoryError::InsufficientSeats { .. } => {
                    CoreError::Conflict(format!("could not amend booking {}: {}", booking_id, e))
                }
                other => other.into(),
            })?;

        self.ensure_bookable(&flight, now)?;
        let quote = self.pricing.quote_for(&flight, class, request.seat_count, now)?;

        flight.updated_at = now;
        tx.save_flight(&flight).await?;

        booking.travel_class = class;
        booking.seat_count = request.seat_count;
        booking.is_premium = quote.is_premium;
        booking.total_price = quote.total_price;
        booking.updated_at = now;

        let replace_travellers = match request.travellers {
            Some(travellers) => {
                booking.replace_travellers(travellers);
                true
            }
            None => false,
        };
        tx.update_booking(&booking, replace_travellers).await?;

        Ok((booking, flight))
    }
}
