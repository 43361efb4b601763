use aeris_catalog::Flight;
use aeris_core::repository::{StoreTransaction, TransactionalStore};
use aeris_core::CoreResult;
use aeris_shared::{Booking, BookingStatus};
use async_trait::async_trait;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::database::PgStore;
use crate::error::map_sqlx;
use crate::rows::{fetch_booking, insert_travellers, FlightRow, BOOKING_COLUMNS, FLIGHT_COLUMNS};

#[async_trait]
impl TransactionalStore for PgStore {
    async fn begin(&self) -> CoreResult<Box<dyn StoreTransaction>> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        // Server-side bound on row lock waits; surfaces as SQLSTATE 55P03.
        sqlx::query(&format!(
            "SET LOCAL lock_timeout = '{}ms'",
            self.lock_timeout.as_millis()
        ))
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx)?;

        Ok(Box::new(PgTransaction { tx }))
    }
}

/// Rolled back by sqlx when dropped uncommitted.
pub struct PgTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTransaction for PgTransaction {
    async fn lock_flight(&mut self, flight_id: Uuid) -> CoreResult<Option<Flight>> {
        let row: Option<FlightRow> = sqlx::query_as(&format!(
            "SELECT {} FROM flights WHERE id = $1 FOR UPDATE",
            FLIGHT_COLUMNS
        ))
        .bind(flight_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;

        row.map(Flight::try_from).transpose()
    }

    async fn save_flight(&mut self, flight: &Flight) -> CoreResult<()> {
        let available = flight.inventory.available_seats();

        sqlx::query(
            "UPDATE flights SET origin = $2, destination = $3, departure_time = $4, arrival_time = $5, \
             economy_price = $6, premium_economy_price = $7, business_price = $8, first_class_price = $9, \
             economy_available = $10, premium_economy_available = $11, business_available = $12, \
             first_class_available = $13, updated_at = $14, deleted_at = $15 \
             WHERE id = $1",
        )
        .bind(flight.id)
        .bind(&flight.origin)
        .bind(&flight.destination)
        .bind(flight.departure_time)
        .bind(flight.arrival_time)
        .bind(flight.fares.economy)
        .bind(flight.fares.premium_economy)
        .bind(flight.fares.business)
        .bind(flight.fares.first_class)
        .bind(available.economy)
        .bind(available.premium_economy)
        .bind(available.business)
        .bind(available.first_class)
        .bind(flight.updated_at)
        .bind(flight.deleted_at)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;

        Ok(())
    }

    async fn get_booking(&mut self, booking_id: Uuid) -> CoreResult<Option<Booking>> {
        fetch_booking(&mut self.tx, booking_id).await
    }

    async fn insert_booking(&mut self, booking: &Booking) -> CoreResult<()> {
        sqlx::query(&format!(
            "INSERT INTO bookings ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
            BOOKING_COLUMNS
        ))
        .bind(booking.id)
        .bind(booking.user_id)
        .bind(booking.flight_id)
        .bind(booking.travel_class.as_str())
        .bind(booking.seat_count)
        .bind(booking.is_premium)
        .bind(booking.total_price)
        .bind(booking.status.as_str())
        .bind(booking.booking_date)
        .bind(booking.updated_at)
        .bind(booking.cancelled_at)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;

        insert_travellers(&mut self.tx, booking).await
    }

    async fn update_booking(&mut self, booking: &Booking, replace_travellers: bool) -> CoreResult<()> {
        sqlx::query(
            "UPDATE bookings SET travel_class = $2, seat_count = $3, is_premium = $4, total_price = $5, \
             status = $6, updated_at = $7, cancelled_at = $8 WHERE id = $1",
        )
        .bind(booking.id)
        .bind(booking.travel_class.as_str())
        .bind(booking.seat_count)
        .bind(booking.is_premium)
        .bind(booking.total_price)
        .bind(booking.status.as_str())
        .bind(booking.updated_at)
        .bind(booking.cancelled_at)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;

        if replace_travellers {
            sqlx::query("DELETE FROM travellers WHERE booking_id = $1")
                .bind(booking.id)
                .execute(&mut *self.tx)
                .await
                .map_err(map_sqlx)?;
            insert_travellers(&mut self.tx, booking).await?;
        }

        Ok(())
    }

    async fn count_confirmed_bookings(&mut self, flight_id: Uuid) -> CoreResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE flight_id = $1 AND status = $2")
            .bind(flight_id)
            .bind(BookingStatus::Confirmed.as_str())
            .fetch_one(&mut *self.tx)
            .await
            .map_err(map_sqlx)
    }

    async fn commit(self: Box<Self>) -> CoreResult<()> {
        self.tx.commit().await.map_err(map_sqlx)
    }

    async fn rollback(self: Box<Self>) -> CoreResult<()> {
        self.tx.rollback().await.map_err(map_sqlx)
    }
}
