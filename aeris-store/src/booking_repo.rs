use aeris_core::repository::BookingRepository;
use aeris_core::search::{Page, PageRequest};
use aeris_core::CoreResult;
use aeris_shared::Booking;
use async_trait::async_trait;
use uuid::Uuid;

use crate::database::PgStore;
use crate::error::map_sqlx;
use crate::rows::{fetch_booking, load_bookings, BookingRow, BOOKING_COLUMNS};

#[async_trait]
impl BookingRepository for PgStore {
    async fn get_booking(&self, id: Uuid) -> CoreResult<Option<Booking>> {
        let mut conn = self.pool.acquire().await.map_err(map_sqlx)?;
        fetch_booking(&mut conn, id).await
    }

    async fn list_bookings_for_user(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> CoreResult<Page<Booking>> {
        let mut conn = self.pool.acquire().await.map_err(map_sqlx)?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&mut *conn)
            .await
            .map_err(map_sqlx)?;

        let rows: Vec<BookingRow> = sqlx::query_as(&format!(
            "SELECT {} FROM bookings WHERE user_id = $1 ORDER BY booking_date DESC, id DESC LIMIT $2 OFFSET $3",
            BOOKING_COLUMNS
        ))
        .bind(user_id)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&mut *conn)
        .await
        .map_err(map_sqlx)?;

        let bookings = load_bookings(&mut conn, rows).await?;
        Ok(Page::new(bookings, total, page))
    }
}
