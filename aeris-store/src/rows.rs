use aeris_catalog::{Flight, SeatInventory};
use aeris_core::{CoreError, CoreResult};
use aeris_shared::{Booking, BookingStatus, Masked, PerClass, TravelClass, Traveller, TravellerDetails, User};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::map_sqlx;

pub(crate) const FLIGHT_COLUMNS: &str = "id, origin, destination, departure_time, arrival_time, \
    economy_price, premium_economy_price, business_price, first_class_price, \
    economy_available, premium_economy_available, business_available, first_class_available, \
    economy_total, premium_economy_total, business_total, first_class_total, \
    created_at, updated_at, deleted_at";

pub(crate) const BOOKING_COLUMNS: &str = "id, user_id, flight_id, travel_class, seat_count, \
    is_premium, total_price, status, booking_date, updated_at, cancelled_at";

#[derive(sqlx::FromRow)]
pub(crate) struct FlightRow {
    id: Uuid,
    origin: String,
    destination: String,
    departure_time: DateTime<Utc>,
    arrival_time: DateTime<Utc>,
    economy_price: i64,
    premium_economy_price: i64,
    business_price: i64,
    first_class_price: i64,
    economy_available: i32,
    premium_economy_available: i32,
    business_available: i32,
    first_class_available: i32,
    economy_total: i32,
    premium_economy_total: i32,
    business_total: i32,
    first_class_total: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<FlightRow> for Flight {
    type Error = CoreError;

    fn try_from(row: FlightRow) -> Result<Self, Self::Error> {
        let inventory = SeatInventory::from_parts(
            PerClass::new(
                row.economy_available,
                row.premium_economy_available,
                row.business_available,
                row.first_class_available,
            ),
            PerClass::new(
                row.economy_total,
                row.premium_economy_total,
                row.business_total,
                row.first_class_total,
            ),
        )
        .map_err(|e| CoreError::StorageError(format!("flight {}: {}", row.id, e)))?;

        Ok(Flight {
            id: row.id,
            origin: row.origin,
            destination: row.destination,
            departure_time: row.departure_time,
            arrival_time: row.arrival_time,
            fares: PerClass::new(
                row.economy_price,
                row.premium_economy_price,
                row.business_price,
                row.first_class_price,
            ),
            inventory,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct BookingRow {
    id: Uuid,
    user_id: Uuid,
    flight_id: Uuid,
    travel_class: String,
    seat_count: i32,
    is_premium: bool,
    total_price: i64,
    status: String,
    booking_date: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    cancelled_at: Option<DateTime<Utc>>,
}

impl BookingRow {
    pub(crate) fn id(&self) -> Uuid {
        self.id
    }

    fn into_booking(self, travellers: Vec<Traveller>) -> CoreResult<Booking> {
        let travel_class = self
            .travel_class
            .parse::<TravelClass>()
            .map_err(|e| CoreError::StorageError(format!("booking {}: {}", self.id, e)))?;
        let status = self
            .status
            .parse::<BookingStatus>()
            .map_err(|e| CoreError::StorageError(format!("booking {}: {}", self.id, e)))?;

        Ok(Booking {
            id: self.id,
            user_id: self.user_id,
            flight_id: self.flight_id,
            travel_class,
            seat_count: self.seat_count,
            is_premium: self.is_premium,
            total_price: self.total_price,
            status,
            booking_date: self.booking_date,
            updated_at: self.updated_at,
            cancelled_at: self.cancelled_at,
            travellers,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct TravellerRow {
    id: Uuid,
    booking_id: Uuid,
    title: String,
    first_name: String,
    last_name: String,
    date_of_birth: NaiveDate,
    nationality: String,
}

impl From<TravellerRow> for Traveller {
    fn from(row: TravellerRow) -> Self {
        Traveller {
            id: row.id,
            booking_id: row.booking_id,
            details: TravellerDetails {
                title: row.title,
                first_name: row.first_name,
                last_name: row.last_name,
                date_of_birth: row.date_of_birth,
                nationality: row.nationality,
            },
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    display_name: String,
    is_admin: bool,
    created_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: Masked(row.email),
            password_hash: Masked(row.password_hash),
            display_name: row.display_name,
            is_admin: row.is_admin,
            created_at: row.created_at,
            deleted_at: row.deleted_at,
        }
    }
}

/// Attach traveller rows to their bookings, preserving the order of `rows`.
pub(crate) async fn load_bookings(
    conn: &mut PgConnection,
    rows: Vec<BookingRow>,
) -> CoreResult<Vec<Booking>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = rows.iter().map(BookingRow::id).collect();
    let travellers: Vec<TravellerRow> = sqlx::query_as(
        "SELECT id, booking_id, title, first_name, last_name, date_of_birth, nationality \
         FROM travellers WHERE booking_id = ANY($1) ORDER BY booking_id, position",
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await
    .map_err(map_sqlx)?;

    let mut by_booking: std::collections::HashMap<Uuid, Vec<Traveller>> =
        std::collections::HashMap::new();
    for row in travellers {
        by_booking.entry(row.booking_id).or_default().push(row.into());
    }

    rows.into_iter()
        .map(|row| {
            let travellers = by_booking.remove(&row.id).unwrap_or_default();
            row.into_booking(travellers)
        })
        .collect()
}

pub(crate) async fn fetch_booking(conn: &mut PgConnection, id: Uuid) -> CoreResult<Option<Booking>> {
    let row: Option<BookingRow> =
        sqlx::query_as(&format!("SELECT {} FROM bookings WHERE id = $1", BOOKING_COLUMNS))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(map_sqlx)?;

    match row {
        Some(row) => Ok(load_bookings(conn, vec![row]).await?.pop()),
        None => Ok(None),
    }
}

pub(crate) async fn insert_travellers(conn: &mut PgConnection, booking: &Booking) -> CoreResult<()> {
    for (position, traveller) in booking.travellers.iter().enumerate() {
        sqlx::query(
            "INSERT INTO travellers (id, booking_id, position, title, first_name, last_name, date_of_birth, nationality) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(traveller.id)
        .bind(booking.id)
        .bind(position as i32)
        .bind(&traveller.details.title)
        .bind(&traveller.details.first_name)
        .bind(&traveller.details.last_name)
        .bind(traveller.details.date_of_birth)
        .bind(&traveller.details.nationality)
        .execute(&mut *conn)
        .await
        .map_err(map_sqlx)?;
    }
    Ok(())
}
