use aeris_catalog::{Flight, FlightStatus};
use aeris_core::repository::FlightRepository;
use aeris_core::search::{FlightQuery, Locations, Page};
use aeris_core::CoreResult;
use async_trait::async_trait;
use chrono::{Duration, NaiveTime};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::database::PgStore;
use crate::error::map_sqlx;
use crate::rows::{FlightRow, FLIGHT_COLUMNS};

#[async_trait]
impl FlightRepository for PgStore {
    async fn insert_flight(&self, flight: &Flight) -> CoreResult<()> {
        let available = flight.inventory.available_seats();
        let total = flight.inventory.total_seats();

        sqlx::query(&format!(
            "INSERT INTO flights ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)",
            FLIGHT_COLUMNS
        ))
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
        .bind(total.economy)
        .bind(total.premium_economy)
        .bind(total.business)
        .bind(total.first_class)
        .bind(flight.created_at)
        .bind(flight.updated_at)
        .bind(flight.deleted_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(())
    }

    async fn get_flight(&self, id: Uuid) -> CoreResult<Option<Flight>> {
        let row: Option<FlightRow> = sqlx::query_as(&format!(
            "SELECT {} FROM flights WHERE id = $1 AND deleted_at IS NULL",
            FLIGHT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        row.map(Flight::try_from).transpose()
    }

    async fn search_flights(&self, query: &FlightQuery) -> CoreResult<Page<Flight>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM flights");
        push_filters(&mut count, query);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx)?;

        let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM flights", FLIGHT_COLUMNS));
        push_filters(&mut select, query);
        select.push(" ORDER BY created_at DESC, id DESC");
        if let Some(page) = query.page {
            select.push(" LIMIT ").push_bind(page.limit);
            select.push(" OFFSET ").push_bind(page.offset());
        }

        let rows: Vec<FlightRow> = select
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
        let flights = rows
            .into_iter()
            .map(Flight::try_from)
            .collect::<CoreResult<Vec<_>>>()?;

        Ok(Page::new(flights, total, query.page_or_all(total)))
    }

    async fn list_locations(&self) -> CoreResult<Locations> {
        let origins: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT origin FROM flights WHERE deleted_at IS NULL ORDER BY origin",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        let destinations: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT destination FROM flights WHERE deleted_at IS NULL ORDER BY destination",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(Locations {
            origins,
            destinations,
        })
    }
}

/// SQL rendition of `FlightQuery::matches`.
fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &FlightQuery) {
    let now = query.as_of;
    let soon = now + query.departing_soon;

    builder.push(" WHERE deleted_at IS NULL");

    if let Some(origin) = &query.origin {
        builder
            .push(" AND origin ILIKE ")
            .push_bind(format!("%{}%", escape_like(origin)));
    }
    if let Some(destination) = &query.destination {
        builder
            .push(" AND destination ILIKE ")
            .push_bind(format!("%{}%", escape_like(destination)));
    }

    match query.status {
        Some(FlightStatus::Scheduled) => {
            builder.push(" AND departure_time > ").push_bind(soon);
        }
        Some(FlightStatus::DepartingSoon) => {
            builder.push(" AND departure_time > ").push_bind(now);
            builder.push(" AND departure_time <= ").push_bind(soon);
        }
        Some(FlightStatus::InAir) => {
            builder.push(" AND departure_time <= ").push_bind(now);
            builder.push(" AND arrival_time > ").push_bind(now);
        }
        Some(FlightStatus::Landed) => {
            builder.push(" AND arrival_time <= ").push_bind(now);
        }
        None => {}
    }

    if let Some(date) = query.departure_date {
        let start = date.and_time(NaiveTime::MIN).and_utc();
        builder.push(" AND departure_time >= ").push_bind(start);
        builder.push(" AND departure_time < ").push_bind(start + Duration::days(1));
    }

    if !query.all_flights {
        builder.push(" AND departure_time > ").push_bind(now);
    }
}

fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
