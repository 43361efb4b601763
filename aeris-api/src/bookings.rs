use aeris_core::repository::BookingRepository;
use aeris_core::search::{Page, PageRequest};
use aeris_core::Identity;
use aeris_order::{AmendBooking, BookingReceipt, CreateBooking};
use aeris_shared::Booking;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Extension, Json, Router,
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListBookingsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: &'static str,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bookings", get(list_bookings).post(create_booking))
        .route("/bookings/{id}", put(amend_booking).delete(cancel_booking))
}

/// POST /api/bookings
async fn create_booking(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    WithRejection(Json(req), _): WithRejection<Json<CreateBooking>, AppError>,
) -> Result<(StatusCode, Json<BookingReceipt>), AppError> {
    let receipt = state.engine.create_booking(identity, req).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// GET /api/bookings
async fn list_bookings(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    WithRejection(Query(params), _): WithRejection<Query<ListBookingsQuery>, AppError>,
) -> Result<Json<Page<Booking>>, AppError> {
    let page = PageRequest::new(params.page, params.limit);
    let bookings = state
        .bookings
        .list_bookings_for_user(identity.user_id, page)
        .await?;
    Ok(Json(bookings))
}

/// PUT /api/bookings/{id}
async fn amend_booking(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    WithRejection(Path(booking_id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(req), _): WithRejection<Json<AmendBooking>, AppError>,
) -> Result<Json<BookingReceipt>, AppError> {
    let receipt = state.engine.amend_booking(identity, booking_id, req).await?;
    Ok(Json(receipt))
}

/// DELETE /api/bookings/{id}
async fn cancel_booking(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    WithRejection(Path(booking_id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<Json<MessageResponse>, AppError> {
    state.engine.cancel_booking(identity, booking_id).await?;
    Ok(Json(MessageResponse {
        message: "Booking cancelled successfully",
    }))
}
