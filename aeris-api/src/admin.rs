use aeris_catalog::{Flight, FlightUpdate, NewFlight};
use aeris_core::Identity;
use aeris_order::FlightDetails;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::WithRejection;
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: &'static str,
}

// ============================================================================
// Flight Management Handlers
// ============================================================================

/// Needs the admin auth layer.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/flights", post(create_flight))
        .route(
            "/admin/flights/{id}",
            get(get_flight).put(update_flight).delete(delete_flight),
        )
}

/// POST /api/admin/flights
async fn create_flight(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    WithRejection(Json(req), _): WithRejection<Json<NewFlight>, AppError>,
) -> Result<(StatusCode, Json<Flight>), AppError> {
    let flight = state.flight_admin.create_flight(&identity, req).await?;
    Ok((StatusCode::CREATED, Json(flight)))
}

/// GET /api/admin/flights/{id}
async fn get_flight(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    WithRejection(Path(flight_id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<Json<FlightDetails>, AppError> {
    let details = state.flight_admin.get_flight_details(&identity, flight_id).await?;
    Ok(Json(details))
}

/// PUT /api/admin/flights/{id}
async fn update_flight(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    WithRejection(Path(flight_id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(req), _): WithRejection<Json<FlightUpdate>, AppError>,
) -> Result<Json<Flight>, AppError> {
    let flight = state.flight_admin.update_flight(&identity, flight_id, req).await?;
    Ok(Json(flight))
}

/// DELETE /api/admin/flights/{id}
async fn delete_flight(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    WithRejection(Path(flight_id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<Json<MessageResponse>, AppError> {
    state.flight_admin.delete_flight(&identity, flight_id).await?;
    Ok(Json(MessageResponse {
        message: "Flight deleted successfully",
    }))
}
