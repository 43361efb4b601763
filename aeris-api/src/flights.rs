use aeris_core::repository::FlightRepository;
use aeris_core::search::{display_class, FlightQuery, FlightSearchQuery, FlightSummary, Locations, Page};
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use axum_extra::extract::WithRejection;

use crate::error::AppError;
use crate::state::AppState;
use crate::stream::flight_stream;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/flights", get(search_flights))
        .route("/flights/{id}/stream", get(flight_stream))
        .route("/locations", get(list_locations))
}

/// GET /api/flights
async fn search_flights(
    State(state): State<AppState>,
    WithRejection(Query(params), _): WithRejection<Query<FlightSearchQuery>, AppError>,
) -> Result<Json<Page<FlightSummary>>, AppError> {
    let now = state.clock.now();
    let status_policy = state.business_rules.status_policy();

    let class = display_class(params.travel_class.as_deref())?;
    let query = FlightQuery::from_request(&params, now, &status_policy)?;

    let page = state.flights.search_flights(&query).await?;
    tracing::debug!("Flight search matched {} flights", page.meta.total);

    Ok(Json(page.map(|flight| {
        FlightSummary::from_flight(&flight, class, now, &status_policy)
    })))
}

/// GET /api/locations
async fn list_locations(State(state): State<AppState>) -> Result<Json<Locations>, AppError> {
    Ok(Json(state.flights.list_locations().await?))
}
