use aeris_core::repository::FlightRepository;
use aeris_core::{CoreError, CoreResult, EventSink};
use aeris_shared::{BookingEvent, BookingEventKind, PerClass, TravelClass};
use async_trait::async_trait;
use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use axum_extra::extract::WithRejection;
use futures_util::stream::{Stream, StreamExt};
use serde::Serialize;
use std::convert::Infallible;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

/// Fans committed booking events out to SSE subscribers.
pub struct BroadcastSink {
    tx: broadcast::Sender<BookingEvent>,
}

impl BroadcastSink {
    pub fn new(tx: broadcast::Sender<BookingEvent>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl EventSink for BroadcastSink {
    async fn emit(&self, event: &BookingEvent) -> CoreResult<()> {
        // No subscribers is not an error.
        let _ = self.tx.send(event.clone());
        Ok(())
    }
}

/// What a stream subscriber sees. Booking and user ids stay private.
#[derive(Debug, Serialize)]
struct AvailabilityUpdate {
    flight_id: Uuid,
    change: BookingEventKind,
    travel_class: TravelClass,
    seat_count: i32,
    available_seats: PerClass<i32>,
    timestamp: i64,
}

impl From<&BookingEvent> for AvailabilityUpdate {
    fn from(event: &BookingEvent) -> Self {
        Self {
            flight_id: event.flight_id,
            change: event.kind,
            travel_class: event.travel_class,
            seat_count: event.seat_count,
            available_seats: event.available_seats,
            timestamp: event.timestamp,
        }
    }
}

/// GET /api/flights/{id}/stream
pub async fn flight_stream(
    State(state): State<AppState>,
    WithRejection(Path(flight_id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    state
        .flights
        .get_flight(flight_id)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("flight {}", flight_id)))?;

    let rx = state.sse_tx.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(move |result| async move {
        match result {
            Ok(event) if event.flight_id == flight_id => {
                match Event::default()
                    .event("availability")
                    .json_data(AvailabilityUpdate::from(&event))
                {
                    Ok(sse) => Some(Ok(sse)),
                    Err(e) => {
                        tracing::warn!("Dropping unencodable event for flight {}: {}", flight_id, e);
                        None
                    }
                }
            }
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("SSE subscriber for flight {} fell behind: {}", flight_id, e);
                None
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
