use aeris_shared::{PerClass, TravelClass};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::inventory::{InventoryError, SeatInventory};
use crate::status::{FlightStatus, StatusPolicy};

const MIN_LOCATION_LEN: usize = 3;

/// A published flight with its per-class fares and seat inventory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flight {
    pub id: Uuid,
    pub origin: String,
    pub destination: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    /// Per-seat fare in minor currency units.
    pub fares: PerClass<i64>,
    #[serde(flatten)]
    pub inventory: SeatInventory,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Flight {
    pub fn fare(&self, class: TravelClass) -> i64 {
        *self.fares.get(class)
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn status(&self, now: DateTime<Utc>, policy: &StatusPolicy) -> FlightStatus {
        policy.project(self.departure_time, self.arrival_time, now)
    }

    /// Apply schedule/fare edits. Capacity is fixed at publication and is
    /// not touched here.
    pub fn apply_update(&mut self, update: FlightUpdate, now: DateTime<Utc>) -> Result<(), FlightError> {
        let origin = update.origin.unwrap_or_else(|| self.origin.clone());
        let destination = update.destination.unwrap_or_else(|| self.destination.clone());
        let departure_time = update.departure_time.unwrap_or(self.departure_time);
        let arrival_time = update.arrival_time.unwrap_or(self.arrival_time);
        let fares = update.fares.unwrap_or(self.fares);

        validate_route(&origin, &destination)?;
        validate_schedule(departure_time, arrival_time)?;
        validate_fares(&fares)?;

        self.origin = origin.trim().to_string();
        self.destination = destination.trim().to_string();
        self.departure_time = departure_time;
        self.arrival_time = arrival_time;
        self.fares = fares;
        self.updated_at = now;
        Ok(())
    }
}

/// Admin input for publishing a flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFlight {
    pub origin: String,
    pub destination: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub fares: PerClass<i64>,
    /// Seats per class; becomes both the capacity and the initial availability.
    pub seats: PerClass<i32>,
}

impl NewFlight {
    pub fn validate(&self) -> Result<(), FlightError> {
        validate_route(&self.origin, &self.destination)?;
        validate_schedule(self.departure_time, self.arrival_time)?;
        validate_fares(&self.fares)?;
        SeatInventory::with_capacity(self.seats)?;
        Ok(())
    }

    pub fn into_flight(self, id: Uuid, now: DateTime<Utc>) -> Result<Flight, FlightError> {
        self.validate()?;
        let inventory = SeatInventory::with_capacity(self.seats)?;

        Ok(Flight {
            id,
            origin: self.origin.trim().to_string(),
            destination: self.destination.trim().to_string(),
            departure_time: self.departure_time,
            arrival_time: self.arrival_time,
            fares: self.fares,
            inventory,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        })
    }
}

/// Partial edit of a flight. Absent fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlightUpdate {
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub departure_time: Option<DateTime<Utc>>,
    pub arrival_time: Option<DateTime<Utc>>,
    pub fares: Option<PerClass<i64>>,
}

fn validate_route(origin: &str, destination: &str) -> Result<(), FlightError> {
    let origin = origin.trim();
    let destination = destination.trim();

    if origin.chars().count() < MIN_LOCATION_LEN || destination.chars().count() < MIN_LOCATION_LEN {
        return Err(FlightError::InvalidRoute(format!(
            "origin and destination must be at least {} characters",
            MIN_LOCATION_LEN
        )));
    }
    if origin.eq_ignore_ascii_case(destination) {
        return Err(FlightError::InvalidRoute(
            "origin and destination must differ".to_string(),
        ));
    }
    Ok(())
}

fn validate_schedule(departure: DateTime<Utc>, arrival: DateTime<Utc>) -> Result<(), FlightError> {
    if arrival <= departure {
        return Err(FlightError::InvalidSchedule);
    }
    Ok(())
}

fn validate_fares(fares: &PerClass<i64>) -> Result<(), FlightError> {
    for (class, fare) in fares.iter() {
        if *fare < 0 {
            return Err(FlightError::NegativeFare(class));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlightError {
    #[error("Invalid route: {0}")]
    InvalidRoute(String),

    #[error("Arrival time must be after departure time")]
    InvalidSchedule,

    #[error("Fare for {0} cannot be negative")]
    NegativeFare(TravelClass),

    #[error(transparent)]
    Inventory(#[from] InventoryError),
}
