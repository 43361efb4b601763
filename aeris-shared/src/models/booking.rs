use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::class::TravelClass;

/// Only two states are ever observable: a booking is confirmed inside the same
/// transaction that reserves its seats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Confirmed" => Ok(BookingStatus::Confirmed),
            "Cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(format!("unknown booking status: {}", other)),
        }
    }
}

/// Personal details supplied for each seat of a booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravellerDetails {
    pub title: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(alias = "dob")]
    pub date_of_birth: NaiveDate,
    pub nationality: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Traveller {
    pub id: Uuid,
    pub booking_id: Uuid,
    #[serde(flatten)]
    pub details: TravellerDetails,
}

impl Traveller {
    pub fn new(booking_id: Uuid, details: TravellerDetails) -> Self {
        Self {
            id: Uuid::new_v4(),
            booking_id,
            details,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub flight_id: Uuid,
    pub travel_class: TravelClass,
    pub seat_count: i32,
    pub is_premium: bool,
    /// Minor currency units.
    pub total_price: i64,
    pub status: BookingStatus,
    pub booking_date: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub travellers: Vec<Traveller>,
}

impl Booking {
    pub fn is_confirmed(&self) -> bool {
        self.status == BookingStatus::Confirmed
    }

    /// A confirmed booking carries exactly one traveller per seat.
    pub fn travellers_match_seats(&self) -> bool {
        self.travellers.len() == self.seat_count as usize
    }

    /// Swap in a fresh traveller list, re-parented to this booking.
    pub fn replace_travellers(&mut self, details: Vec<TravellerDetails>) {
        self.travellers = details
            .into_iter()
            .map(|d| Traveller::new(self.id, d))
            .collect();
    }

    pub fn cancel(&mut self, at: DateTime<Utc>) {
        self.status = BookingStatus::Cancelled;
        self.cancelled_at = Some(at);
        self.updated_at = at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(first_name: &str) -> TravellerDetails {
        TravellerDetails {
            title: "Ms".to_string(),
            first_name: first_name.to_string(),
            last_name: "Lovelace".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 12, 10).unwrap(),
            nationality: "GB".to_string(),
        }
    }

    fn booking() -> Booking {
        let now = Utc::now();
        Booking {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            flight_id: Uuid::new_v4(),
            travel_class: TravelClass::Economy,
            seat_count: 2,
            is_premium: false,
            total_price: 20000,
            status: BookingStatus::Confirmed,
            booking_date: now,
            updated_at: now,
            cancelled_at: None,
            travellers: Vec::new(),
        }
    }

    #[test]
    fn test_replace_travellers_reparents() {
        let mut booking = booking();
        booking.replace_travellers(vec![details("Ada"), details("Grace")]);

        assert!(booking.travellers_match_seats());
        assert!(booking.travellers.iter().all(|t| t.booking_id == booking.id));
    }

    #[test]
    fn test_cancel_sets_lifecycle_fields() {
        let mut booking = booking();
        let at = Utc::now();
        booking.cancel(at);

        assert_eq!(booking.status, BookingStatus::Cancelled);
        assert_eq!(booking.cancelled_at, Some(at));
        assert!(!booking.is_confirmed());
    }

    #[test]
    fn test_traveller_accepts_dob_alias() {
        let json = r#"{
            "title": "Mr",
            "first_name": "Alan",
            "last_name": "Turing",
            "dob": "1912-06-23",
            "nationality": "GB"
        }"#;
        let parsed: TravellerDetails = serde_json::from_str(json).expect("Failed to deserialize");
        assert_eq!(parsed.date_of_birth, NaiveDate::from_ymd_opt(1912, 6, 23).unwrap());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("Cancelled".parse::<BookingStatus>().unwrap(), BookingStatus::Cancelled);
        assert!("PENDING".parse::<BookingStatus>().is_err());
    }
}
