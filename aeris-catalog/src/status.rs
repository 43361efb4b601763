use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Real-time lifecycle of a flight. Derived from the schedule on every read,
/// never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlightStatus {
    Scheduled,
    DepartingSoon,
    InAir,
    Landed,
}

impl FlightStatus {
    /// Only flights that have not entered the departure phase take bookings.
    pub fn is_bookable(&self) -> bool {
        matches!(self, FlightStatus::Scheduled)
    }

    pub fn label(&self) -> &'static str {
        match self {
            FlightStatus::Scheduled => "Scheduled",
            FlightStatus::DepartingSoon => "Departing Soon",
            FlightStatus::InAir => "In Air",
            FlightStatus::Landed => "Landed",
        }
    }
}

impl fmt::Display for FlightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FlightStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "scheduled" => Ok(FlightStatus::Scheduled),
            "departingsoon" => Ok(FlightStatus::DepartingSoon),
            "inair" => Ok(FlightStatus::InAir),
            "landed" => Ok(FlightStatus::Landed),
            _ => Err(format!("unknown flight status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusPolicy {
    pub departing_soon: Duration,
}

impl Default for StatusPolicy {
    fn default() -> Self {
        Self {
            departing_soon: Duration::minutes(10),
        }
    }
}

impl StatusPolicy {
    pub fn project(
        &self,
        departure_time: DateTime<Utc>,
        arrival_time: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> FlightStatus {
        if now >= arrival_time {
            FlightStatus::Landed
        } else if now >= departure_time {
            FlightStatus::InAir
        } else if departure_time - now <= self.departing_soon {
            FlightStatus::DepartingSoon
        } else {
            FlightStatus::Scheduled
        }
    }
}
