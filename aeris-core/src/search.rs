use aeris_catalog::{Flight, FlightStatus, StatusPolicy};
use aeris_shared::TravelClass;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CoreError, CoreResult};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// Raw search parameters as they arrive on the query string.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct FlightSearchQuery {
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub status: Option<String>,
    pub departure_date: Option<String>,
    pub travel_class: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
    #[serde(default)]
    pub all_flights: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// Non-positive values fall back to the defaults; the limit is capped.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        let page = page.filter(|p| *p > 0).unwrap_or(DEFAULT_PAGE);
        let limit = limit
            .filter(|l| *l > 0)
            .unwrap_or(DEFAULT_LIMIT)
            .min(MAX_LIMIT);
        Self { page, limit }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PageMeta {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, total: i64, request: PageRequest) -> Self {
        Self {
            data,
            meta: PageMeta {
                total,
                page: request.page,
                limit: request.limit,
                offset: request.offset(),
            },
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }
}

/// Validated search, pinned to the instant it was issued so that status
/// filtering and the "upcoming only" cut agree with each other.
#[derive(Debug, Clone)]
pub struct FlightQuery {
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub status: Option<FlightStatus>,
    pub departure_date: Option<NaiveDate>,
    /// When false, only flights that have not departed yet are returned.
    pub all_flights: bool,
    /// Unpaginated when `None`.
    pub page: Option<PageRequest>,
    pub as_of: DateTime<Utc>,
    pub departing_soon: Duration,
}

impl FlightQuery {
    pub fn from_request(
        request: &FlightSearchQuery,
        as_of: DateTime<Utc>,
        status_policy: &StatusPolicy,
    ) -> CoreResult<Self> {
        let status = match non_blank(&request.status) {
            Some(raw) => Some(raw.parse::<FlightStatus>().map_err(CoreError::ValidationError)?),
            None => None,
        };

        let departure_date = match non_blank(&request.departure_date) {
            Some(raw) => Some(NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| {
                CoreError::ValidationError(
                    "Invalid departure_date format. Expected YYYY-MM-DD.".to_string(),
                )
            })?),
            None => None,
        };

        let page = if request.all_flights {
            None
        } else {
            Some(PageRequest::new(request.page, request.limit))
        };

        Ok(Self {
            origin: non_blank(&request.origin),
            destination: non_blank(&request.destination),
            status,
            departure_date,
            all_flights: request.all_flights,
            page,
            as_of,
            departing_soon: status_policy.departing_soon,
        })
    }

    pub fn status_policy(&self) -> StatusPolicy {
        StatusPolicy {
            departing_soon: self.departing_soon,
        }
    }

    /// Filter predicate; storage backends that cannot push it down evaluate
    /// it row by row.
    pub fn matches(&self, flight: &Flight) -> bool {
        if flight.is_deleted() {
            return false;
        }
        if let Some(origin) = &self.origin {
            if !contains_ignore_case(&flight.origin, origin) {
                return false;
            }
        }
        if let Some(destination) = &self.destination {
            if !contains_ignore_case(&flight.destination, destination) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if flight.status(self.as_of, &self.status_policy()) != status {
                return false;
            }
        }
        if let Some(date) = self.departure_date {
            if flight.departure_time.date_naive() != date {
                return false;
            }
        }
        if !self.all_flights && flight.departure_time <= self.as_of {
            return false;
        }
        true
    }

    /// Page echoed back in responses. Unpaginated searches report everything
    /// as a single page.
    pub fn page_or_all(&self, total: i64) -> PageRequest {
        self.page.unwrap_or(PageRequest {
            page: 1,
            limit: total.max(1),
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Flight as shown in search results: display price for the requested class
/// and the live status.
#[derive(Debug, Clone, Serialize)]
pub struct FlightSummary {
    pub id: Uuid,
    pub origin: String,
    pub destination: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub travel_class: TravelClass,
    pub price: i64,
    pub available_seats: i32,
    pub status: FlightStatus,
    pub status_label: &'static str,
}

impl FlightSummary {
    pub fn from_flight(
        flight: &Flight,
        class: TravelClass,
        now: DateTime<Utc>,
        policy: &StatusPolicy,
    ) -> Self {
        let status = flight.status(now, policy);
        Self {
            id: flight.id,
            origin: flight.origin.clone(),
            destination: flight.destination.clone(),
            departure_time: flight.departure_time,
            arrival_time: flight.arrival_time,
            travel_class: class,
            price: flight.fare(class),
            available_seats: flight.inventory.total_available(),
            status,
            status_label: status.label(),
        }
    }
}

/// Display class requested by a search; Economy when absent.
pub fn display_class(raw: Option<&str>) -> CoreResult<TravelClass> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        Some(raw) => Ok(raw.parse::<TravelClass>()?),
        None => Ok(TravelClass::Economy),
    }
}

/// Distinct places that appear on live flights.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Locations {
    pub origins: Vec<String>,
    pub destinations: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use aeris_catalog::NewFlight;
    use aeris_shared::PerClass;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn flight(origin: &str, destination: &str, departs_in: Duration) -> Flight {
        let departure = now() + departs_in;
        NewFlight {
            origin: origin.to_string(),
            destination: destination.to_string(),
            departure_time: departure,
            arrival_time: departure + Duration::hours(2),
            fares: PerClass::new(10000, 20000, 40000, 80000),
            seats: PerClass::new(10, 5, 2, 1),
        }
        .into_flight(Uuid::new_v4(), now())
        .unwrap()
    }

    fn query(request: FlightSearchQuery) -> FlightQuery {
        FlightQuery::from_request(&request, now(), &StatusPolicy::default()).unwrap()
    }

    #[test]
    fn test_search_query_deserialization() {
        let json = r#"{"origin": "lon", "page": 2, "limit": 5, "all_flights": true}"#;
        let request: FlightSearchQuery = serde_json::from_str(json).expect("Failed to deserialize");
        assert_eq!(request.origin.as_deref(), Some("lon"));
        assert!(request.all_flights);
    }

    #[test]
    fn test_page_request_defaults_and_offset() {
        let page = PageRequest::new(None, None);
        assert_eq!((page.page, page.limit, page.offset()), (1, 10, 0));

        let page = PageRequest::new(Some(3), Some(20));
        assert_eq!(page.offset(), 40);

        let page = PageRequest::new(Some(0), Some(1000));
        assert_eq!((page.page, page.limit), (1, MAX_LIMIT));
    }

    #[test]
    fn test_route_filter_is_case_insensitive_substring() {
        let q = query(FlightSearchQuery {
            origin: Some("LON".to_string()),
            destination: Some("york".to_string()),
            ..Default::default()
        });
        assert!(q.matches(&flight("London", "New York", Duration::hours(5))));
        assert!(!q.matches(&flight("Paris", "New York", Duration::hours(5))));
    }

    #[test]
    fn test_status_filter_uses_projection() {
        let soon = query(FlightSearchQuery {
            status: Some("Departing Soon".to_string()),
            ..Default::default()
        });
        assert!(soon.matches(&flight("London", "Paris", Duration::minutes(5))));
        assert!(!soon.matches(&flight("London", "Paris", Duration::hours(5))));

        let in_air = query(FlightSearchQuery {
            status: Some("IN_AIR".to_string()),
            all_flights: true,
            ..Default::default()
        });
        assert!(in_air.matches(&flight("London", "Paris", Duration::minutes(-30))));
    }

    #[test]
    fn test_departed_flights_hidden_unless_all_flights() {
        let departed = flight("London", "Paris", Duration::hours(-1));
        assert!(!query(FlightSearchQuery::default()).matches(&departed));

        let all = query(FlightSearchQuery {
            all_flights: true,
            ..Default::default()
        });
        assert!(all.matches(&departed));
        assert!(all.page.is_none());
    }

    #[test]
    fn test_invalid_filters_rejected() {
        let bad_date = FlightSearchQuery {
            departure_date: Some("01/06/2025".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            FlightQuery::from_request(&bad_date, now(), &StatusPolicy::default()),
            Err(CoreError::ValidationError(_))
        ));

        let bad_status = FlightSearchQuery {
            status: Some("Boarding".to_string()),
            ..Default::default()
        };
        assert!(FlightQuery::from_request(&bad_status, now(), &StatusPolicy::default()).is_err());
    }

    #[test]
    fn test_departure_date_filter() {
        let q = query(FlightSearchQuery {
            departure_date: Some("2025-06-02".to_string()),
            ..Default::default()
        });
        assert!(q.matches(&flight("London", "Paris", Duration::hours(24))));
        assert!(!q.matches(&flight("London", "Paris", Duration::hours(2))));
    }

    #[test]
    fn test_summary_uses_requested_class_price() {
        let flight = flight("London", "Paris", Duration::hours(5));
        let class = display_class(Some("Business")).unwrap();
        let summary = FlightSummary::from_flight(&flight, class, now(), &StatusPolicy::default());

        assert_eq!(summary.price, 40000);
        assert_eq!(summary.available_seats, 18);
        assert_eq!(summary.status, FlightStatus::Scheduled);
        assert_eq!(display_class(None).unwrap(), TravelClass::Economy);
        assert!(matches!(display_class(Some("Cargo")), Err(CoreError::InvalidTravelClass(_))));
    }
}
