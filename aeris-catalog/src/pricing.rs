use aeris_shared::TravelClass;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::flight::Flight;

/// Result of pricing a seat allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub base_price_per_seat: i64,
    pub seat_count: i32,
    pub is_premium: bool,
    /// Minor currency units.
    pub total_price: i64,
}

/// Time-to-departure pricing.
///
/// Bookings closer than `booking_cutoff` to departure are refused; bookings
/// inside `surcharge_window` (but outside the cutoff) pay `surcharge_percent`
/// on top of the fare. Pure: the caller supplies the clock reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingPolicy {
    pub booking_cutoff: Duration,
    pub surcharge_window: Duration,
    pub surcharge_percent: i64,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            booking_cutoff: Duration::minutes(15),
            surcharge_window: Duration::minutes(60),
            surcharge_percent: 30,
        }
    }
}

impl PricingPolicy {
    pub fn quote(
        &self,
        base_price_per_seat: i64,
        seat_count: i32,
        time_until_departure: Duration,
    ) -> Result<Quote, PricingError> {
        if seat_count <= 0 {
            return Err(PricingError::InvalidSeatCount(seat_count));
        }
        if base_price_per_seat < 0 {
            return Err(PricingError::NegativeFare(base_price_per_seat));
        }
        if time_until_departure < self.booking_cutoff {
            return Err(PricingError::BookingWindowClosed {
                cutoff_minutes: self.booking_cutoff.num_minutes(),
            });
        }

        let is_premium = time_until_departure < self.surcharge_window;

        let subtotal = base_price_per_seat
            .checked_mul(i64::from(seat_count))
            .ok_or(PricingError::Overflow)?;

        let total_price = if is_premium {
            // Round half up to the nearest minor unit.
            let scaled = subtotal
                .checked_mul(100 + self.surcharge_percent)
                .ok_or(PricingError::Overflow)?;
            (scaled + 50) / 100
        } else {
            subtotal
        };

        Ok(Quote {
            base_price_per_seat,
            seat_count,
            is_premium,
            total_price,
        })
    }

    /// Price `seat_count` seats of `class` on `flight` as seen at `now`.
    pub fn quote_for(
        &self,
        flight: &Flight,
        class: TravelClass,
        seat_count: i32,
        now: DateTime<Utc>,
    ) -> Result<Quote, PricingError> {
        self.quote(flight.fare(class), seat_count, flight.departure_time - now)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PricingError {
    #[error("Booking window closed: departure is less than {cutoff_minutes} minutes away")]
    BookingWindowClosed { cutoff_minutes: i64 },

    #[error("Seat count must be positive, got {0}")]
    InvalidSeatCount(i32),

    #[error("Fare cannot be negative, got {0}")]
    NegativeFare(i64),

    #[error("Price calculation overflowed")]
    Overflow,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minutes_seconds(m: i64, s: i64) -> Duration {
        Duration::minutes(m) + Duration::seconds(s)
    }

    #[test]
    fn test_window_closes_just_before_cutoff() {
        let policy = PricingPolicy::default();
        assert_eq!(
            policy.quote(10000, 3, minutes_seconds(14, 59)),
            Err(PricingError::BookingWindowClosed { cutoff_minutes: 15 })
        );
    }

    #[test]
    fn test_surcharge_boundaries() {
        let policy = PricingPolicy::default();

        let at_cutoff = policy.quote(10000, 3, minutes_seconds(15, 0)).unwrap();
        assert!(at_cutoff.is_premium);
        assert_eq!(at_cutoff.total_price, 39000);

        let just_inside = policy.quote(10000, 3, minutes_seconds(59, 59)).unwrap();
        assert!(just_inside.is_premium);

        let at_window = policy.quote(10000, 3, minutes_seconds(60, 0)).unwrap();
        assert!(!at_window.is_premium);
        assert_eq!(at_window.total_price, 30000);
    }

    #[test]
    fn test_far_departure_is_plain_fare() {
        let policy = PricingPolicy::default();
        let quote = policy.quote(25050, 2, Duration::hours(5)).unwrap();
        assert_eq!(quote.total_price, 50100);
        assert_eq!(quote.base_price_per_seat, 25050);
    }

    #[test]
    fn test_surcharge_rounds_half_up() {
        let policy = PricingPolicy::default();
        // 1.05 * 1.30 = 1.365 -> 1.37
        let quote = policy.quote(105, 1, Duration::minutes(30)).unwrap();
        assert_eq!(quote.total_price, 137);
    }

    #[test]
    fn test_zero_fare_is_allowed() {
        let policy = PricingPolicy::default();
        assert_eq!(policy.quote(0, 4, Duration::minutes(30)).unwrap().total_price, 0);
    }

    #[test]
    fn test_rejects_bad_inputs() {
        let policy = PricingPolicy::default();
        assert_eq!(
            policy.quote(100, 0, Duration::hours(2)),
            Err(PricingError::InvalidSeatCount(0))
        );
        assert_eq!(
            policy.quote(-1, 1, Duration::hours(2)),
            Err(PricingError::NegativeFare(-1))
        );
        assert_eq!(
            policy.quote(i64::MAX, 2, Duration::hours(2)),
            Err(PricingError::Overflow)
        );
    }

    #[test]
    fn test_custom_policy() {
        let policy = PricingPolicy {
            booking_cutoff: Duration::minutes(30),
            surcharge_window: Duration::hours(2),
            surcharge_percent: 50,
        };
        assert!(policy.quote(100, 1, Duration::minutes(20)).is_err());
        assert_eq!(policy.quote(100, 1, Duration::minutes(90)).unwrap().total_price, 150);
    }
}
