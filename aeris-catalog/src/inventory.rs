use aeris_shared::{PerClass, TravelClass};
use serde::{Deserialize, Serialize};

/// Per-class seat counters for one flight.
///
/// `total` is the capacity ceiling fixed when the flight is published; only
/// `available` moves afterwards. Every constructor and mutation keeps
/// `0 <= available <= total` for all four classes. Callers must hold the
/// flight's exclusive lock while reserving or releasing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawInventory")]
pub struct SeatInventory {
    available_seats: PerClass<i32>,
    total_seats: PerClass<i32>,
}

#[derive(Deserialize)]
struct RawInventory {
    available_seats: PerClass<i32>,
    total_seats: PerClass<i32>,
}

impl TryFrom<RawInventory> for SeatInventory {
    type Error = InventoryError;

    fn try_from(raw: RawInventory) -> Result<Self, Self::Error> {
        SeatInventory::from_parts(raw.available_seats, raw.total_seats)
    }
}

impl SeatInventory {
    /// Seed a brand new flight: everything is available.
    pub fn with_capacity(total_seats: PerClass<i32>) -> Result<Self, InventoryError> {
        let inventory = Self::from_parts(total_seats, total_seats)?;
        if inventory.total_capacity() == 0 {
            return Err(InventoryError::NoCapacity);
        }
        Ok(inventory)
    }

    /// Rebuild counters loaded from storage.
    pub fn from_parts(
        available_seats: PerClass<i32>,
        total_seats: PerClass<i32>,
    ) -> Result<Self, InventoryError> {
        for class in TravelClass::ALL {
            let available = *available_seats.get(class);
            let total = *total_seats.get(class);
            if total < 0 {
                return Err(InventoryError::NegativeCapacity(class));
            }
            if available < 0 || available > total {
                return Err(InventoryError::Inconsistent {
                    class,
                    available,
                    total,
                });
            }
        }

        Ok(Self {
            available_seats,
            total_seats,
        })
    }

    pub fn available(&self, class: TravelClass) -> i32 {
        *self.available_seats.get(class)
    }

    pub fn total(&self, class: TravelClass) -> i32 {
        *self.total_seats.get(class)
    }

    pub fn booked(&self, class: TravelClass) -> i32 {
        self.total(class) - self.available(class)
    }

    pub fn available_seats(&self) -> &PerClass<i32> {
        &self.available_seats
    }

    pub fn total_seats(&self) -> &PerClass<i32> {
        &self.total_seats
    }

    pub fn total_available(&self) -> i32 {
        self.available_seats.iter().map(|(_, n)| *n).sum()
    }

    pub fn total_capacity(&self) -> i32 {
        self.total_seats.iter().map(|(_, n)| *n).sum()
    }

    /// Take `count` seats out of the class pool.
    pub fn reserve(&mut self, class: TravelClass, count: i32) -> Result<(), InventoryError> {
        if count <= 0 {
            return Err(InventoryError::InvalidQuantity(count));
        }

        let available = self.available_seats.get_mut(class);
        if count > *available {
            return Err(InventoryError::InsufficientSeats {
                class,
                requested: count,
                available: *available,
            });
        }

        *available -= count;
        Ok(())
    }

    /// Hand back seats taken by an earlier `reserve` on the same class.
    pub fn release(&mut self, class: TravelClass, count: i32) -> Result<(), InventoryError> {
        if count <= 0 {
            return Err(InventoryError::InvalidQuantity(count));
        }

        let total = self.total(class);
        let available = self.available_seats.get_mut(class);
        if *available + count > total {
            return Err(InventoryError::OverRelease {
                class,
                released: count,
                booked: total - *available,
            });
        }

        *available += count;
        Ok(())
    }

    /// Share of the class already sold, 0.0 for classes without seats.
    pub fn utilization(&self, class: TravelClass) -> f64 {
        let total = self.total(class);
        if total == 0 {
            0.0
        } else {
            1.0 - (self.available(class) as f64 / total as f64)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InventoryError {
    #[error("Seat quantity must be positive, got {0}")]
    InvalidQuantity(i32),

    #[error("Insufficient {class} seats: requested {requested}, available {available}")]
    InsufficientSeats {
        class: TravelClass,
        requested: i32,
        available: i32,
    },

    #[error("Cannot release {released} {class} seats: only {booked} are booked")]
    OverRelease {
        class: TravelClass,
        released: i32,
        booked: i32,
    },

    #[error("Capacity for {0} cannot be negative")]
    NegativeCapacity(TravelClass),

    #[error("At least one travel class must have seats")]
    NoCapacity,

    #[error("Inconsistent {class} counters: available {available}, total {total}")]
    Inconsistent {
        class: TravelClass,
        available: i32,
        total: i32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inventory() -> SeatInventory {
        SeatInventory::with_capacity(PerClass::new(100, 20, 10, 0)).unwrap()
    }

    #[test]
    fn test_inventory_lifecycle() {
        let mut inventory = inventory();
        assert_eq!(inventory.available(TravelClass::Economy), 100);

        inventory.reserve(TravelClass::Economy, 10).unwrap();
        assert_eq!(inventory.available(TravelClass::Economy), 90);
        assert_eq!(inventory.booked(TravelClass::Economy), 10);

        let utilization = inventory.utilization(TravelClass::Economy);
        assert!((utilization - 0.1).abs() < 0.01);

        inventory.release(TravelClass::Economy, 10).unwrap();
        assert_eq!(inventory.available(TravelClass::Economy), 100);
        assert_eq!(inventory.total(TravelClass::Economy), 100);
    }

    #[test]
    fn test_reserve_never_goes_negative() {
        let mut inventory = inventory();
        inventory.reserve(TravelClass::Business, 10).unwrap();

        let err = inventory.reserve(TravelClass::Business, 1).unwrap_err();
        assert_eq!(
            err,
            InventoryError::InsufficientSeats {
                class: TravelClass::Business,
                requested: 1,
                available: 0,
            }
        );
        assert_eq!(inventory.available(TravelClass::Business), 0);
    }

    #[test]
    fn test_empty_class_cannot_be_reserved() {
        let mut inventory = inventory();
        assert!(inventory.reserve(TravelClass::FirstClass, 1).is_err());
    }

    #[test]
    fn test_release_cannot_exceed_capacity() {
        let mut inventory = inventory();
        inventory.reserve(TravelClass::PremiumEconomy, 2).unwrap();

        assert!(matches!(
            inventory.release(TravelClass::PremiumEconomy, 3),
            Err(InventoryError::OverRelease { booked: 2, .. })
        ));
        assert_eq!(inventory.available(TravelClass::PremiumEconomy), 18);
    }

    #[test]
    fn test_non_positive_quantities_rejected() {
        let mut inventory = inventory();
        assert_eq!(
            inventory.reserve(TravelClass::Economy, 0),
            Err(InventoryError::InvalidQuantity(0))
        );
        assert_eq!(
            inventory.release(TravelClass::Economy, -1),
            Err(InventoryError::InvalidQuantity(-1))
        );
    }

    #[test]
    fn test_construction_validates_invariants() {
        assert_eq!(
            SeatInventory::with_capacity(PerClass::new(0, 0, 0, 0)),
            Err(InventoryError::NoCapacity)
        );
        assert_eq!(
            SeatInventory::with_capacity(PerClass::new(-1, 5, 0, 0)),
            Err(InventoryError::NegativeCapacity(TravelClass::Economy))
        );
        assert!(matches!(
            SeatInventory::from_parts(PerClass::new(11, 0, 0, 0), PerClass::new(10, 0, 0, 0)),
            Err(InventoryError::Inconsistent { .. })
        ));
    }

    #[test]
    fn test_deserialization_rejects_corrupt_counters() {
        let json = r#"{
            "available_seats": {"economy": 5, "premium_economy": 0, "business": 0, "first_class": 0},
            "total_seats": {"economy": 4, "premium_economy": 0, "business": 0, "first_class": 0}
        }"#;
        assert!(serde_json::from_str::<SeatInventory>(json).is_err());
    }
}
