use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Cabin a seat is sold in. Every flight keeps an independent seat pool and fare per class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TravelClass {
    Economy,
    PremiumEconomy,
    Business,
    FirstClass,
}

impl TravelClass {
    pub const ALL: [TravelClass; 4] = [
        TravelClass::Economy,
        TravelClass::PremiumEconomy,
        TravelClass::Business,
        TravelClass::FirstClass,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TravelClass::Economy => "Economy",
            TravelClass::PremiumEconomy => "PremiumEconomy",
            TravelClass::Business => "Business",
            TravelClass::FirstClass => "FirstClass",
        }
    }
}

impl fmt::Display for TravelClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown travel class: {0}")]
pub struct UnknownTravelClass(pub String);

impl FromStr for TravelClass {
    type Err = UnknownTravelClass;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "economy" => Ok(TravelClass::Economy),
            "premiumeconomy" => Ok(TravelClass::PremiumEconomy),
            "business" => Ok(TravelClass::Business),
            "firstclass" | "first" => Ok(TravelClass::FirstClass),
            _ => Err(UnknownTravelClass(s.to_string())),
        }
    }
}

/// One value per travel class (fares, seat counters, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PerClass<T> {
    pub economy: T,
    pub premium_economy: T,
    pub business: T,
    pub first_class: T,
}

impl<T> PerClass<T> {
    pub fn new(economy: T, premium_economy: T, business: T, first_class: T) -> Self {
        Self {
            economy,
            premium_economy,
            business,
            first_class,
        }
    }

    pub fn get(&self, class: TravelClass) -> &T {
        match class {
            TravelClass::Economy => &self.economy,
            TravelClass::PremiumEconomy => &self.premium_economy,
            TravelClass::Business => &self.business,
            TravelClass::FirstClass => &self.first_class,
        }
    }

    pub fn get_mut(&mut self, class: TravelClass) -> &mut T {
        match class {
            TravelClass::Economy => &mut self.economy,
            TravelClass::PremiumEconomy => &mut self.premium_economy,
            TravelClass::Business => &mut self.business,
            TravelClass::FirstClass => &mut self.first_class,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (TravelClass, &T)> {
        TravelClass::ALL.into_iter().map(move |class| (class, self.get(class)))
    }

    pub fn map<U>(&self, mut f: impl FnMut(TravelClass, &T) -> U) -> PerClass<U> {
        PerClass {
            economy: f(TravelClass::Economy, &self.economy),
            premium_economy: f(TravelClass::PremiumEconomy, &self.premium_economy),
            business: f(TravelClass::Business, &self.business),
            first_class: f(TravelClass::FirstClass, &self.first_class),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_travel_class() {
        assert_eq!("Economy".parse::<TravelClass>().unwrap(), TravelClass::Economy);
        assert_eq!("PremiumEconomy".parse::<TravelClass>().unwrap(), TravelClass::PremiumEconomy);
        assert_eq!("premium_economy".parse::<TravelClass>().unwrap(), TravelClass::PremiumEconomy);
        assert_eq!("First Class".parse::<TravelClass>().unwrap(), TravelClass::FirstClass);
        assert!("Cargo".parse::<TravelClass>().is_err());
        assert!("".parse::<TravelClass>().is_err());
    }

    #[test]
    fn test_display_round_trips_through_from_str() {
        for class in TravelClass::ALL {
            assert_eq!(class.to_string().parse::<TravelClass>().unwrap(), class);
        }
    }

    #[test]
    fn test_per_class_access() {
        let mut seats = PerClass::new(10, 5, 2, 0);
        *seats.get_mut(TravelClass::Business) -= 1;

        assert_eq!(*seats.get(TravelClass::Business), 1);
        assert_eq!(seats.iter().map(|(_, n)| *n).sum::<i32>(), 16);

        let doubled = seats.map(|_, n| n * 2);
        assert_eq!(doubled.economy, 20);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&TravelClass::FirstClass).unwrap();
        assert_eq!(json, "\"FirstClass\"");

        let seats: PerClass<i32> = serde_json::from_str(
            r#"{"economy": 1, "premium_economy": 2, "business": 3, "first_class": 4}"#,
        )
        .unwrap();
        assert_eq!(*seats.get(TravelClass::FirstClass), 4);
    }
}
