use aeris_core::{CoreError, CoreResult};
use aeris_shared::TravellerDetails;
use chrono::NaiveDate;

pub fn validate_seat_count(seat_count: i32, max_seats: i32) -> CoreResult<()> {
    if seat_count <= 0 {
        return Err(CoreError::ValidationError(
            "seat_count must be greater than zero".to_string(),
        ));
    }
    if seat_count > max_seats {
        return Err(CoreError::ValidationError(format!(
            "at most {} seats can be booked at once",
            max_seats
        )));
    }
    Ok(())
}

/// One complete traveller record per seat.
pub fn validate_travellers(
    travellers: &[TravellerDetails],
    seat_count: i32,
    today: NaiveDate,
) -> CoreResult<()> {
    if travellers.len() != seat_count as usize {
        return Err(CoreError::ValidationError(format!(
            "number of travellers ({}) must match seat_count ({})",
            travellers.len(),
            seat_count
        )));
    }

    for (i, traveller) in travellers.iter().enumerate() {
        let fields = [
            ("title", &traveller.title),
            ("first_name", &traveller.first_name),
            ("last_name", &traveller.last_name),
            ("nationality", &traveller.nationality),
        ];
        if let Some((name, _)) = fields.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(CoreError::ValidationError(format!(
                "traveller {}: {} is required",
                i + 1,
                name
            )));
        }
        if traveller.date_of_birth > today {
            return Err(CoreError::ValidationError(format!(
                "traveller {}: date_of_birth cannot be in the future",
                i + 1
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn traveller() -> TravellerDetails {
        TravellerDetails {
            title: "Dr".to_string(),
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1906, 12, 9).unwrap(),
            nationality: "US".to_string(),
        }
    }

    #[test]
    fn test_seat_count_bounds() {
        assert!(validate_seat_count(1, 9).is_ok());
        assert!(validate_seat_count(9, 9).is_ok());
        assert!(validate_seat_count(0, 9).is_err());
        assert!(validate_seat_count(-2, 9).is_err());
        assert!(validate_seat_count(10, 9).is_err());
    }

    #[test]
    fn test_traveller_count_must_match() {
        let travellers = vec![traveller()];
        assert!(validate_travellers(&travellers, 1, today()).is_ok());
        assert!(matches!(
            validate_travellers(&travellers, 2, today()),
            Err(CoreError::ValidationError(_))
        ));
    }

    #[test]
    fn test_traveller_fields_required() {
        let mut blank = traveller();
        blank.last_name = "  ".to_string();
        let err = validate_travellers(&[blank], 1, today()).unwrap_err();
        assert!(err.to_string().contains("last_name"));

        let mut unborn = traveller();
        unborn.date_of_birth = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        assert!(validate_travellers(&[unborn], 1, today()).is_err());
    }
}
