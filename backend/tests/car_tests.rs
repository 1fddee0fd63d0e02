//! Car listing tests
//!
//! Property-based and unit tests for:
//! - Listing specification validation
//! - Sale versus rent pricing in search and price ranges
//! - Search filter parsing

use chrono::{Datelike, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{
    effective_price, validate_car_spec, CarFilter, CarStatus, CarType, ListingType, PriceColumn,
    Transmission, MIN_CAR_YEAR,
};

// ============================================================================
// Property Test Strategies
// ============================================================================

/// Generate model years accepted for listing
fn valid_year_strategy() -> impl Strategy<Value = i32> {
    MIN_CAR_YEAR..=Utc::now().year() + 1
}

fn listing_type_strategy() -> impl Strategy<Value = ListingType> {
    prop_oneof![Just(ListingType::Sell), Just(ListingType::Rent)]
}

/// Generate optional prices in whole rupees
fn optional_price_strategy() -> impl Strategy<Value = Option<Decimal>> {
    prop::option::of((100i64..5_000_000).prop_map(Decimal::from))
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Any plausible car between the oldest year and next year is accepted
    #[test]
    fn prop_valid_spec_accepted(
        year in valid_year_strategy(),
        seats in 1i32..10,
        doors in 2i32..6,
        ownership in prop::option::of(1i32..=5),
    ) {
        prop_assert!(validate_car_spec(year, seats, doors, ownership).is_ok());
    }

    /// Years before the oldest accepted year are rejected
    #[test]
    fn prop_old_year_rejected(year in 1900i32..MIN_CAR_YEAR) {
        prop_assert!(validate_car_spec(year, 5, 4, None).is_err());
    }

    /// Rentals are priced by their rent price, sales by their sale price
    #[test]
    fn prop_effective_price(
        listing_type in listing_type_strategy(),
        sale in optional_price_strategy(),
        rent in optional_price_strategy(),
    ) {
        let price = effective_price(listing_type, sale, rent);
        match listing_type {
            ListingType::Rent => prop_assert_eq!(price, rent),
            ListingType::Sell => prop_assert_eq!(price, sale),
        }
    }

    /// Price bounds apply to the rent column only when filtering rentals
    #[test]
    fn prop_price_column(listing_type in prop::option::of(listing_type_strategy())) {
        let filter = CarFilter { listing_type, ..Default::default() };
        let expected = if listing_type == Some(ListingType::Rent) {
            PriceColumn::Rent
        } else {
            PriceColumn::Sale
        };
        prop_assert_eq!(filter.price_column(), expected);
    }
}

// ============================================================================
// Specification Tests
// ============================================================================

#[cfg(test)]
mod spec_tests {
    use super::*;

    #[test]
    fn test_boundary_years() {
        assert!(validate_car_spec(MIN_CAR_YEAR, 5, 4, None).is_ok());
        assert!(validate_car_spec(Utc::now().year() + 1, 5, 4, None).is_ok());
        assert!(validate_car_spec(Utc::now().year() + 2, 5, 4, None).is_err());
    }

    #[test]
    fn test_seats_and_doors() {
        assert_eq!(
            validate_car_spec(2022, 0, 4, None),
            Err("A car must have at least 1 seat")
        );
        assert_eq!(
            validate_car_spec(2022, 2, 1, None),
            Err("A car must have at least 2 doors")
        );
    }

    #[test]
    fn test_ownership_range() {
        assert!(validate_car_spec(2022, 5, 4, Some(0)).is_err());
        assert!(validate_car_spec(2022, 5, 4, Some(5)).is_ok());
        assert!(validate_car_spec(2022, 5, 4, Some(6)).is_err());
    }

    #[test]
    fn test_new_listing_is_draft() {
        assert_eq!(CarStatus::default(), CarStatus::Draft);
        assert_eq!(CarStatus::Active.as_str(), "active");
    }
}

// ============================================================================
// Search Filter Tests
// ============================================================================

#[cfg(test)]
mod filter_tests {
    use super::*;

    #[test]
    fn test_filter_from_json() {
        let json = serde_json::json!({
            "brand": "Tata",
            "year": 2021,
            "carType": "SUV",
            "listingType": "rent",
            "transmission": "automatic",
            "minPrice": "1000",
            "maxPrice": 5000
        });
        let filter: CarFilter = serde_json::from_value(json).unwrap();

        assert_eq!(filter.brand.as_deref(), Some("Tata"));
        assert_eq!(filter.car_type, Some(CarType::Suv));
        assert_eq!(filter.transmission, Some(Transmission::Automatic));
        assert_eq!(filter.min_price, Some(Decimal::from(1000)));
        assert_eq!(filter.max_price, Some(Decimal::from(5000)));
        assert_eq!(filter.price_column(), PriceColumn::Rent);
        assert!(filter.has_price_bounds());
    }

    #[test]
    fn test_empty_filter() {
        let filter: CarFilter = serde_json::from_str("{}").unwrap();
        assert_eq!(filter, CarFilter::default());
        assert!(!filter.has_price_bounds());
    }

    #[test]
    fn test_unknown_car_type_rejected() {
        let json = serde_json::json!({ "carType": "Spaceship" });
        assert!(serde_json::from_value::<CarFilter>(json).is_err());
    }

    #[test]
    fn test_car_type_names() {
        for (car_type, name) in [
            (CarType::Hatchback, "Hatchback"),
            (CarType::Suv, "SUV"),
            (CarType::Muv, "MUV"),
            (CarType::Van, "Van"),
        ] {
            assert_eq!(car_type.as_str(), name);
            let parsed: CarType = serde_json::from_value(serde_json::json!(name)).unwrap();
            assert_eq!(parsed, car_type);
        }
    }
}
