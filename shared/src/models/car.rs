//! Car listings for sale or rent

use chrono::{Datelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Whether a car is offered for sale or for rent
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ListingType {
    Sell,
    Rent,
}

impl ListingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingType::Sell => "sell",
            ListingType::Rent => "rent",
        }
    }
}

/// Publication status of a listing
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CarStatus {
    #[default]
    Draft,
    Active,
    Inactive,
}

impl CarStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CarStatus::Draft => "draft",
            CarStatus::Active => "active",
            CarStatus::Inactive => "inactive",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CarType {
    Hatchback,
    Sedan,
    #[serde(rename = "SUV")]
    Suv,
    Luxury,
    #[serde(rename = "MUV")]
    Muv,
    Convertible,
    Van,
}

impl CarType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CarType::Hatchback => "Hatchback",
            CarType::Sedan => "Sedan",
            CarType::Suv => "SUV",
            CarType::Luxury => "Luxury",
            CarType::Muv => "MUV",
            CarType::Convertible => "Convertible",
            CarType::Van => "Van",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Transmission {
    Manual,
    Automatic,
}

impl Transmission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transmission::Manual => "manual",
            Transmission::Automatic => "automatic",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FuelType {
    Petrol,
    Diesel,
    Electric,
    Hybrid,
}

impl FuelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FuelType::Petrol => "petrol",
            FuelType::Diesel => "diesel",
            FuelType::Electric => "electric",
            FuelType::Hybrid => "hybrid",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CarCondition {
    New,
    Used,
}

impl CarCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            CarCondition::New => "new",
            CarCondition::Used => "used",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RentPriceUnit {
    Hour,
    Day,
    Week,
}

impl RentPriceUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            RentPriceUnit::Hour => "hour",
            RentPriceUnit::Day => "day",
            RentPriceUnit::Week => "week",
        }
    }
}

/// Oldest model year accepted for a listing
pub const MIN_CAR_YEAR: i32 = 1990;

/// Check the physical specification of a listing
pub fn validate_car_spec(
    year: i32,
    seats: i32,
    doors: i32,
    ownership: Option<i32>,
) -> Result<(), &'static str> {
    let max_year = Utc::now().year() + 1;
    if !(MIN_CAR_YEAR..=max_year).contains(&year) {
        return Err("Year must be between 1990 and next year");
    }
    if seats < 1 {
        return Err("A car must have at least 1 seat");
    }
    if doors < 2 {
        return Err("A car must have at least 2 doors");
    }
    if let Some(owners) = ownership {
        if !(1..=5).contains(&owners) {
            return Err("Ownership must be between 1 and 5");
        }
    }
    Ok(())
}

/// The price a listing is compared and ranged by: rent price for rentals
pub fn effective_price(
    listing_type: ListingType,
    sale_price: Option<Decimal>,
    rent_price: Option<Decimal>,
) -> Option<Decimal> {
    match listing_type {
        ListingType::Rent => rent_price,
        ListingType::Sell => sale_price,
    }
}

/// Public search filters
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CarFilter {
    pub brand: Option<String>,
    pub year: Option<i32>,
    pub seat: Option<i32>,
    pub car_type: Option<CarType>,
    pub listing_type: Option<ListingType>,
    pub transmission: Option<Transmission>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

/// Which stored price column a price bound applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceColumn {
    Sale,
    Rent,
}

impl CarFilter {
    /// Price bounds use the rent price only when filtering rentals
    pub fn price_column(&self) -> PriceColumn {
        match self.listing_type {
            Some(ListingType::Rent) => PriceColumn::Rent,
            _ => PriceColumn::Sale,
        }
    }

    pub fn has_price_bounds(&self) -> bool {
        self.min_price.is_some() || self.max_price.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_car_spec() {
        assert!(validate_car_spec(2020, 5, 4, Some(1)).is_ok());
        assert!(validate_car_spec(1989, 5, 4, None).is_err());
        assert!(validate_car_spec(Utc::now().year() + 2, 5, 4, None).is_err());
        assert!(validate_car_spec(2020, 0, 4, None).is_err());
        assert!(validate_car_spec(2020, 5, 1, None).is_err());
        assert!(validate_car_spec(2020, 5, 4, Some(6)).is_err());
    }

    #[test]
    fn test_price_column() {
        let rent = CarFilter {
            listing_type: Some(ListingType::Rent),
            ..Default::default()
        };
        assert_eq!(rent.price_column(), PriceColumn::Rent);
        assert_eq!(CarFilter::default().price_column(), PriceColumn::Sale);
    }

    #[test]
    fn test_effective_price() {
        let sale = Some(Decimal::from(500_000));
        let rent = Some(Decimal::from(1_500));
        assert_eq!(effective_price(ListingType::Rent, sale, rent), rent);
        assert_eq!(effective_price(ListingType::Sell, sale, rent), sale);
    }

    #[test]
    fn test_car_type_wire_names() {
        assert_eq!(serde_json::to_string(&CarType::Suv).unwrap(), "\"SUV\"");
        assert_eq!(CarType::Muv.as_str(), "MUV");
    }
}
