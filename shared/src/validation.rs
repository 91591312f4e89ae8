//! Quantity validation for ledger and request operations
//!
//! All checks are exact: quantities are decimals, so increment membership is
//! a plain remainder test with no floating-point tolerance.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::ChemicalDefinition;
use crate::types::Location;
use crate::units;

/// Why a quantity was rejected. `Display` is the caller-facing reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantityError {
    #[error("Quantity must be greater than or equal to 0")]
    Negative,

    #[error("Location {0} is not allowed for this chemical")]
    LocationNotAllowed(Location),

    #[error("Quantity must be a multiple of {increment} {unit_label}")]
    NotIncrementMultiple {
        increment: Decimal,
        unit_label: &'static str,
    },

    #[error("Quantity must be a multiple of {0}")]
    NotRequestIncrementMultiple(Decimal),

    #[error("Quantity must be a whole number")]
    NotWholeNumber,
}

/// Validate an absolute "set quantity" write. The quantity is in stored
/// units (gallons, or purchase units for box-counted items) and must land on
/// the chemical's storage increment.
pub fn validate_set_quantity(
    chemical: &ChemicalDefinition,
    location: Location,
    qty: Decimal,
) -> Result<(), QuantityError> {
    if qty < Decimal::ZERO {
        return Err(QuantityError::Negative);
    }
    if !chemical.tracks(location) {
        return Err(QuantityError::LocationNotAllowed(location));
    }

    let increment = units::storage_increment(chemical);
    if !(qty % increment).is_zero() {
        let gallon_based = chemical.gallons_per_unit.is_some();
        let unit_label = if increment == Decimal::ONE {
            if gallon_based {
                "gallon"
            } else {
                chemical.unit.label()
            }
        } else if gallon_based {
            "gallons"
        } else {
            chemical.unit.label_plural()
        };
        return Err(QuantityError::NotIncrementMultiple { increment, unit_label });
    }

    Ok(())
}

/// Validate a pickup-style write: whole purchase units at an allowed
/// location
pub fn validate_whole_quantity(
    chemical: &ChemicalDefinition,
    location: Location,
    qty: Decimal,
) -> Result<(), QuantityError> {
    if qty < Decimal::ZERO {
        return Err(QuantityError::Negative);
    }
    if !chemical.tracks(location) {
        return Err(QuantityError::LocationNotAllowed(location));
    }
    if !qty.fract().is_zero() {
        return Err(QuantityError::NotWholeNumber);
    }
    Ok(())
}

/// Validate a request quantity against the location-independent request
/// increment
pub fn validate_request_quantity(
    chemical: &ChemicalDefinition,
    qty: Decimal,
) -> Result<(), QuantityError> {
    if qty < Decimal::ZERO {
        return Err(QuantityError::Negative);
    }
    let increment = units::request_increment(chemical);
    if !(qty % increment).is_zero() {
        return Err(QuantityError::NotRequestIncrementMultiple(increment));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PurchaseUnit;
    use chrono::Utc;
    use uuid::Uuid;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn chemical(unit: PurchaseUnit, increment: &str, gallons_per_unit: Option<&str>) -> ChemicalDefinition {
        ChemicalDefinition {
            id: Uuid::new_v4(),
            name: "Test Chemical".to_string(),
            unit,
            increment: dec(increment),
            gallons_per_unit: gallons_per_unit.map(dec),
            track_on_shelf: true,
            track_on_line: true,
            active: true,
            cost_per_unit: None,
            sort_order: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_set_quantity_accepts_increment_multiples() {
        let c = chemical(PurchaseUnit::Box, "0.5", Some("5"));
        // Gallon-tracked items move in tenths
        for qty in ["0", "0.1", "0.2", "1.0", "12.5", "30"] {
            assert!(validate_set_quantity(&c, Location::Shelf, dec(qty)).is_ok(), "{qty}");
        }
    }

    #[test]
    fn test_set_quantity_rejects_off_increment() {
        let c = chemical(PurchaseUnit::Box, "0.25", None);
        assert!(validate_set_quantity(&c, Location::Shelf, dec("0.25")).is_ok());
        assert!(validate_set_quantity(&c, Location::Shelf, dec("0.75")).is_ok());
        assert_eq!(
            validate_set_quantity(&c, Location::Shelf, dec("0.3")),
            Err(QuantityError::NotIncrementMultiple {
                increment: dec("0.25"),
                unit_label: "boxes",
            })
        );
    }

    #[test]
    fn test_set_quantity_rejects_negative() {
        let c = chemical(PurchaseUnit::Bucket, "1", Some("5"));
        assert_eq!(
            validate_set_quantity(&c, Location::Shelf, dec("-0.1")),
            Err(QuantityError::Negative)
        );
    }

    #[test]
    fn test_set_quantity_rejects_untracked_location() {
        let mut c = chemical(PurchaseUnit::Box, "0.25", None);
        c.track_on_line = false;
        assert_eq!(
            validate_set_quantity(&c, Location::Line, dec("1")),
            Err(QuantityError::LocationNotAllowed(Location::Line))
        );
    }

    #[test]
    fn test_whole_quantity_accepts_integers_only() {
        let c = chemical(PurchaseUnit::Barrel, "0.25", Some("30"));
        assert!(validate_whole_quantity(&c, Location::Shelf, dec("0")).is_ok());
        assert!(validate_whole_quantity(&c, Location::Shelf, dec("2")).is_ok());
        assert!(validate_whole_quantity(&c, Location::Shelf, dec("2.0")).is_ok());
        assert_eq!(
            validate_whole_quantity(&c, Location::Shelf, dec("2.5")),
            Err(QuantityError::NotWholeNumber)
        );
        assert_eq!(
            validate_whole_quantity(&c, Location::Shelf, dec("-1")),
            Err(QuantityError::Negative)
        );
    }

    #[test]
    fn test_request_quantity_bucket_quarter_steps() {
        let bucket = chemical(PurchaseUnit::Bucket, "1", Some("5"));
        assert!(validate_request_quantity(&bucket, dec("0.25")).is_ok());
        assert!(validate_request_quantity(&bucket, dec("1.75")).is_ok());
        assert_eq!(
            validate_request_quantity(&bucket, dec("0.3")),
            Err(QuantityError::NotRequestIncrementMultiple(dec("0.25")))
        );
    }

    #[test]
    fn test_request_quantity_uses_configured_increment() {
        let kit = chemical(PurchaseUnit::Box, "1", None);
        assert!(validate_request_quantity(&kit, dec("3")).is_ok());
        assert!(validate_request_quantity(&kit, dec("1.5")).is_err());
    }

    #[test]
    fn test_error_message_names_the_increment() {
        let c = chemical(PurchaseUnit::Box, "0.5", Some("5"));
        let err = validate_set_quantity(&c, Location::Shelf, dec("0.15")).unwrap_err();
        assert_eq!(err.to_string(), "Quantity must be a multiple of 0.1 gallons");
    }
}
