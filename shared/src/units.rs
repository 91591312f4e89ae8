//! Conversion between purchase units and stored gallon quantities
//!
//! Inventory is stored in gallons for every chemical that has a gallon
//! conversion; items without one (box-counted supplies such as clean kits,
//! bottles, and air fresheners) are stored directly in purchase units.

use rust_decimal::Decimal;

use crate::models::ChemicalDefinition;
use crate::types::{Location, PurchaseUnit};

/// Convert a purchase-unit count to the stored quantity
pub fn to_gallons(chemical: &ChemicalDefinition, units: Decimal) -> Decimal {
    match chemical.gallons_per_unit {
        Some(per_unit) => units * per_unit,
        None => units,
    }
}

/// Convert a stored quantity back to purchase units for display
pub fn to_units(chemical: &ChemicalDefinition, gallons: Decimal) -> Decimal {
    match chemical.gallons_per_unit {
        Some(per_unit) => gallons / per_unit,
        None => gallons,
    }
}

/// Allowed step size for stored quantities: tenth-gallon precision for
/// converted items, the configured increment for box-counted items
pub fn storage_increment(chemical: &ChemicalDefinition) -> Decimal {
    if chemical.gallons_per_unit.is_some() {
        Decimal::new(1, 1)
    } else {
        chemical.increment
    }
}

/// Allowed step size for restock request quantities. Buckets are requested
/// in quarter steps; everything else uses the configured increment.
pub fn request_increment(chemical: &ChemicalDefinition) -> Decimal {
    if chemical.unit == PurchaseUnit::Bucket {
        Decimal::new(25, 2)
    } else {
        chemical.increment
    }
}

/// Locations at which the chemical accepts writes
pub fn allowed_locations(chemical: &ChemicalDefinition) -> Vec<Location> {
    let mut locations = Vec::new();
    if chemical.track_on_shelf {
        locations.push(Location::Shelf);
    }
    if chemical.track_on_line {
        locations.push(Location::Line);
    }
    locations
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn chemical(unit: PurchaseUnit, increment: &str, gallons_per_unit: Option<&str>) -> ChemicalDefinition {
        ChemicalDefinition {
            id: Uuid::new_v4(),
            name: "Test Chemical".to_string(),
            unit,
            increment: increment.parse().unwrap(),
            gallons_per_unit: gallons_per_unit.map(|g| g.parse().unwrap()),
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
    fn test_to_gallons_converted() {
        let c = chemical(PurchaseUnit::Box, "0.5", Some("5"));
        assert_eq!(to_gallons(&c, "2".parse().unwrap()), "10".parse().unwrap());
        assert_eq!(to_gallons(&c, "0.5".parse().unwrap()), "2.5".parse().unwrap());
    }

    #[test]
    fn test_to_gallons_identity_for_box_counted() {
        let c = chemical(PurchaseUnit::Box, "0.25", None);
        let qty: Decimal = "3.25".parse().unwrap();
        assert_eq!(to_gallons(&c, qty), qty);
        assert_eq!(to_units(&c, qty), qty);
    }

    #[test]
    fn test_round_trip() {
        let c = chemical(PurchaseUnit::Barrel, "0.25", Some("30"));
        let units: Decimal = "1.75".parse().unwrap();
        assert_eq!(to_units(&c, to_gallons(&c, units)), units);
    }

    #[test]
    fn test_storage_increment() {
        let converted = chemical(PurchaseUnit::Bucket, "1", Some("5"));
        assert_eq!(storage_increment(&converted), Decimal::new(1, 1));

        let box_counted = chemical(PurchaseUnit::Box, "0.25", None);
        assert_eq!(storage_increment(&box_counted), "0.25".parse().unwrap());
    }

    #[test]
    fn test_request_increment() {
        let bucket = chemical(PurchaseUnit::Bucket, "1", Some("5"));
        assert_eq!(request_increment(&bucket), "0.25".parse().unwrap());

        let barrel = chemical(PurchaseUnit::Barrel, "0.25", Some("30"));
        assert_eq!(request_increment(&barrel), "0.25".parse().unwrap());

        let kit = chemical(PurchaseUnit::Box, "1", None);
        assert_eq!(request_increment(&kit), "1".parse().unwrap());
    }

    #[test]
    fn test_allowed_locations() {
        let both = chemical(PurchaseUnit::Box, "0.5", Some("5"));
        assert_eq!(allowed_locations(&both), vec![Location::Shelf, Location::Line]);

        let mut shelf_only = chemical(PurchaseUnit::Box, "0.25", None);
        shelf_only.track_on_line = false;
        assert_eq!(allowed_locations(&shelf_only), vec![Location::Shelf]);
    }
}
