//! Low-stock policy tests
//!
//! Runs the standing rule table against catalog-shaped definitions and
//! checks every threshold boundary, including the one intentionally
//! inclusive comparison.

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use shared::models::ChemicalDefinition;
use shared::thresholds::{check_low_stock, standard_rules};
use shared::types::{Location, PurchaseUnit};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn chemical(name: &str, unit: PurchaseUnit, gallons_per_unit: Option<&str>) -> ChemicalDefinition {
    ChemicalDefinition {
        id: Uuid::new_v4(),
        name: name.to_string(),
        unit,
        increment: dec("0.25"),
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

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Clean kits are watched on the line, in purchase units
    #[test]
    fn test_clean_kit_line_threshold() {
        let rules = standard_rules();
        let kit = chemical("Clean Kit", PurchaseUnit::Box, None);

        let alert = check_low_stock(&rules, &kit, dec("10"), dec("1.5")).unwrap();
        assert_eq!(alert.location, Location::Line);
        assert_eq!(alert.threshold, dec("2"));
        assert_eq!(alert.current, dec("1.5"));

        assert!(check_low_stock(&rules, &kit, dec("0"), dec("2")).is_none());
    }

    /// Tire shine is watched on the shelf against 30 gallons
    #[test]
    fn test_tire_shine_gallon_threshold() {
        let rules = standard_rules();
        let shine = chemical("Tire Shine", PurchaseUnit::Barrel, Some("30"));

        assert!(check_low_stock(&rules, &shine, dec("29.9"), dec("0")).is_some());
        assert!(check_low_stock(&rules, &shine, dec("30"), dec("0")).is_none());
        assert!(check_low_stock(&rules, &shine, dec("45"), dec("0")).is_none());
    }

    /// The two bucket chemicals share a 5-gallon shelf threshold
    #[test]
    fn test_bucket_chemical_thresholds() {
        let rules = standard_rules();
        for name in ["RLC", "Glass Cleaner"] {
            let c = chemical(name, PurchaseUnit::Bucket, Some("5"));
            assert!(check_low_stock(&rules, &c, dec("4.9"), dec("0")).is_some(), "{name}");
            assert!(check_low_stock(&rules, &c, dec("5"), dec("0")).is_none(), "{name}");
        }
    }

    /// Every air freshener variant reorders below one box
    #[test]
    fn test_air_freshener_family() {
        let rules = standard_rules();
        for name in [
            "Air Freshener - Black Ice",
            "Air Freshener - New Car",
            "Air Freshener - Pina Colada",
        ] {
            let c = chemical(name, PurchaseUnit::Box, None);
            let alert = check_low_stock(&rules, &c, dec("0.75"), dec("0")).unwrap();
            assert_eq!(alert.threshold_gallons, dec("1"), "{name}");
            assert!(check_low_stock(&rules, &c, dec("1"), dec("0")).is_none(), "{name}");
        }
    }

    /// Bottles alert at exactly the half-box mark; bottle triggers only
    /// strictly below it
    #[test]
    fn test_half_box_boundary_comparisons() {
        let rules = standard_rules();
        let bottles = chemical("Bottles", PurchaseUnit::Box, None);
        let triggers = chemical("Bottle Triggers", PurchaseUnit::Box, None);

        assert!(check_low_stock(&rules, &bottles, dec("0.5"), dec("0")).is_some());
        assert!(check_low_stock(&rules, &bottles, dec("0.51"), dec("0")).is_none());

        assert!(check_low_stock(&rules, &triggers, dec("0.5"), dec("0")).is_none());
        assert!(check_low_stock(&rules, &triggers, dec("0.49"), dec("0")).is_some());
    }

    /// Any unnamed 5-gallon box chemical reorders below two boxes
    #[test]
    fn test_generic_five_gallon_box_rule() {
        let rules = standard_rules();
        for name in ["Nova", "Silk", "Prizm Red", "Road Rage", "Clean and Fresh Blast"] {
            let c = chemical(name, PurchaseUnit::Box, Some("5"));
            let alert = check_low_stock(&rules, &c, dec("9.9"), dec("0")).unwrap();
            assert_eq!(alert.threshold_gallons, dec("10"), "{name}");
            assert!(check_low_stock(&rules, &c, dec("10"), dec("0")).is_none(), "{name}");
        }
    }

    /// Chemicals no rule selects are not monitored at any level
    #[test]
    fn test_unmonitored_chemical() {
        let rules = standard_rules();
        let mystery = chemical("Spot Free Rinse", PurchaseUnit::Barrel, Some("55"));
        assert!(check_low_stock(&rules, &mystery, dec("0"), dec("0")).is_none());
    }

    /// The alert reports the location, both threshold forms, and the
    /// current quantity
    #[test]
    fn test_alert_payload() {
        let rules = standard_rules();
        let nova = chemical("Nova", PurchaseUnit::Box, Some("5"));

        let alert = check_low_stock(&rules, &nova, dec("7.5"), dec("0")).unwrap();
        assert_eq!(alert.chemical_name, "Nova");
        assert_eq!(alert.unit, PurchaseUnit::Box);
        assert_eq!(alert.location, Location::Shelf);
        assert_eq!(alert.threshold, dec("2"));
        assert_eq!(alert.threshold_gallons, dec("10"));
        assert_eq!(alert.current, dec("7.5"));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn quantity_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..=10000i64).prop_map(|n| Decimal::new(n, 2)) // 0.00 to 100.00
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// A strict rule alerts exactly when current < threshold
        #[test]
        fn prop_strict_rule_boundary(current in quantity_strategy()) {
            let rules = standard_rules();
            let nova = chemical("Nova", PurchaseUnit::Box, Some("5"));

            let alert = check_low_stock(&rules, &nova, current, Decimal::ZERO);
            prop_assert_eq!(alert.is_some(), current < dec("10"));
        }

        /// The inclusive rule alerts exactly when current <= threshold
        #[test]
        fn prop_inclusive_rule_boundary(current in quantity_strategy()) {
            let rules = standard_rules();
            let bottles = chemical("Bottles", PurchaseUnit::Box, None);

            let alert = check_low_stock(&rules, &bottles, current, Decimal::ZERO);
            prop_assert_eq!(alert.is_some(), current <= dec("0.5"));
        }

        /// Shelf-watched rules never read the line quantity
        #[test]
        fn prop_shelf_rules_ignore_line(
            shelf in quantity_strategy(),
            line in quantity_strategy()
        ) {
            let rules = standard_rules();
            let shine = chemical("Tire Shine", PurchaseUnit::Barrel, Some("30"));

            let with_line = check_low_stock(&rules, &shine, shelf, line).is_some();
            let without_line = check_low_stock(&rules, &shine, shelf, Decimal::ZERO).is_some();
            prop_assert_eq!(with_line, without_line);
        }
    }
}
