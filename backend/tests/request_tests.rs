//! Restock request workflow tests
//!
//! Exercises the batch state machine in pure form: OPEN to FULFILLED exactly
//! once, over-picking, opportunistic pickups, and the zero-pickup close.

use chrono::{DateTime, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use shared::models::{ChemicalDefinition, RequestStatus};
use shared::types::{Location, PurchaseUnit};
use shared::units;
use shared::validation;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn chemical(name: &str, unit: PurchaseUnit, gallons_per_unit: Option<&str>) -> ChemicalDefinition {
    ChemicalDefinition {
        id: Uuid::new_v4(),
        name: name.to_string(),
        unit,
        increment: dec("0.5"),
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

#[derive(Debug, Clone)]
struct Item {
    chemical_id: Uuid,
    requested_qty: Decimal,
    picked_up_qty: Decimal,
}

#[derive(Debug, Clone)]
struct Batch {
    status: RequestStatus,
    items: Vec<Item>,
    fulfilled_at: Option<DateTime<Utc>>,
}

impl Batch {
    fn open(requests: &[(Uuid, Decimal)]) -> Self {
        Self {
            status: RequestStatus::Open,
            items: requests
                .iter()
                .map(|(chemical_id, qty)| Item {
                    chemical_id: *chemical_id,
                    requested_qty: *qty,
                    picked_up_qty: Decimal::ZERO,
                })
                .collect(),
            fulfilled_at: None,
        }
    }
}

/// Fulfill a batch the way the workflow does: requested items accumulate
/// picked quantities without a cap, other pickups only touch the shelf, and
/// the batch closes even with no pickups at all
fn simulate_fulfill(
    batch: &mut Batch,
    chemicals: &[ChemicalDefinition],
    pickups: &[(Uuid, Decimal)],
    shelf: &mut std::collections::HashMap<Uuid, Decimal>,
) -> Result<(), String> {
    if batch.status != RequestStatus::Open {
        return Err("Request batch is not open".to_string());
    }

    let by_id: std::collections::HashMap<Uuid, &ChemicalDefinition> =
        chemicals.iter().map(|c| (c.id, c)).collect();

    let pickups: Vec<(Uuid, Decimal)> = pickups
        .iter()
        .filter(|(_, qty)| *qty > Decimal::ZERO)
        .copied()
        .collect();

    for (chemical_id, qty) in &pickups {
        let chemical = by_id
            .get(chemical_id)
            .ok_or_else(|| format!("Chemical {} not found", chemical_id))?;
        validation::validate_whole_quantity(chemical, Location::Shelf, *qty)
            .map_err(|e| format!("{}: {}", chemical.name, e))?;
    }

    for (chemical_id, qty) in &pickups {
        let chemical = by_id[chemical_id];
        *shelf.entry(*chemical_id).or_insert(Decimal::ZERO) += units::to_gallons(chemical, *qty);
        if let Some(item) = batch.items.iter_mut().find(|i| i.chemical_id == *chemical_id) {
            item.picked_up_qty += *qty;
        }
    }

    batch.status = RequestStatus::Fulfilled;
    batch.fulfilled_at = Some(Utc::now());
    Ok(())
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// A batch starts OPEN and fulfills to FULFILLED with a timestamp
    #[test]
    fn test_fulfillment_transitions_batch() {
        let nova = chemical("Nova", PurchaseUnit::Box, Some("5"));
        let mut batch = Batch::open(&[(nova.id, dec("2"))]);
        let mut shelf = std::collections::HashMap::new();

        assert_eq!(batch.status, RequestStatus::Open);
        assert!(batch.fulfilled_at.is_none());

        simulate_fulfill(&mut batch, &[nova.clone()], &[(nova.id, dec("2"))], &mut shelf).unwrap();

        assert_eq!(batch.status, RequestStatus::Fulfilled);
        assert!(batch.fulfilled_at.is_some());
        assert_eq!(batch.items[0].picked_up_qty, dec("2"));
        assert_eq!(shelf[&nova.id], dec("10"));
    }

    /// A second fulfillment of the same batch fails
    #[test]
    fn test_refulfillment_rejected() {
        let nova = chemical("Nova", PurchaseUnit::Box, Some("5"));
        let mut batch = Batch::open(&[(nova.id, dec("2"))]);
        let mut shelf = std::collections::HashMap::new();

        simulate_fulfill(&mut batch, &[nova.clone()], &[], &mut shelf).unwrap();
        let err = simulate_fulfill(&mut batch, &[nova.clone()], &[(nova.id, dec("1"))], &mut shelf)
            .unwrap_err();

        assert_eq!(err, "Request batch is not open");
        assert_eq!(shelf.get(&nova.id), None);
    }

    /// Closing a batch without taking anything is a valid fulfillment
    #[test]
    fn test_zero_pickup_fulfillment() {
        let nova = chemical("Nova", PurchaseUnit::Box, Some("5"));
        let mut batch = Batch::open(&[(nova.id, dec("3"))]);
        let mut shelf = std::collections::HashMap::new();

        simulate_fulfill(&mut batch, &[nova.clone()], &[], &mut shelf).unwrap();

        assert_eq!(batch.status, RequestStatus::Fulfilled);
        assert!(batch.fulfilled_at.is_some());
        assert_eq!(batch.items[0].picked_up_qty, Decimal::ZERO);
        assert!(shelf.is_empty());
    }

    /// Over-picking is allowed; picked quantity is never capped at the
    /// requested amount
    #[test]
    fn test_over_pick_accumulates() {
        let shine = chemical("Tire Shine", PurchaseUnit::Barrel, Some("30"));
        let mut batch = Batch::open(&[(shine.id, dec("3"))]);
        let mut shelf = std::collections::HashMap::new();

        simulate_fulfill(&mut batch, &[shine.clone()], &[(shine.id, dec("5"))], &mut shelf).unwrap();

        assert_eq!(batch.items[0].requested_qty, dec("3"));
        assert_eq!(batch.items[0].picked_up_qty, dec("5"));
        assert_eq!(shelf[&shine.id], dec("150"));
    }

    /// Pickups outside the requested items hit the shelf but no item
    #[test]
    fn test_opportunistic_pickup() {
        let nova = chemical("Nova", PurchaseUnit::Box, Some("5"));
        let extra = chemical("Silk", PurchaseUnit::Box, Some("5"));
        let mut batch = Batch::open(&[(nova.id, dec("2"))]);
        let mut shelf = std::collections::HashMap::new();

        simulate_fulfill(
            &mut batch,
            &[nova.clone(), extra.clone()],
            &[(extra.id, dec("1"))],
            &mut shelf,
        )
        .unwrap();

        assert_eq!(shelf[&extra.id], dec("5"));
        assert_eq!(batch.items[0].picked_up_qty, Decimal::ZERO);
        assert_eq!(batch.status, RequestStatus::Fulfilled);
    }

    /// Non-positive pickup quantities are ignored rather than rejected
    #[test]
    fn test_non_positive_pickups_skipped() {
        let nova = chemical("Nova", PurchaseUnit::Box, Some("5"));
        let mut batch = Batch::open(&[(nova.id, dec("2"))]);
        let mut shelf = std::collections::HashMap::new();

        simulate_fulfill(&mut batch, &[nova.clone()], &[(nova.id, dec("0"))], &mut shelf).unwrap();

        assert!(shelf.is_empty());
        assert_eq!(batch.status, RequestStatus::Fulfilled);
    }

    /// Fractional pickup quantities fail fulfillment before any write
    #[test]
    fn test_fractional_pickup_rejected() {
        let nova = chemical("Nova", PurchaseUnit::Box, Some("5"));
        let mut batch = Batch::open(&[(nova.id, dec("2"))]);
        let mut shelf = std::collections::HashMap::new();

        let err = simulate_fulfill(&mut batch, &[nova.clone()], &[(nova.id, dec("1.5"))], &mut shelf)
            .unwrap_err();

        assert!(err.starts_with("Nova:"));
        assert!(shelf.is_empty());
    }

    /// Request quantities are whole purchase units
    #[test]
    fn test_request_quantities_are_whole_units() {
        let shine = chemical("Tire Shine", PurchaseUnit::Barrel, Some("30"));
        assert!(validation::validate_whole_quantity(&shine, Location::Shelf, dec("2")).is_ok());
        assert!(validation::validate_whole_quantity(&shine, Location::Shelf, dec("0.5")).is_err());
    }

    /// The fulfillment form steps buckets in quarters and everything else
    /// by its configured increment
    #[test]
    fn test_request_entry_increment() {
        let glass = chemical("Glass Cleaner", PurchaseUnit::Bucket, Some("5"));
        assert_eq!(units::request_increment(&glass), dec("0.25"));

        let nova = chemical("Nova", PurchaseUnit::Box, Some("5"));
        assert_eq!(units::request_increment(&nova), dec("0.5"));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn whole_units_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=100i64).prop_map(Decimal::from)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Picked-up quantity equals the sum of fulfillment pickups for the
        /// item, independent of the requested amount
        #[test]
        fn prop_picked_up_accumulates_uncapped(
            requested in whole_units_strategy(),
            picked in whole_units_strategy()
        ) {
            let nova = chemical("Nova", PurchaseUnit::Box, Some("5"));
            let mut batch = Batch::open(&[(nova.id, requested)]);
            let mut shelf = std::collections::HashMap::new();

            simulate_fulfill(&mut batch, &[nova.clone()], &[(nova.id, picked)], &mut shelf).unwrap();

            prop_assert_eq!(batch.items[0].picked_up_qty, picked);
            prop_assert_eq!(shelf[&nova.id], units::to_gallons(&nova, picked));
        }

        /// Fulfillment always terminates the batch, whatever the pickups
        #[test]
        fn prop_fulfillment_is_terminal(
            pickups in prop::collection::vec((0i64..=10i64).prop_map(Decimal::from), 0..5)
        ) {
            let nova = chemical("Nova", PurchaseUnit::Box, Some("5"));
            let mut batch = Batch::open(&[(nova.id, dec("2"))]);
            let mut shelf = std::collections::HashMap::new();

            let pickup_items: Vec<(Uuid, Decimal)> =
                pickups.iter().map(|qty| (nova.id, *qty)).collect();
            simulate_fulfill(&mut batch, &[nova.clone()], &pickup_items, &mut shelf).unwrap();

            prop_assert_eq!(batch.status, RequestStatus::Fulfilled);
            prop_assert!(batch.fulfilled_at.is_some());
            prop_assert!(
                simulate_fulfill(&mut batch, &[nova.clone()], &[], &mut shelf).is_err()
            );
        }
    }
}
