//! Low-stock threshold policy
//!
//! Restock thresholds are business policy that varies per chemical, so the
//! policy lives in a data table of rules rather than chained conditionals.
//! Each rule names the chemicals it selects, the location it watches, and
//! how its configured threshold translates into stored quantities.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::ChemicalDefinition;
use crate::types::{Location, PurchaseUnit};
use crate::units;

/// How a rule picks the chemicals it applies to
#[derive(Debug, Clone)]
pub enum RuleSelector {
    /// Exact catalog name
    Name(String),
    /// Name prefix, used for chemical families stocked in variants
    NamePrefix(String),
    /// Any chemical bought in the given unit with the given gallon
    /// conversion, when no more specific rule matched
    UnitConversion {
        unit: PurchaseUnit,
        gallons_per_unit: Decimal,
    },
}

impl RuleSelector {
    fn matches(&self, chemical: &ChemicalDefinition) -> bool {
        match self {
            RuleSelector::Name(name) => chemical.name == *name,
            RuleSelector::NamePrefix(prefix) => chemical.name.starts_with(prefix.as_str()),
            RuleSelector::UnitConversion { unit, gallons_per_unit } => {
                chemical.unit == *unit && chemical.gallons_per_unit == Some(*gallons_per_unit)
            }
        }
    }
}

/// How the current quantity is compared against the threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Below,
    AtOrBelow,
}

/// What the configured threshold number is denominated in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdKind {
    /// Already in stored gallons
    Gallons,
    /// Purchase units, converted through the chemical's gallon conversion
    PurchaseUnits,
}

/// One row of the low-stock policy table
#[derive(Debug, Clone)]
pub struct LowStockRule {
    pub selector: RuleSelector,
    pub location: Location,
    pub threshold: Decimal,
    pub threshold_kind: ThresholdKind,
    pub comparison: Comparison,
}

impl LowStockRule {
    fn threshold_gallons(&self, chemical: &ChemicalDefinition) -> Decimal {
        match self.threshold_kind {
            ThresholdKind::Gallons => self.threshold,
            ThresholdKind::PurchaseUnits => units::to_gallons(chemical, self.threshold),
        }
    }
}

/// A chemical that needs restocking
#[derive(Debug, Clone, Serialize)]
pub struct LowStockAlert {
    pub chemical_name: String,
    pub unit: PurchaseUnit,
    pub location: Location,
    /// Threshold as configured in the rule table, for display
    pub threshold: Decimal,
    /// Threshold in stored units
    pub threshold_gallons: Decimal,
    /// Current stored quantity at the watched location
    pub current: Decimal,
}

/// The standing restock policy
pub fn standard_rules() -> Vec<LowStockRule> {
    fn name(n: &str) -> RuleSelector {
        RuleSelector::Name(n.to_string())
    }

    vec![
        // Clean kits are box-counted and consumed on the line
        LowStockRule {
            selector: name("Clean Kit"),
            location: Location::Line,
            threshold: Decimal::from(2),
            threshold_kind: ThresholdKind::PurchaseUnits,
            comparison: Comparison::Below,
        },
        // Tire shine burns fastest of anything on the shelf
        LowStockRule {
            selector: name("Tire Shine"),
            location: Location::Shelf,
            threshold: Decimal::from(30),
            threshold_kind: ThresholdKind::Gallons,
            comparison: Comparison::Below,
        },
        LowStockRule {
            selector: name("RLC"),
            location: Location::Shelf,
            threshold: Decimal::from(5),
            threshold_kind: ThresholdKind::Gallons,
            comparison: Comparison::Below,
        },
        LowStockRule {
            selector: name("Glass Cleaner"),
            location: Location::Shelf,
            threshold: Decimal::from(5),
            threshold_kind: ThresholdKind::Gallons,
            comparison: Comparison::Below,
        },
        LowStockRule {
            selector: RuleSelector::NamePrefix("Air Freshener".to_string()),
            location: Location::Shelf,
            threshold: Decimal::ONE,
            threshold_kind: ThresholdKind::PurchaseUnits,
            comparison: Comparison::Below,
        },
        // Bottles reorder at the half-box mark, inclusive
        LowStockRule {
            selector: name("Bottles"),
            location: Location::Shelf,
            threshold: Decimal::new(5, 1),
            threshold_kind: ThresholdKind::PurchaseUnits,
            comparison: Comparison::AtOrBelow,
        },
        LowStockRule {
            selector: name("Bottle Triggers"),
            location: Location::Shelf,
            threshold: Decimal::new(5, 1),
            threshold_kind: ThresholdKind::PurchaseUnits,
            comparison: Comparison::Below,
        },
        // Every remaining 5-gallon-box chemical reorders at two boxes
        LowStockRule {
            selector: RuleSelector::UnitConversion {
                unit: PurchaseUnit::Box,
                gallons_per_unit: Decimal::from(5),
            },
            location: Location::Shelf,
            threshold: Decimal::from(2),
            threshold_kind: ThresholdKind::PurchaseUnits,
            comparison: Comparison::Below,
        },
    ]
}

/// Evaluate one chemical against the rule table. The first matching rule
/// decides; chemicals no rule selects are not monitored.
pub fn check_low_stock(
    rules: &[LowStockRule],
    chemical: &ChemicalDefinition,
    shelf_qty: Decimal,
    line_qty: Decimal,
) -> Option<LowStockAlert> {
    let rule = rules.iter().find(|r| r.selector.matches(chemical))?;

    let current = match rule.location {
        Location::Shelf => shelf_qty,
        Location::Line => line_qty,
    };
    let threshold_gallons = rule.threshold_gallons(chemical);
    let is_low = match rule.comparison {
        Comparison::Below => current < threshold_gallons,
        Comparison::AtOrBelow => current <= threshold_gallons,
    };

    is_low.then(|| LowStockAlert {
        chemical_name: chemical.name.clone(),
        unit: chemical.unit,
        location: rule.location,
        threshold: rule.threshold,
        threshold_gallons,
        current,
    })
}
