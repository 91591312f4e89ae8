//! Display and dashboard reporting helpers
//!
//! Pure functions behind the dashboard read path: quantity display strings,
//! fleet-wide totals per purchase-unit category, and the batch-grouped
//! recent-activity feed.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::models::{ActivityType, ChemicalDefinition};
use crate::types::{Location, PurchaseUnit};
use crate::units;

/// Render a stored quantity for display, e.g. "12.5 gal (2.5 boxes)" for a
/// converted item or "0.75 boxes" for a box-counted one
pub fn format_quantity(chemical: &ChemicalDefinition, gallons: Decimal) -> String {
    match chemical.gallons_per_unit {
        Some(_) => {
            let units = units::to_units(chemical, gallons);
            format!(
                "{:.1} gal ({:.1} {})",
                gallons,
                units,
                unit_label(chemical.unit, units)
            )
        }
        None => {
            let qty = gallons.normalize();
            format!("{} {}", qty, unit_label(chemical.unit, qty))
        }
    }
}

fn unit_label(unit: PurchaseUnit, qty: Decimal) -> &'static str {
    if qty == Decimal::ONE {
        unit.label()
    } else {
        unit.label_plural()
    }
}

/// Fleet-wide stock totals per purchase-unit category
#[derive(Debug, Clone, Default, Serialize)]
pub struct FleetTotals {
    pub total_gallons: Decimal,
    pub total_boxes: Decimal,
    pub total_barrels: Decimal,
    pub total_buckets: Decimal,
}

impl FleetTotals {
    /// Fold one chemical's current stock into the totals
    pub fn accumulate(&mut self, chemical: &ChemicalDefinition, shelf_qty: Decimal, line_qty: Decimal) {
        let combined = shelf_qty + line_qty;
        match chemical.gallons_per_unit {
            Some(_) => {
                self.total_gallons += combined;
                let units = units::to_units(chemical, combined);
                match chemical.unit {
                    PurchaseUnit::Box => self.total_boxes += units,
                    PurchaseUnit::Barrel => self.total_barrels += units,
                    PurchaseUnit::Bucket => self.total_buckets += units,
                }
            }
            // Box-counted stock contributes straight to the box total
            None => self.total_boxes += combined,
        }
    }
}

/// One activity-log row, denormalized for feed rendering
#[derive(Debug, Clone)]
pub struct FeedEntry {
    pub id: Uuid,
    pub entry_type: ActivityType,
    pub chemical_name: String,
    pub location: Option<Location>,
    pub set_qty: Option<Decimal>,
    pub add_qty: Option<Decimal>,
    pub request_qty: Option<Decimal>,
    pub note: Option<String>,
    pub batch_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// One display item in the recent-activity feed: either a standalone log row
/// or every row written by one batched user action
#[derive(Debug, Clone, Serialize)]
pub struct ActivityGroup {
    /// Id of the newest log row in the group, for detail lookups
    pub id: Uuid,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Collapse log rows into display groups. Rows sharing a batch id become one
/// group; rows without one stand alone. `entries` must be ordered newest
/// first, and at most `cap` groups are returned, newest first.
pub fn group_feed(entries: &[FeedEntry], cap: usize) -> Vec<ActivityGroup> {
    let mut groups = Vec::new();
    let mut seen_batches = std::collections::HashSet::new();

    for entry in entries {
        if groups.len() >= cap {
            break;
        }
        match entry.batch_id {
            Some(batch_id) => {
                if !seen_batches.insert(batch_id) {
                    continue;
                }
                let members: Vec<&FeedEntry> = entries
                    .iter()
                    .filter(|e| e.batch_id == Some(batch_id))
                    .collect();
                groups.push(ActivityGroup {
                    id: entry.id,
                    message: feed_message(&members),
                    note: entry.note.clone(),
                    created_at: entry.created_at,
                });
            }
            None => groups.push(ActivityGroup {
                id: entry.id,
                message: feed_message(&[entry]),
                note: entry.note.clone(),
                created_at: entry.created_at,
            }),
        }
    }

    groups
}

fn location_phrase(location: Option<Location>) -> &'static str {
    match location.unwrap_or(Location::Shelf) {
        Location::Shelf => "On the Shelf",
        Location::Line => "On the Line",
    }
}

fn qty_text(qty: Option<Decimal>) -> String {
    qty.unwrap_or_default().normalize().to_string()
}

fn feed_message(members: &[&FeedEntry]) -> String {
    let first = members[0];

    if members.len() == 1 {
        return match first.entry_type {
            ActivityType::Pickup => format!(
                "Picked up {} {} ({})",
                qty_text(first.add_qty),
                first.chemical_name,
                location_phrase(first.location)
            ),
            ActivityType::Update => format!(
                "Updated {} {} to {}",
                first.chemical_name,
                location_phrase(first.location),
                qty_text(first.set_qty)
            ),
            ActivityType::Request => match first.request_qty.filter(|q| *q > Decimal::ZERO) {
                Some(qty) => format!("Requested {} ({})", first.chemical_name, qty.normalize()),
                None => format!("Requested {}", first.chemical_name),
            },
        };
    }

    match first.entry_type {
        ActivityType::Pickup => {
            let items: Vec<String> = members
                .iter()
                .map(|e| format!("{} ({})", e.chemical_name, qty_text(e.add_qty)))
                .collect();
            format!(
                "Picked up chemicals: {} ({})",
                items.join(", "),
                location_phrase(first.location)
            )
        }
        ActivityType::Update => {
            let items: Vec<String> = members
                .iter()
                .map(|e| format!("{} -> {}", e.chemical_name, qty_text(e.set_qty)))
                .collect();
            format!(
                "Updated inventory ({}): {}",
                location_phrase(first.location),
                items.join(", ")
            )
        }
        ActivityType::Request => {
            let items: Vec<String> = members
                .iter()
                .map(|e| match e.request_qty.filter(|q| *q > Decimal::ZERO) {
                    Some(qty) => format!("{} ({})", e.chemical_name, qty.normalize()),
                    None => e.chemical_name.clone(),
                })
                .collect();
            format!("Requested: {}", items.join(", "))
        }
    }
}
