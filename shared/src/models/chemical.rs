//! Chemical catalog models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{Location, PurchaseUnit};

/// Static configuration for one tracked chemical
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChemicalDefinition {
    pub id: Uuid,
    pub name: String,
    pub unit: PurchaseUnit,
    /// Allowed step size, in purchase units, for items counted directly in
    /// purchase units
    pub increment: Decimal,
    /// Gallons per purchase unit. `None` means the item has no gallon
    /// conversion and its stored quantities are purchase-unit counts.
    /// Strictly positive when present (schema contract).
    pub gallons_per_unit: Option<Decimal>,
    pub track_on_shelf: bool,
    pub track_on_line: bool,
    pub active: bool,
    pub cost_per_unit: Option<Decimal>,
    /// Dashboard display position
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChemicalDefinition {
    /// Whether quantities are tracked at the given location
    pub fn tracks(&self, location: Location) -> bool {
        match location {
            Location::Shelf => self.track_on_shelf,
            Location::Line => self.track_on_line,
        }
    }
}
