//! Chemical catalog lookups

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::ChemicalDefinition;
use shared::types::PurchaseUnit;

/// Catalog service for chemical definitions
#[derive(Clone)]
pub struct CatalogService {
    db: PgPool,
}

/// Row for chemical queries
#[derive(Debug, FromRow)]
struct ChemicalRow {
    id: Uuid,
    name: String,
    unit: String,
    increment: Decimal,
    gallons_per_unit: Option<Decimal>,
    track_on_shelf: bool,
    track_on_line: bool,
    active: bool,
    cost_per_unit: Option<Decimal>,
    sort_order: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ChemicalRow {
    fn into_definition(self) -> AppResult<ChemicalDefinition> {
        let unit = PurchaseUnit::parse(&self.unit)
            .ok_or_else(|| AppError::Internal(format!("unknown purchase unit: {}", self.unit)))?;

        Ok(ChemicalDefinition {
            id: self.id,
            name: self.name,
            unit,
            increment: self.increment,
            gallons_per_unit: self.gallons_per_unit,
            track_on_shelf: self.track_on_shelf,
            track_on_line: self.track_on_line,
            active: self.active,
            cost_per_unit: self.cost_per_unit,
            sort_order: self.sort_order,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const CHEMICAL_COLUMNS: &str = "id, name, unit, increment, gallons_per_unit, track_on_shelf, \
     track_on_line, active, cost_per_unit, sort_order, created_at, updated_at";

impl CatalogService {
    /// Create a new CatalogService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List active chemicals in dashboard order
    pub async fn list_active(&self) -> AppResult<Vec<ChemicalDefinition>> {
        let rows = sqlx::query_as::<_, ChemicalRow>(&format!(
            "SELECT {} FROM chemicals WHERE active ORDER BY sort_order, name",
            CHEMICAL_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(ChemicalRow::into_definition).collect()
    }

    /// Get a chemical by id
    pub async fn get(&self, id: Uuid) -> AppResult<ChemicalDefinition> {
        let row = sqlx::query_as::<_, ChemicalRow>(&format!(
            "SELECT {} FROM chemicals WHERE id = $1",
            CHEMICAL_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Chemical".to_string()))?;

        row.into_definition()
    }

    /// Fetch the definitions for a set of ids in one query, keyed by id.
    /// Ids with no matching chemical are simply absent from the map; callers
    /// report those per item.
    pub async fn find_for(&self, ids: &[Uuid]) -> AppResult<HashMap<Uuid, ChemicalDefinition>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, ChemicalRow>(&format!(
            "SELECT {} FROM chemicals WHERE id = ANY($1)",
            CHEMICAL_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.db)
        .await?;

        let mut chemicals = HashMap::with_capacity(rows.len());
        for row in rows {
            let definition = row.into_definition()?;
            chemicals.insert(definition.id, definition);
        }
        Ok(chemicals)
    }
}
