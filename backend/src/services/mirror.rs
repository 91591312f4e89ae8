//! Spreadsheet mirror of ledger state
//!
//! Exports catalog, inventory state, activity log, and usage history to the
//! reporting spreadsheet. Writes from ledger flows are spawned after commit
//! and any failure is logged and swallowed; the mirror must never fail or
//! roll back the operation that triggered it.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::AppResult;
use crate::external::SheetsClient;

/// Mirror service driving the spreadsheet client from database state
#[derive(Clone)]
pub struct MirrorService {
    db: PgPool,
    sheets: SheetsClient,
}

/// Header rows per spreadsheet tab
const TAB_HEADERS: &[(&str, &[&str])] = &[
    (
        "chemicals",
        &[
            "id",
            "name",
            "unit",
            "increment",
            "track_on_shelf",
            "track_on_line",
            "gallons_per_unit",
            "active",
            "created_at",
            "updated_at",
        ],
    ),
    (
        "inventory_state",
        &[
            "chemical_id",
            "chemical_name",
            "shelf_qty",
            "line_qty",
            "combined_qty",
            "gallons_total",
            "updated_at",
        ],
    ),
    (
        "activity_log",
        &[
            "id",
            "type",
            "chemical_id",
            "chemical_name",
            "location",
            "set_qty",
            "add_qty",
            "request_qty",
            "note",
            "created_by",
            "created_at",
        ],
    ),
    (
        "usage_history",
        &[
            "id",
            "chemical_id",
            "chemical_name",
            "event_type",
            "quantity_gallons",
            "quantity_units",
            "unit",
            "location",
            "cost_per_unit",
            "total_cost",
            "note",
            "recorded_at",
        ],
    ),
];

/// Render an optional value as a cell, empty when absent
fn cell<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[derive(Debug, FromRow)]
struct ChemicalExportRow {
    id: Uuid,
    name: String,
    unit: String,
    increment: Decimal,
    track_on_shelf: bool,
    track_on_line: bool,
    gallons_per_unit: Option<Decimal>,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct InventoryExportRow {
    chemical_id: Uuid,
    chemical_name: String,
    shelf_qty: Decimal,
    line_qty: Decimal,
    gallons_per_unit: Option<Decimal>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct ActivityExportRow {
    id: Uuid,
    entry_type: String,
    chemical_id: Uuid,
    chemical_name: String,
    location: Option<String>,
    set_qty: Option<Decimal>,
    add_qty: Option<Decimal>,
    request_qty: Option<Decimal>,
    note: Option<String>,
    created_by: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct UsageExportRow {
    id: Uuid,
    chemical_id: Uuid,
    chemical_name: String,
    event_type: String,
    quantity_gallons: Decimal,
    quantity_units: Decimal,
    unit: String,
    location: String,
    cost_per_unit: Option<Decimal>,
    total_cost: Option<Decimal>,
    note: Option<String>,
    recorded_at: DateTime<Utc>,
}

impl MirrorService {
    /// Create a new MirrorService instance
    pub fn new(db: PgPool, sheets: SheetsClient) -> Self {
        Self { db, sheets }
    }

    /// Write the header row of every tab
    pub async fn ensure_headers(&self) -> AppResult<()> {
        if !self.sheets.enabled() {
            return Ok(());
        }

        for (tab, headers) in TAB_HEADERS {
            let row: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
            self.sheets
                .update_range(&format!("{}!A1", tab), vec![row])
                .await?;
        }
        Ok(())
    }

    /// Bulk-replace the chemicals tab
    pub async fn sync_chemicals(&self) -> AppResult<()> {
        if !self.sheets.enabled() {
            return Ok(());
        }

        let chemicals = sqlx::query_as::<_, ChemicalExportRow>(
            r#"
            SELECT id, name, unit, increment, track_on_shelf, track_on_line,
                   gallons_per_unit, active, created_at, updated_at
            FROM chemicals
            ORDER BY name
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let rows: Vec<Vec<String>> = chemicals
            .into_iter()
            .map(|c| {
                vec![
                    c.id.to_string(),
                    c.name,
                    c.unit,
                    c.increment.to_string(),
                    c.track_on_shelf.to_string(),
                    c.track_on_line.to_string(),
                    cell(c.gallons_per_unit),
                    c.active.to_string(),
                    c.created_at.to_rfc3339(),
                    c.updated_at.to_rfc3339(),
                ]
            })
            .collect();

        self.sheets.clear_range("chemicals!A2:J1000").await?;
        if !rows.is_empty() {
            self.sheets.update_range("chemicals!A2", rows).await?;
        }
        Ok(())
    }

    /// Bulk-replace the inventory_state tab
    pub async fn sync_inventory_state(&self) -> AppResult<()> {
        if !self.sheets.enabled() {
            return Ok(());
        }

        let inventories = sqlx::query_as::<_, InventoryExportRow>(
            r#"
            SELECT i.chemical_id, c.name AS chemical_name, i.shelf_qty, i.line_qty,
                   c.gallons_per_unit, i.updated_at
            FROM inventory_state i
            JOIN chemicals c ON c.id = i.chemical_id
            ORDER BY c.name
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let rows: Vec<Vec<String>> = inventories
            .into_iter()
            .map(|i| {
                let combined = i.shelf_qty + i.line_qty;
                // Stored quantities are already gallons for converted items;
                // box-counted items have no gallon total
                let gallons_total = i.gallons_per_unit.map(|_| combined);
                vec![
                    i.chemical_id.to_string(),
                    i.chemical_name,
                    i.shelf_qty.to_string(),
                    i.line_qty.to_string(),
                    combined.to_string(),
                    cell(gallons_total),
                    i.updated_at.to_rfc3339(),
                ]
            })
            .collect();

        self.sheets.clear_range("inventory_state!A2:G1000").await?;
        if !rows.is_empty() {
            self.sheets.update_range("inventory_state!A2", rows).await?;
        }
        Ok(())
    }

    /// Append one activity-log row
    pub async fn append_activity_log_row(&self, log_id: Uuid) -> AppResult<()> {
        if !self.sheets.enabled() {
            return Ok(());
        }

        let log = sqlx::query_as::<_, ActivityExportRow>(
            r#"
            SELECT a.id, a.type AS entry_type, a.chemical_id, c.name AS chemical_name,
                   a.location, a.set_qty, a.add_qty, a.request_qty, a.note,
                   a.created_by, a.created_at
            FROM activity_log a
            JOIN chemicals c ON c.id = a.chemical_id
            WHERE a.id = $1
            "#,
        )
        .bind(log_id)
        .fetch_optional(&self.db)
        .await?;

        let Some(log) = log else {
            tracing::warn!("activity log {} not found for export", log_id);
            return Ok(());
        };

        let row = vec![
            log.id.to_string(),
            log.entry_type,
            log.chemical_id.to_string(),
            log.chemical_name,
            cell(log.location),
            cell(log.set_qty),
            cell(log.add_qty),
            cell(log.request_qty),
            cell(log.note),
            cell(log.created_by),
            log.created_at.to_rfc3339(),
        ];

        self.sheets.append_row("activity_log!A:A", row).await
    }

    /// Append one usage-history row
    pub async fn append_usage_history_row(&self, usage_id: Uuid) -> AppResult<()> {
        if !self.sheets.enabled() {
            return Ok(());
        }

        let record = sqlx::query_as::<_, UsageExportRow>(
            r#"
            SELECT id, chemical_id, chemical_name, event_type, quantity_gallons,
                   quantity_units, unit, location, cost_per_unit, total_cost,
                   note, recorded_at
            FROM usage_history
            WHERE id = $1
            "#,
        )
        .bind(usage_id)
        .fetch_optional(&self.db)
        .await?;

        let Some(record) = record else {
            tracing::warn!("usage history {} not found for export", usage_id);
            return Ok(());
        };

        self.sheets
            .append_row("usage_history!A:A", Self::usage_row(record))
            .await
    }

    /// Bulk-replace the usage_history tab with the newest records, capped to
    /// keep the sheet a manageable size
    pub async fn sync_usage_history(&self) -> AppResult<()> {
        if !self.sheets.enabled() {
            return Ok(());
        }

        let records = sqlx::query_as::<_, UsageExportRow>(
            r#"
            SELECT id, chemical_id, chemical_name, event_type, quantity_gallons,
                   quantity_units, unit, location, cost_per_unit, total_cost,
                   note, recorded_at
            FROM usage_history
            ORDER BY recorded_at DESC
            LIMIT 5000
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let rows: Vec<Vec<String>> = records.into_iter().map(Self::usage_row).collect();

        self.sheets.clear_range("usage_history!A2:L6000").await?;
        if !rows.is_empty() {
            self.sheets.update_range("usage_history!A2", rows).await?;
        }
        Ok(())
    }

    fn usage_row(record: UsageExportRow) -> Vec<String> {
        vec![
            record.id.to_string(),
            record.chemical_id.to_string(),
            record.chemical_name,
            record.event_type,
            record.quantity_gallons.to_string(),
            record.quantity_units.to_string(),
            record.unit,
            record.location,
            cell(record.cost_per_unit),
            cell(record.total_cost),
            cell(record.note),
            record.recorded_at.to_rfc3339(),
        ]
    }

    /// Headers plus a full backfill, run once at startup
    pub async fn startup_backfill(&self) -> AppResult<()> {
        self.ensure_headers().await?;
        self.sync_chemicals().await?;
        self.sync_inventory_state().await?;
        Ok(())
    }

    /// Export the rows written by a committed ledger operation without
    /// blocking the caller. Failures are logged and suppressed.
    pub fn spawn_after_commit(&self, log_ids: Vec<Uuid>, usage_ids: Vec<Uuid>, state_changed: bool) {
        if !self.sheets.enabled() {
            return;
        }

        let mirror = self.clone();
        tokio::spawn(async move {
            for log_id in log_ids {
                if let Err(e) = mirror.append_activity_log_row(log_id).await {
                    tracing::warn!("activity log export failed: {}", e);
                }
            }
            for usage_id in usage_ids {
                if let Err(e) = mirror.append_usage_history_row(usage_id).await {
                    tracing::warn!("usage history export failed: {}", e);
                }
            }
            if state_changed {
                if let Err(e) = mirror.sync_inventory_state().await {
                    tracing::warn!("inventory state export failed: {}", e);
                }
            }
        });
    }
}
