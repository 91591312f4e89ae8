//! Inventory ledger: pickups, absolute quantity updates, and the dashboard
//! read path
//!
//! Every mutating operation validates all of its items before touching the
//! database, then applies the inventory change and its log rows in one
//! transaction. The two write operations deliberately take different units:
//! pickups are counted in purchase units lifted off the shelf, while updates
//! carry the stored quantity an operator read off a gauge.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{ActivityType, ChemicalDefinition};
use crate::services::catalog::CatalogService;
use crate::services::mirror::MirrorService;
use shared::reporting::{self, ActivityGroup, FeedEntry, FleetTotals};
use shared::thresholds::{self, LowStockAlert};
use shared::types::{Location, PurchaseUnit};
use shared::units;
use shared::validation;

/// How many log rows the feed scans and how many groups it returns
const FEED_SCAN_LIMIT: i64 = 200;
const FEED_GROUP_CAP: usize = 50;

/// Ledger service for inventory writes and dashboard reads
#[derive(Clone)]
pub struct LedgerService {
    db: PgPool,
    mirror: MirrorService,
}

/// One item of a multi-item ledger write
#[derive(Debug, Deserialize)]
pub struct LedgerItemInput {
    pub chemical_id: Uuid,
    pub qty: Decimal,
}

/// Input for recording a pickup; quantities are whole purchase units and
/// always land on the shelf
#[derive(Debug, Deserialize)]
pub struct PickupInput {
    pub items: Vec<LedgerItemInput>,
    pub note: Option<String>,
}

/// Input for an absolute quantity update at one location; quantities are in
/// stored units (gallons, or purchase units for box-counted items)
#[derive(Debug, Deserialize)]
pub struct UpdateInput {
    pub items: Vec<LedgerItemInput>,
    pub location: Location,
    pub note: Option<String>,
}

/// Outcome of a ledger write
#[derive(Debug, Serialize)]
pub struct WriteReceipt {
    /// Batch id shared by the log rows of this write, absent when nothing
    /// was recorded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<Uuid>,
    pub recorded: usize,
}

/// Per-chemical entry of the dashboard snapshot
#[derive(Debug, Serialize)]
pub struct ChemicalStatus {
    pub id: Uuid,
    pub name: String,
    pub unit: PurchaseUnit,
    pub allowed_locations: Vec<Location>,
    pub shelf_increment: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_increment: Option<Decimal>,
    pub request_increment: Decimal,
    pub shelf_qty: Decimal,
    pub line_qty: Decimal,
    pub shelf_display: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_display: Option<String>,
    pub combined_display: String,
}

/// Everything the dashboard needs in one payload
#[derive(Debug, Serialize)]
pub struct DashboardSnapshot {
    pub chemicals: Vec<ChemicalStatus>,
    pub totals: FleetTotals,
    pub low_stock: Vec<LowStockAlert>,
    pub recent_activity: Vec<ActivityGroup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_request_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated_at: Option<DateTime<Utc>>,
}

/// Detail view of one activity-log row
#[derive(Debug, Serialize)]
pub struct ActivityDetail {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub entry_type: ActivityType,
    pub chemical_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set_qty: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_qty: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_qty: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Row for dashboard chemical queries
#[derive(Debug, FromRow)]
struct ChemicalStockRow {
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
    shelf_qty: Decimal,
    line_qty: Decimal,
}

impl ChemicalStockRow {
    fn into_parts(self) -> AppResult<(ChemicalDefinition, Decimal, Decimal)> {
        let unit = PurchaseUnit::parse(&self.unit)
            .ok_or_else(|| AppError::Internal(format!("unknown purchase unit: {}", self.unit)))?;

        let definition = ChemicalDefinition {
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
        };
        Ok((definition, self.shelf_qty, self.line_qty))
    }
}

/// Row for activity feed queries
#[derive(Debug, FromRow)]
struct ActivityRow {
    id: Uuid,
    entry_type: String,
    chemical_name: String,
    location: Option<String>,
    set_qty: Option<Decimal>,
    add_qty: Option<Decimal>,
    request_qty: Option<Decimal>,
    note: Option<String>,
    batch_id: Option<Uuid>,
    created_by: Option<String>,
    created_at: DateTime<Utc>,
}

impl ActivityRow {
    fn entry_type(&self) -> AppResult<ActivityType> {
        ActivityType::parse(&self.entry_type)
            .ok_or_else(|| AppError::Internal(format!("unknown activity type: {}", self.entry_type)))
    }

    fn location(&self) -> Option<Location> {
        self.location.as_deref().and_then(Location::parse)
    }
}

impl LedgerService {
    /// Create a new LedgerService instance
    pub fn new(db: PgPool, mirror: MirrorService) -> Self {
        Self { db, mirror }
    }

    /// Record a multi-item pickup. Quantities are whole purchase units,
    /// converted to stored gallons and added to the shelf.
    pub async fn record_pickup(&self, input: PickupInput) -> AppResult<WriteReceipt> {
        let note = normalize_note(input.note);
        let chemicals = self.load_chemicals(&input.items).await?;

        let mut errors = Vec::new();
        let mut valid = Vec::new();
        for item in &input.items {
            match chemicals.get(&item.chemical_id) {
                None => errors.push(format!("Chemical {} not found", item.chemical_id)),
                Some(chemical) => {
                    match validation::validate_whole_quantity(chemical, Location::Shelf, item.qty) {
                        Err(reason) => errors.push(format!("{}: {}", chemical.name, reason)),
                        Ok(()) => valid.push((chemical, item.qty)),
                    }
                }
            }
        }
        if !errors.is_empty() {
            return Err(AppError::BatchValidation(errors));
        }
        if valid.is_empty() {
            return Ok(WriteReceipt { batch_id: None, recorded: 0 });
        }

        let batch_id = Uuid::new_v4();
        let mut log_ids = Vec::with_capacity(valid.len());
        let mut usage_ids = Vec::with_capacity(valid.len());

        let mut tx = self.db.begin().await?;
        for (chemical, qty) in &valid {
            let gallons = units::to_gallons(chemical, *qty);
            apply_shelf_increment(&mut tx, chemical.id, gallons).await?;

            let log_id = insert_activity_log(
                &mut tx,
                ActivityType::Pickup,
                chemical.id,
                Some(Location::Shelf),
                None,
                Some(*qty),
                None,
                note.as_deref(),
                Some(batch_id),
            )
            .await?;
            log_ids.push(log_id);

            let usage_id =
                insert_usage_history(&mut tx, chemical, gallons, *qty, Location::Shelf, note.as_deref())
                    .await?;
            usage_ids.push(usage_id);
        }
        tx.commit().await?;

        self.mirror.spawn_after_commit(log_ids, usage_ids, true);

        Ok(WriteReceipt {
            batch_id: Some(batch_id),
            recorded: valid.len(),
        })
    }

    /// Set absolute quantities at one location. Update is a correction, not
    /// a consumption event, so it writes no usage history.
    pub async fn record_update(&self, input: UpdateInput) -> AppResult<WriteReceipt> {
        let note = normalize_note(input.note);
        let chemicals = self.load_chemicals(&input.items).await?;

        let mut errors = Vec::new();
        let mut valid = Vec::new();
        for item in &input.items {
            match chemicals.get(&item.chemical_id) {
                None => errors.push(format!("Chemical {} not found", item.chemical_id)),
                Some(chemical) => {
                    match validation::validate_set_quantity(chemical, input.location, item.qty) {
                        Err(reason) => errors.push(format!("{}: {}", chemical.name, reason)),
                        Ok(()) => valid.push((chemical, item.qty)),
                    }
                }
            }
        }
        if !errors.is_empty() {
            return Err(AppError::BatchValidation(errors));
        }
        if valid.is_empty() {
            return Ok(WriteReceipt { batch_id: None, recorded: 0 });
        }

        let batch_id = Uuid::new_v4();
        let mut log_ids = Vec::with_capacity(valid.len());

        let mut tx = self.db.begin().await?;
        for (chemical, qty) in &valid {
            set_location_quantity(&mut tx, chemical.id, input.location, *qty).await?;

            let log_id = insert_activity_log(
                &mut tx,
                ActivityType::Update,
                chemical.id,
                Some(input.location),
                Some(*qty),
                None,
                None,
                note.as_deref(),
                Some(batch_id),
            )
            .await?;
            log_ids.push(log_id);
        }
        tx.commit().await?;

        self.mirror.spawn_after_commit(log_ids, Vec::new(), true);

        Ok(WriteReceipt {
            batch_id: Some(batch_id),
            recorded: valid.len(),
        })
    }

    /// Assemble the dashboard snapshot: per-chemical state with display
    /// conversions, fleet totals, low-stock report, open-request reference,
    /// and the grouped recent-activity feed
    pub async fn dashboard(&self) -> AppResult<DashboardSnapshot> {
        let rows = sqlx::query_as::<_, ChemicalStockRow>(
            r#"
            SELECT c.id, c.name, c.unit, c.increment, c.gallons_per_unit,
                   c.track_on_shelf, c.track_on_line, c.active, c.cost_per_unit,
                   c.sort_order, c.created_at, c.updated_at,
                   COALESCE(i.shelf_qty, 0) AS shelf_qty,
                   COALESCE(i.line_qty, 0) AS line_qty
            FROM chemicals c
            LEFT JOIN inventory_state i ON i.chemical_id = c.id
            WHERE c.active
            ORDER BY c.sort_order, c.name
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let rules = thresholds::standard_rules();
        let mut chemicals = Vec::with_capacity(rows.len());
        let mut totals = FleetTotals::default();
        let mut low_stock = Vec::new();

        for row in rows {
            let (definition, shelf_qty, line_qty) = row.into_parts()?;

            totals.accumulate(&definition, shelf_qty, line_qty);
            if let Some(alert) = thresholds::check_low_stock(&rules, &definition, shelf_qty, line_qty)
            {
                low_stock.push(alert);
            }

            let line_tracked = definition.track_on_line;
            chemicals.push(ChemicalStatus {
                id: definition.id,
                name: definition.name.clone(),
                unit: definition.unit,
                allowed_locations: units::allowed_locations(&definition),
                shelf_increment: units::storage_increment(&definition),
                line_increment: line_tracked.then(|| units::storage_increment(&definition)),
                request_increment: units::request_increment(&definition),
                shelf_qty,
                line_qty,
                shelf_display: reporting::format_quantity(&definition, shelf_qty),
                line_display: line_tracked.then(|| reporting::format_quantity(&definition, line_qty)),
                combined_display: reporting::format_quantity(&definition, shelf_qty + line_qty),
            });
        }

        let recent_activity = self.recent_activity().await?;
        let open_request_id = self.open_request_id().await?;
        let last_updated_at = self.last_updated_at().await?;

        Ok(DashboardSnapshot {
            chemicals,
            totals,
            low_stock,
            recent_activity,
            open_request_id,
            last_updated_at,
        })
    }

    /// Detail view of one activity-log row
    pub async fn activity_detail(&self, log_id: Uuid) -> AppResult<ActivityDetail> {
        let row = sqlx::query_as::<_, ActivityRow>(
            r#"
            SELECT a.id, a.type AS entry_type, c.name AS chemical_name, a.location,
                   a.set_qty, a.add_qty, a.request_qty, a.note, a.batch_id,
                   a.created_by, a.created_at
            FROM activity_log a
            JOIN chemicals c ON c.id = a.chemical_id
            WHERE a.id = $1
            "#,
        )
        .bind(log_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Activity log".to_string()))?;

        let entry_type = row.entry_type()?;
        let positive = |qty: Option<Decimal>| qty.filter(|q| *q > Decimal::ZERO);

        Ok(ActivityDetail {
            id: row.id,
            entry_type,
            location: row.location(),
            set_qty: positive(row.set_qty),
            add_qty: positive(row.add_qty),
            request_qty: positive(row.request_qty),
            note: row.note,
            created_by: row.created_by,
            created_at: row.created_at,
            chemical_name: row.chemical_name,
        })
    }

    async fn recent_activity(&self) -> AppResult<Vec<ActivityGroup>> {
        let rows = sqlx::query_as::<_, ActivityRow>(
            r#"
            SELECT a.id, a.type AS entry_type, c.name AS chemical_name, a.location,
                   a.set_qty, a.add_qty, a.request_qty, a.note, a.batch_id,
                   a.created_by, a.created_at
            FROM activity_log a
            JOIN chemicals c ON c.id = a.chemical_id
            ORDER BY a.created_at DESC
            LIMIT $1
            "#,
        )
        .bind(FEED_SCAN_LIMIT)
        .fetch_all(&self.db)
        .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let entry_type = row.entry_type()?;
            entries.push(FeedEntry {
                id: row.id,
                entry_type,
                location: row.location(),
                chemical_name: row.chemical_name,
                set_qty: row.set_qty,
                add_qty: row.add_qty,
                request_qty: row.request_qty,
                note: row.note,
                batch_id: row.batch_id,
                created_at: row.created_at,
            });
        }

        Ok(reporting::group_feed(&entries, FEED_GROUP_CAP))
    }

    async fn open_request_id(&self) -> AppResult<Option<Uuid>> {
        let id = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM request_batches WHERE status = 'OPEN' ORDER BY created_at DESC LIMIT 1",
        )
        .fetch_optional(&self.db)
        .await?;
        Ok(id)
    }

    async fn last_updated_at(&self) -> AppResult<Option<DateTime<Utc>>> {
        let from_state = sqlx::query_scalar::<_, Option<DateTime<Utc>>>(
            "SELECT MAX(updated_at) FROM inventory_state",
        )
        .fetch_one(&self.db)
        .await?;

        if from_state.is_some() {
            return Ok(from_state);
        }

        // No inventory rows yet; fall back to the newest mutating log entry
        let from_log = sqlx::query_scalar::<_, DateTime<Utc>>(
            r#"
            SELECT created_at FROM activity_log
            WHERE type IN ('PICKUP', 'UPDATE')
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.db)
        .await?;
        Ok(from_log)
    }

    async fn load_chemicals(
        &self,
        items: &[LedgerItemInput],
    ) -> AppResult<std::collections::HashMap<Uuid, ChemicalDefinition>> {
        let ids: Vec<Uuid> = items.iter().map(|i| i.chemical_id).collect();
        CatalogService::new(self.db.clone()).find_for(&ids).await
    }
}

/// Trim a caller-supplied note, dropping it when empty
pub(crate) fn normalize_note(note: Option<String>) -> Option<String> {
    note.and_then(|n| {
        let trimmed = n.trim().to_string();
        (!trimmed.is_empty()).then_some(trimmed)
    })
}

/// Add stored gallons to a chemical's shelf, creating the inventory row on
/// first write. The increment happens inside the upsert so concurrent
/// pickups of the same chemical serialize on the row.
pub(crate) async fn apply_shelf_increment(
    tx: &mut Transaction<'_, Postgres>,
    chemical_id: Uuid,
    gallons: Decimal,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO inventory_state (chemical_id, shelf_qty, line_qty)
        VALUES ($1, $2, 0)
        ON CONFLICT (chemical_id) DO UPDATE
        SET shelf_qty = inventory_state.shelf_qty + EXCLUDED.shelf_qty,
            updated_at = now()
        "#,
    )
    .bind(chemical_id)
    .bind(gallons)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Set a chemical's stored quantity at one location absolutely, creating the
/// inventory row on first write
pub(crate) async fn set_location_quantity(
    tx: &mut Transaction<'_, Postgres>,
    chemical_id: Uuid,
    location: Location,
    qty: Decimal,
) -> AppResult<()> {
    let sql = match location {
        Location::Shelf => {
            r#"
            INSERT INTO inventory_state (chemical_id, shelf_qty, line_qty)
            VALUES ($1, $2, 0)
            ON CONFLICT (chemical_id) DO UPDATE
            SET shelf_qty = EXCLUDED.shelf_qty, updated_at = now()
            "#
        }
        Location::Line => {
            r#"
            INSERT INTO inventory_state (chemical_id, shelf_qty, line_qty)
            VALUES ($1, 0, $2)
            ON CONFLICT (chemical_id) DO UPDATE
            SET line_qty = EXCLUDED.line_qty, updated_at = now()
            "#
        }
    };

    sqlx::query(sql)
        .bind(chemical_id)
        .bind(qty)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Insert one activity-log row and return its id
#[allow(clippy::too_many_arguments)]
pub(crate) async fn insert_activity_log(
    tx: &mut Transaction<'_, Postgres>,
    entry_type: ActivityType,
    chemical_id: Uuid,
    location: Option<Location>,
    set_qty: Option<Decimal>,
    add_qty: Option<Decimal>,
    request_qty: Option<Decimal>,
    note: Option<&str>,
    batch_id: Option<Uuid>,
) -> AppResult<Uuid> {
    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO activity_log (type, chemical_id, location, set_qty, add_qty, request_qty, note, batch_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id
        "#,
    )
    .bind(entry_type.as_str())
    .bind(chemical_id)
    .bind(location.map(|l| l.as_str()))
    .bind(set_qty)
    .bind(add_qty)
    .bind(request_qty)
    .bind(note)
    .bind(batch_id)
    .fetch_one(&mut **tx)
    .await?;
    Ok(id)
}

/// Insert one usage-history row for a quantity-increasing event and return
/// its id. Costs are filled in from the chemical's configured unit cost.
pub(crate) async fn insert_usage_history(
    tx: &mut Transaction<'_, Postgres>,
    chemical: &ChemicalDefinition,
    gallons: Decimal,
    units_qty: Decimal,
    location: Location,
    note: Option<&str>,
) -> AppResult<Uuid> {
    let total_cost = chemical.cost_per_unit.map(|cost| cost * units_qty);

    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO usage_history (chemical_id, chemical_name, event_type, quantity_gallons,
                                   quantity_units, unit, location, cost_per_unit, total_cost, note)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING id
        "#,
    )
    .bind(chemical.id)
    .bind(&chemical.name)
    .bind(ActivityType::Pickup.as_str())
    .bind(gallons)
    .bind(units_qty)
    .bind(chemical.unit.as_str())
    .bind(location.as_str())
    .bind(chemical.cost_per_unit)
    .bind(total_cost)
    .bind(note)
    .fetch_one(&mut **tx)
    .await?;
    Ok(id)
}
