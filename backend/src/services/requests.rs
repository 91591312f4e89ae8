//! Restock request workflow
//!
//! A request batch opens with the items an operator wants restocked and is
//! closed exactly once by fulfillment, which records the actual pickups
//! against the ledger. At most one batch may be open at a time; creation
//! rejects a second open batch and a partial unique index backstops the
//! race.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{ActivityType, RequestStatus};
use crate::services::catalog::CatalogService;
use crate::services::ledger::{
    apply_shelf_increment, insert_activity_log, insert_usage_history, normalize_note,
};
use crate::services::mirror::MirrorService;
use shared::types::{Location, PurchaseUnit};
use shared::units;
use shared::validation;

/// Name of the partial unique index that enforces a single open batch
const SINGLE_OPEN_BATCH_INDEX: &str = "request_batches_single_open";

/// Request workflow service
#[derive(Clone)]
pub struct RequestService {
    db: PgPool,
    mirror: MirrorService,
}

/// One requested or picked-up item, in whole purchase units
#[derive(Debug, Deserialize)]
pub struct RequestItemInput {
    pub chemical_id: Uuid,
    pub qty: Decimal,
}

/// Input for creating a restock request
#[derive(Debug, Deserialize)]
pub struct CreateRequestInput {
    pub items: Vec<RequestItemInput>,
    pub note: Option<String>,
}

/// Input for fulfilling a request batch
#[derive(Debug, Deserialize)]
pub struct FulfillInput {
    #[serde(default)]
    pub pickups: Vec<RequestItemInput>,
    pub note: Option<String>,
}

/// Item of the currently open request, with the entry increment for the
/// fulfillment form
#[derive(Debug, Serialize)]
pub struct OpenRequestItem {
    pub chemical_id: Uuid,
    pub chemical_name: String,
    pub requested_qty: Decimal,
    pub increment: Decimal,
    pub unit: PurchaseUnit,
}

/// The currently open request batch
#[derive(Debug, Serialize)]
pub struct OpenRequest {
    pub batch_id: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub items: Vec<OpenRequestItem>,
}

/// Item of a request batch detail view
#[derive(Debug, Serialize)]
pub struct RequestBatchItem {
    pub chemical_id: Uuid,
    pub chemical_name: String,
    pub requested_qty: Decimal,
    pub picked_up_qty: Decimal,
}

/// Full view of a request batch
#[derive(Debug, Serialize)]
pub struct RequestBatchDetail {
    pub batch_id: Uuid,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fulfilled_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub items: Vec<RequestBatchItem>,
}

/// Outcome of fulfilling a batch
#[derive(Debug, Serialize)]
pub struct FulfillReceipt {
    pub batch_id: Uuid,
    pub fulfilled_at: DateTime<Utc>,
    /// Batch id shared by the pickup log rows, absent when the batch was
    /// closed without taking anything
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickup_batch_id: Option<Uuid>,
    pub pickups_recorded: usize,
}

#[derive(Debug, FromRow)]
struct BatchRow {
    id: Uuid,
    status: String,
    note: Option<String>,
    created_at: DateTime<Utc>,
    fulfilled_at: Option<DateTime<Utc>>,
}

impl BatchRow {
    fn status(&self) -> AppResult<RequestStatus> {
        RequestStatus::parse(&self.status)
            .ok_or_else(|| AppError::Internal(format!("unknown request status: {}", self.status)))
    }
}

#[derive(Debug, FromRow)]
struct ItemRow {
    chemical_id: Uuid,
    chemical_name: String,
    requested_qty: Decimal,
    picked_up_qty: Decimal,
}

impl RequestService {
    /// Create a new RequestService instance
    pub fn new(db: PgPool, mirror: MirrorService) -> Self {
        Self { db, mirror }
    }

    /// Open a restock request. Entries with non-positive quantities are
    /// ignored; everything else must be a whole purchase-unit count of a
    /// known chemical. Fails when a request is already open.
    pub async fn create(&self, input: CreateRequestInput) -> AppResult<RequestBatchDetail> {
        let note = normalize_note(input.note);

        let requested: Vec<&RequestItemInput> = input
            .items
            .iter()
            .filter(|item| item.qty > Decimal::ZERO)
            .collect();
        let ids: Vec<Uuid> = requested.iter().map(|item| item.chemical_id).collect();
        let chemicals = CatalogService::new(self.db.clone()).find_for(&ids).await?;

        let mut errors = Vec::new();
        let mut valid = Vec::new();
        for item in &requested {
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
            return Err(AppError::Validation {
                field: "items".to_string(),
                message: "No valid items to request".to_string(),
            });
        }

        if self.open_batch_id().await?.is_some() {
            return Err(AppError::Conflict(
                "A restock request is already open".to_string(),
            ));
        }

        let mut tx = self.db.begin().await?;

        let batch_id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO request_batches (status, note) VALUES ('OPEN', $1) RETURNING id",
        )
        .bind(note.as_deref())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, SINGLE_OPEN_BATCH_INDEX) {
                AppError::Conflict("A restock request is already open".to_string())
            } else {
                AppError::DatabaseError(e)
            }
        })?;

        for (chemical, qty) in &valid {
            sqlx::query(
                "INSERT INTO request_items (batch_id, chemical_id, requested_qty) VALUES ($1, $2, $3)",
            )
            .bind(batch_id)
            .bind(chemical.id)
            .bind(qty)
            .execute(&mut *tx)
            .await?;
        }

        // One log row for the whole batch, anchored to the first requested
        // chemical, with a back-reference for cross-log navigation
        let (first_chemical, first_qty) = valid[0];
        let log_note = match &note {
            Some(n) => format!("RequestBatch:{} - {}", batch_id, n),
            None => format!("RequestBatch:{}", batch_id),
        };
        let log_id = insert_activity_log(
            &mut tx,
            ActivityType::Request,
            first_chemical.id,
            None,
            None,
            None,
            Some(first_qty),
            Some(&log_note),
            None,
        )
        .await?;

        tx.commit().await?;

        self.mirror.spawn_after_commit(vec![log_id], Vec::new(), false);

        self.get(batch_id).await
    }

    /// The most recently created open batch with its items, or `None`
    pub async fn open(&self) -> AppResult<Option<OpenRequest>> {
        let batch = sqlx::query_as::<_, BatchRow>(
            r#"
            SELECT id, status, note, created_at, fulfilled_at
            FROM request_batches
            WHERE status = 'OPEN'
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.db)
        .await?;

        let Some(batch) = batch else {
            return Ok(None);
        };

        let items = self.batch_items(batch.id).await?;
        let ids: Vec<Uuid> = items.iter().map(|i| i.chemical_id).collect();
        let chemicals = CatalogService::new(self.db.clone()).find_for(&ids).await?;

        let mut open_items = Vec::with_capacity(items.len());
        for item in items {
            let chemical = chemicals.get(&item.chemical_id).ok_or_else(|| {
                AppError::Internal(format!("request item references unknown chemical {}", item.chemical_id))
            })?;
            open_items.push(OpenRequestItem {
                chemical_id: item.chemical_id,
                chemical_name: item.chemical_name,
                requested_qty: item.requested_qty,
                increment: units::request_increment(chemical),
                unit: chemical.unit,
            });
        }

        Ok(Some(OpenRequest {
            batch_id: batch.id,
            created_at: batch.created_at,
            note: batch.note,
            items: open_items,
        }))
    }

    /// Full view of one batch
    pub async fn get(&self, batch_id: Uuid) -> AppResult<RequestBatchDetail> {
        let batch = self.batch(batch_id).await?;
        let status = batch.status()?;
        let items = self.batch_items(batch_id).await?;

        Ok(RequestBatchDetail {
            batch_id: batch.id,
            status,
            created_at: batch.created_at,
            fulfilled_at: batch.fulfilled_at,
            note: batch.note,
            items: items
                .into_iter()
                .map(|i| RequestBatchItem {
                    chemical_id: i.chemical_id,
                    chemical_name: i.chemical_name,
                    requested_qty: i.requested_qty,
                    picked_up_qty: i.picked_up_qty,
                })
                .collect(),
        })
    }

    /// Fulfill an open batch. Pickups may cover requested items or anything
    /// else the operator grabbed; both hit the shelf identically. The batch
    /// transitions to FULFILLED even when nothing was picked up.
    pub async fn fulfill(&self, batch_id: Uuid, input: FulfillInput) -> AppResult<FulfillReceipt> {
        let batch = self.batch(batch_id).await?;
        if batch.status()? != RequestStatus::Open {
            return Err(AppError::InvalidStateTransition(format!(
                "Request batch {} is not open",
                batch_id
            )));
        }

        let batch_items = sqlx::query_as::<_, (Uuid, Uuid)>(
            "SELECT id, chemical_id FROM request_items WHERE batch_id = $1",
        )
        .bind(batch_id)
        .fetch_all(&self.db)
        .await?;

        let note = normalize_note(input.note);
        let pickups: Vec<&RequestItemInput> = input
            .pickups
            .iter()
            .filter(|p| p.qty > Decimal::ZERO)
            .collect();
        let ids: Vec<Uuid> = pickups.iter().map(|p| p.chemical_id).collect();
        let chemicals = CatalogService::new(self.db.clone()).find_for(&ids).await?;

        let mut errors = Vec::new();
        let mut valid = Vec::new();
        for pickup in &pickups {
            match chemicals.get(&pickup.chemical_id) {
                None => errors.push(format!("Chemical {} not found", pickup.chemical_id)),
                Some(chemical) => {
                    match validation::validate_whole_quantity(chemical, Location::Shelf, pickup.qty) {
                        Err(reason) => errors.push(format!("{}: {}", chemical.name, reason)),
                        Ok(()) => valid.push((chemical, pickup.qty)),
                    }
                }
            }
        }
        if !errors.is_empty() {
            return Err(AppError::BatchValidation(errors));
        }

        let pickup_batch_id = Uuid::new_v4();
        let mut log_ids = Vec::with_capacity(valid.len());
        let mut usage_ids = Vec::with_capacity(valid.len());

        let mut tx = self.db.begin().await?;
        for (chemical, qty) in &valid {
            let gallons = units::to_gallons(chemical, *qty);
            apply_shelf_increment(&mut tx, chemical.id, gallons).await?;

            let requested_item = batch_items
                .iter()
                .find(|(_, chemical_id)| *chemical_id == chemical.id);
            let line_note = fulfillment_note(batch_id, requested_item.is_some(), note.as_deref());

            let log_id = insert_activity_log(
                &mut tx,
                ActivityType::Pickup,
                chemical.id,
                Some(Location::Shelf),
                None,
                Some(*qty),
                None,
                Some(&line_note),
                Some(pickup_batch_id),
            )
            .await?;
            log_ids.push(log_id);

            let usage_id = insert_usage_history(
                &mut tx,
                chemical,
                gallons,
                *qty,
                Location::Shelf,
                Some(&line_note),
            )
            .await?;
            usage_ids.push(usage_id);

            if let Some((item_id, _)) = requested_item {
                sqlx::query(
                    "UPDATE request_items SET picked_up_qty = picked_up_qty + $1 WHERE id = $2",
                )
                .bind(qty)
                .bind(item_id)
                .execute(&mut *tx)
                .await?;
            }
        }

        let fulfilled_at = sqlx::query_scalar::<_, DateTime<Utc>>(
            r#"
            UPDATE request_batches
            SET status = 'FULFILLED', fulfilled_at = now()
            WHERE id = $1
            RETURNING fulfilled_at
            "#,
        )
        .bind(batch_id)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        let state_changed = !valid.is_empty();
        self.mirror.spawn_after_commit(log_ids, usage_ids, state_changed);

        Ok(FulfillReceipt {
            batch_id,
            fulfilled_at,
            pickup_batch_id: state_changed.then_some(pickup_batch_id),
            pickups_recorded: valid.len(),
        })
    }

    async fn batch(&self, batch_id: Uuid) -> AppResult<BatchRow> {
        sqlx::query_as::<_, BatchRow>(
            "SELECT id, status, note, created_at, fulfilled_at FROM request_batches WHERE id = $1",
        )
        .bind(batch_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Request batch".to_string()))
    }

    async fn batch_items(&self, batch_id: Uuid) -> AppResult<Vec<ItemRow>> {
        let items = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT ri.chemical_id, c.name AS chemical_name,
                   ri.requested_qty, ri.picked_up_qty
            FROM request_items ri
            JOIN chemicals c ON c.id = ri.chemical_id
            WHERE ri.batch_id = $1 AND ri.requested_qty > 0
            ORDER BY c.name
            "#,
        )
        .bind(batch_id)
        .fetch_all(&self.db)
        .await?;
        Ok(items)
    }

    async fn open_batch_id(&self) -> AppResult<Option<Uuid>> {
        let id = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM request_batches WHERE status = 'OPEN' ORDER BY created_at DESC LIMIT 1",
        )
        .fetch_optional(&self.db)
        .await?;
        Ok(id)
    }
}

fn fulfillment_note(batch_id: Uuid, was_requested: bool, note: Option<&str>) -> String {
    let prefix = if was_requested {
        format!("Fulfilled from RequestBatch:{}", batch_id)
    } else {
        format!("Picked up with RequestBatch:{}", batch_id)
    };
    match note {
        Some(n) => format!("{} - {}", prefix, n),
        None => prefix,
    }
}

fn is_unique_violation(error: &sqlx::Error, constraint: &str) -> bool {
    matches!(
        error,
        sqlx::Error::Database(db) if db.constraint() == Some(constraint)
    )
}
