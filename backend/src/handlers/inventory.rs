//! HTTP handlers for inventory ledger writes

use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::services::ledger::{PickupInput, UpdateInput, WriteReceipt};
use crate::AppState;

/// Record a multi-item pickup onto the shelf
pub async fn record_pickup(
    State(state): State<AppState>,
    Json(input): Json<PickupInput>,
) -> AppResult<Json<WriteReceipt>> {
    let service = state.ledger();
    let receipt = service.record_pickup(input).await?;
    Ok(Json(receipt))
}

/// Set absolute quantities at one location
pub async fn record_update(
    State(state): State<AppState>,
    Json(input): Json<UpdateInput>,
) -> AppResult<Json<WriteReceipt>> {
    let service = state.ledger();
    let receipt = service.record_update(input).await?;
    Ok(Json(receipt))
}
