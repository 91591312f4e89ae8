//! HTTP handlers for the restock request workflow

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::requests::{
    CreateRequestInput, FulfillInput, FulfillReceipt, OpenRequest, RequestBatchDetail,
};
use crate::AppState;

/// Open a restock request batch
pub async fn create_request(
    State(state): State<AppState>,
    Json(input): Json<CreateRequestInput>,
) -> AppResult<Json<RequestBatchDetail>> {
    let service = state.requests();
    let batch = service.create(input).await?;
    Ok(Json(batch))
}

/// Get the currently open request batch, or `null` when none is open
pub async fn get_open_request(
    State(state): State<AppState>,
) -> AppResult<Json<Option<OpenRequest>>> {
    let service = state.requests();
    let open = service.open().await?;
    Ok(Json(open))
}

/// Get a request batch by id
pub async fn get_request_batch(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
) -> AppResult<Json<RequestBatchDetail>> {
    let service = state.requests();
    let batch = service.get(batch_id).await?;
    Ok(Json(batch))
}

/// Fulfill an open request batch, recording the actual pickups
pub async fn fulfill_request(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
    Json(input): Json<FulfillInput>,
) -> AppResult<Json<FulfillReceipt>> {
    let service = state.requests();
    let receipt = service.fulfill(batch_id, input).await?;
    Ok(Json(receipt))
}
