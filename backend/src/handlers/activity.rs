//! HTTP handler for activity-log detail lookups

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::ledger::ActivityDetail;
use crate::AppState;

/// Get one activity-log entry with its chemical name
pub async fn get_activity_detail(
    State(state): State<AppState>,
    Path(log_id): Path<Uuid>,
) -> AppResult<Json<ActivityDetail>> {
    let service = state.ledger();
    let detail = service.activity_detail(log_id).await?;
    Ok(Json(detail))
}
