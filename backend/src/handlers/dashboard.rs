//! HTTP handler for the dashboard snapshot

use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::services::ledger::DashboardSnapshot;
use crate::AppState;

/// Get the dashboard snapshot: chemicals with current stock, fleet totals,
/// low-stock report, open-request reference, and recent activity
pub async fn get_dashboard(State(state): State<AppState>) -> AppResult<Json<DashboardSnapshot>> {
    let service = state.ledger();
    let snapshot = service.dashboard().await?;
    Ok(Json(snapshot))
}
