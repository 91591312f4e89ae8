//! HTTP handler for the chemical catalog

use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::models::ChemicalDefinition;
use crate::AppState;

/// List active chemicals in dashboard order
pub async fn list_chemicals(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<ChemicalDefinition>>> {
    let service = state.catalog();
    let chemicals = service.list_active().await?;
    Ok(Json(chemicals))
}
