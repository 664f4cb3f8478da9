//! HTTP handlers for the offer vault

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use shared::{ActionResult, VaultEntry, VaultItem};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AddToVaultInput {
    pub offer_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ReconcileResponse {
    pub approved: u64,
}

pub async fn list_vault(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<VaultItem>>> {
    let items = state.vault().list(current_user.0.user_id).await?;
    Ok(Json(items))
}

/// Save an offer; sends a connection request to its owner when needed
pub async fn add_to_vault(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<AddToVaultInput>,
) -> AppResult<Json<ActionResult<VaultEntry>>> {
    let result = state
        .vault()
        .add(current_user.0.user_id, input.offer_id)
        .await?;
    Ok(Json(result))
}

pub async fn remove_from_vault(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(entry_id): Path<Uuid>,
) -> AppResult<Json<ActionResult<()>>> {
    let result = state
        .vault()
        .remove(current_user.0.user_id, entry_id)
        .await?;
    Ok(Json(result))
}

/// Approve entries whose connection was accepted but never cascaded
pub async fn reconcile_vault(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<ReconcileResponse>> {
    let approved = state.vault().reconcile(current_user.0.user_id).await?;
    Ok(Json(ReconcileResponse { approved }))
}
