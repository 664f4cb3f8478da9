//! HTTP handlers for connections between users

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use shared::{ActionResult, Connection, ConnectionStatus, ConnectionView};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ConnectionRequestInput {
    pub recipient_user_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ConnectionStatusResponse {
    pub user_id: Uuid,
    pub status: ConnectionStatus,
}

pub async fn list_connections(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<ConnectionView>>> {
    let connections = state.connections().list(current_user.0.user_id).await?;
    Ok(Json(connections))
}

/// Connection status with another user, from the caller's side
pub async fn get_connection_status(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(other_user_id): Path<Uuid>,
) -> AppResult<Json<ConnectionStatusResponse>> {
    let status = state
        .connections()
        .status(current_user.0.user_id, other_user_id)
        .await?;
    Ok(Json(ConnectionStatusResponse {
        user_id: other_user_id,
        status,
    }))
}

pub async fn send_request(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<ConnectionRequestInput>,
) -> AppResult<Json<ActionResult<Connection>>> {
    let result = state
        .connections()
        .send_request(current_user.0.user_id, input.recipient_user_id)
        .await?;
    Ok(Json(result))
}

pub async fn accept_request(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(connection_id): Path<Uuid>,
) -> AppResult<Json<ActionResult<Connection>>> {
    let result = state
        .connections()
        .accept(connection_id, current_user.0.user_id)
        .await?;
    Ok(Json(result))
}

pub async fn decline_request(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(connection_id): Path<Uuid>,
) -> AppResult<Json<ActionResult<Connection>>> {
    let result = state
        .connections()
        .decline(connection_id, current_user.0.user_id)
        .await?;
    Ok(Json(result))
}

pub async fn cancel_request(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(connection_id): Path<Uuid>,
) -> AppResult<Json<ActionResult<()>>> {
    let result = state
        .connections()
        .cancel(connection_id, current_user.0.user_id)
        .await?;
    Ok(Json(result))
}
