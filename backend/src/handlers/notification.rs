//! HTTP handlers for in-app notifications

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use shared::{ChannelFilter, Notification};
use uuid::Uuid;

use crate::error::AppResult;
use crate::handlers::message::ChannelResponse;
use crate::middleware::CurrentUser;
use crate::AppState;

/// Query parameters for listing notifications
#[derive(Debug, Deserialize)]
pub struct ListNotificationsQuery {
    pub unread_only: Option<bool>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct MarkAllReadResponse {
    pub marked_count: u64,
}

/// Get in-app notifications
pub async fn get_notifications(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ListNotificationsQuery>,
) -> AppResult<Json<Vec<Notification>>> {
    let notifications = state
        .notifications()
        .list(
            current_user.0.user_id,
            query.unread_only.unwrap_or(false),
            query.limit,
        )
        .await?;
    Ok(Json(notifications))
}

/// Get unread notification count
pub async fn get_unread_count(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<UnreadCountResponse>> {
    let count = state
        .notifications()
        .unread_count(current_user.0.user_id)
        .await?;
    Ok(Json(UnreadCountResponse { count }))
}

/// Mark notification as read
pub async fn mark_as_read(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(notification_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state
        .notifications()
        .mark_as_read(current_user.0.user_id, notification_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Mark all notifications as read
pub async fn mark_all_as_read(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<MarkAllReadResponse>> {
    let marked_count = state
        .notifications()
        .mark_all_as_read(current_user.0.user_id)
        .await?;
    Ok(Json(MarkAllReadResponse { marked_count }))
}

/// Realtime subscription for the caller's new notifications
pub async fn get_notification_channel(current_user: CurrentUser) -> Json<ChannelResponse> {
    Json(ChannelFilter::notifications(current_user.0.user_id).into())
}
