//! HTTP handlers for business profiles, the directory and favorites

use axum::{
    extract::{Path, Query, State},
    Json,
};
use shared::{
    step_completion, ActionResult, Business, BusinessSummary, DirectoryFilter, Favorite,
    PaginatedResponse, Pagination, ProfileStatus, StepCompletion, UpdateBusinessInput,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::business::BusinessDetail;
use crate::AppState;

// ============================================================================
// Own Profile
// ============================================================================

pub async fn get_my_business(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Business>> {
    let business = state
        .businesses()
        .get_mine(current_user.0.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Business".to_string()))?;
    Ok(Json(business))
}

/// Save onboarding or any wizard step
pub async fn update_my_business(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<UpdateBusinessInput>,
) -> AppResult<Json<Business>> {
    let business = state
        .businesses()
        .update_profile(current_user.0.user_id, input)
        .await?;
    Ok(Json(business))
}

pub async fn get_profile_status(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<ProfileStatus>> {
    let status = state.businesses().status(current_user.0.user_id).await?;
    Ok(Json(status))
}

/// Per-step done flags for the profile wizard
pub async fn get_wizard_steps(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<StepCompletion>>> {
    let business = state
        .businesses()
        .get_mine(current_user.0.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Business".to_string()))?;
    Ok(Json(step_completion(&business)))
}

pub async fn publish_business(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<ActionResult<Business>>> {
    let result = state.businesses().publish(current_user.0.user_id).await?;
    Ok(Json(result))
}

pub async fn unpublish_business(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Business>> {
    let business = state.businesses().unpublish(current_user.0.user_id).await?;
    Ok(Json(business))
}

// ============================================================================
// Directory
// ============================================================================

pub async fn list_directory(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filter): Query<DirectoryFilter>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<PaginatedResponse<BusinessSummary>>> {
    let businesses = state.businesses().directory(&filter).await?;
    Ok(Json(PaginatedResponse::page_of(businesses, &pagination)))
}

pub async fn get_business(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(business_id): Path<Uuid>,
) -> AppResult<Json<BusinessDetail>> {
    let detail = state
        .businesses()
        .detail(current_user.0.user_id, business_id)
        .await?;
    Ok(Json(detail))
}

// ============================================================================
// Favorites
// ============================================================================

pub async fn list_favorites(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<BusinessSummary>>> {
    let favorites = state
        .businesses()
        .list_favorites(current_user.0.user_id)
        .await?;
    Ok(Json(favorites))
}

pub async fn add_favorite(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(business_id): Path<Uuid>,
) -> AppResult<Json<ActionResult<Favorite>>> {
    let result = state
        .businesses()
        .add_favorite(current_user.0.user_id, business_id)
        .await?;
    Ok(Json(result))
}

pub async fn remove_favorite(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(business_id): Path<Uuid>,
) -> AppResult<Json<ActionResult<()>>> {
    let result = state
        .businesses()
        .remove_favorite(current_user.0.user_id, business_id)
        .await?;
    Ok(Json(result))
}
