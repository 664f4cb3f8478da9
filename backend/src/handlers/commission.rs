//! HTTP handlers for affiliate commissions

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use shared::{ActionResult, CommissionEvent, EarningsSummary, RecordConversionInput};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::commission::export_to_csv;
use crate::AppState;

#[derive(Deserialize)]
pub struct SummaryQuery {
    pub format: Option<String>, // "json" or "csv"
}

/// Per-affiliate totals for the caller's business
pub async fn get_affiliate_summary(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<SummaryQuery>,
) -> AppResult<impl IntoResponse> {
    let service = state.commissions();

    if query.format.as_deref() == Some("csv") {
        let csv = service.export_summary_csv(current_user.0.user_id).await?;
        Ok((
            [
                (header::CONTENT_TYPE, "text/csv"),
                (header::CONTENT_DISPOSITION, "attachment; filename=\"affiliate_summary.csv\""),
            ],
            csv,
        )
            .into_response())
    } else {
        let data = service.summary(current_user.0.user_id).await?;
        Ok(Json(data).into_response())
    }
}

/// Record a sale against one of the caller's affiliate links
pub async fn record_conversion(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<RecordConversionInput>,
) -> AppResult<(StatusCode, Json<CommissionEvent>)> {
    let event = state
        .commissions()
        .record_sale(current_user.0.user_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn mark_paid(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(affiliate_user_id): Path<Uuid>,
) -> AppResult<Json<ActionResult<u64>>> {
    let result = state
        .commissions()
        .mark_paid(current_user.0.user_id, affiliate_user_id)
        .await?;
    Ok(Json(result))
}

/// What the caller has earned as an affiliate
pub async fn get_earnings(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<SummaryQuery>,
) -> AppResult<impl IntoResponse> {
    let earnings: EarningsSummary = state
        .commissions()
        .earnings(current_user.0.user_id)
        .await?;

    if query.format.as_deref() == Some("csv") {
        let csv = export_to_csv(std::slice::from_ref(&earnings))?;
        Ok((
            [
                (header::CONTENT_TYPE, "text/csv"),
                (header::CONTENT_DISPOSITION, "attachment; filename=\"earnings.csv\""),
            ],
            csv,
        )
            .into_response())
    } else {
        Ok(Json(earnings).into_response())
    }
}
