//! HTTP handlers for plans, checkout and the payment webhook

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};
use shared::{ActionResult, Plan, PlanTier, SubscriptionStatus};

use crate::error::AppResult;
use crate::external::checkout::CheckoutSession;
use crate::middleware::CurrentUser;
use crate::services::billing::SIGNATURE_HEADER;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CheckoutInput {
    pub plan: PlanTier,
    pub promo_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub received: bool,
    pub subscription_status: SubscriptionStatus,
}

/// The pricing page catalog
pub async fn list_plans(State(state): State<AppState>) -> Json<Vec<Plan>> {
    Json(state.billing().plans().to_vec())
}

pub async fn create_checkout(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CheckoutInput>,
) -> AppResult<Json<ActionResult<CheckoutSession>>> {
    let result = state
        .billing()
        .start_checkout(
            &state.checkout,
            current_user.0.user_id,
            &current_user.0.token,
            input.plan,
            input.promo_code.as_deref(),
        )
        .await?;
    Ok(Json(result))
}

/// Signed events from the checkout function. Reads the raw body so the
/// signature is checked over the exact bytes sent.
pub async fn handle_checkout_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<WebhookResponse>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());
    let subscription_status = state
        .billing()
        .handle_webhook(&state.config.payments.webhook_secret, &body, signature)
        .await?;
    Ok(Json(WebhookResponse {
        received: true,
        subscription_status,
    }))
}
