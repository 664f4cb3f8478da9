//! Subscription checkout and payment webhooks

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use shared::{plan, plan_catalog, ActionResult, Plan, PlanTier, SubscriptionStatus};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::external::checkout::{CheckoutClient, CheckoutSession};
use crate::services::referral::ReferralService;
use crate::store::Store;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying base64(HMAC-SHA256(secret, body))
pub const SIGNATURE_HEADER: &str = "x-checkout-signature";

/// Events posted by the checkout function
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CheckoutEvent {
    /// `session_id` is the provider's checkout session; retries repeat it
    CheckoutCompleted {
        user_id: Uuid,
        session_id: String,
        plan: PlanTier,
        amount: Decimal,
    },
    SubscriptionRenewed {
        user_id: Uuid,
    },
    PaymentFailed {
        user_id: Uuid,
    },
    SubscriptionCanceled {
        user_id: Uuid,
    },
}

impl CheckoutEvent {
    pub fn user_id(&self) -> Uuid {
        match self {
            CheckoutEvent::CheckoutCompleted { user_id, .. }
            | CheckoutEvent::SubscriptionRenewed { user_id }
            | CheckoutEvent::PaymentFailed { user_id }
            | CheckoutEvent::SubscriptionCanceled { user_id } => *user_id,
        }
    }
}

/// Status a user ends up with after `event`, given the current one.
/// Lifetime access is never downgraded by subscription events.
pub fn status_after(current: SubscriptionStatus, event: &CheckoutEvent) -> SubscriptionStatus {
    if current == SubscriptionStatus::Lifetime {
        return current;
    }
    match event {
        CheckoutEvent::CheckoutCompleted {
            plan: PlanTier::Lifetime,
            ..
        } => SubscriptionStatus::Lifetime,
        CheckoutEvent::CheckoutCompleted { .. } | CheckoutEvent::SubscriptionRenewed { .. } => {
            SubscriptionStatus::Active
        }
        CheckoutEvent::PaymentFailed { .. } => SubscriptionStatus::PastDue,
        CheckoutEvent::SubscriptionCanceled { .. } => SubscriptionStatus::Canceled,
    }
}

/// Check a webhook signature against the shared secret
pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> AppResult<()> {
    if secret.is_empty() {
        return Err(AppError::Configuration(
            "payments.webhook_secret is not set".to_string(),
        ));
    }
    let provided = BASE64
        .decode(signature.trim())
        .map_err(|_| AppError::Unauthorized("Malformed webhook signature".to_string()))?;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| AppError::Internal("Failed to create HMAC".to_string()))?;
    mac.update(body);
    mac.verify_slice(&provided)
        .map_err(|_| AppError::Unauthorized("Signature mismatch".to_string()))
}

/// Signature the checkout function would send for `body`
pub fn sign(secret: &str, body: &[u8]) -> AppResult<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| AppError::Internal("Failed to create HMAC".to_string()))?;
    mac.update(body);
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

#[derive(Clone)]
pub struct BillingService {
    store: Arc<dyn Store>,
    referrals: ReferralService,
}

impl BillingService {
    pub fn new(store: Arc<dyn Store>, referrals: ReferralService) -> Self {
        Self { store, referrals }
    }

    pub fn plans(&self) -> [Plan; 3] {
        plan_catalog()
    }

    /// Start a checkout session for the signed-in user
    pub async fn start_checkout(
        &self,
        client: &CheckoutClient,
        user_id: Uuid,
        access_token: &str,
        tier: PlanTier,
        promo_code: Option<&str>,
    ) -> AppResult<ActionResult<CheckoutSession>> {
        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))?;
        if user.subscription_status == SubscriptionStatus::Lifetime {
            return Ok(ActionResult::failure("You already have lifetime access"));
        }
        if user.subscription_status == SubscriptionStatus::Active && tier != PlanTier::Lifetime {
            return Ok(ActionResult::failure("Your subscription is already active"));
        }

        let session = client
            .create_session(access_token, &plan(tier), promo_code)
            .await?;
        tracing::info!(user_id = %user_id, plan = tier.as_str(), "checkout session created");
        Ok(ActionResult::ok("Redirecting to checkout", session))
    }

    /// Apply a verified webhook event
    pub async fn apply_event(&self, event: &CheckoutEvent) -> AppResult<SubscriptionStatus> {
        let user_id = event.user_id();
        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        let status = status_after(user.subscription_status, event);
        if status != user.subscription_status {
            self.store.set_subscription_status(user_id, status).await?;
            tracing::info!(
                user_id = %user_id,
                from = ?user.subscription_status,
                to = ?status,
                "subscription status changed"
            );
        }

        if let CheckoutEvent::CheckoutCompleted {
            session_id,
            plan,
            amount,
            ..
        } = event
        {
            self.referrals
                .record_conversion(user_id, session_id, *plan, *amount)
                .await?;
        }
        Ok(status)
    }

    /// Verify, parse and apply a raw webhook body
    pub async fn handle_webhook(
        &self,
        secret: &str,
        body: &[u8],
        signature: Option<&str>,
    ) -> AppResult<SubscriptionStatus> {
        let signature = signature
            .ok_or_else(|| AppError::Unauthorized(format!("Missing {} header", SIGNATURE_HEADER)))?;
        verify_signature(secret, body, signature)?;
        let event: CheckoutEvent = serde_json::from_slice(body)
            .map_err(|e| AppError::ValidationError(format!("Invalid webhook payload: {}", e)))?;
        self.apply_event(&event).await
    }
}
