//! Client for the serverless checkout function
//!
//! The function creates a payment-provider checkout session on behalf of the
//! signed-in user and answers with the URL to redirect to.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::{CheckoutMode, Plan, PlanTier};

use crate::config::PaymentsConfig;
use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct CheckoutClient {
    client: Client,
    checkout_url: String,
}

#[derive(Debug, Serialize)]
struct CheckoutRequest<'a> {
    plan: PlanTier,
    mode: CheckoutMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    promo_code: Option<&'a str>,
}

/// Where the browser goes next
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub url: String,
}

impl CheckoutClient {
    pub fn new(config: &PaymentsConfig) -> Self {
        Self {
            client: Client::new(),
            checkout_url: config.checkout_url.clone(),
        }
    }

    /// Start a checkout for `plan`, authenticated as the caller
    pub async fn create_session(
        &self,
        access_token: &str,
        plan: &Plan,
        promo_code: Option<&str>,
    ) -> AppResult<CheckoutSession> {
        let body = CheckoutRequest {
            plan: plan.tier,
            mode: plan.mode,
            promo_code: promo_code.map(str::trim).filter(|c| !c.is_empty()),
        };
        let response = self
            .client
            .post(&self.checkout_url)
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::PaymentError(format!("checkout request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::PaymentError(format!("{} - {}", status, body)));
        }

        let session: CheckoutSession = response
            .json()
            .await
            .map_err(|e| AppError::PaymentError(format!("Failed to parse checkout response: {}", e)))?;
        if session.url.is_empty() {
            return Err(AppError::PaymentError("checkout returned no URL".to_string()));
        }
        Ok(session)
    }
}
