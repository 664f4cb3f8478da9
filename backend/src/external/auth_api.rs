//! Client for the hosted auth service
//!
//! Account credentials never touch this backend's store: sign-up, sign-in,
//! password reset and verification emails are all delegated. The service
//! issues HS256 session JWTs which the auth middleware validates locally.

use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct AuthApiClient {
    client: Client,
    base_url: String,
    anon_key: String,
    redirect_url: String,
}

/// Account record as returned by the auth service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthAccount {
    pub id: Uuid,
    pub email: Option<String>,
    pub email_confirmed_at: Option<String>,
}

/// Session issued on sign-in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: AuthAccount,
}

/// Sign-up answers with either a bare account (email confirmation on) or a
/// full session (confirmation off)
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(AuthSession),
    Account(AuthAccount),
}

#[derive(Debug, Deserialize)]
struct AuthErrorBody {
    msg: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
}

impl AuthApiClient {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.api_url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            redirect_url: config.redirect_url.clone(),
        }
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .header("apikey", &self.anon_key)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> AppResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| AppError::AuthService(format!("Auth service request failed: {}", e)))?;
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<AuthErrorBody>(&body)
            .ok()
            .and_then(|b| b.msg.or(b.error_description).or(b.message))
            .unwrap_or_else(|| format!("Auth service error: {}", status));
        tracing::warn!(%status, "auth service rejected request: {}", message);

        Err(match status {
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::UNPROCESSABLE_ENTITY => {
                AppError::Unauthorized(message)
            }
            StatusCode::TOO_MANY_REQUESTS => AppError::AuthService(
                "Too many attempts, please wait a moment and try again".to_string(),
            ),
            _ => AppError::AuthService(message),
        })
    }

    /// Create an account. Profile fields ride along as user metadata.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> AppResult<AuthAccount> {
        let request = self
            .post(&format!("/signup?redirect_to={}", self.redirect_url))
            .json(&json!({
                "email": email,
                "password": password,
                "data": { "full_name": full_name },
            }));
        let response = self.send(request).await?;
        let parsed: SignUpResponse = response
            .json()
            .await
            .map_err(|e| AppError::AuthService(format!("Failed to parse sign-up response: {}", e)))?;
        Ok(match parsed {
            SignUpResponse::Session(session) => session.user,
            SignUpResponse::Account(account) => account,
        })
    }

    /// Password grant
    pub async fn sign_in(&self, email: &str, password: &str) -> AppResult<AuthSession> {
        let request = self
            .post("/token?grant_type=password")
            .json(&json!({ "email": email, "password": password }));
        let response = self.send(request).await.map_err(|e| match e {
            AppError::Unauthorized(_) => {
                AppError::Unauthorized("Invalid email or password".to_string())
            }
            other => other,
        })?;
        response
            .json()
            .await
            .map_err(|e| AppError::AuthService(format!("Failed to parse session: {}", e)))
    }

    pub async fn sign_out(&self, access_token: &str) -> AppResult<()> {
        let request = self.post("/logout").bearer_auth(access_token);
        self.send(request).await?;
        Ok(())
    }

    /// Send a password reset email
    pub async fn recover(&self, email: &str) -> AppResult<()> {
        let request = self
            .post(&format!("/recover?redirect_to={}/reset-password", self.redirect_url))
            .json(&json!({ "email": email }));
        self.send(request).await?;
        Ok(())
    }

    /// Re-send the sign-up verification email
    pub async fn resend_verification(&self, email: &str) -> AppResult<()> {
        let request = self
            .post("/resend")
            .json(&json!({ "type": "signup", "email": email }));
        self.send(request).await?;
        Ok(())
    }
}
