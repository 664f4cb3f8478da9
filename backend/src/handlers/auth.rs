//! HTTP handlers for sign-up, sign-in and the account

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};
use shared::{validate_email, SignInInput, SignUpInput, User};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::external::auth_api::AuthSession;
use crate::middleware::CurrentUser;
use crate::services::account::AccountView;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct SignUpResponse {
    pub user: User,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailInput {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct W9Response {
    pub path: String,
}

/// Create an account; the auth service sends the verification email
pub async fn sign_up(
    State(state): State<AppState>,
    Json(input): Json<SignUpInput>,
) -> AppResult<Json<SignUpResponse>> {
    let user = state.accounts().sign_up(&state.auth_api, input).await?;
    Ok(Json(SignUpResponse {
        user,
        message: "Check your email to verify your account".to_string(),
    }))
}

pub async fn sign_in(
    State(state): State<AppState>,
    Json(input): Json<SignInInput>,
) -> AppResult<Json<AuthSession>> {
    input.validate()?;
    let session = state
        .auth_api
        .sign_in(input.email.trim(), &input.password)
        .await?;
    tracing::info!(user_id = %session.user.id, "user signed in");
    Ok(Json(session))
}

pub async fn sign_out(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<MessageResponse>> {
    state.auth_api.sign_out(&current_user.0.token).await?;
    Ok(MessageResponse::new("Signed out"))
}

/// Always answers the same way so the endpoint can't probe for accounts
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(input): Json<EmailInput>,
) -> AppResult<Json<MessageResponse>> {
    validate_email(input.email.trim()).map_err(|m| AppError::validation("email", m))?;
    if let Err(e) = state.auth_api.recover(input.email.trim()).await {
        tracing::warn!("password reset request failed: {}", e);
    }
    Ok(MessageResponse::new(
        "If an account exists for that email, a reset link is on its way",
    ))
}

pub async fn resend_verification(
    State(state): State<AppState>,
    Json(input): Json<EmailInput>,
) -> AppResult<Json<MessageResponse>> {
    validate_email(input.email.trim()).map_err(|m| AppError::validation("email", m))?;
    state.auth_api.resend_verification(input.email.trim()).await?;
    Ok(MessageResponse::new("Verification email sent"))
}

/// Current user with the flags the route guards need
pub async fn me(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<AccountView>> {
    let view = state
        .accounts()
        .me(current_user.0.user_id, state.config.features)
        .await?;
    Ok(Json(view))
}

/// Upload a W-9 (multipart field `file`, PDF only)
pub async fn upload_w9(
    State(state): State<AppState>,
    current_user: CurrentUser,
    mut multipart: Multipart,
) -> AppResult<Json<W9Response>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::ValidationError(format!("Invalid upload: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::ValidationError(format!("Invalid upload: {}", e)))?;
        let path = state
            .accounts()
            .upload_w9(&state.storage, current_user.0.user_id, &content_type, bytes.to_vec())
            .await?;
        return Ok(Json(W9Response { path }));
    }
    Err(AppError::validation("file", "A PDF file is required"))
}
