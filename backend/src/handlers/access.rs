//! Route guard resolution for the front-end shell
//!
//! Public: anonymous visitors get the same answer the shell would compute
//! for a signed-out session.

use axum::{
    extract::{Query, State},
    http::{header::AUTHORIZATION, HeaderMap},
    Json,
};
use serde::{Deserialize, Serialize};
use shared::{guard_for_path, resolve_route, RouteDecision, RouteGuard, SessionFlags};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::auth::decode_jwt;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AccessQuery {
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct AccessResponse {
    pub path: String,
    pub guard: RouteGuard,
    pub session: SessionFlags,
    pub decision: RouteDecision,
}

/// Bearer user id, if the header carries a valid session token
fn session_user(headers: &HeaderMap, secret: &str) -> Option<Uuid> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))?;
    let claims = decode_jwt(token.trim(), secret).ok()?;
    Uuid::parse_str(&claims.sub).ok()
}

pub async fn check_access(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<AccessQuery>,
) -> AppResult<Json<AccessResponse>> {
    let session = match session_user(&headers, &state.config.auth.jwt_secret) {
        Some(user_id) => state.accounts().session_flags(user_id).await?,
        None => SessionFlags::default(),
    };
    let guard = guard_for_path(&query.path);
    let decision = resolve_route(guard, session, state.config.features);
    Ok(Json(AccessResponse {
        path: query.path,
        guard,
        session,
        decision,
    }))
}
