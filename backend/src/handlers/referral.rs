//! HTTP handlers for short links and the referral dashboard

use axum::{
    extract::{Path, Query, State},
    response::Redirect,
    Json,
};
use serde::Deserialize;
use shared::{LinkKind, ReferralStats};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ClickQuery {
    /// Front-end page the visitor arrived from
    pub from: Option<String>,
}

/// Where a short link visit lands on the front-end
fn landing_url(base: &str, kind: LinkKind, code: &str, known: bool) -> String {
    let base = base.trim_end_matches('/');
    match (kind, known) {
        (_, false) => format!("{}/", base),
        (LinkKind::Platform, true) => format!("{}/signup?ref={}", base, code),
        (LinkKind::Offer, true) => format!("{}/lead/{}", base, code),
    }
}

async fn follow(state: AppState, kind: LinkKind, code: String, from: Option<String>) -> Redirect {
    let known = match state.referrals().record_click(kind, &code, from).await {
        Ok(known) => known,
        Err(e) => {
            // A failed click count must not break the visitor's redirect
            tracing::warn!(code = %code, "failed to record click: {}", e);
            true
        }
    };
    Redirect::temporary(&landing_url(
        &state.config.referral.short_link_base,
        kind,
        &code,
        known,
    ))
}

/// `/r/{code}`: platform referral
pub async fn follow_referral_link(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(query): Query<ClickQuery>,
) -> Redirect {
    follow(state, LinkKind::Platform, code, query.from).await
}

/// `/o/{code}`: offer affiliate link
pub async fn follow_offer_link(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(query): Query<ClickQuery>,
) -> Redirect {
    follow(state, LinkKind::Offer, code, query.from).await
}

/// Referral dashboard: code, link, clicks, sign-ups and earnings
pub async fn get_referral_stats(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<ReferralStats>> {
    let stats = state.referrals().stats(current_user.0.user_id).await?;
    Ok(Json(stats))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landing_urls() {
        let base = "https://partners.example.com/";
        assert_eq!(
            landing_url(base, LinkKind::Platform, "AbC123xY", true),
            "https://partners.example.com/signup?ref=AbC123xY"
        );
        assert_eq!(
            landing_url(base, LinkKind::Offer, "Zz9", true),
            "https://partners.example.com/lead/Zz9"
        );
        assert_eq!(
            landing_url(base, LinkKind::Offer, "nope", false),
            "https://partners.example.com/"
        );
    }
}
