//! HTTP handlers for offers and the offer marketplace

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use shared::{AffiliateLink, CreateOfferInput, LinkKind, Offer, OfferFilter, UpdateOfferInput};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::offer::MarketplaceOffer;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct AffiliateLinkResponse {
    pub link: AffiliateLink,
    pub short_link: String,
}

/// Active offers from live businesses
pub async fn list_marketplace(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filter): Query<OfferFilter>,
) -> AppResult<Json<Vec<MarketplaceOffer>>> {
    let offers = state.offers().marketplace(&filter).await?;
    Ok(Json(offers))
}

pub async fn list_my_offers(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<Offer>>> {
    let offers = state.offers().list_mine(current_user.0.user_id).await?;
    Ok(Json(offers))
}

pub async fn create_offer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateOfferInput>,
) -> AppResult<(StatusCode, Json<Offer>)> {
    let offer = state.offers().create(current_user.0.user_id, input).await?;
    Ok((StatusCode::CREATED, Json(offer)))
}

pub async fn update_offer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(offer_id): Path<Uuid>,
    Json(input): Json<UpdateOfferInput>,
) -> AppResult<Json<Offer>> {
    let offer = state
        .offers()
        .update(current_user.0.user_id, offer_id, input)
        .await?;
    Ok(Json(offer))
}

pub async fn delete_offer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(offer_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state
        .offers()
        .delete(current_user.0.user_id, offer_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The caller's affiliate link for an offer, issued on first request
pub async fn get_offer_referral_link(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(offer_id): Path<Uuid>,
) -> AppResult<Json<AffiliateLinkResponse>> {
    let referrals = state.referrals();
    let link = referrals
        .ensure_offer_code(current_user.0.user_id, offer_id)
        .await?;
    Ok(Json(AffiliateLinkResponse {
        short_link: referrals.link(LinkKind::Offer, &link.code),
        link,
    }))
}
