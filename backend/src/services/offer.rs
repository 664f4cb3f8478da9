//! Offer management and the marketplace listing

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use shared::{
    validate_amount, validate_commission_percent, Business, BusinessSummary, CreateOfferInput,
    Offer, OfferFilter, ProfileState, UpdateOfferInput,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::store::Store;

/// Offer card on the marketplace page
#[derive(Debug, Clone, Serialize)]
pub struct MarketplaceOffer {
    #[serde(flatten)]
    pub offer: Offer,
    pub business: BusinessSummary,
}

#[derive(Clone)]
pub struct OfferService {
    store: Arc<dyn Store>,
}

fn validate_offer(offer: &Offer) -> AppResult<()> {
    if offer.title.trim().is_empty() {
        return Err(AppError::validation("title", "Offer title cannot be empty"));
    }
    validate_amount(offer.price).map_err(|m| AppError::validation("price", m))?;
    validate_commission_percent(offer.commission_percent)
        .map_err(|m| AppError::validation("commission_percent", m))?;
    Ok(())
}

impl OfferService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    async fn business_of(&self, owner_user_id: Uuid) -> AppResult<Business> {
        self.store
            .get_business_by_owner(owner_user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Business".to_string()))
    }

    /// Load an offer and make sure it belongs to the owner's business
    async fn owned_offer(&self, owner_user_id: Uuid, offer_id: Uuid) -> AppResult<Offer> {
        let business = self.business_of(owner_user_id).await?;
        let offer = self
            .store
            .get_offer(offer_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Offer".to_string()))?;
        if offer.business_id != business.id {
            return Err(AppError::Forbidden("This offer belongs to another business".to_string()));
        }
        Ok(offer)
    }

    pub async fn create(&self, owner_user_id: Uuid, input: CreateOfferInput) -> AppResult<Offer> {
        let business = self.business_of(owner_user_id).await?;
        let now = Utc::now();
        let offer = Offer {
            id: Uuid::new_v4(),
            business_id: business.id,
            title: input.title.trim().to_string(),
            description: input.description,
            offer_type: input.offer_type,
            price: input.price,
            commission_percent: input.commission_percent,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        validate_offer(&offer)?;
        let offer = self.store.save_offer(&offer).await?;
        tracing::info!(offer_id = %offer.id, business_id = %business.id, "offer created");
        Ok(offer)
    }

    pub async fn update(
        &self,
        owner_user_id: Uuid,
        offer_id: Uuid,
        input: UpdateOfferInput,
    ) -> AppResult<Offer> {
        let mut offer = self.owned_offer(owner_user_id, offer_id).await?;
        input.apply_to(&mut offer);
        offer.updated_at = Utc::now();
        validate_offer(&offer)?;
        self.store.save_offer(&offer).await
    }

    pub async fn delete(&self, owner_user_id: Uuid, offer_id: Uuid) -> AppResult<()> {
        let offer = self.owned_offer(owner_user_id, offer_id).await?;
        self.store.delete_offer(offer.id).await?;
        tracing::info!(offer_id = %offer.id, "offer deleted");
        Ok(())
    }

    pub async fn list_mine(&self, owner_user_id: Uuid) -> AppResult<Vec<Offer>> {
        let business = self.business_of(owner_user_id).await?;
        self.store.list_offers_by_business(business.id).await
    }

    /// Active offers of live businesses
    pub async fn marketplace(&self, filter: &OfferFilter) -> AppResult<Vec<MarketplaceOffer>> {
        let live: Vec<Business> = self.store.list_live_businesses().await?;
        let offers = self.store.list_active_offers().await?;
        Ok(offers
            .into_iter()
            .filter(|o| filter.matches(o))
            .filter_map(|offer| {
                live.iter()
                    .find(|b| b.id == offer.business_id && b.profile_state == ProfileState::Live)
                    .map(|b| MarketplaceOffer {
                        business: BusinessSummary::from(b),
                        offer,
                    })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shared::OfferType;

    fn offer(percent: i64) -> Offer {
        let now = Utc::now();
        Offer {
            id: Uuid::new_v4(),
            business_id: Uuid::new_v4(),
            title: "Growth audit".to_string(),
            description: String::new(),
            offer_type: OfferType::Service,
            price: Decimal::from(500),
            commission_percent: Decimal::from(percent),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_commission_bounds() {
        assert!(validate_offer(&offer(20)).is_ok());
        assert!(validate_offer(&offer(0)).is_err());
        assert!(validate_offer(&offer(150)).is_err());
    }

    #[test]
    fn test_blank_title_rejected() {
        let mut o = offer(10);
        o.title = "   ".to_string();
        assert!(validate_offer(&o).is_err());
    }
}
