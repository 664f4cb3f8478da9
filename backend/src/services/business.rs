//! Business profile service
//!
//! Covers onboarding, the profile wizard, publishing to the marketplace
//! directory and favorites.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use shared::{
    is_profile_complete, missing_fields, state_after_edit, validate_calendar_link, validate_email,
    validate_phone, validate_url, ActionResult, Business, BusinessSummary, DirectoryFilter,
    Favorite, Offer, ProfileState, ProfileStatus, UpdateBusinessInput,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::store::Store;

/// Public profile page: the business and its active offers
#[derive(Debug, Clone, Serialize)]
pub struct BusinessDetail {
    #[serde(flatten)]
    pub business: Business,
    pub offers: Vec<Offer>,
}

#[derive(Clone)]
pub struct BusinessService {
    store: Arc<dyn Store>,
}

/// Check the fields that carry a format; blank values are left to the
/// completeness check
fn validate_profile_input(input: &UpdateBusinessInput) -> AppResult<()> {
    fn filled(v: &Option<String>) -> Option<&str> {
        v.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    if let Some(email) = filled(&input.business_email) {
        validate_email(email).map_err(|m| AppError::validation("business_email", m))?;
    }
    if let Some(phone) = filled(&input.phone) {
        validate_phone(phone).map_err(|m| AppError::validation("phone", m))?;
    }
    if let Some(website) = filled(&input.website) {
        validate_url(website).map_err(|m| AppError::validation("website", m))?;
    }
    if let Some(logo) = filled(&input.logo_url) {
        validate_url(logo).map_err(|m| AppError::validation("logo_url", m))?;
    }
    if let Some(link) = filled(&input.calendar_link) {
        validate_calendar_link(link).map_err(|m| AppError::validation("calendar_link", m))?;
    }
    Ok(())
}

impl BusinessService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn get_mine(&self, owner_user_id: Uuid) -> AppResult<Option<Business>> {
        self.store.get_business_by_owner(owner_user_id).await
    }

    async fn require_mine(&self, owner_user_id: Uuid) -> AppResult<Business> {
        self.get_mine(owner_user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Business".to_string()))
    }

    /// Save onboarding or wizard input. The profile is created on first save.
    /// A live profile that loses a required field drops back to draft.
    pub async fn update_profile(
        &self,
        owner_user_id: Uuid,
        input: UpdateBusinessInput,
    ) -> AppResult<Business> {
        validate_profile_input(&input)?;

        let now = Utc::now();
        let mut business = match self.get_mine(owner_user_id).await? {
            Some(b) => b,
            None => Business {
                id: Uuid::new_v4(),
                owner_user_id,
                created_at: now,
                ..Default::default()
            },
        };
        let was = business.profile_state;

        input.apply_to(&mut business);
        business.profile_state = state_after_edit(&business);
        business.updated_at = now;

        let business = self.store.save_business(&business).await?;
        if was == ProfileState::Live && business.profile_state == ProfileState::Draft {
            tracing::info!(
                business_id = %business.id,
                missing = ?missing_fields(&business),
                "profile hidden after edit"
            );
        }
        Ok(business)
    }

    /// Make a complete profile visible in the directory
    pub async fn publish(&self, owner_user_id: Uuid) -> AppResult<ActionResult<Business>> {
        let mut business = self.require_mine(owner_user_id).await?;
        if !is_profile_complete(&business) {
            let missing = missing_fields(&business);
            return Ok(ActionResult::failure(format!(
                "Complete your profile before publishing. Missing: {}",
                missing.join(", ")
            )));
        }
        if business.profile_state == ProfileState::Live {
            return Ok(ActionResult::ok("Your profile is already live", business));
        }

        business.profile_state = ProfileState::Live;
        business.updated_at = Utc::now();
        let business = self.store.save_business(&business).await?;
        tracing::info!(business_id = %business.id, "profile published");
        Ok(ActionResult::ok("Your profile is live", business))
    }

    /// Take the profile out of the directory
    pub async fn unpublish(&self, owner_user_id: Uuid) -> AppResult<Business> {
        let mut business = self.require_mine(owner_user_id).await?;
        business.profile_state = ProfileState::Draft;
        business.updated_at = Utc::now();
        self.store.save_business(&business).await
    }

    pub async fn status(&self, owner_user_id: Uuid) -> AppResult<ProfileStatus> {
        let business = self.get_mine(owner_user_id).await?.unwrap_or_else(|| Business {
            owner_user_id,
            ..Default::default()
        });
        Ok(ProfileStatus::of(&business))
    }

    /// Live, complete businesses with at least one active offer
    pub async fn directory(&self, filter: &DirectoryFilter) -> AppResult<Vec<BusinessSummary>> {
        let live = self.store.list_live_businesses().await?;
        let active = self.store.list_active_offers().await?;
        Ok(live
            .iter()
            .filter(|b| is_profile_complete(b))
            .filter(|b| active.iter().any(|o| o.business_id == b.id))
            .filter(|b| filter.matches(b))
            .map(BusinessSummary::from)
            .collect())
    }

    /// A business's public page. Hidden profiles are only shown to their owner.
    pub async fn detail(&self, viewer: Uuid, business_id: Uuid) -> AppResult<BusinessDetail> {
        let business = self
            .store
            .get_business(business_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Business".to_string()))?;
        let is_owner = business.owner_user_id == viewer;
        if !is_owner && business.profile_state != ProfileState::Live {
            return Err(AppError::NotFound("Business".to_string()));
        }
        let offers = self
            .store
            .list_offers_by_business(business.id)
            .await?
            .into_iter()
            .filter(|o| is_owner || o.is_active)
            .collect();
        Ok(BusinessDetail { business, offers })
    }

    // ------------------------------------------------------------------
    // Favorites
    // ------------------------------------------------------------------

    pub async fn list_favorites(&self, user_id: Uuid) -> AppResult<Vec<BusinessSummary>> {
        let favorites = self.store.list_favorites(user_id).await?;
        let mut cards = Vec::with_capacity(favorites.len());
        for f in favorites {
            if let Some(b) = self.store.get_business(f.business_id).await? {
                cards.push(BusinessSummary::from(&b));
            }
        }
        Ok(cards)
    }

    pub async fn add_favorite(
        &self,
        user_id: Uuid,
        business_id: Uuid,
    ) -> AppResult<ActionResult<Favorite>> {
        if self.store.get_business(business_id).await?.is_none() {
            return Err(AppError::NotFound("Business".to_string()));
        }
        let favorite = Favorite {
            id: Uuid::new_v4(),
            user_id,
            business_id,
            created_at: Utc::now(),
        };
        match self.store.insert_favorite(&favorite).await {
            Ok(f) => Ok(ActionResult::ok("Added to favorites", f)),
            Err(AppError::DuplicateEntry(_)) => Ok(ActionResult::failure("Already in your favorites")),
            Err(e) => Err(e),
        }
    }

    pub async fn remove_favorite(&self, user_id: Uuid, business_id: Uuid) -> AppResult<ActionResult<()>> {
        if !self.store.delete_favorite(user_id, business_id).await? {
            return Ok(ActionResult::failure("Not in your favorites"));
        }
        Ok(ActionResult::ok("Removed from favorites", ()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_fields_skip_format_checks() {
        let input = UpdateBusinessInput {
            website: Some("  ".to_string()),
            calendar_link: Some(String::new()),
            ..Default::default()
        };
        assert!(validate_profile_input(&input).is_ok());
    }

    #[test]
    fn test_calendar_link_must_be_https() {
        let input = UpdateBusinessInput {
            calendar_link: Some("http://cal.example.com/me".to_string()),
            ..Default::default()
        };
        match validate_profile_input(&input) {
            Err(AppError::Validation { field, .. }) => assert_eq!(field, "calendar_link"),
            other => panic!("expected validation error, got {:?}", other.map(|_| ())),
        }
    }
}
