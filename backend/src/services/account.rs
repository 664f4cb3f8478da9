//! Account service: sign-up, the session view and tax documents
//!
//! Credentials live with the hosted auth service. This service owns the
//! profile row created next to the auth account and the flags the route
//! guards read.

use std::sync::Arc;

use serde::Serialize;
use shared::{
    is_onboarding_complete, validate_password, validate_phone, validate_tax_document,
    FeatureFlags, NewUser, SessionFlags, SignUpInput, User,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::external::{AuthApiClient, StorageClient};
use crate::services::referral::ReferralService;
use crate::store::Store;

/// What the front-end shell loads after sign-in
#[derive(Debug, Clone, Serialize)]
pub struct AccountView {
    pub user: User,
    pub session: SessionFlags,
    pub features: FeatureFlags,
    pub has_business: bool,
    pub has_w9: bool,
}

#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn Store>,
    referrals: ReferralService,
}

/// Reject sign-ups the auth service would accept but the platform won't
pub fn validate_sign_up(input: &SignUpInput) -> AppResult<()> {
    input.validate()?;
    validate_password(&input.password).map_err(|m| AppError::validation("password", m))?;
    if let Some(phone) = input.phone.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        validate_phone(phone).map_err(|m| AppError::validation("phone", m))?;
    }
    if !input.terms_accepted {
        return Err(AppError::validation(
            "terms_accepted",
            "You must accept the terms to create an account",
        ));
    }
    Ok(())
}

impl AccountService {
    pub fn new(store: Arc<dyn Store>, referrals: ReferralService) -> Self {
        Self { store, referrals }
    }

    /// Create the auth account, then the profile row
    pub async fn sign_up(&self, auth: &AuthApiClient, input: SignUpInput) -> AppResult<User> {
        validate_sign_up(&input)?;
        let account = auth
            .sign_up(input.email.trim(), &input.password, input.full_name.trim())
            .await?;
        self.register_profile(account.id, input).await
    }

    /// Profile row for an auth account, crediting the referrer if the
    /// sign-up carried a known code
    pub async fn register_profile(&self, account_id: Uuid, input: SignUpInput) -> AppResult<User> {
        let referred_by = self
            .referrals
            .resolve_signup_referral(input.referral_code.as_deref())
            .await?;
        let user = self
            .store
            .insert_user(NewUser {
                id: account_id,
                email: input.email.trim().to_lowercase(),
                full_name: input.full_name.trim().to_string(),
                phone: input.phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty()),
                marketing_consent: input.marketing_consent,
                terms_accepted: input.terms_accepted,
                referred_by,
            })
            .await?;

        tracing::info!(
            user_id = %user.id,
            referred = referred_by.is_some(),
            "user registered"
        );
        Ok(user)
    }

    pub async fn session_flags(&self, user_id: Uuid) -> AppResult<SessionFlags> {
        let user = self.get(user_id).await?;
        self.flags_for(&user).await
    }

    async fn flags_for(&self, user: &User) -> AppResult<SessionFlags> {
        let onboarding_complete = self
            .store
            .get_business_by_owner(user.id)
            .await?
            .map(|b| is_onboarding_complete(&b))
            .unwrap_or(false);
        Ok(SessionFlags {
            authenticated: true,
            onboarding_complete,
            subscription_active: user.subscription_status.is_active(),
        })
    }

    async fn get(&self, user_id: Uuid) -> AppResult<User> {
        self.store
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))
    }

    pub async fn me(&self, user_id: Uuid, features: FeatureFlags) -> AppResult<AccountView> {
        let user = self.get(user_id).await?;
        let session = self.flags_for(&user).await?;
        let has_business = self.store.get_business_by_owner(user_id).await?.is_some();
        Ok(AccountView {
            has_w9: user.w9_path.is_some(),
            user,
            session,
            features,
            has_business,
        })
    }

    /// Upload a W-9 and remember where it went
    pub async fn upload_w9(
        &self,
        storage: &StorageClient,
        user_id: Uuid,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> AppResult<String> {
        validate_tax_document(content_type, bytes.len())
            .map_err(|m| AppError::validation("file", m))?;
        self.get(user_id).await?;
        let path = storage.upload_w9(user_id, bytes).await?;
        self.record_w9(user_id, &path).await?;
        Ok(path)
    }

    pub async fn record_w9(&self, user_id: Uuid, path: &str) -> AppResult<()> {
        self.store.set_w9_path(user_id, path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> SignUpInput {
        SignUpInput {
            email: "owner@acme.co".to_string(),
            password: "correct-horse".to_string(),
            full_name: "Dana Owner".to_string(),
            phone: None,
            marketing_consent: false,
            terms_accepted: true,
            referral_code: None,
        }
    }

    #[test]
    fn test_terms_must_be_accepted() {
        let mut i = input();
        i.terms_accepted = false;
        match validate_sign_up(&i) {
            Err(AppError::Validation { field, .. }) => assert_eq!(field, "terms_accepted"),
            other => panic!("expected validation error, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_phone_checked_when_present() {
        let mut i = input();
        i.phone = Some("call me".to_string());
        assert!(validate_sign_up(&i).is_err());
        i.phone = Some("  ".to_string());
        assert!(validate_sign_up(&i).is_ok());
        i.phone = Some("(555) 123-4567".to_string());
        assert!(validate_sign_up(&i).is_ok());
    }
}
