//! Referral codes, short links and the platform referral program
//!
//! Codes are random alphanumeric strings checked for uniqueness against the
//! store. Generation retries on collision up to a fixed number of attempts.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use rand::{distr::Alphanumeric, rngs::StdRng, Rng, SeedableRng};
use rust_decimal::Decimal;
use shared::{
    referral_share, short_link, AffiliateLink, CommissionStatus, EarningsSummary, LinkKind,
    PlanTier, ReferralClick, ReferralCommission, ReferralConversion, ReferralStats,
};
use uuid::Uuid;

use crate::config::ReferralConfig;
use crate::error::{AppError, AppResult};
use crate::store::{CodeNamespace, Store};

/// Draw one code of `length` ASCII alphanumerics
pub fn generate_code<R: Rng>(rng: &mut R, length: usize) -> String {
    (0..length).map(|_| rng.sample(Alphanumeric) as char).collect()
}

/// Shared code generator. Holds the RNG so a seeded run is reproducible
/// across requests.
pub struct CodeIssuer {
    rng: Mutex<StdRng>,
    length: usize,
    max_attempts: u32,
}

impl CodeIssuer {
    pub fn new(rng: StdRng, length: usize, max_attempts: u32) -> Self {
        Self {
            rng: Mutex::new(rng),
            length,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn from_config(config: &ReferralConfig) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::new(rng, config.code_length, config.max_code_attempts)
    }

    fn next_code(&self) -> AppResult<String> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| AppError::Internal("code generator lock poisoned".to_string()))?;
        Ok(generate_code(&mut *rng, self.length))
    }

    /// Find a code not yet taken in `namespace`
    pub async fn issue(&self, store: &dyn Store, namespace: CodeNamespace) -> AppResult<String> {
        for attempt in 1..=self.max_attempts {
            let code = self.next_code()?;
            if !store.code_taken(namespace, &code).await? {
                return Ok(code);
            }
            tracing::debug!(attempt, ?namespace, "referral code collision");
        }
        tracing::error!(attempts = self.max_attempts, ?namespace, "referral code space exhausted");
        Err(AppError::CodeSpaceExhausted {
            attempts: self.max_attempts,
        })
    }
}

#[derive(Clone)]
pub struct ReferralService {
    store: Arc<dyn Store>,
    issuer: Arc<CodeIssuer>,
    config: ReferralConfig,
}

impl ReferralService {
    pub fn new(store: Arc<dyn Store>, issuer: Arc<CodeIssuer>, config: ReferralConfig) -> Self {
        Self {
            store,
            issuer,
            config,
        }
    }

    pub fn link(&self, kind: LinkKind, code: &str) -> String {
        short_link(&self.config.short_link_base, kind, code)
    }

    /// The user's platform referral code, issued on first request
    pub async fn ensure_user_code(&self, user_id: Uuid) -> AppResult<String> {
        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))?;
        if let Some(code) = user.referral_code {
            return Ok(code);
        }

        let code = self.issuer.issue(self.store.as_ref(), CodeNamespace::User).await?;
        self.store.set_referral_code(user_id, &code).await?;
        tracing::info!(user_id = %user_id, "referral code issued");
        Ok(code)
    }

    /// The user's affiliate link for an offer, issued on first request
    pub async fn ensure_offer_code(&self, user_id: Uuid, offer_id: Uuid) -> AppResult<AffiliateLink> {
        if let Some(link) = self.store.find_affiliate_link(user_id, offer_id).await? {
            return Ok(link);
        }

        let offer = self
            .store
            .get_offer(offer_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Offer".to_string()))?;
        let business = self
            .store
            .get_business(offer.business_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Business".to_string()))?;
        if business.owner_user_id == user_id {
            return Err(AppError::Forbidden(
                "You cannot promote your own offer".to_string(),
            ));
        }

        let code = self.issuer.issue(self.store.as_ref(), CodeNamespace::Offer).await?;
        let link = AffiliateLink {
            id: Uuid::new_v4(),
            affiliate_user_id: user_id,
            business_id: business.id,
            offer_id,
            code,
            click_count: 0,
            created_at: Utc::now(),
        };
        let link = self.store.insert_affiliate_link(&link).await?;
        tracing::info!(user_id = %user_id, offer_id = %offer_id, "affiliate link issued");
        Ok(link)
    }

    /// Count a visit to a short link. Unknown codes are ignored.
    pub async fn record_click(
        &self,
        kind: LinkKind,
        code: &str,
        landing_path: Option<String>,
    ) -> AppResult<bool> {
        match kind {
            LinkKind::Platform => {
                let Some(referrer) = self.store.find_user_by_referral_code(code).await? else {
                    return Ok(false);
                };
                let click = ReferralClick {
                    id: Uuid::new_v4(),
                    referrer_user_id: referrer.id,
                    code: code.to_string(),
                    landing_path,
                    created_at: Utc::now(),
                };
                self.store.insert_referral_click(&click).await?;
            }
            LinkKind::Offer => {
                let Some(link) = self.store.find_affiliate_link_by_code(code).await? else {
                    return Ok(false);
                };
                self.store.increment_link_clicks(link.id).await?;
            }
        }
        Ok(true)
    }

    /// Referrer for a sign-up carrying `code`, if the code is known
    pub async fn resolve_signup_referral(&self, code: Option<&str>) -> AppResult<Option<Uuid>> {
        let Some(code) = code.map(str::trim).filter(|c| !c.is_empty()) else {
            return Ok(None);
        };
        let referrer = self.store.find_user_by_referral_code(code).await?;
        if referrer.is_none() {
            tracing::debug!(code, "sign-up referral code not found");
        }
        Ok(referrer.map(|u| u.id))
    }

    /// Credit the referrer of `referred_user_id` with a share of a plan
    /// payment. Users who signed up without a code are skipped, and a
    /// checkout session already credited is not credited again.
    pub async fn record_conversion(
        &self,
        referred_user_id: Uuid,
        checkout_session_id: &str,
        plan: PlanTier,
        amount: Decimal,
    ) -> AppResult<Option<ReferralConversion>> {
        let user = self
            .store
            .get_user(referred_user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))?;
        let Some(referrer) = user.referred_by else {
            return Ok(None);
        };

        let now = Utc::now();
        let conversion = ReferralConversion {
            id: Uuid::new_v4(),
            referrer_user_id: referrer,
            referred_user_id,
            checkout_session_id: checkout_session_id.to_string(),
            plan,
            amount,
            created_at: now,
        };
        let commission = ReferralCommission {
            id: Uuid::new_v4(),
            conversion_id: conversion.id,
            referrer_user_id: referrer,
            amount: referral_share(amount, self.config.revenue_share_percent)
                .ok_or_else(|| AppError::validation("amount", "Payment amount is too large"))?,
            status: CommissionStatus::Pending,
            payable_at: None,
            paid_at: None,
            created_at: now,
        };
        match self
            .store
            .insert_referral_conversion(&conversion, &commission)
            .await
        {
            Ok(()) => {}
            Err(AppError::DuplicateEntry(_)) => {
                tracing::info!(
                    referred = %referred_user_id,
                    session = checkout_session_id,
                    "checkout session already credited"
                );
                return Ok(None);
            }
            Err(e) => return Err(e),
        }

        tracing::info!(
            referrer = %referrer,
            referred = %referred_user_id,
            plan = plan.as_str(),
            share = %commission.amount,
            "referral conversion recorded"
        );
        Ok(Some(conversion))
    }

    pub async fn stats(&self, user_id: Uuid) -> AppResult<ReferralStats> {
        let code = self.ensure_user_code(user_id).await?;
        let clicks = self.store.count_referral_clicks(user_id).await?;
        let signups = self.store.count_referred_users(user_id).await?;
        let conversions = self.store.list_referral_conversions(user_id).await?.len() as i64;
        let commissions = self.store.list_referral_commissions(user_id).await?;

        Ok(ReferralStats {
            short_link: self.link(LinkKind::Platform, &code),
            code,
            clicks,
            signups,
            conversions,
            earnings: EarningsSummary::from_lines(&commissions),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_codes_are_alphanumeric() {
        let mut rng = StdRng::seed_from_u64(7);
        let code = generate_code(&mut rng, 8);
        assert_eq!(code.len(), 8);
        assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        for _ in 0..5 {
            assert_eq!(generate_code(&mut a, 8), generate_code(&mut b, 8));
        }
    }

    #[test]
    fn test_issuer_needs_at_least_one_attempt() {
        let issuer = CodeIssuer::new(StdRng::seed_from_u64(1), 8, 0);
        assert_eq!(issuer.max_attempts, 1);
    }
}
