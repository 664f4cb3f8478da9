//! Billing and account tests
//!
//! Signed checkout webhooks, subscription status changes, checkout
//! preconditions and W-9 bookkeeping.

mod common;

use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{FeatureFlags, PlanTier, SubscriptionStatus};
use uuid::Uuid;

use partner_marketplace_backend::{
    error::AppError,
    services::billing::{sign, CheckoutEvent},
};

const SECRET: &str = "whsec_test";

fn body(event: &CheckoutEvent) -> Vec<u8> {
    serde_json::to_vec(event).unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[tokio::test]
    async fn test_signed_webhook_activates_subscription() {
        let state = common::state();
        let user = common::user(&state, "Pat Payer").await;
        let payload = body(&CheckoutEvent::CheckoutCompleted {
            user_id: user,
            session_id: "cs_test_1".to_string(),
            plan: PlanTier::Monthly,
            amount: Decimal::from(97),
        });
        let signature = sign(SECRET, &payload).unwrap();

        let status = state
            .billing()
            .handle_webhook(SECRET, &payload, Some(&signature))
            .await
            .unwrap();
        assert_eq!(status, SubscriptionStatus::Active);
        assert!(state.accounts().session_flags(user).await.unwrap().subscription_active);
    }

    #[tokio::test]
    async fn test_bad_or_missing_signature_is_unauthorized() {
        let state = common::state();
        let user = common::user(&state, "Pat Payer").await;
        let payload = body(&CheckoutEvent::PaymentFailed { user_id: user });
        let billing = state.billing();

        assert!(matches!(
            billing.handle_webhook(SECRET, &payload, None).await,
            Err(AppError::Unauthorized(_))
        ));
        let forged = sign("not-the-secret", &payload).unwrap();
        assert!(matches!(
            billing.handle_webhook(SECRET, &payload, Some(&forged)).await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            billing.handle_webhook(SECRET, &payload, Some("%%%")).await,
            Err(AppError::Unauthorized(_))
        ));

        // Nothing was applied
        let user = state.store.get_user(user).await.unwrap().unwrap();
        assert_eq!(user.subscription_status, SubscriptionStatus::None);
    }

    #[tokio::test]
    async fn test_malformed_payload_rejected_after_signature() {
        let state = common::state();
        let payload = br#"{"type":"refund_issued"}"#;
        let signature = sign(SECRET, payload).unwrap();
        let result = state
            .billing()
            .handle_webhook(SECRET, payload, Some(&signature))
            .await;
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found() {
        let state = common::state();
        let result = state
            .billing()
            .apply_event(&CheckoutEvent::SubscriptionRenewed {
                user_id: Uuid::new_v4(),
            })
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_subscription_lifecycle() {
        let state = common::state();
        let user = common::user(&state, "Pat Payer").await;
        let billing = state.billing();

        let steps = [
            (
                CheckoutEvent::CheckoutCompleted {
                    user_id: user,
                    session_id: "cs_test_1".to_string(),
                    plan: PlanTier::Annual,
                    amount: Decimal::from(970),
                },
                SubscriptionStatus::Active,
            ),
            (CheckoutEvent::PaymentFailed { user_id: user }, SubscriptionStatus::PastDue),
            (CheckoutEvent::SubscriptionRenewed { user_id: user }, SubscriptionStatus::Active),
            (CheckoutEvent::SubscriptionCanceled { user_id: user }, SubscriptionStatus::Canceled),
        ];
        for (event, expected) in steps {
            assert_eq!(billing.apply_event(&event).await.unwrap(), expected);
        }
        assert!(!state.accounts().session_flags(user).await.unwrap().subscription_active);
    }

    #[tokio::test]
    async fn test_lifetime_is_never_downgraded() {
        let state = common::state();
        let user = common::user(&state, "Pat Payer").await;
        let billing = state.billing();

        billing
            .apply_event(&CheckoutEvent::CheckoutCompleted {
                user_id: user,
                session_id: "cs_test_1".to_string(),
                plan: PlanTier::Lifetime,
                amount: Decimal::from(1997),
            })
            .await
            .unwrap();
        let after_cancel = billing
            .apply_event(&CheckoutEvent::SubscriptionCanceled { user_id: user })
            .await
            .unwrap();
        assert_eq!(after_cancel, SubscriptionStatus::Lifetime);
    }

    #[tokio::test]
    async fn test_checkout_refused_for_existing_access() {
        let state = common::state();
        let lifetime = common::user(&state, "Lou Lifetime").await;
        let active = common::user(&state, "Ada Active").await;
        state
            .store
            .set_subscription_status(lifetime, SubscriptionStatus::Lifetime)
            .await
            .unwrap();
        state
            .store
            .set_subscription_status(active, SubscriptionStatus::Active)
            .await
            .unwrap();
        let billing = state.billing();

        let refused = billing
            .start_checkout(&state.checkout, lifetime, "token", PlanTier::Monthly, None)
            .await
            .unwrap();
        assert!(!refused.success);
        assert_eq!(refused.message, "You already have lifetime access");

        let refused = billing
            .start_checkout(&state.checkout, active, "token", PlanTier::Annual, None)
            .await
            .unwrap();
        assert!(!refused.success);
        assert_eq!(refused.message, "Your subscription is already active");
    }

    #[tokio::test]
    async fn test_plans_listed_in_order() {
        let state = common::state();
        let tiers: Vec<PlanTier> = state.billing().plans().iter().map(|p| p.tier).collect();
        assert_eq!(tiers, vec![PlanTier::Monthly, PlanTier::Annual, PlanTier::Lifetime]);
    }

    #[tokio::test]
    async fn test_w9_upload_validates_before_storage() {
        let state = common::state();
        let user = common::user(&state, "Wren Writer").await;
        let accounts = state.accounts();

        let wrong_type = accounts
            .upload_w9(&state.storage, user, "image/png", vec![1, 2, 3])
            .await;
        assert!(matches!(wrong_type, Err(AppError::Validation { .. })));
        let empty = accounts
            .upload_w9(&state.storage, user, "application/pdf", Vec::new())
            .await;
        assert!(matches!(empty, Err(AppError::Validation { .. })));

        accounts
            .record_w9(user, &format!("{}/w9-1700000000000.pdf", user))
            .await
            .unwrap();
        let view = accounts.me(user, FeatureFlags::default()).await.unwrap();
        assert!(view.has_w9);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let state = common::state();
        common::user(&state, "Dana Dup").await;
        let result = state
            .accounts()
            .register_profile(Uuid::new_v4(), common::sign_up_input("Dana Dup"))
            .await;
        assert!(matches!(result, Err(AppError::DuplicateEntry(_))));
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn event_strategy(user_id: Uuid) -> impl Strategy<Value = CheckoutEvent> {
        prop_oneof![
            prop_oneof![
                Just(PlanTier::Monthly),
                Just(PlanTier::Annual),
                Just(PlanTier::Lifetime)
            ]
            .prop_map(move |plan| CheckoutEvent::CheckoutCompleted {
                user_id,
                session_id: "cs_test_1".to_string(),
                plan,
                amount: Decimal::from(97),
            }),
            Just(CheckoutEvent::SubscriptionRenewed { user_id }),
            Just(CheckoutEvent::PaymentFailed { user_id }),
            Just(CheckoutEvent::SubscriptionCanceled { user_id }),
        ]
    }

    proptest! {
        /// Once a lifetime purchase lands, no later event changes the status
        #[test]
        fn prop_lifetime_is_terminal(
            events in prop::collection::vec(event_strategy(Uuid::nil()), 0..10),
        ) {
            use partner_marketplace_backend::services::billing::status_after;

            let lifetime = CheckoutEvent::CheckoutCompleted {
                user_id: Uuid::nil(),
                session_id: "cs_test_1".to_string(),
                plan: PlanTier::Lifetime,
                amount: Decimal::from(1997),
            };
            let mut status = status_after(SubscriptionStatus::None, &lifetime);
            for event in &events {
                status = status_after(status, event);
            }
            prop_assert_eq!(status, SubscriptionStatus::Lifetime);
        }

        /// A signature only verifies the exact body it was made for
        #[test]
        fn prop_signature_binds_body(payload in prop::collection::vec(any::<u8>(), 1..256), flip in any::<usize>()) {
            use partner_marketplace_backend::services::billing::verify_signature;

            let signature = sign(SECRET, &payload).unwrap();
            prop_assert!(verify_signature(SECRET, &payload, &signature).is_ok());

            let mut tampered = payload.clone();
            let i = flip % tampered.len();
            tampered[i] ^= 0x01;
            prop_assert!(verify_signature(SECRET, &tampered, &signature).is_err());
        }
    }
}
