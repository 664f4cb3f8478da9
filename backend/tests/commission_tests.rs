//! Commission ledger tests
//!
//! Sales reported against affiliate links, the payout threshold, settlement
//! and the per-affiliate summary.

mod common;

use chrono::{Duration, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{
    days_late, CommissionStatus, LinkKind, RecordConversionInput, MAX_AMOUNT_DOLLARS,
};
use uuid::Uuid;

use partner_marketplace_backend::{error::AppError, AppState};

fn sale(code: &str, amount: i64) -> RecordConversionInput {
    RecordConversionInput {
        code: code.to_string(),
        name: "Casey Customer".to_string(),
        email: "casey@example.com".to_string(),
        sale_amount: Decimal::from(amount),
    }
}

/// Owner with an offer plus an affiliate holding a link to it
async fn affiliate_setup(state: &AppState) -> (Uuid, Uuid, String) {
    let (owner, _, offer) = common::owner_with_offer(state, "Olive Owner", "Acme Growth").await;
    let affiliate = common::user(state, "Avery Affiliate").await;
    let link = state
        .referrals()
        .ensure_offer_code(affiliate, offer.id)
        .await
        .unwrap();
    (owner, affiliate, link.code)
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[tokio::test]
    async fn test_sale_below_threshold_stays_pending() {
        let state = common::state();
        let (owner, affiliate, code) = affiliate_setup(&state).await;

        let event = state
            .commissions()
            .record_sale(owner, sale(&code, 100))
            .await
            .unwrap();
        assert_eq!(event.affiliate_user_id, affiliate);
        assert_eq!(event.affiliate_amount, Decimal::from(20));
        assert_eq!(event.platform_amount, Decimal::from(4));
        assert_eq!(event.status, CommissionStatus::Pending);

        let summary = state.commissions().summary(owner).await.unwrap();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].conversions, 1);
        assert_eq!(summary[0].owed_to_affiliate, Decimal::from(20));
        assert_eq!(summary[0].payable_now, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_threshold_promotes_whole_group() {
        let state = common::state();
        let (owner, affiliate, code) = affiliate_setup(&state).await;
        let commissions = state.commissions();

        commissions.record_sale(owner, sale(&code, 100)).await.unwrap();
        commissions.record_sale(owner, sale(&code, 200)).await.unwrap();

        // 20 + 40 crosses the $50 threshold, so both lines are payable
        let earnings = commissions.earnings(affiliate).await.unwrap();
        assert_eq!(earnings.pending, Decimal::ZERO);
        assert_eq!(earnings.payable, Decimal::from(60));

        let summary = commissions.summary(owner).await.unwrap();
        assert_eq!(summary[0].payable_now, Decimal::from(60));
        assert_eq!(summary[0].owed_to_platform, Decimal::from(12));
        // Due thirty days out, so nothing is late yet
        assert_eq!(summary[0].max_days_late, 0);
    }

    #[tokio::test]
    async fn test_mark_paid_settles_payable_only() {
        let state = common::state();
        let (owner, affiliate, code) = affiliate_setup(&state).await;
        let commissions = state.commissions();

        commissions.record_sale(owner, sale(&code, 300)).await.unwrap();
        commissions.record_sale(owner, sale(&code, 50)).await.unwrap();

        // The first sale (60) was promoted on its own; the second (10) stays pending
        let paid = commissions.mark_paid(owner, affiliate).await.unwrap();
        assert!(paid.success, "{}", paid.message);
        assert_eq!(paid.data, Some(1));

        let earnings = commissions.earnings(affiliate).await.unwrap();
        assert_eq!(earnings.paid, Decimal::from(60));
        assert_eq!(earnings.pending, Decimal::from(10));
        assert_eq!(earnings.total, Decimal::from(70));

        let again = commissions.mark_paid(owner, affiliate).await.unwrap();
        assert!(!again.success);
        assert_eq!(again.message, "No payable commissions for this affiliate");
    }

    #[tokio::test]
    async fn test_sale_against_another_business_is_forbidden() {
        let state = common::state();
        let (_, _, code) = affiliate_setup(&state).await;
        let (other_owner, _, _) = common::owner_with_offer(&state, "Rita Rival", "Rival Co").await;

        let result = state.commissions().record_sale(other_owner, sale(&code, 100)).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_unknown_code_and_bad_amount() {
        let state = common::state();
        let (owner, _, code) = affiliate_setup(&state).await;
        let commissions = state.commissions();

        let unknown = commissions.record_sale(owner, sale("NOPE0000", 100)).await;
        assert!(matches!(unknown, Err(AppError::NotFound(_))));

        let negative = commissions.record_sale(owner, sale(&code, -5)).await;
        assert!(matches!(negative, Err(AppError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_oversized_sale_is_rejected_without_recording() {
        let state = common::state();
        let (owner, affiliate, code) = affiliate_setup(&state).await;
        let commissions = state.commissions();

        let mut huge = sale(&code, 0);
        huge.sale_amount = Decimal::MAX;
        match commissions.record_sale(owner, huge).await {
            Err(AppError::Validation { field, .. }) => assert_eq!(field, "sale_amount"),
            other => panic!("unexpected {:?}", other),
        }

        let just_over = sale(&code, MAX_AMOUNT_DOLLARS + 1);
        assert!(matches!(
            commissions.record_sale(owner, just_over).await,
            Err(AppError::Validation { .. })
        ));

        let at_bound = commissions
            .record_sale(owner, sale(&code, MAX_AMOUNT_DOLLARS))
            .await
            .unwrap();
        assert_eq!(at_bound.affiliate_amount, Decimal::from(200_000_000));
        assert_eq!(
            commissions.earnings(affiliate).await.unwrap().total,
            Decimal::from(200_000_000)
        );
    }

    #[tokio::test]
    async fn test_affiliate_is_notified_of_commission() {
        let state = common::state();
        let (owner, affiliate, code) = affiliate_setup(&state).await;
        state.commissions().record_sale(owner, sale(&code, 100)).await.unwrap();

        assert_eq!(state.notifications().unread_count(affiliate).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_clicks_appear_in_summary_and_csv() {
        let state = common::state();
        let (owner, affiliate, code) = affiliate_setup(&state).await;
        let referrals = state.referrals();

        assert!(referrals.record_click(LinkKind::Offer, &code, None).await.unwrap());
        assert!(referrals.record_click(LinkKind::Offer, &code, None).await.unwrap());

        let summary = state.commissions().summary(owner).await.unwrap();
        assert_eq!(summary[0].affiliate_user_id, affiliate);
        assert_eq!(summary[0].clicks, 2);
        assert_eq!(summary[0].conversions, 0);

        let csv = state.commissions().export_summary_csv(owner).await.unwrap();
        let mut lines = csv.lines();
        assert!(lines.next().unwrap().starts_with("affiliate_user_id,clicks,conversions"));
        assert!(lines.next().unwrap().starts_with(&format!("{},2,0", affiliate)));
    }

    #[tokio::test]
    async fn test_summary_without_business_is_not_found() {
        let state = common::state();
        let nobody = common::user(&state, "Nora Nobody").await;
        let result = state.commissions().summary(nobody).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        /// Lateness is never negative and never shrinks as time passes
        #[test]
        fn prop_days_late_non_negative_and_monotone(
            offset_hours in -2_000i64..2_000,
            later_hours in 0i64..2_000,
        ) {
            let now = Utc::now();
            let due = Some(now - Duration::hours(offset_hours));
            let early = days_late(due, now);
            let late = days_late(due, now + Duration::hours(later_hours));
            prop_assert!(early >= 0);
            prop_assert!(late >= early);
        }

        /// Affiliate amount is the offer's percentage of the sale, in cents
        #[test]
        fn prop_affiliate_amount_matches_rate(cents in 1i64..10_000_000) {
            tokio_test::block_on(async {
                let state = common::state();
                let (owner, _, code) = affiliate_setup(&state).await;
                let mut input = sale(&code, 0);
                input.sale_amount = Decimal::new(cents, 2);
                let event = state.commissions().record_sale(owner, input).await.unwrap();
                let expected = (Decimal::new(cents, 2) * Decimal::from(20) / Decimal::ONE_HUNDRED).round_dp(2);
                assert_eq!(event.affiliate_amount, expected);
                assert!(event.platform_amount <= event.affiliate_amount);
            });
        }
    }
}
