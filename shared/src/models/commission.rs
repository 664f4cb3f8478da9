//! Commission ledger models and aggregation

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ledger line status: pending until the payout threshold is met,
/// payable once due, paid once the business settles it
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "text", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum CommissionStatus {
    Pending,
    Payable,
    Paid,
}

/// Tracking link an affiliate uses to promote a business's offer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct AffiliateLink {
    pub id: Uuid,
    pub affiliate_user_id: Uuid,
    pub business_id: Uuid,
    pub offer_id: Uuid,
    pub code: String,
    pub click_count: i64,
    pub created_at: DateTime<Utc>,
}

/// A conversion captured through an affiliate link
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Lead {
    pub id: Uuid,
    pub affiliate_link_id: Uuid,
    pub affiliate_user_id: Uuid,
    pub business_id: Uuid,
    pub offer_id: Uuid,
    pub name: String,
    pub email: String,
    pub sale_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

/// One ledger line: revenue share owed for one conversion
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CommissionEvent {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub affiliate_user_id: Uuid,
    pub business_id: Uuid,
    pub offer_id: Uuid,
    pub sale_amount: Decimal,
    pub affiliate_amount: Decimal,
    pub platform_amount: Decimal,
    pub status: CommissionStatus,
    pub payable_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Anything that can be totalled into an earnings summary
pub trait LedgerLine {
    fn amount(&self) -> Decimal;
    fn status(&self) -> CommissionStatus;
}

impl LedgerLine for CommissionEvent {
    fn amount(&self) -> Decimal {
        self.affiliate_amount
    }

    fn status(&self) -> CommissionStatus {
        self.status
    }
}

/// Earnings totals by status
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EarningsSummary {
    pub pending: Decimal,
    pub payable: Decimal,
    pub paid: Decimal,
    pub total: Decimal,
}

impl EarningsSummary {
    pub fn from_lines<'a, L, I>(lines: I) -> Self
    where
        L: LedgerLine + 'a,
        I: IntoIterator<Item = &'a L>,
    {
        let mut summary = Self::default();
        for line in lines {
            let amount = line.amount();
            match line.status() {
                CommissionStatus::Pending => summary.pending += amount,
                CommissionStatus::Payable => summary.payable += amount,
                CommissionStatus::Paid => summary.paid += amount,
            }
            summary.total += amount;
        }
        summary
    }
}

/// `percent`% of `amount` rounded to cents, or `None` if it does not fit
pub fn percent_of(amount: Decimal, percent: Decimal) -> Option<Decimal> {
    amount
        .checked_mul(percent)?
        .checked_div(Decimal::ONE_HUNDRED)
        .map(|share| share.round_dp(2))
}

/// Whole days elapsed since `payable_at`, never negative
pub fn days_late(payable_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> i64 {
    payable_at
        .map(|due| (now - due).num_days().max(0))
        .unwrap_or(0)
}

/// Per-affiliate totals shown on a business's leads page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AffiliateSummary {
    pub affiliate_user_id: Uuid,
    pub clicks: i64,
    pub conversions: i64,
    /// Pending and payable amounts not yet paid to the affiliate
    pub owed_to_affiliate: Decimal,
    /// Platform share of the unpaid lines
    pub owed_to_platform: Decimal,
    pub paid_to_affiliate: Decimal,
    /// Amount currently due (payable)
    pub payable_now: Decimal,
    pub max_days_late: i64,
}

impl AffiliateSummary {
    fn zeroed(affiliate_user_id: Uuid) -> Self {
        Self {
            affiliate_user_id,
            clicks: 0,
            conversions: 0,
            owed_to_affiliate: Decimal::ZERO,
            owed_to_platform: Decimal::ZERO,
            paid_to_affiliate: Decimal::ZERO,
            payable_now: Decimal::ZERO,
            max_days_late: 0,
        }
    }
}

/// Fold commission rows and affiliate links into per-affiliate totals.
///
/// Affiliates that only have a link are still listed with zeroed stats.
/// Result is ordered by amount owed (descending), then affiliate id.
pub fn summarize_by_affiliate(
    events: &[CommissionEvent],
    links: &[AffiliateLink],
    now: DateTime<Utc>,
) -> Vec<AffiliateSummary> {
    let mut by_affiliate: BTreeMap<Uuid, AffiliateSummary> = BTreeMap::new();

    for link in links {
        by_affiliate
            .entry(link.affiliate_user_id)
            .or_insert_with(|| AffiliateSummary::zeroed(link.affiliate_user_id))
            .clicks += link.click_count;
    }

    for event in events {
        let summary = by_affiliate
            .entry(event.affiliate_user_id)
            .or_insert_with(|| AffiliateSummary::zeroed(event.affiliate_user_id));
        summary.conversions += 1;
        match event.status {
            CommissionStatus::Pending => {
                summary.owed_to_affiliate += event.affiliate_amount;
                summary.owed_to_platform += event.platform_amount;
            }
            CommissionStatus::Payable => {
                summary.owed_to_affiliate += event.affiliate_amount;
                summary.owed_to_platform += event.platform_amount;
                summary.payable_now += event.affiliate_amount;
                summary.max_days_late = summary.max_days_late.max(days_late(event.payable_at, now));
            }
            CommissionStatus::Paid => {
                summary.paid_to_affiliate += event.affiliate_amount;
            }
        }
    }

    let mut summaries: Vec<_> = by_affiliate.into_values().collect();
    summaries.sort_by(|a, b| {
        b.owed_to_affiliate
            .cmp(&a.owed_to_affiliate)
            .then(a.affiliate_user_id.cmp(&b.affiliate_user_id))
    });
    summaries
}

/// Select pending lines that become payable.
///
/// Pending amounts accumulate per (affiliate, business). Once a group's total
/// reaches `threshold`, every pending line in it is returned, to be stamped
/// with `payable_at = now + grace_days`.
pub fn promote_payable(events: &[CommissionEvent], threshold: Decimal) -> Vec<Uuid> {
    let mut groups: BTreeMap<(Uuid, Uuid), (Decimal, Vec<Uuid>)> = BTreeMap::new();
    for event in events.iter().filter(|e| e.status == CommissionStatus::Pending) {
        let group = groups
            .entry((event.affiliate_user_id, event.business_id))
            .or_insert_with(|| (Decimal::ZERO, Vec::new()));
        group.0 += event.affiliate_amount;
        group.1.push(event.id);
    }

    groups
        .into_values()
        .filter(|(total, _)| *total >= threshold)
        .flat_map(|(_, ids)| ids)
        .collect()
}

/// Due date for lines promoted at `now`
pub fn payable_due_date(now: DateTime<Utc>, grace_days: i64) -> DateTime<Utc> {
    now + Duration::days(grace_days.max(0))
}

/// Input for recording a sale made through an affiliate link
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordConversionInput {
    pub code: String,
    pub name: String,
    pub email: String,
    pub sale_amount: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_of_overflow_is_none() {
        assert_eq!(
            percent_of(Decimal::from(250), Decimal::from(20)),
            Some(Decimal::from(50))
        );
        assert_eq!(percent_of(Decimal::MAX, Decimal::from(20)), None);
    }

    fn event(
        affiliate: Uuid,
        business: Uuid,
        amount: i64,
        status: CommissionStatus,
        payable_at: Option<DateTime<Utc>>,
    ) -> CommissionEvent {
        CommissionEvent {
            id: Uuid::new_v4(),
            lead_id: Uuid::new_v4(),
            affiliate_user_id: affiliate,
            business_id: business,
            offer_id: Uuid::new_v4(),
            sale_amount: Decimal::from(amount * 10),
            affiliate_amount: Decimal::from(amount),
            platform_amount: Decimal::from(amount) / Decimal::from(5),
            status,
            payable_at,
            paid_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_days_late_clamps_and_floors() {
        let now = Utc::now();
        assert_eq!(days_late(None, now), 0);
        assert_eq!(days_late(Some(now + Duration::days(3)), now), 0);
        assert_eq!(days_late(Some(now - Duration::hours(23)), now), 0);
        assert_eq!(days_late(Some(now - Duration::hours(49)), now), 2);
    }

    #[test]
    fn test_link_only_affiliate_listed() {
        let business = Uuid::new_v4();
        let quiet = Uuid::new_v4();
        let link = AffiliateLink {
            id: Uuid::new_v4(),
            affiliate_user_id: quiet,
            business_id: business,
            offer_id: Uuid::new_v4(),
            code: "QUIET123".to_string(),
            click_count: 4,
            created_at: Utc::now(),
        };
        let summaries = summarize_by_affiliate(&[], &[link], Utc::now());
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].affiliate_user_id, quiet);
        assert_eq!(summaries[0].clicks, 4);
        assert_eq!(summaries[0].conversions, 0);
        assert_eq!(summaries[0].owed_to_affiliate, Decimal::ZERO);
    }

    #[test]
    fn test_summary_totals() {
        let now = Utc::now();
        let business = Uuid::new_v4();
        let a = Uuid::new_v4();
        let events = vec![
            event(a, business, 30, CommissionStatus::Pending, None),
            event(a, business, 40, CommissionStatus::Payable, Some(now - Duration::days(5))),
            event(a, business, 25, CommissionStatus::Paid, Some(now - Duration::days(40))),
        ];
        let summaries = summarize_by_affiliate(&events, &[], now);
        let s = &summaries[0];
        assert_eq!(s.conversions, 3);
        assert_eq!(s.owed_to_affiliate, Decimal::from(70));
        assert_eq!(s.payable_now, Decimal::from(40));
        assert_eq!(s.paid_to_affiliate, Decimal::from(25));
        assert_eq!(s.owed_to_platform, Decimal::from(14));
        assert_eq!(s.max_days_late, 5);
    }

    #[test]
    fn test_promote_payable_threshold() {
        let business = Uuid::new_v4();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let events = vec![
            event(a, business, 30, CommissionStatus::Pending, None),
            event(a, business, 20, CommissionStatus::Pending, None),
            event(b, business, 49, CommissionStatus::Pending, None),
            event(b, business, 100, CommissionStatus::Paid, None),
        ];
        let promoted = promote_payable(&events, Decimal::from(50));
        assert_eq!(promoted.len(), 2);
        assert!(promoted.contains(&events[0].id));
        assert!(promoted.contains(&events[1].id));
    }

    #[test]
    fn test_earnings_summary() {
        let (a, business) = (Uuid::new_v4(), Uuid::new_v4());
        let events = vec![
            event(a, business, 10, CommissionStatus::Pending, None),
            event(a, business, 20, CommissionStatus::Payable, None),
            event(a, business, 30, CommissionStatus::Paid, None),
        ];
        let summary = EarningsSummary::from_lines(&events);
        assert_eq!(summary.pending, Decimal::from(10));
        assert_eq!(summary.payable, Decimal::from(20));
        assert_eq!(summary.paid, Decimal::from(30));
        assert_eq!(summary.total, Decimal::from(60));
    }
}
