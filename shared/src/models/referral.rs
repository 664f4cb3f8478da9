//! Platform referral program models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::commission::{percent_of, CommissionStatus, EarningsSummary, LedgerLine};
use crate::plans::PlanTier;

/// Which kind of short link a code resolves through
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    /// Platform referral, `/r/{code}`
    Platform,
    /// Offer affiliate link, `/o/{code}`
    Offer,
}

impl LinkKind {
    pub fn path_segment(&self) -> &'static str {
        match self {
            LinkKind::Platform => "r",
            LinkKind::Offer => "o",
        }
    }
}

/// Build the public short link for a code
pub fn short_link(base: &str, kind: LinkKind, code: &str) -> String {
    format!("{}/{}/{}", base.trim_end_matches('/'), kind.path_segment(), code)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ReferralClick {
    pub id: Uuid,
    pub referrer_user_id: Uuid,
    pub code: String,
    pub landing_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A referred user's first paid plan
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ReferralConversion {
    pub id: Uuid,
    pub referrer_user_id: Uuid,
    pub referred_user_id: Uuid,
    /// Checkout session that paid for the plan, unique per conversion
    pub checkout_session_id: String,
    pub plan: PlanTier,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Revenue share owed to the referrer for one conversion
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ReferralCommission {
    pub id: Uuid,
    pub conversion_id: Uuid,
    pub referrer_user_id: Uuid,
    pub amount: Decimal,
    pub status: CommissionStatus,
    pub payable_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl LedgerLine for ReferralCommission {
    fn amount(&self) -> Decimal {
        self.amount
    }

    fn status(&self) -> CommissionStatus {
        self.status
    }
}

/// Referral dashboard numbers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferralStats {
    pub code: String,
    pub short_link: String,
    pub clicks: i64,
    pub signups: i64,
    pub conversions: i64,
    pub earnings: EarningsSummary,
}

/// Revenue share on a plan payment, rounded to cents
pub fn referral_share(amount: Decimal, share_percent: Decimal) -> Option<Decimal> {
    percent_of(amount, share_percent)
}
