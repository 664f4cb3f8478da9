//! Commission ledger service
//!
//! Conversions captured through affiliate links become pending commission
//! events. Once an affiliate's pending total with a business reaches the
//! payout threshold, those events turn payable with a due date; the business
//! then marks them paid.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use shared::{
    payable_due_date, percent_of, promote_payable, summarize_by_affiliate, validate_amount,
    ActionResult, AffiliateSummary, Business, CommissionEvent, CommissionStatus, EarningsSummary,
    Lead, NewNotification, RecordConversionInput,
};
use uuid::Uuid;

use crate::config::CommissionConfig;
use crate::error::{AppError, AppResult};
use crate::services::notification::NotificationService;
use crate::store::Store;

#[derive(Clone)]
pub struct CommissionService {
    store: Arc<dyn Store>,
    config: CommissionConfig,
}

/// One CSV row of the per-affiliate summary
#[derive(Debug, Serialize)]
struct SummaryCsvRow {
    affiliate_user_id: Uuid,
    clicks: i64,
    conversions: i64,
    owed_to_affiliate: Decimal,
    owed_to_platform: Decimal,
    paid_to_affiliate: Decimal,
    payable_now: Decimal,
    max_days_late: i64,
}

impl From<&AffiliateSummary> for SummaryCsvRow {
    fn from(s: &AffiliateSummary) -> Self {
        Self {
            affiliate_user_id: s.affiliate_user_id,
            clicks: s.clicks,
            conversions: s.conversions,
            owed_to_affiliate: s.owed_to_affiliate,
            owed_to_platform: s.owed_to_platform,
            paid_to_affiliate: s.paid_to_affiliate,
            payable_now: s.payable_now,
            max_days_late: s.max_days_late,
        }
    }
}

impl CommissionService {
    pub fn new(store: Arc<dyn Store>, config: CommissionConfig) -> Self {
        Self { store, config }
    }

    async fn business_of(&self, owner_user_id: Uuid) -> AppResult<Business> {
        self.store
            .get_business_by_owner(owner_user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Business".to_string()))
    }

    /// Record a sale made through an affiliate code
    pub async fn record_conversion(&self, input: RecordConversionInput) -> AppResult<CommissionEvent> {
        validate_amount(input.sale_amount).map_err(|m| AppError::validation("sale_amount", m))?;
        if input.name.trim().is_empty() {
            return Err(AppError::validation("name", "Name is required"));
        }
        shared::validate_email(&input.email).map_err(|m| AppError::validation("email", m))?;

        let link = self
            .store
            .find_affiliate_link_by_code(&input.code)
            .await?
            .ok_or_else(|| AppError::NotFound("Affiliate link".to_string()))?;
        let offer = self
            .store
            .get_offer(link.offer_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Offer".to_string()))?;

        let now = Utc::now();
        let lead = Lead {
            id: Uuid::new_v4(),
            affiliate_link_id: link.id,
            affiliate_user_id: link.affiliate_user_id,
            business_id: link.business_id,
            offer_id: link.offer_id,
            name: input.name.trim().to_string(),
            email: input.email.trim().to_string(),
            sale_amount: input.sale_amount,
            created_at: now,
        };
        let lead = self.store.insert_lead(&lead).await?;

        let affiliate_amount = offer
            .commission_for(input.sale_amount)
            .ok_or_else(|| AppError::validation("sale_amount", "Sale amount is too large"))?;
        let platform_amount = percent_of(affiliate_amount, self.config.platform_share_percent)
            .ok_or_else(|| AppError::validation("sale_amount", "Sale amount is too large"))?;
        let event = CommissionEvent {
            id: Uuid::new_v4(),
            lead_id: lead.id,
            affiliate_user_id: link.affiliate_user_id,
            business_id: link.business_id,
            offer_id: link.offer_id,
            sale_amount: input.sale_amount,
            affiliate_amount,
            platform_amount,
            status: CommissionStatus::Pending,
            payable_at: None,
            paid_at: None,
            created_at: now,
        };
        let event = self.store.insert_commission_event(&event).await?;

        tracing::info!(
            event_id = %event.id,
            affiliate = %event.affiliate_user_id,
            business_id = %event.business_id,
            affiliate_amount = %event.affiliate_amount,
            "commission recorded"
        );

        let company = self
            .store
            .get_business(link.business_id)
            .await?
            .map(|b| b.company_name)
            .unwrap_or_default();
        NotificationService::new(self.store.clone())
            .notify(NewNotification::commission_recorded(link.affiliate_user_id, &company))
            .await;

        self.promote(link.business_id).await?;
        Ok(event)
    }

    /// A business owner reporting a sale against one of their own links
    pub async fn record_sale(
        &self,
        owner_user_id: Uuid,
        input: RecordConversionInput,
    ) -> AppResult<CommissionEvent> {
        let business = self.business_of(owner_user_id).await?;
        let link = self
            .store
            .find_affiliate_link_by_code(&input.code)
            .await?
            .ok_or_else(|| AppError::NotFound("Affiliate link".to_string()))?;
        if link.business_id != business.id {
            return Err(AppError::Forbidden(
                "This referral code belongs to another business".to_string(),
            ));
        }
        self.record_conversion(input).await
    }

    /// Move pending events over the threshold to payable. Returns how many changed.
    pub async fn promote(&self, business_id: Uuid) -> AppResult<u64> {
        let events = self
            .store
            .list_commission_events_for_business(business_id)
            .await?;
        let ids = promote_payable(&events, self.config.payout_threshold);
        if ids.is_empty() {
            return Ok(0);
        }
        let due = payable_due_date(Utc::now(), self.config.grace_days);
        let promoted = self.store.mark_commissions_payable(&ids, due).await?;
        tracing::info!(business_id = %business_id, promoted, due = %due, "commissions payable");
        Ok(promoted)
    }

    /// Per-affiliate ledger of the owner's business
    pub async fn summary(&self, owner_user_id: Uuid) -> AppResult<Vec<AffiliateSummary>> {
        let business = self.business_of(owner_user_id).await?;
        let events = self
            .store
            .list_commission_events_for_business(business.id)
            .await?;
        let links = self.store.list_links_for_business(business.id).await?;
        Ok(summarize_by_affiliate(&events, &links, Utc::now()))
    }

    /// Settle everything payable to one affiliate
    pub async fn mark_paid(
        &self,
        owner_user_id: Uuid,
        affiliate_user_id: Uuid,
    ) -> AppResult<ActionResult<u64>> {
        let business = self.business_of(owner_user_id).await?;
        let paid = self
            .store
            .mark_commissions_paid(business.id, affiliate_user_id, Utc::now())
            .await?;
        if paid == 0 {
            return Ok(ActionResult::failure(
                "No payable commissions for this affiliate",
            ));
        }
        tracing::info!(
            business_id = %business.id,
            affiliate = %affiliate_user_id,
            paid,
            "commissions marked paid"
        );
        Ok(ActionResult::ok(format!("{} commissions marked paid", paid), paid))
    }

    /// Totals the affiliate has earned across all businesses
    pub async fn earnings(&self, affiliate_user_id: Uuid) -> AppResult<EarningsSummary> {
        let events = self
            .store
            .list_commission_events_for_affiliate(affiliate_user_id)
            .await?;
        Ok(EarningsSummary::from_lines(&events))
    }

    /// Per-affiliate summary as CSV
    pub async fn export_summary_csv(&self, owner_user_id: Uuid) -> AppResult<String> {
        let summaries = self.summary(owner_user_id).await?;
        let rows: Vec<SummaryCsvRow> = summaries.iter().map(SummaryCsvRow::from).collect();
        export_to_csv(&rows)
    }
}

/// Serialize records to CSV with a header row
pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for record in data {
        wtr.serialize(record)
            .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
}
