//! Partner offer models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::commission::percent_of;

/// Kind of deal a business promotes through partners
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "text", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum OfferType {
    Product,
    Service,
    Course,
    Software,
    Event,
    Other,
}

/// A promotable deal belonging to a business
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Offer {
    pub id: Uuid,
    pub business_id: Uuid,
    pub title: String,
    pub description: String,
    pub offer_type: OfferType,
    pub price: Decimal,
    /// Percent of the sale paid to the referring partner (0, 100]
    pub commission_percent: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Offer {
    /// Commission owed on a sale of `sale_amount`, rounded to cents
    pub fn commission_for(&self, sale_amount: Decimal) -> Option<Decimal> {
        percent_of(sale_amount, self.commission_percent)
    }
}

/// Input for creating an offer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOfferInput {
    pub title: String,
    pub description: String,
    pub offer_type: OfferType,
    pub price: Decimal,
    pub commission_percent: Decimal,
}

/// Input for updating an offer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateOfferInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub offer_type: Option<OfferType>,
    pub price: Option<Decimal>,
    pub commission_percent: Option<Decimal>,
    pub is_active: Option<bool>,
}

impl UpdateOfferInput {
    pub fn apply_to(self, offer: &mut Offer) {
        if let Some(title) = self.title {
            offer.title = title;
        }
        if let Some(description) = self.description {
            offer.description = description;
        }
        if let Some(offer_type) = self.offer_type {
            offer.offer_type = offer_type;
        }
        if let Some(price) = self.price {
            offer.price = price;
        }
        if let Some(commission_percent) = self.commission_percent {
            offer.commission_percent = commission_percent;
        }
        if let Some(is_active) = self.is_active {
            offer.is_active = is_active;
        }
    }
}

/// Marketplace listing filter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OfferFilter {
    pub offer_type: Option<OfferType>,
    pub min_commission: Option<Decimal>,
    pub search: Option<String>,
}

impl OfferFilter {
    pub fn matches(&self, offer: &Offer) -> bool {
        if let Some(t) = self.offer_type {
            if offer.offer_type != t {
                return false;
            }
        }
        if let Some(min) = self.min_commission {
            if offer.commission_percent < min {
                return false;
            }
        }
        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => {
                let needle = needle.to_lowercase();
                offer.title.to_lowercase().contains(&needle)
                    || offer.description.to_lowercase().contains(&needle)
            }
            _ => true,
        }
    }
}

/// A user's bookmarked business
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Favorite {
    pub id: Uuid,
    pub user_id: Uuid,
    pub business_id: Uuid,
    pub created_at: DateTime<Utc>,
}
