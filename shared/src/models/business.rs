//! Business profile models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Marketplace visibility of a business profile
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "text", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum ProfileState {
    #[default]
    Draft,
    Live,
}

/// A business profile, owned by exactly one user
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Business {
    pub id: Uuid,
    pub owner_user_id: Uuid,

    // Contact
    pub contact_name: String,
    pub contact_title: String,
    pub business_email: String,
    pub phone: String,

    // Company
    pub company_name: String,
    pub website: String,
    pub logo_url: String,
    pub city: String,
    pub state: String,
    pub country: String,

    // Industry
    pub industry: String,
    pub niche: String,
    pub years_in_business: String,
    pub team_size: String,
    pub annual_revenue: String,

    // Story
    pub business_description: String,
    pub unique_value_proposition: String,

    // Audience
    pub target_audience: String,
    pub ideal_customer: String,

    // Offer
    pub offer_name: String,
    pub offer_description: String,
    pub offer_price: String,
    pub offer_type: String,
    pub commission_rate: String,

    // Partnerships
    pub sales_process: String,
    pub looking_for: Vec<String>,
    pub partnership_opportunities: Vec<String>,

    // Scheduling
    pub calendar_link: String,

    pub profile_state: ProfileState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update from the onboarding form or one wizard step.
/// `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBusinessInput {
    pub contact_name: Option<String>,
    pub contact_title: Option<String>,
    pub business_email: Option<String>,
    pub phone: Option<String>,
    pub company_name: Option<String>,
    pub website: Option<String>,
    pub logo_url: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub industry: Option<String>,
    pub niche: Option<String>,
    pub years_in_business: Option<String>,
    pub team_size: Option<String>,
    pub annual_revenue: Option<String>,
    pub business_description: Option<String>,
    pub unique_value_proposition: Option<String>,
    pub target_audience: Option<String>,
    pub ideal_customer: Option<String>,
    pub offer_name: Option<String>,
    pub offer_description: Option<String>,
    pub offer_price: Option<String>,
    pub offer_type: Option<String>,
    pub commission_rate: Option<String>,
    pub sales_process: Option<String>,
    pub looking_for: Option<Vec<String>>,
    pub partnership_opportunities: Option<Vec<String>>,
    pub calendar_link: Option<String>,
}

macro_rules! apply_fields {
    ($target:expr, $input:expr, $($field:ident),+ $(,)?) => {
        $(
            if let Some(value) = $input.$field {
                $target.$field = value;
            }
        )+
    };
}

impl UpdateBusinessInput {
    /// Merge the provided fields into `business`
    pub fn apply_to(self, business: &mut Business) {
        apply_fields!(
            business,
            self,
            contact_name,
            contact_title,
            business_email,
            phone,
            company_name,
            website,
            logo_url,
            city,
            state,
            country,
            industry,
            niche,
            years_in_business,
            team_size,
            annual_revenue,
            business_description,
            unique_value_proposition,
            target_audience,
            ideal_customer,
            offer_name,
            offer_description,
            offer_price,
            offer_type,
            commission_rate,
            sales_process,
            looking_for,
            partnership_opportunities,
            calendar_link,
        );
    }
}

/// Card shown in the marketplace directory and on connection lists
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BusinessSummary {
    pub id: Uuid,
    pub owner_user_id: Uuid,
    pub company_name: String,
    pub industry: String,
    pub niche: String,
    pub logo_url: String,
    pub city: String,
    pub country: String,
}

impl From<&Business> for BusinessSummary {
    fn from(b: &Business) -> Self {
        Self {
            id: b.id,
            owner_user_id: b.owner_user_id,
            company_name: b.company_name.clone(),
            industry: b.industry.clone(),
            niche: b.niche.clone(),
            logo_url: b.logo_url.clone(),
            city: b.city.clone(),
            country: b.country.clone(),
        }
    }
}

/// Directory filter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectoryFilter {
    pub industry: Option<String>,
    pub search: Option<String>,
}

impl DirectoryFilter {
    /// Case-insensitive match on industry and free-text search
    pub fn matches(&self, business: &Business) -> bool {
        if let Some(industry) = &self.industry {
            if !business.industry.eq_ignore_ascii_case(industry) {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.trim().to_lowercase();
            if !needle.is_empty() {
                let haystacks = [
                    &business.company_name,
                    &business.niche,
                    &business.business_description,
                ];
                return haystacks.iter().any(|h| h.to_lowercase().contains(&needle));
            }
        }
        true
    }
}
