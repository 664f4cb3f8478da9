//! Fixtures shared by the integration tests: an in-memory app state and
//! helpers to create users, businesses and offers through the services.

#![allow(dead_code)]

use std::sync::Arc;

use rust_decimal::Decimal;
use shared::{Business, CreateOfferInput, Offer, OfferType, SignUpInput, UpdateBusinessInput};
use uuid::Uuid;

use partner_marketplace_backend::{config::Config, store::MemoryStore, AppState};

pub fn state() -> AppState {
    AppState::new(Arc::new(MemoryStore::new()), Config::local())
}

pub fn state_with(config: Config) -> AppState {
    AppState::new(Arc::new(MemoryStore::new()), config)
}

pub fn sign_up_input(name: &str) -> SignUpInput {
    SignUpInput {
        email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        password: "correct-horse-battery".to_string(),
        full_name: name.to_string(),
        phone: None,
        marketing_consent: false,
        terms_accepted: true,
        referral_code: None,
    }
}

/// Register a profile row as if the auth service had just created the account
pub async fn user(state: &AppState, name: &str) -> Uuid {
    let account_id = Uuid::new_v4();
    state
        .accounts()
        .register_profile(account_id, sign_up_input(name))
        .await
        .unwrap()
        .id
}

/// Every required profile field filled with a valid value
pub fn complete_profile(company: &str) -> UpdateBusinessInput {
    let slug = company.to_lowercase().replace(' ', "-");
    let s = |v: &str| Some(v.to_string());
    UpdateBusinessInput {
        contact_name: s("Dana Owner"),
        contact_title: s("Founder"),
        business_email: Some(format!("hello@{}.com", slug)),
        phone: s("(555) 123-4567"),
        company_name: s(company),
        website: Some(format!("https://{}.com", slug)),
        logo_url: Some(format!("https://{}.com/logo.png", slug)),
        city: s("Austin"),
        state: s("TX"),
        country: s("US"),
        industry: s("Marketing"),
        niche: s("B2B SaaS"),
        years_in_business: s("5"),
        team_size: s("10"),
        annual_revenue: s("$1M"),
        business_description: s("We help teams grow."),
        unique_value_proposition: s("Done-for-you campaigns"),
        target_audience: s("Founders"),
        ideal_customer: s("Seed-stage startups"),
        offer_name: s("Growth Sprint"),
        offer_description: s("Six weeks of campaigns"),
        offer_price: s("2000"),
        offer_type: s("service"),
        commission_rate: s("10%"),
        sales_process: s("Discovery call then proposal"),
        looking_for: Some(vec!["affiliates".to_string()]),
        partnership_opportunities: Some(vec!["joint webinars".to_string()]),
        calendar_link: Some(format!("https://cal.example.com/{}", slug)),
    }
}

/// A live business with its complete profile
pub async fn live_business(state: &AppState, owner: Uuid, company: &str) -> Business {
    let businesses = state.businesses();
    businesses
        .update_profile(owner, complete_profile(company))
        .await
        .unwrap();
    let published = businesses.publish(owner).await.unwrap();
    assert!(published.success, "{}", published.message);
    published.data.unwrap()
}

pub fn offer_input(title: &str, commission_percent: i64) -> CreateOfferInput {
    CreateOfferInput {
        title: title.to_string(),
        description: format!("{} for partners", title),
        offer_type: OfferType::Service,
        price: Decimal::from(500),
        commission_percent: Decimal::from(commission_percent),
    }
}

/// Owner with a live business and one active offer
pub async fn owner_with_offer(state: &AppState, name: &str, company: &str) -> (Uuid, Business, Offer) {
    let owner = user(state, name).await;
    let business = live_business(state, owner, company).await;
    let offer = state
        .offers()
        .create(owner, offer_input(&format!("{} Offer", company), 20))
        .await
        .unwrap();
    (owner, business, offer)
}
