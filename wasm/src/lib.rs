//! WebAssembly module for the Partner Marketplace front-end
//!
//! Provides client-side computation for:
//! - Profile completeness and the hidden-profile banner
//! - Route guard decisions
//! - The add-to-vault decision
//! - Commission totals and lateness
//! - Realtime message feed merging
//! - Form field validation

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::json;
use uuid::Uuid;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;
pub use shared::validation::*;

use shared::{guard_for_path, resolve_route, FeatureFlags, ProfileStatus, SessionFlags};

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    web_sys::console::log_1(&JsValue::from_str("partner marketplace module loaded"));
}

fn parse<T: DeserializeOwned>(what: &str, json: &str) -> Result<T, String> {
    serde_json::from_str(json).map_err(|e| format!("Invalid {} JSON: {}", what, e))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("Serialization failed: {}", e))
}

fn parse_decimal(what: &str, value: &str) -> Result<Decimal, String> {
    value
        .trim()
        .parse()
        .map_err(|_| format!("Invalid {}: {}", what, value))
}

fn profile_status_json(business_json: &str) -> Result<String, String> {
    let business: Business = parse("business", business_json)?;
    to_json(&ProfileStatus::of(&business))
}

/// Completeness, missing fields and wizard steps for a business profile
#[wasm_bindgen]
pub fn profile_status(business_json: &str) -> Result<String, JsValue> {
    profile_status_json(business_json).map_err(|e| JsValue::from_str(&e))
}

fn route_decision_json(path: &str, session: SessionFlags, flags: FeatureFlags) -> Result<String, String> {
    to_json(&resolve_route(guard_for_path(path), session, flags))
}

/// Allow or redirect for a front-end path, given what the shell knows
#[wasm_bindgen]
pub fn route_decision(
    path: &str,
    authenticated: bool,
    onboarding_complete: bool,
    subscription_active: bool,
    bypass_subscription: bool,
) -> Result<String, JsValue> {
    let session = SessionFlags {
        authenticated,
        onboarding_complete,
        subscription_active,
    };
    let flags = FeatureFlags {
        bypass_subscription,
    };
    route_decision_json(path, session, flags).map_err(|e| JsValue::from_str(&e))
}

fn vault_outcome_json(connection_status: &str) -> Result<String, String> {
    let status: ConnectionStatus = parse("connection status", &format!("\"{}\"", connection_status))?;
    let decision = vault_decision(status);
    to_json(&json!({
        "entry_status": decision.entry_status,
        "send_connection_request": decision.send_connection_request,
    }))
}

/// What saving an offer does for the current connection status
#[wasm_bindgen]
pub fn vault_outcome(connection_status: &str) -> Result<String, JsValue> {
    vault_outcome_json(connection_status).map_err(|e| JsValue::from_str(&e))
}

fn earnings_json(events_json: &str) -> Result<String, String> {
    let events: Vec<CommissionEvent> = parse("commission events", events_json)?;
    to_json(&EarningsSummary::from_lines(&events))
}

/// Pending, payable and paid totals over commission lines
#[wasm_bindgen]
pub fn earnings_summary(events_json: &str) -> Result<String, JsValue> {
    earnings_json(events_json).map_err(|e| JsValue::from_str(&e))
}

fn days_late_at(payable_at: Option<&str>, now: DateTime<Utc>) -> Result<i64, String> {
    let due = payable_at
        .map(|s| {
            DateTime::parse_from_rfc3339(s)
                .map(|d| d.with_timezone(&Utc))
                .map_err(|_| format!("Invalid timestamp: {}", s))
        })
        .transpose()?;
    Ok(days_late(due, now))
}

/// Whole days a payable commission is overdue, measured against the browser clock
#[wasm_bindgen]
pub fn commission_days_late(payable_at: Option<String>) -> Result<i64, JsValue> {
    let now = DateTime::from_timestamp_millis(js_sys::Date::now() as i64).unwrap_or_else(Utc::now);
    days_late_at(payable_at.as_deref(), now).map_err(|e| JsValue::from_str(&e))
}

fn commission_for_sale(sale_amount: &str, commission_percent: &str) -> Result<String, String> {
    let sale = parse_decimal("sale amount", sale_amount)?;
    let percent = parse_decimal("commission percent", commission_percent)?;
    validate_amount(sale)?;
    validate_commission_percent(percent)?;
    percent_of(sale, percent)
        .map(|amount| amount.to_string())
        .ok_or_else(|| "Sale amount is too large".to_string())
}

/// Affiliate share of a sale, as a decimal string
#[wasm_bindgen]
pub fn commission_amount(sale_amount: &str, commission_percent: &str) -> Result<String, JsValue> {
    commission_for_sale(sale_amount, commission_percent).map_err(|e| JsValue::from_str(&e))
}

fn merge_message(feed_json: &str, message_json: &str) -> Result<String, String> {
    let mut feed: MessageFeed = parse("feed", feed_json)?;
    let message: Message = parse("message", message_json)?;
    feed.apply(message);
    to_json(&feed)
}

/// Merge a realtime insert or update into a conversation feed
#[wasm_bindgen]
pub fn feed_apply(feed_json: &str, message_json: &str) -> Result<String, JsValue> {
    merge_message(feed_json, message_json).map_err(|e| JsValue::from_str(&e))
}

fn unread_in_feed(feed_json: &str, viewer: &str) -> Result<usize, String> {
    let feed: MessageFeed = parse("feed", feed_json)?;
    let viewer = Uuid::parse_str(viewer).map_err(|_| format!("Invalid user id: {}", viewer))?;
    Ok(feed.unread_for(viewer))
}

/// Messages in the feed the viewer has not read yet
#[wasm_bindgen]
pub fn feed_unread_count(feed_json: &str, viewer: &str) -> Result<usize, JsValue> {
    unread_in_feed(feed_json, viewer).map_err(|e| JsValue::from_str(&e))
}

fn check_field(kind: &str, value: &str) -> Option<String> {
    let result = match kind {
        "email" => validate_email(value),
        "password" => validate_password(value),
        "phone" => validate_phone(value),
        "url" => validate_url(value),
        "calendar_link" => validate_calendar_link(value),
        "message" => validate_message_body(value),
        "short_code" => validate_short_code(value),
        _ => return Some(format!("Unknown field kind: {}", kind)),
    };
    result.err().map(str::to_string)
}

/// Validation message for a form field, or nothing when the value is valid
#[wasm_bindgen]
pub fn validate_field(kind: &str, value: &str) -> Option<String> {
    check_field(kind, value)
}

/// Shareable short link for a platform (`r`) or offer (`o`) code
#[wasm_bindgen]
pub fn short_link_url(base: &str, kind: &str, code: &str) -> Option<String> {
    let kind = match kind {
        "r" | "platform" => LinkKind::Platform,
        "o" | "offer" => LinkKind::Offer,
        _ => return None,
    };
    Some(short_link(base, kind, code))
}

/// Local storage keys of the one-time prompts
#[wasm_bindgen]
pub fn prompt_storage_keys() -> Vec<String> {
    PromptFlag::all()
        .iter()
        .map(|f| f.storage_key().to_string())
        .collect()
}
