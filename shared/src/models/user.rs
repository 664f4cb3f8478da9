//! User account models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Subscription state as reported by the payment provider
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "text", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    #[default]
    None,
    Active,
    PastDue,
    Canceled,
    Lifetime,
}

impl SubscriptionStatus {
    /// Whether this status grants access to subscriber-only screens
    pub fn is_active(&self) -> bool {
        matches!(self, SubscriptionStatus::Active | SubscriptionStatus::Lifetime)
    }
}

/// A user account on the platform
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub marketing_consent: bool,
    pub terms_accepted: bool,
    pub referral_code: Option<String>,
    pub referred_by: Option<Uuid>,
    pub subscription_status: SubscriptionStatus,
    pub w9_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating the profile row after the auth service signs a user up
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub marketing_consent: bool,
    pub terms_accepted: bool,
    pub referred_by: Option<Uuid>,
}

/// Sign-up request body
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SignUpInput {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,
    pub phone: Option<String>,
    #[serde(default)]
    pub marketing_consent: bool,
    pub terms_accepted: bool,
    /// Referral code from a `/r/{code}` landing, if any
    pub referral_code: Option<String>,
}

/// Sign-in request body
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SignInInput {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// One-time prompts whose dismissal the front-end keeps in local storage
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PromptFlag {
    ProfileCheckDismissed,
    OnboardingCallBooked,
}

impl PromptFlag {
    pub fn storage_key(&self) -> &'static str {
        match self {
            PromptFlag::ProfileCheckDismissed => "profile_check_dismissed",
            PromptFlag::OnboardingCallBooked => "onboarding_call_booked",
        }
    }

    pub fn all() -> [PromptFlag; 2] {
        [PromptFlag::ProfileCheckDismissed, PromptFlag::OnboardingCallBooked]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_active_states() {
        assert!(SubscriptionStatus::Active.is_active());
        assert!(SubscriptionStatus::Lifetime.is_active());
        assert!(!SubscriptionStatus::PastDue.is_active());
        assert!(!SubscriptionStatus::Canceled.is_active());
        assert!(!SubscriptionStatus::None.is_active());
    }

    #[test]
    fn test_sign_up_validation() {
        let input = SignUpInput {
            email: "not-an-email".to_string(),
            password: "short".to_string(),
            full_name: "".to_string(),
            phone: None,
            marketing_consent: false,
            terms_accepted: true,
            referral_code: None,
        };
        let errors = input.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
        assert!(fields.contains_key("full_name"));
    }

    #[test]
    fn test_prompt_storage_keys() {
        let keys: Vec<_> = PromptFlag::all().iter().map(|f| f.storage_key()).collect();
        assert_eq!(keys, vec!["profile_check_dismissed", "onboarding_call_booked"]);
    }
}
