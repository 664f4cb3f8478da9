//! Route guards for the single-page front-end
//!
//! Three independent predicates gate a route: signed in, onboarding done,
//! subscription active. They are checked in that order and the first one
//! that fails picks the redirect.

use serde::{Deserialize, Serialize};

/// Environment toggles injected at startup
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeatureFlags {
    /// Treat every session as subscribed
    #[serde(default)]
    pub bypass_subscription: bool,
}

/// What the shell knows about the current visitor
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionFlags {
    pub authenticated: bool,
    pub onboarding_complete: bool,
    pub subscription_active: bool,
}

/// Protection level of a route
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RouteGuard {
    Public,
    /// Signed in, but the onboarding form itself must stay reachable
    Authenticated,
    /// Signed in and onboarded; the pricing page lives here
    Onboarded,
    /// Signed in, onboarded and subscribed
    Subscriber,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "decision", content = "to", rename_all = "snake_case")]
pub enum RouteDecision {
    Allow,
    Redirect(&'static str),
}

pub const LOGIN_PATH: &str = "/login";
pub const ONBOARDING_PATH: &str = "/onboarding";
pub const PRICING_PATH: &str = "/pricing";

pub fn resolve_route(guard: RouteGuard, session: SessionFlags, flags: FeatureFlags) -> RouteDecision {
    if guard == RouteGuard::Public {
        return RouteDecision::Allow;
    }
    if !session.authenticated {
        return RouteDecision::Redirect(LOGIN_PATH);
    }
    if guard == RouteGuard::Authenticated {
        return RouteDecision::Allow;
    }
    if !session.onboarding_complete {
        return RouteDecision::Redirect(ONBOARDING_PATH);
    }
    if guard == RouteGuard::Onboarded {
        return RouteDecision::Allow;
    }
    if !(session.subscription_active || flags.bypass_subscription) {
        return RouteDecision::Redirect(PRICING_PATH);
    }
    RouteDecision::Allow
}

/// Guard for a front-end path
pub fn guard_for_path(path: &str) -> RouteGuard {
    let first = path.trim_start_matches('/').split('/').next().unwrap_or("");
    match first {
        "" | "login" | "signup" | "forgot-password" | "reset-password" | "verify-email" | "r"
        | "o" => RouteGuard::Public,
        "onboarding" => RouteGuard::Authenticated,
        "pricing" | "checkout" | "account" => RouteGuard::Onboarded,
        _ => RouteGuard::Subscriber,
    }
}
