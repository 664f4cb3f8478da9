//! Route definitions for the Partner Marketplace

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Public short links, served at the site root
pub fn short_link_routes() -> Router<AppState> {
    Router::new()
        .route("/r/:code", get(handlers::follow_referral_link))
        .route("/o/:code", get(handlers::follow_offer_link))
}

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Route guard answers (public, reads the bearer token if present)
        .route("/access", get(handlers::check_access))
        // Auth routes (public plus a protected account subtree)
        .nest("/auth", auth_routes(state.clone()))
        // Plans and the checkout webhook (public)
        .route("/billing/plans", get(handlers::list_plans))
        .route("/billing/webhook", post(handlers::handle_checkout_webhook))
        // Protected routes
        .nest("/billing", billing_routes(state.clone()))
        .nest("/business", my_business_routes(state.clone()))
        .nest("/businesses", directory_routes(state.clone()))
        .nest("/favorites", favorite_routes(state.clone()))
        .nest("/offers", offer_routes(state.clone()))
        .nest("/connections", connection_routes(state.clone()))
        .nest("/vault", vault_routes(state.clone()))
        .nest("/commissions", commission_routes(state.clone()))
        .nest("/referrals", referral_routes(state.clone()))
        .nest("/conversations", conversation_routes(state.clone()))
        .nest("/notifications", notification_routes(state))
}

/// Authentication routes
fn auth_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/signup", post(handlers::sign_up))
        .route("/signin", post(handlers::sign_in))
        .route("/forgot-password", post(handlers::forgot_password))
        .route("/resend-verification", post(handlers::resend_verification))
        .merge(account_routes(state))
}

/// Account routes (protected)
fn account_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/signout", post(handlers::sign_out))
        .route("/me", get(handlers::me))
        .route("/me/w9", post(handlers::upload_w9))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Checkout routes (protected)
fn billing_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/checkout", post(handlers::create_checkout))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// The caller's own business profile (protected)
fn my_business_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::get_my_business).put(handlers::update_my_business),
        )
        .route("/status", get(handlers::get_profile_status))
        .route("/steps", get(handlers::get_wizard_steps))
        .route("/publish", post(handlers::publish_business))
        .route("/unpublish", post(handlers::unpublish_business))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Marketplace directory (protected)
fn directory_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_directory))
        .route("/:business_id", get(handlers::get_business))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Favorite businesses (protected)
fn favorite_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_favorites))
        .route(
            "/:business_id",
            post(handlers::add_favorite).delete(handlers::remove_favorite),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Offer management and marketplace (protected)
fn offer_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_marketplace).post(handlers::create_offer),
        )
        .route("/mine", get(handlers::list_my_offers))
        .route(
            "/:offer_id",
            put(handlers::update_offer).delete(handlers::delete_offer),
        )
        .route("/:offer_id/referral-link", post(handlers::get_offer_referral_link))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Connection routes (protected)
fn connection_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_connections).post(handlers::send_request),
        )
        .route("/status/:user_id", get(handlers::get_connection_status))
        .route("/:connection_id", delete(handlers::cancel_request))
        .route("/:connection_id/accept", post(handlers::accept_request))
        .route("/:connection_id/decline", post(handlers::decline_request))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Offer vault routes (protected)
fn vault_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_vault).post(handlers::add_to_vault))
        .route("/reconcile", post(handlers::reconcile_vault))
        .route("/:entry_id", delete(handlers::remove_from_vault))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Commission routes (protected)
fn commission_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/summary", get(handlers::get_affiliate_summary))
        .route("/conversions", post(handlers::record_conversion))
        .route("/earnings", get(handlers::get_earnings))
        .route(
            "/affiliates/:affiliate_user_id/mark-paid",
            post(handlers::mark_paid),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Platform referral dashboard (protected)
fn referral_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/me", get(handlers::get_referral_stats))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Messaging routes (protected)
fn conversation_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_conversations).post(handlers::open_conversation),
        )
        .route(
            "/:conversation_id/messages",
            get(handlers::list_messages).post(handlers::send_message),
        )
        .route("/:conversation_id/read", post(handlers::mark_conversation_read))
        .route("/:conversation_id/channel", get(handlers::get_conversation_channel))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Notification routes (protected)
fn notification_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::get_notifications))
        .route("/unread-count", get(handlers::get_unread_count))
        .route("/read-all", post(handlers::mark_all_as_read))
        .route("/channel", get(handlers::get_notification_channel))
        .route("/:notification_id/read", post(handlers::mark_as_read))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
