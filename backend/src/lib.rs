//! Partner Marketplace - Backend
//!
//! Business owners publish a partner profile and offers, connect with each
//! other, save offers to a vault, refer customers through short links and
//! settle affiliate commissions.

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod external;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod store;

pub use config::Config;

use external::{AuthApiClient, CheckoutClient, StorageClient};
use services::{
    AccountService, BillingService, BusinessService, CodeIssuer, CommissionService,
    ConnectionService, MessageService, NotificationService, OfferService, ReferralService,
    VaultService,
};
use store::Store;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<Config>,
    pub codes: Arc<CodeIssuer>,
    pub auth_api: AuthApiClient,
    pub storage: StorageClient,
    pub checkout: CheckoutClient,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        let codes = Arc::new(CodeIssuer::from_config(&config.referral));
        Self {
            auth_api: AuthApiClient::new(&config.auth),
            storage: StorageClient::new(&config.storage),
            checkout: CheckoutClient::new(&config.payments),
            store,
            codes,
            config: Arc::new(config),
        }
    }

    pub fn accounts(&self) -> AccountService {
        AccountService::new(self.store.clone(), self.referrals())
    }

    pub fn billing(&self) -> BillingService {
        BillingService::new(self.store.clone(), self.referrals())
    }

    pub fn businesses(&self) -> BusinessService {
        BusinessService::new(self.store.clone())
    }

    pub fn commissions(&self) -> CommissionService {
        CommissionService::new(self.store.clone(), self.config.commission.clone())
    }

    pub fn connections(&self) -> ConnectionService {
        ConnectionService::new(self.store.clone())
    }

    pub fn messages(&self) -> MessageService {
        MessageService::new(self.store.clone())
    }

    pub fn notifications(&self) -> NotificationService {
        NotificationService::new(self.store.clone())
    }

    pub fn offers(&self) -> OfferService {
        OfferService::new(self.store.clone())
    }

    pub fn referrals(&self) -> ReferralService {
        ReferralService::new(
            self.store.clone(),
            self.codes.clone(),
            self.config.referral.clone(),
        )
    }

    pub fn vault(&self) -> VaultService {
        VaultService::new(self.store.clone())
    }
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(handlers::health_check))
        .merge(routes::short_link_routes())
        .nest("/api/v1", routes::api_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn root() -> &'static str {
    "Partner Marketplace API v1.0"
}
