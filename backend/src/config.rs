//! Configuration management for the Partner Marketplace
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with PM_ prefix

use config::{ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::FeatureFlags;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// `pretty` or `json` log lines
    pub log_format: String,

    pub server: ServerConfig,

    pub database: DatabaseConfig,

    pub store: StoreConfig,

    /// Hosted auth service
    pub auth: AuthConfig,

    /// Hosted file storage
    pub storage: StorageConfig,

    /// Serverless checkout endpoint
    pub payments: PaymentsConfig,

    #[serde(default)]
    pub features: FeatureFlags,

    pub referral: ReferralConfig,

    pub commission: CommissionConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL of the hosted data service
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

/// Which store implementation backs the services
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// Base URL of the auth service, e.g. https://<project>.example.co/auth/v1
    pub api_url: String,

    /// Public API key sent with every auth request
    pub anon_key: String,

    /// Secret the auth service signs session JWTs with (HS256)
    pub jwt_secret: String,

    /// Where verification and reset emails send the user back to
    pub redirect_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Base URL of the storage service, e.g. https://<project>.example.co/storage/v1
    pub api_url: String,

    /// Service key allowed to write private buckets
    pub service_key: String,

    pub tax_docs_bucket: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaymentsConfig {
    /// Serverless function that creates checkout sessions
    pub checkout_url: String,

    /// Shared secret for the checkout webhook signature
    pub webhook_secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReferralConfig {
    pub code_length: usize,

    /// Total generation attempts before giving up on a unique code
    pub max_code_attempts: u32,

    /// Fixed RNG seed for reproducible codes; unset in production
    pub rng_seed: Option<u64>,

    /// Public base URL short links are built on
    pub short_link_base: String,

    /// Referrer's share of a referred user's plan payment, in percent
    pub revenue_share_percent: Decimal,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CommissionConfig {
    /// Accumulated pending amount that makes lines payable, in USD
    pub payout_threshold: Decimal,

    /// Days between becoming payable and being due
    pub grace_days: i64,

    /// Platform's cut of each affiliate commission, in percent
    pub platform_share_percent: Decimal,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("PM_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("log_format", "pretty")?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.url", "postgres://localhost/partner_marketplace")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("store.backend", "postgres")?
            .set_default("auth.api_url", "http://localhost:9999")?
            .set_default("auth.anon_key", "")?
            .set_default("auth.jwt_secret", "development-secret-key")?
            .set_default("auth.redirect_url", "http://localhost:5173")?
            .set_default("storage.api_url", "http://localhost:5000")?
            .set_default("storage.service_key", "")?
            .set_default("storage.tax_docs_bucket", "tax-docs")?
            .set_default("payments.checkout_url", "http://localhost:54321/functions/v1/checkout")?
            .set_default("payments.webhook_secret", "")?
            .set_default("features.bypass_subscription", false)?
            .set_default("referral.code_length", 8)?
            .set_default("referral.max_code_attempts", 10)?
            .set_default("referral.short_link_base", "http://localhost:5173")?
            .set_default("referral.revenue_share_percent", "20")?
            .set_default("commission.payout_threshold", "50")?
            .set_default("commission.grace_days", 30)?
            .set_default("commission.platform_share_percent", "20")?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (PM_ prefix)
            .add_source(
                Environment::with_prefix("PM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Config {
    /// Fully local configuration: in-memory store, no external services
    /// reachable, subscription gate bypassed
    pub fn local() -> Self {
        Config {
            environment: "development".to_string(),
            log_format: "pretty".to_string(),
            server: ServerConfig::default(),
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 1,
                min_connections: 0,
            },
            store: StoreConfig {
                backend: StoreBackend::Memory,
            },
            auth: AuthConfig {
                api_url: "http://localhost:9999".to_string(),
                anon_key: String::new(),
                jwt_secret: "development-secret-key".to_string(),
                redirect_url: "http://localhost:5173".to_string(),
            },
            storage: StorageConfig {
                api_url: "http://localhost:5000".to_string(),
                service_key: String::new(),
                tax_docs_bucket: "tax-docs".to_string(),
            },
            payments: PaymentsConfig {
                checkout_url: "http://localhost:54321/functions/v1/checkout".to_string(),
                webhook_secret: String::new(),
            },
            features: FeatureFlags {
                bypass_subscription: true,
            },
            referral: ReferralConfig::default(),
            commission: CommissionConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}

impl Default for ReferralConfig {
    fn default() -> Self {
        Self {
            code_length: 8,
            max_code_attempts: 10,
            rng_seed: None,
            short_link_base: "http://localhost:5173".to_string(),
            revenue_share_percent: Decimal::from(20),
        }
    }
}

impl Default for CommissionConfig {
    fn default() -> Self {
        Self {
            payout_threshold: Decimal::from(50),
            grace_days: 30,
            platform_share_percent: Decimal::from(20),
        }
    }
}
