//! External API integrations

pub mod auth_api;
pub mod checkout;
pub mod storage;

pub use auth_api::AuthApiClient;
pub use checkout::CheckoutClient;
pub use storage::StorageClient;
