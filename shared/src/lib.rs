//! Shared types and models for the Partner Marketplace
//!
//! This crate contains the domain models and the pure derived-state
//! calculators shared between the backend, the front-end (via WASM),
//! and the test suites.

pub mod access;
pub mod models;
pub mod plans;
pub mod profile;
pub mod types;
pub mod validation;

pub use access::*;
pub use models::*;
pub use plans::*;
pub use profile::*;
pub use types::*;
pub use validation::*;
