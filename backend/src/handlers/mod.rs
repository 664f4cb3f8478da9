//! HTTP handlers

pub mod access;
pub mod auth;
pub mod billing;
pub mod business;
pub mod commission;
pub mod connection;
pub mod health;
pub mod message;
pub mod notification;
pub mod offer;
pub mod referral;
pub mod vault;

pub use access::*;
pub use auth::*;
pub use billing::*;
pub use business::*;
pub use commission::*;
pub use connection::*;
pub use health::*;
pub use message::*;
pub use notification::*;
pub use offer::*;
pub use referral::*;
pub use vault::*;
