//! Domain models for the Partner Marketplace

mod business;
mod commission;
mod connection;
mod message;
mod notification;
mod offer;
mod referral;
mod user;
mod vault;

pub use business::*;
pub use commission::*;
pub use connection::*;
pub use message::*;
pub use notification::*;
pub use offer::*;
pub use referral::*;
pub use user::*;
pub use vault::*;
