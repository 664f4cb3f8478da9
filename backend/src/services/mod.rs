//! Business logic services for the Partner Marketplace

pub mod account;
pub mod billing;
pub mod business;
pub mod commission;
pub mod connection;
pub mod message;
pub mod notification;
pub mod offer;
pub mod referral;
pub mod vault;

pub use account::AccountService;
pub use billing::BillingService;
pub use business::BusinessService;
pub use commission::CommissionService;
pub use connection::ConnectionService;
pub use message::MessageService;
pub use notification::NotificationService;
pub use offer::OfferService;
pub use referral::{CodeIssuer, ReferralService};
pub use vault::VaultService;
