//! Data-store seam for the hosted data service
//!
//! Services only talk to `dyn Store`. `PgStore` runs against the hosted
//! Postgres whose schema the data service owns; `MemoryStore` keeps the same
//! contract in process for local development and the test suites.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::{
    AffiliateLink, Business, CommissionEvent, Connection, Conversation, Favorite, Lead, Message,
    NewNotification, NewUser, Notification, Offer, ReferralClick, ReferralCommission,
    ReferralConversion, SubscriptionStatus, User, VaultEntry,
};
use uuid::Uuid;

use crate::error::AppResult;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Which table a short code must be unique in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeNamespace {
    /// Platform referral codes on users
    User,
    /// Per-offer affiliate codes on affiliate links
    Offer,
}

/// Outcome of the acceptance cascade
#[derive(Debug, Clone)]
pub struct AcceptOutcome {
    pub connection: Connection,
    /// Vault entries flipped to approved, both directions combined
    pub approved_entries: u64,
    pub notification: Notification,
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Cheap liveness probe for the health endpoint
    async fn ping(&self) -> AppResult<()>;

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    async fn get_user(&self, user_id: Uuid) -> AppResult<Option<User>>;

    async fn insert_user(&self, user: NewUser) -> AppResult<User>;

    async fn find_user_by_referral_code(&self, code: &str) -> AppResult<Option<User>>;

    /// Fails with `DuplicateEntry` when another user holds the code
    async fn set_referral_code(&self, user_id: Uuid, code: &str) -> AppResult<()>;

    async fn set_subscription_status(
        &self,
        user_id: Uuid,
        status: SubscriptionStatus,
    ) -> AppResult<()>;

    async fn set_w9_path(&self, user_id: Uuid, path: &str) -> AppResult<()>;

    async fn count_referred_users(&self, referrer: Uuid) -> AppResult<i64>;

    async fn code_taken(&self, namespace: CodeNamespace, code: &str) -> AppResult<bool>;

    // ------------------------------------------------------------------
    // Businesses, offers, favorites
    // ------------------------------------------------------------------

    async fn get_business(&self, business_id: Uuid) -> AppResult<Option<Business>>;

    async fn get_business_by_owner(&self, owner_user_id: Uuid) -> AppResult<Option<Business>>;

    /// Insert or replace the row with `business.id`
    async fn save_business(&self, business: &Business) -> AppResult<Business>;

    async fn list_live_businesses(&self) -> AppResult<Vec<Business>>;

    async fn get_offer(&self, offer_id: Uuid) -> AppResult<Option<Offer>>;

    async fn list_offers_by_business(&self, business_id: Uuid) -> AppResult<Vec<Offer>>;

    async fn list_active_offers(&self) -> AppResult<Vec<Offer>>;

    /// Insert or replace the row with `offer.id`
    async fn save_offer(&self, offer: &Offer) -> AppResult<Offer>;

    async fn delete_offer(&self, offer_id: Uuid) -> AppResult<bool>;

    async fn list_favorites(&self, user_id: Uuid) -> AppResult<Vec<Favorite>>;

    async fn insert_favorite(&self, favorite: &Favorite) -> AppResult<Favorite>;

    async fn delete_favorite(&self, user_id: Uuid, business_id: Uuid) -> AppResult<bool>;

    // ------------------------------------------------------------------
    // Connections
    // ------------------------------------------------------------------

    async fn get_connection(&self, connection_id: Uuid) -> AppResult<Option<Connection>>;

    /// The single row for the unordered pair, if any
    async fn find_connection_between(&self, a: Uuid, b: Uuid) -> AppResult<Option<Connection>>;

    /// Fails with `DuplicateEntry` when the pair already has a row
    async fn insert_connection(&self, connection: &Connection) -> AppResult<Connection>;

    async fn update_connection(&self, connection: &Connection) -> AppResult<Connection>;

    async fn delete_connection(&self, connection_id: Uuid) -> AppResult<bool>;

    async fn list_connections_for(&self, user_id: Uuid) -> AppResult<Vec<Connection>>;

    /// Mark a pending connection accepted, approve the vault entries waiting
    /// on it in both directions and notify the requester. Runs as one unit.
    /// Returns `None` when the row is gone or no longer pending.
    async fn accept_connection(
        &self,
        connection_id: Uuid,
        responded_at: DateTime<Utc>,
        notification: NewNotification,
    ) -> AppResult<Option<AcceptOutcome>>;

    // ------------------------------------------------------------------
    // Offer vault
    // ------------------------------------------------------------------

    async fn find_vault_entry(&self, user_id: Uuid, offer_id: Uuid)
        -> AppResult<Option<VaultEntry>>;

    /// Fails with `DuplicateEntry` when (user, offer) already exists
    async fn insert_vault_entry(&self, entry: &VaultEntry) -> AppResult<VaultEntry>;

    async fn list_vault_entries(&self, user_id: Uuid) -> AppResult<Vec<VaultEntry>>;

    async fn delete_vault_entry(&self, user_id: Uuid, entry_id: Uuid) -> AppResult<bool>;

    /// Approve `saver`'s entries for offers owned by `owner` that are still
    /// waiting on the connection
    async fn approve_vault_entries(&self, saver: Uuid, owner: Uuid) -> AppResult<u64>;

    // ------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------

    async fn insert_notification(&self, notification: NewNotification) -> AppResult<Notification>;

    async fn list_notifications(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: i64,
    ) -> AppResult<Vec<Notification>>;

    async fn count_unread_notifications(&self, user_id: Uuid) -> AppResult<i64>;

    async fn mark_notification_read(&self, user_id: Uuid, notification_id: Uuid)
        -> AppResult<bool>;

    async fn mark_all_notifications_read(&self, user_id: Uuid) -> AppResult<u64>;

    // ------------------------------------------------------------------
    // Affiliate links, leads, commissions
    // ------------------------------------------------------------------

    async fn find_affiliate_link(
        &self,
        affiliate_user_id: Uuid,
        offer_id: Uuid,
    ) -> AppResult<Option<AffiliateLink>>;

    async fn find_affiliate_link_by_code(&self, code: &str) -> AppResult<Option<AffiliateLink>>;

    /// Fails with `DuplicateEntry` on a taken code or an existing (affiliate, offer) link
    async fn insert_affiliate_link(&self, link: &AffiliateLink) -> AppResult<AffiliateLink>;

    async fn increment_link_clicks(&self, link_id: Uuid) -> AppResult<()>;

    async fn list_links_for_business(&self, business_id: Uuid) -> AppResult<Vec<AffiliateLink>>;

    async fn insert_lead(&self, lead: &Lead) -> AppResult<Lead>;

    async fn insert_commission_event(&self, event: &CommissionEvent) -> AppResult<CommissionEvent>;

    async fn list_commission_events_for_business(
        &self,
        business_id: Uuid,
    ) -> AppResult<Vec<CommissionEvent>>;

    async fn list_commission_events_for_affiliate(
        &self,
        affiliate_user_id: Uuid,
    ) -> AppResult<Vec<CommissionEvent>>;

    /// Pending events in `ids` become payable, due at `payable_at`
    async fn mark_commissions_payable(
        &self,
        ids: &[Uuid],
        payable_at: DateTime<Utc>,
    ) -> AppResult<u64>;

    /// Payable events of the pair become paid
    async fn mark_commissions_paid(
        &self,
        business_id: Uuid,
        affiliate_user_id: Uuid,
        paid_at: DateTime<Utc>,
    ) -> AppResult<u64>;

    // ------------------------------------------------------------------
    // Conversations and messages
    // ------------------------------------------------------------------

    /// One conversation per unordered pair, created on first use
    async fn get_or_create_conversation(&self, a: Uuid, b: Uuid) -> AppResult<Conversation>;

    async fn get_conversation(&self, conversation_id: Uuid) -> AppResult<Option<Conversation>>;

    async fn list_conversations(&self, user_id: Uuid) -> AppResult<Vec<Conversation>>;

    /// Stores the message and bumps the conversation's `last_message_at`
    async fn insert_message(&self, message: &Message) -> AppResult<Message>;

    async fn list_messages(&self, conversation_id: Uuid) -> AppResult<Vec<Message>>;

    /// Stamp `read_at` on messages `reader` received in the conversation
    async fn mark_conversation_messages_read(
        &self,
        conversation_id: Uuid,
        reader: Uuid,
    ) -> AppResult<u64>;

    // ------------------------------------------------------------------
    // Platform referral program
    // ------------------------------------------------------------------

    async fn insert_referral_click(&self, click: &ReferralClick) -> AppResult<()>;

    async fn count_referral_clicks(&self, referrer: Uuid) -> AppResult<i64>;

    async fn insert_referral_conversion(
        &self,
        conversion: &ReferralConversion,
        commission: &ReferralCommission,
    ) -> AppResult<()>;

    async fn list_referral_conversions(&self, referrer: Uuid)
        -> AppResult<Vec<ReferralConversion>>;

    async fn list_referral_commissions(&self, referrer: Uuid)
        -> AppResult<Vec<ReferralCommission>>;
}

/// Order a pair so both directions map to the same key
pub(crate) fn ordered_pair(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
