//! In-process store used for local development and tests

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::{
    AffiliateLink, Business, CommissionEvent, CommissionStatus, Connection, ConnectionState,
    Conversation, Favorite, Lead, Message, NewNotification, NewUser, Notification, Offer,
    ProfileState, ReferralClick, ReferralCommission, ReferralConversion, SubscriptionStatus, User,
    VaultEntry, VaultStatus,
};
use uuid::Uuid;

use super::{ordered_pair, AcceptOutcome, CodeNamespace, Store};
use crate::error::{AppError, AppResult};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    businesses: HashMap<Uuid, Business>,
    offers: HashMap<Uuid, Offer>,
    favorites: Vec<Favorite>,
    connections: HashMap<Uuid, Connection>,
    vault: Vec<VaultEntry>,
    notifications: Vec<Notification>,
    affiliate_links: Vec<AffiliateLink>,
    leads: Vec<Lead>,
    commission_events: Vec<CommissionEvent>,
    conversations: HashMap<(Uuid, Uuid), Conversation>,
    messages: Vec<Message>,
    referral_clicks: Vec<ReferralClick>,
    referral_conversions: Vec<ReferralConversion>,
    referral_commissions: Vec<ReferralCommission>,
}

impl Tables {
    fn push_notification(&mut self, n: NewNotification) -> Notification {
        let notification = Notification {
            id: Uuid::new_v4(),
            user_id: n.user_id,
            kind: n.kind,
            title: n.title,
            body: n.body,
            link: n.link,
            is_read: false,
            created_at: Utc::now(),
        };
        self.notifications.push(notification.clone());
        notification
    }

    fn approve_vault(&mut self, saver: Uuid, owner: Uuid) -> u64 {
        let mut approved = 0;
        for entry in self.vault.iter_mut().filter(|e| {
            e.user_id == saver
                && e.owner_user_id == owner
                && e.status == VaultStatus::PendingConnection
        }) {
            entry.status = VaultStatus::Approved;
            approved += 1;
        }
        approved
    }
}

/// `Store` backed by hash maps behind one mutex
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| AppError::Internal("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> AppResult<()> {
        self.lock().map(|_| ())
    }

    async fn get_user(&self, user_id: Uuid) -> AppResult<Option<User>> {
        Ok(self.lock()?.users.get(&user_id).cloned())
    }

    async fn insert_user(&self, user: NewUser) -> AppResult<User> {
        let mut t = self.lock()?;
        if t.users.contains_key(&user.id) {
            return Err(AppError::DuplicateEntry("id".to_string()));
        }
        if t.users.values().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(AppError::DuplicateEntry("email".to_string()));
        }
        let now = Utc::now();
        let row = User {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            phone: user.phone,
            marketing_consent: user.marketing_consent,
            terms_accepted: user.terms_accepted,
            referral_code: None,
            referred_by: user.referred_by,
            subscription_status: SubscriptionStatus::None,
            w9_path: None,
            created_at: now,
            updated_at: now,
        };
        t.users.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_user_by_referral_code(&self, code: &str) -> AppResult<Option<User>> {
        Ok(self
            .lock()?
            .users
            .values()
            .find(|u| u.referral_code.as_deref() == Some(code))
            .cloned())
    }

    async fn set_referral_code(&self, user_id: Uuid, code: &str) -> AppResult<()> {
        let mut t = self.lock()?;
        if t
            .users
            .values()
            .any(|u| u.id != user_id && u.referral_code.as_deref() == Some(code))
        {
            return Err(AppError::DuplicateEntry("referral_code".to_string()));
        }
        let user = t
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::NotFound("User".to_string()))?;
        user.referral_code = Some(code.to_string());
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn set_subscription_status(
        &self,
        user_id: Uuid,
        status: SubscriptionStatus,
    ) -> AppResult<()> {
        let mut t = self.lock()?;
        let user = t
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::NotFound("User".to_string()))?;
        user.subscription_status = status;
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn set_w9_path(&self, user_id: Uuid, path: &str) -> AppResult<()> {
        let mut t = self.lock()?;
        let user = t
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::NotFound("User".to_string()))?;
        user.w9_path = Some(path.to_string());
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn count_referred_users(&self, referrer: Uuid) -> AppResult<i64> {
        Ok(self
            .lock()?
            .users
            .values()
            .filter(|u| u.referred_by == Some(referrer))
            .count() as i64)
    }

    async fn code_taken(&self, namespace: CodeNamespace, code: &str) -> AppResult<bool> {
        let t = self.lock()?;
        Ok(match namespace {
            CodeNamespace::User => t
                .users
                .values()
                .any(|u| u.referral_code.as_deref() == Some(code)),
            CodeNamespace::Offer => t.affiliate_links.iter().any(|l| l.code == code),
        })
    }

    async fn get_business(&self, business_id: Uuid) -> AppResult<Option<Business>> {
        Ok(self.lock()?.businesses.get(&business_id).cloned())
    }

    async fn get_business_by_owner(&self, owner_user_id: Uuid) -> AppResult<Option<Business>> {
        Ok(self
            .lock()?
            .businesses
            .values()
            .find(|b| b.owner_user_id == owner_user_id)
            .cloned())
    }

    async fn save_business(&self, business: &Business) -> AppResult<Business> {
        let mut t = self.lock()?;
        if t
            .businesses
            .values()
            .any(|b| b.owner_user_id == business.owner_user_id && b.id != business.id)
        {
            return Err(AppError::DuplicateEntry("owner_user_id".to_string()));
        }
        t.businesses.insert(business.id, business.clone());
        Ok(business.clone())
    }

    async fn list_live_businesses(&self) -> AppResult<Vec<Business>> {
        let mut live: Vec<_> = self
            .lock()?
            .businesses
            .values()
            .filter(|b| b.profile_state == ProfileState::Live)
            .cloned()
            .collect();
        live.sort_by(|a, b| a.company_name.cmp(&b.company_name));
        Ok(live)
    }

    async fn get_offer(&self, offer_id: Uuid) -> AppResult<Option<Offer>> {
        Ok(self.lock()?.offers.get(&offer_id).cloned())
    }

    async fn list_offers_by_business(&self, business_id: Uuid) -> AppResult<Vec<Offer>> {
        let mut offers: Vec<_> = self
            .lock()?
            .offers
            .values()
            .filter(|o| o.business_id == business_id)
            .cloned()
            .collect();
        offers.sort_by_key(|o| o.created_at);
        Ok(offers)
    }

    async fn list_active_offers(&self) -> AppResult<Vec<Offer>> {
        let mut offers: Vec<_> = self
            .lock()?
            .offers
            .values()
            .filter(|o| o.is_active)
            .cloned()
            .collect();
        offers.sort_by_key(|o| std::cmp::Reverse(o.created_at));
        Ok(offers)
    }

    async fn save_offer(&self, offer: &Offer) -> AppResult<Offer> {
        self.lock()?.offers.insert(offer.id, offer.clone());
        Ok(offer.clone())
    }

    async fn delete_offer(&self, offer_id: Uuid) -> AppResult<bool> {
        Ok(self.lock()?.offers.remove(&offer_id).is_some())
    }

    async fn list_favorites(&self, user_id: Uuid) -> AppResult<Vec<Favorite>> {
        Ok(self
            .lock()?
            .favorites
            .iter()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn insert_favorite(&self, favorite: &Favorite) -> AppResult<Favorite> {
        let mut t = self.lock()?;
        if t
            .favorites
            .iter()
            .any(|f| f.user_id == favorite.user_id && f.business_id == favorite.business_id)
        {
            return Err(AppError::DuplicateEntry("favorite".to_string()));
        }
        t.favorites.push(favorite.clone());
        Ok(favorite.clone())
    }

    async fn delete_favorite(&self, user_id: Uuid, business_id: Uuid) -> AppResult<bool> {
        let mut t = self.lock()?;
        let before = t.favorites.len();
        t.favorites
            .retain(|f| !(f.user_id == user_id && f.business_id == business_id));
        Ok(t.favorites.len() != before)
    }

    async fn get_connection(&self, connection_id: Uuid) -> AppResult<Option<Connection>> {
        Ok(self.lock()?.connections.get(&connection_id).cloned())
    }

    async fn find_connection_between(&self, a: Uuid, b: Uuid) -> AppResult<Option<Connection>> {
        Ok(self
            .lock()?
            .connections
            .values()
            .find(|c| c.links(a, b))
            .cloned())
    }

    async fn insert_connection(&self, connection: &Connection) -> AppResult<Connection> {
        let mut t = self.lock()?;
        if t
            .connections
            .values()
            .any(|c| c.links(connection.requester_user_id, connection.recipient_user_id))
        {
            return Err(AppError::DuplicateEntry("connection".to_string()));
        }
        t.connections.insert(connection.id, connection.clone());
        Ok(connection.clone())
    }

    async fn update_connection(&self, connection: &Connection) -> AppResult<Connection> {
        let mut t = self.lock()?;
        let row = t
            .connections
            .get_mut(&connection.id)
            .ok_or_else(|| AppError::NotFound("Connection".to_string()))?;
        *row = connection.clone();
        Ok(connection.clone())
    }

    async fn delete_connection(&self, connection_id: Uuid) -> AppResult<bool> {
        Ok(self.lock()?.connections.remove(&connection_id).is_some())
    }

    async fn list_connections_for(&self, user_id: Uuid) -> AppResult<Vec<Connection>> {
        let mut rows: Vec<_> = self
            .lock()?
            .connections
            .values()
            .filter(|c| c.counterpart(user_id).is_some())
            .cloned()
            .collect();
        rows.sort_by_key(|c| std::cmp::Reverse(c.created_at));
        Ok(rows)
    }

    async fn accept_connection(
        &self,
        connection_id: Uuid,
        responded_at: DateTime<Utc>,
        notification: NewNotification,
    ) -> AppResult<Option<AcceptOutcome>> {
        let mut t = self.lock()?;
        let Some(row) = t.connections.get_mut(&connection_id) else {
            return Ok(None);
        };
        if row.status != ConnectionState::Pending {
            return Ok(None);
        }
        row.status = ConnectionState::Accepted;
        row.responded_at = Some(responded_at);
        let connection = row.clone();

        let approved_entries = t.approve_vault(
            connection.requester_user_id,
            connection.recipient_user_id,
        ) + t.approve_vault(connection.recipient_user_id, connection.requester_user_id);
        let notification = t.push_notification(notification);

        Ok(Some(AcceptOutcome {
            connection,
            approved_entries,
            notification,
        }))
    }

    async fn find_vault_entry(
        &self,
        user_id: Uuid,
        offer_id: Uuid,
    ) -> AppResult<Option<VaultEntry>> {
        Ok(self
            .lock()?
            .vault
            .iter()
            .find(|e| e.user_id == user_id && e.offer_id == offer_id)
            .cloned())
    }

    async fn insert_vault_entry(&self, entry: &VaultEntry) -> AppResult<VaultEntry> {
        let mut t = self.lock()?;
        if t
            .vault
            .iter()
            .any(|e| e.user_id == entry.user_id && e.offer_id == entry.offer_id)
        {
            return Err(AppError::DuplicateEntry("offer".to_string()));
        }
        t.vault.push(entry.clone());
        Ok(entry.clone())
    }

    async fn list_vault_entries(&self, user_id: Uuid) -> AppResult<Vec<VaultEntry>> {
        let mut entries: Vec<_> = self
            .lock()?
            .vault
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by_key(|e| std::cmp::Reverse(e.created_at));
        Ok(entries)
    }

    async fn delete_vault_entry(&self, user_id: Uuid, entry_id: Uuid) -> AppResult<bool> {
        let mut t = self.lock()?;
        let before = t.vault.len();
        t.vault.retain(|e| !(e.id == entry_id && e.user_id == user_id));
        Ok(t.vault.len() != before)
    }

    async fn approve_vault_entries(&self, saver: Uuid, owner: Uuid) -> AppResult<u64> {
        Ok(self.lock()?.approve_vault(saver, owner))
    }

    async fn insert_notification(&self, notification: NewNotification) -> AppResult<Notification> {
        Ok(self.lock()?.push_notification(notification))
    }

    async fn list_notifications(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: i64,
    ) -> AppResult<Vec<Notification>> {
        let mut rows: Vec<_> = self
            .lock()?
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && (!unread_only || !n.is_read))
            .cloned()
            .collect();
        rows.sort_by_key(|n| std::cmp::Reverse(n.created_at));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn count_unread_notifications(&self, user_id: Uuid) -> AppResult<i64> {
        Ok(self
            .lock()?
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .count() as i64)
    }

    async fn mark_notification_read(
        &self,
        user_id: Uuid,
        notification_id: Uuid,
    ) -> AppResult<bool> {
        let mut t = self.lock()?;
        match t
            .notifications
            .iter_mut()
            .find(|n| n.id == notification_id && n.user_id == user_id)
        {
            Some(n) => {
                n.is_read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_all_notifications_read(&self, user_id: Uuid) -> AppResult<u64> {
        let mut t = self.lock()?;
        let mut marked = 0;
        for n in t
            .notifications
            .iter_mut()
            .filter(|n| n.user_id == user_id && !n.is_read)
        {
            n.is_read = true;
            marked += 1;
        }
        Ok(marked)
    }

    async fn find_affiliate_link(
        &self,
        affiliate_user_id: Uuid,
        offer_id: Uuid,
    ) -> AppResult<Option<AffiliateLink>> {
        Ok(self
            .lock()?
            .affiliate_links
            .iter()
            .find(|l| l.affiliate_user_id == affiliate_user_id && l.offer_id == offer_id)
            .cloned())
    }

    async fn find_affiliate_link_by_code(&self, code: &str) -> AppResult<Option<AffiliateLink>> {
        Ok(self
            .lock()?
            .affiliate_links
            .iter()
            .find(|l| l.code == code)
            .cloned())
    }

    async fn insert_affiliate_link(&self, link: &AffiliateLink) -> AppResult<AffiliateLink> {
        let mut t = self.lock()?;
        if t.affiliate_links.iter().any(|l| l.code == link.code) {
            return Err(AppError::DuplicateEntry("code".to_string()));
        }
        if t
            .affiliate_links
            .iter()
            .any(|l| l.affiliate_user_id == link.affiliate_user_id && l.offer_id == link.offer_id)
        {
            return Err(AppError::DuplicateEntry("affiliate_link".to_string()));
        }
        t.affiliate_links.push(link.clone());
        Ok(link.clone())
    }

    async fn increment_link_clicks(&self, link_id: Uuid) -> AppResult<()> {
        let mut t = self.lock()?;
        let link = t
            .affiliate_links
            .iter_mut()
            .find(|l| l.id == link_id)
            .ok_or_else(|| AppError::NotFound("Affiliate link".to_string()))?;
        link.click_count += 1;
        Ok(())
    }

    async fn list_links_for_business(&self, business_id: Uuid) -> AppResult<Vec<AffiliateLink>> {
        Ok(self
            .lock()?
            .affiliate_links
            .iter()
            .filter(|l| l.business_id == business_id)
            .cloned()
            .collect())
    }

    async fn insert_lead(&self, lead: &Lead) -> AppResult<Lead> {
        self.lock()?.leads.push(lead.clone());
        Ok(lead.clone())
    }

    async fn insert_commission_event(&self, event: &CommissionEvent) -> AppResult<CommissionEvent> {
        self.lock()?.commission_events.push(event.clone());
        Ok(event.clone())
    }

    async fn list_commission_events_for_business(
        &self,
        business_id: Uuid,
    ) -> AppResult<Vec<CommissionEvent>> {
        Ok(self
            .lock()?
            .commission_events
            .iter()
            .filter(|e| e.business_id == business_id)
            .cloned()
            .collect())
    }

    async fn list_commission_events_for_affiliate(
        &self,
        affiliate_user_id: Uuid,
    ) -> AppResult<Vec<CommissionEvent>> {
        Ok(self
            .lock()?
            .commission_events
            .iter()
            .filter(|e| e.affiliate_user_id == affiliate_user_id)
            .cloned()
            .collect())
    }

    async fn mark_commissions_payable(
        &self,
        ids: &[Uuid],
        payable_at: DateTime<Utc>,
    ) -> AppResult<u64> {
        let mut t = self.lock()?;
        let mut updated = 0;
        for event in t
            .commission_events
            .iter_mut()
            .filter(|e| e.status == CommissionStatus::Pending && ids.contains(&e.id))
        {
            event.status = CommissionStatus::Payable;
            event.payable_at = Some(payable_at);
            updated += 1;
        }
        Ok(updated)
    }

    async fn mark_commissions_paid(
        &self,
        business_id: Uuid,
        affiliate_user_id: Uuid,
        paid_at: DateTime<Utc>,
    ) -> AppResult<u64> {
        let mut t = self.lock()?;
        let mut updated = 0;
        for event in t.commission_events.iter_mut().filter(|e| {
            e.business_id == business_id
                && e.affiliate_user_id == affiliate_user_id
                && e.status == CommissionStatus::Payable
        }) {
            event.status = CommissionStatus::Paid;
            event.paid_at = Some(paid_at);
            updated += 1;
        }
        Ok(updated)
    }

    async fn get_or_create_conversation(&self, a: Uuid, b: Uuid) -> AppResult<Conversation> {
        let key = ordered_pair(a, b);
        let mut t = self.lock()?;
        let conversation = t.conversations.entry(key).or_insert_with(|| Conversation {
            id: Uuid::new_v4(),
            user_a_id: key.0,
            user_b_id: key.1,
            last_message_at: None,
            created_at: Utc::now(),
        });
        Ok(conversation.clone())
    }

    async fn get_conversation(&self, conversation_id: Uuid) -> AppResult<Option<Conversation>> {
        Ok(self
            .lock()?
            .conversations
            .values()
            .find(|c| c.id == conversation_id)
            .cloned())
    }

    async fn list_conversations(&self, user_id: Uuid) -> AppResult<Vec<Conversation>> {
        let mut rows: Vec<_> = self
            .lock()?
            .conversations
            .values()
            .filter(|c| c.includes(user_id))
            .cloned()
            .collect();
        rows.sort_by_key(|c| std::cmp::Reverse(c.last_message_at.unwrap_or(c.created_at)));
        Ok(rows)
    }

    async fn insert_message(&self, message: &Message) -> AppResult<Message> {
        let mut t = self.lock()?;
        let conversation = t
            .conversations
            .values_mut()
            .find(|c| c.id == message.conversation_id)
            .ok_or_else(|| AppError::NotFound("Conversation".to_string()))?;
        conversation.last_message_at = Some(message.created_at);
        t.messages.push(message.clone());
        Ok(message.clone())
    }

    async fn list_messages(&self, conversation_id: Uuid) -> AppResult<Vec<Message>> {
        let mut rows: Vec<_> = self
            .lock()?
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect();
        rows.sort_by_key(|m| (m.created_at, m.id));
        Ok(rows)
    }

    async fn mark_conversation_messages_read(
        &self,
        conversation_id: Uuid,
        reader: Uuid,
    ) -> AppResult<u64> {
        let mut t = self.lock()?;
        let now = Utc::now();
        let mut marked = 0;
        for m in t.messages.iter_mut().filter(|m| {
            m.conversation_id == conversation_id && m.sender_user_id != reader && m.read_at.is_none()
        }) {
            m.read_at = Some(now);
            marked += 1;
        }
        Ok(marked)
    }

    async fn insert_referral_click(&self, click: &ReferralClick) -> AppResult<()> {
        self.lock()?.referral_clicks.push(click.clone());
        Ok(())
    }

    async fn count_referral_clicks(&self, referrer: Uuid) -> AppResult<i64> {
        Ok(self
            .lock()?
            .referral_clicks
            .iter()
            .filter(|c| c.referrer_user_id == referrer)
            .count() as i64)
    }

    async fn insert_referral_conversion(
        &self,
        conversion: &ReferralConversion,
        commission: &ReferralCommission,
    ) -> AppResult<()> {
        let mut t = self.lock()?;
        if t
            .referral_conversions
            .iter()
            .any(|c| c.checkout_session_id == conversion.checkout_session_id)
        {
            return Err(AppError::DuplicateEntry("checkout_session_id".to_string()));
        }
        t.referral_conversions.push(conversion.clone());
        t.referral_commissions.push(commission.clone());
        Ok(())
    }

    async fn list_referral_conversions(
        &self,
        referrer: Uuid,
    ) -> AppResult<Vec<ReferralConversion>> {
        Ok(self
            .lock()?
            .referral_conversions
            .iter()
            .filter(|c| c.referrer_user_id == referrer)
            .cloned()
            .collect())
    }

    async fn list_referral_commissions(
        &self,
        referrer: Uuid,
    ) -> AppResult<Vec<ReferralCommission>> {
        Ok(self
            .lock()?
            .referral_commissions
            .iter()
            .filter(|c| c.referrer_user_id == referrer)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{NotificationKind, Offer, OfferType};

    fn pending(requester: Uuid, recipient: Uuid) -> Connection {
        Connection {
            id: Uuid::new_v4(),
            requester_user_id: requester,
            recipient_user_id: recipient,
            status: ConnectionState::Pending,
            created_at: Utc::now(),
            responded_at: None,
        }
    }

    fn entry(user: Uuid, owner: Uuid) -> VaultEntry {
        VaultEntry {
            id: Uuid::new_v4(),
            user_id: user,
            offer_id: Uuid::new_v4(),
            business_id: Uuid::new_v4(),
            owner_user_id: owner,
            status: VaultStatus::PendingConnection,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_pair_is_unique_in_both_directions() {
        let store = MemoryStore::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        store.insert_connection(&pending(a, b)).await.unwrap();
        let err = store.insert_connection(&pending(b, a)).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateEntry(_)));
    }

    #[tokio::test]
    async fn test_accept_cascade_approves_both_directions() {
        let store = MemoryStore::new();
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let conn = store.insert_connection(&pending(a, b)).await.unwrap();
        store.insert_vault_entry(&entry(a, b)).await.unwrap();
        store.insert_vault_entry(&entry(b, a)).await.unwrap();
        let unrelated = store.insert_vault_entry(&entry(a, c)).await.unwrap();

        let outcome = store
            .accept_connection(conn.id, Utc::now(), NewNotification::connection_accepted(a, "B"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(outcome.approved_entries, 2);
        assert_eq!(outcome.connection.status, ConnectionState::Accepted);
        assert_eq!(outcome.notification.kind, NotificationKind::ConnectionAccepted);

        let untouched = store.find_vault_entry(a, unrelated.offer_id).await.unwrap().unwrap();
        assert_eq!(untouched.status, VaultStatus::PendingConnection);

        // A second accept is a no-op
        let again = store
            .accept_connection(conn.id, Utc::now(), NewNotification::connection_accepted(a, "B"))
            .await
            .unwrap();
        assert!(again.is_none());
    }

    #[tokio::test]
    async fn test_conversation_is_shared_by_pair() {
        let store = MemoryStore::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let first = store.get_or_create_conversation(a, b).await.unwrap();
        let second = store.get_or_create_conversation(b, a).await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_inactive_offers_not_listed() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let offer = Offer {
            id: Uuid::new_v4(),
            business_id: Uuid::new_v4(),
            title: "Audit".to_string(),
            description: String::new(),
            offer_type: OfferType::Service,
            price: 100.into(),
            commission_percent: 10.into(),
            is_active: false,
            created_at: now,
            updated_at: now,
        };
        store.save_offer(&offer).await.unwrap();
        assert!(store.list_active_offers().await.unwrap().is_empty());
    }
}
