//! `Store` over the hosted Postgres
//!
//! The tables and the two RPC functions belong to the data service; this
//! module only issues queries against them and never migrates.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use shared::{
    AffiliateLink, Business, CommissionEvent, Connection, Conversation, Favorite, Lead, Message,
    NewNotification, NewUser, Notification, Offer, ReferralClick, ReferralCommission,
    ReferralConversion, SubscriptionStatus, User, VaultEntry,
};
use uuid::Uuid;

use super::{AcceptOutcome, CodeNamespace, Store};
use crate::error::{AppError, AppResult};

const USER_COLUMNS: &str = "id, email, full_name, phone, marketing_consent, terms_accepted, \
     referral_code, referred_by, subscription_status, w9_path, created_at, updated_at";

const BUSINESS_COLUMNS: &str = "id, owner_user_id, contact_name, contact_title, business_email, \
     phone, company_name, website, logo_url, city, state, country, industry, niche, \
     years_in_business, team_size, annual_revenue, business_description, \
     unique_value_proposition, target_audience, ideal_customer, offer_name, offer_description, \
     offer_price, offer_type, commission_rate, sales_process, looking_for, \
     partnership_opportunities, calendar_link, profile_state, created_at, updated_at";

const OFFER_COLUMNS: &str = "id, business_id, title, description, offer_type, price, \
     commission_percent, is_active, created_at, updated_at";

const CONNECTION_COLUMNS: &str =
    "id, requester_user_id, recipient_user_id, status, created_at, responded_at";

const VAULT_COLUMNS: &str = "id, user_id, offer_id, business_id, owner_user_id, status, created_at";

const NOTIFICATION_COLUMNS: &str = "id, user_id, kind, title, body, link, is_read, created_at";

const LINK_COLUMNS: &str =
    "id, affiliate_user_id, business_id, offer_id, code, click_count, created_at";

const EVENT_COLUMNS: &str = "id, lead_id, affiliate_user_id, business_id, offer_id, sale_amount, \
     affiliate_amount, platform_amount, status, payable_at, paid_at, created_at";

const CONVERSATION_COLUMNS: &str = "id, user_a_id, user_b_id, last_message_at, created_at";

const MESSAGE_COLUMNS: &str =
    "id, conversation_id, sender_user_id, body, is_system, read_at, created_at";

/// Map a unique-constraint violation to `DuplicateEntry` on `field`
fn unique_as_duplicate(err: sqlx::Error, field: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::DuplicateEntry(field.to_string())
        }
        _ => AppError::DatabaseError(err),
    }
}

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }

    async fn get_user(&self, user_id: Uuid) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn insert_user(&self, user: NewUser) -> AppResult<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, email, full_name, phone, marketing_consent, terms_accepted,
                               referred_by, subscription_status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'none')
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(&user.phone)
        .bind(user.marketing_consent)
        .bind(user.terms_accepted)
        .bind(user.referred_by)
        .fetch_one(&self.db)
        .await
        .map_err(|e| unique_as_duplicate(e, "email"))
    }

    async fn find_user_by_referral_code(&self, code: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE referral_code = $1",
            USER_COLUMNS
        ))
        .bind(code)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn set_referral_code(&self, user_id: Uuid, code: &str) -> AppResult<()> {
        let result =
            sqlx::query("UPDATE users SET referral_code = $2, updated_at = NOW() WHERE id = $1")
                .bind(user_id)
                .bind(code)
                .execute(&self.db)
                .await
                .map_err(|e| unique_as_duplicate(e, "referral_code"))?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User".to_string()));
        }
        Ok(())
    }

    async fn set_subscription_status(
        &self,
        user_id: Uuid,
        status: SubscriptionStatus,
    ) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE users SET subscription_status = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(user_id)
        .bind(status)
        .execute(&self.db)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User".to_string()));
        }
        Ok(())
    }

    async fn set_w9_path(&self, user_id: Uuid, path: &str) -> AppResult<()> {
        let result = sqlx::query("UPDATE users SET w9_path = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(path)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User".to_string()));
        }
        Ok(())
    }

    async fn count_referred_users(&self, referrer: Uuid) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE referred_by = $1")
            .bind(referrer)
            .fetch_one(&self.db)
            .await?;
        Ok(count)
    }

    async fn code_taken(&self, namespace: CodeNamespace, code: &str) -> AppResult<bool> {
        let sql = match namespace {
            CodeNamespace::User => "SELECT EXISTS(SELECT 1 FROM users WHERE referral_code = $1)",
            CodeNamespace::Offer => "SELECT EXISTS(SELECT 1 FROM affiliate_links WHERE code = $1)",
        };
        let taken = sqlx::query_scalar::<_, bool>(sql)
            .bind(code)
            .fetch_one(&self.db)
            .await?;
        Ok(taken)
    }

    async fn get_business(&self, business_id: Uuid) -> AppResult<Option<Business>> {
        let business = sqlx::query_as::<_, Business>(&format!(
            "SELECT {} FROM businesses WHERE id = $1",
            BUSINESS_COLUMNS
        ))
        .bind(business_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(business)
    }

    async fn get_business_by_owner(&self, owner_user_id: Uuid) -> AppResult<Option<Business>> {
        let business = sqlx::query_as::<_, Business>(&format!(
            "SELECT {} FROM businesses WHERE owner_user_id = $1",
            BUSINESS_COLUMNS
        ))
        .bind(owner_user_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(business)
    }

    async fn save_business(&self, b: &Business) -> AppResult<Business> {
        sqlx::query_as::<_, Business>(&format!(
            r#"
            INSERT INTO businesses ({cols})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                    $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $29, $30,
                    $31, $32, $33)
            ON CONFLICT (id) DO UPDATE SET
                contact_name = EXCLUDED.contact_name,
                contact_title = EXCLUDED.contact_title,
                business_email = EXCLUDED.business_email,
                phone = EXCLUDED.phone,
                company_name = EXCLUDED.company_name,
                website = EXCLUDED.website,
                logo_url = EXCLUDED.logo_url,
                city = EXCLUDED.city,
                state = EXCLUDED.state,
                country = EXCLUDED.country,
                industry = EXCLUDED.industry,
                niche = EXCLUDED.niche,
                years_in_business = EXCLUDED.years_in_business,
                team_size = EXCLUDED.team_size,
                annual_revenue = EXCLUDED.annual_revenue,
                business_description = EXCLUDED.business_description,
                unique_value_proposition = EXCLUDED.unique_value_proposition,
                target_audience = EXCLUDED.target_audience,
                ideal_customer = EXCLUDED.ideal_customer,
                offer_name = EXCLUDED.offer_name,
                offer_description = EXCLUDED.offer_description,
                offer_price = EXCLUDED.offer_price,
                offer_type = EXCLUDED.offer_type,
                commission_rate = EXCLUDED.commission_rate,
                sales_process = EXCLUDED.sales_process,
                looking_for = EXCLUDED.looking_for,
                partnership_opportunities = EXCLUDED.partnership_opportunities,
                calendar_link = EXCLUDED.calendar_link,
                profile_state = EXCLUDED.profile_state,
                updated_at = EXCLUDED.updated_at
            RETURNING {cols}
            "#,
            cols = BUSINESS_COLUMNS
        ))
        .bind(b.id)
        .bind(b.owner_user_id)
        .bind(&b.contact_name)
        .bind(&b.contact_title)
        .bind(&b.business_email)
        .bind(&b.phone)
        .bind(&b.company_name)
        .bind(&b.website)
        .bind(&b.logo_url)
        .bind(&b.city)
        .bind(&b.state)
        .bind(&b.country)
        .bind(&b.industry)
        .bind(&b.niche)
        .bind(&b.years_in_business)
        .bind(&b.team_size)
        .bind(&b.annual_revenue)
        .bind(&b.business_description)
        .bind(&b.unique_value_proposition)
        .bind(&b.target_audience)
        .bind(&b.ideal_customer)
        .bind(&b.offer_name)
        .bind(&b.offer_description)
        .bind(&b.offer_price)
        .bind(&b.offer_type)
        .bind(&b.commission_rate)
        .bind(&b.sales_process)
        .bind(&b.looking_for)
        .bind(&b.partnership_opportunities)
        .bind(&b.calendar_link)
        .bind(b.profile_state)
        .bind(b.created_at)
        .bind(b.updated_at)
        .fetch_one(&self.db)
        .await
        .map_err(|e| unique_as_duplicate(e, "owner_user_id"))
    }

    async fn list_live_businesses(&self) -> AppResult<Vec<Business>> {
        let rows = sqlx::query_as::<_, Business>(&format!(
            "SELECT {} FROM businesses WHERE profile_state = 'live' ORDER BY company_name ASC",
            BUSINESS_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn get_offer(&self, offer_id: Uuid) -> AppResult<Option<Offer>> {
        let offer = sqlx::query_as::<_, Offer>(&format!(
            "SELECT {} FROM offers WHERE id = $1",
            OFFER_COLUMNS
        ))
        .bind(offer_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(offer)
    }

    async fn list_offers_by_business(&self, business_id: Uuid) -> AppResult<Vec<Offer>> {
        let rows = sqlx::query_as::<_, Offer>(&format!(
            "SELECT {} FROM offers WHERE business_id = $1 ORDER BY created_at ASC",
            OFFER_COLUMNS
        ))
        .bind(business_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn list_active_offers(&self) -> AppResult<Vec<Offer>> {
        let rows = sqlx::query_as::<_, Offer>(&format!(
            "SELECT {} FROM offers WHERE is_active ORDER BY created_at DESC",
            OFFER_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn save_offer(&self, o: &Offer) -> AppResult<Offer> {
        let offer = sqlx::query_as::<_, Offer>(&format!(
            r#"
            INSERT INTO offers ({cols})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (id) DO UPDATE SET
                title = EXCLUDED.title,
                description = EXCLUDED.description,
                offer_type = EXCLUDED.offer_type,
                price = EXCLUDED.price,
                commission_percent = EXCLUDED.commission_percent,
                is_active = EXCLUDED.is_active,
                updated_at = EXCLUDED.updated_at
            RETURNING {cols}
            "#,
            cols = OFFER_COLUMNS
        ))
        .bind(o.id)
        .bind(o.business_id)
        .bind(&o.title)
        .bind(&o.description)
        .bind(o.offer_type)
        .bind(o.price)
        .bind(o.commission_percent)
        .bind(o.is_active)
        .bind(o.created_at)
        .bind(o.updated_at)
        .fetch_one(&self.db)
        .await?;
        Ok(offer)
    }

    async fn delete_offer(&self, offer_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM offers WHERE id = $1")
            .bind(offer_id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_favorites(&self, user_id: Uuid) -> AppResult<Vec<Favorite>> {
        let rows = sqlx::query_as::<_, Favorite>(
            "SELECT id, user_id, business_id, created_at FROM favorites WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn insert_favorite(&self, f: &Favorite) -> AppResult<Favorite> {
        sqlx::query_as::<_, Favorite>(
            r#"
            INSERT INTO favorites (id, user_id, business_id, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, business_id, created_at
            "#,
        )
        .bind(f.id)
        .bind(f.user_id)
        .bind(f.business_id)
        .bind(f.created_at)
        .fetch_one(&self.db)
        .await
        .map_err(|e| unique_as_duplicate(e, "favorite"))
    }

    async fn delete_favorite(&self, user_id: Uuid, business_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND business_id = $2")
            .bind(user_id)
            .bind(business_id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_connection(&self, connection_id: Uuid) -> AppResult<Option<Connection>> {
        let row = sqlx::query_as::<_, Connection>(&format!(
            "SELECT {} FROM connections WHERE id = $1",
            CONNECTION_COLUMNS
        ))
        .bind(connection_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn find_connection_between(&self, a: Uuid, b: Uuid) -> AppResult<Option<Connection>> {
        let row = sqlx::query_as::<_, Connection>(&format!(
            r#"
            SELECT {} FROM connections
            WHERE (requester_user_id = $1 AND recipient_user_id = $2)
               OR (requester_user_id = $2 AND recipient_user_id = $1)
            "#,
            CONNECTION_COLUMNS
        ))
        .bind(a)
        .bind(b)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn insert_connection(&self, c: &Connection) -> AppResult<Connection> {
        sqlx::query_as::<_, Connection>(&format!(
            r#"
            INSERT INTO connections ({cols})
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {cols}
            "#,
            cols = CONNECTION_COLUMNS
        ))
        .bind(c.id)
        .bind(c.requester_user_id)
        .bind(c.recipient_user_id)
        .bind(c.status)
        .bind(c.created_at)
        .bind(c.responded_at)
        .fetch_one(&self.db)
        .await
        .map_err(|e| unique_as_duplicate(e, "connection"))
    }

    async fn update_connection(&self, c: &Connection) -> AppResult<Connection> {
        sqlx::query_as::<_, Connection>(&format!(
            r#"
            UPDATE connections
            SET requester_user_id = $2, recipient_user_id = $3, status = $4,
                created_at = $5, responded_at = $6
            WHERE id = $1
            RETURNING {}
            "#,
            CONNECTION_COLUMNS
        ))
        .bind(c.id)
        .bind(c.requester_user_id)
        .bind(c.recipient_user_id)
        .bind(c.status)
        .bind(c.created_at)
        .bind(c.responded_at)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Connection".to_string()))
    }

    async fn delete_connection(&self, connection_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM connections WHERE id = $1")
            .bind(connection_id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_connections_for(&self, user_id: Uuid) -> AppResult<Vec<Connection>> {
        let rows = sqlx::query_as::<_, Connection>(&format!(
            r#"
            SELECT {} FROM connections
            WHERE requester_user_id = $1 OR recipient_user_id = $1
            ORDER BY created_at DESC
            "#,
            CONNECTION_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn accept_connection(
        &self,
        connection_id: Uuid,
        responded_at: DateTime<Utc>,
        notification: NewNotification,
    ) -> AppResult<Option<AcceptOutcome>> {
        let mut tx = self.db.begin().await?;

        let connection = sqlx::query_as::<_, Connection>(&format!(
            r#"
            UPDATE connections SET status = 'accepted', responded_at = $2
            WHERE id = $1 AND status = 'pending'
            RETURNING {}
            "#,
            CONNECTION_COLUMNS
        ))
        .bind(connection_id)
        .bind(responded_at)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(connection) = connection else {
            tx.rollback().await?;
            return Ok(None);
        };

        let mut approved_entries = 0;
        for (saver, owner) in [
            (connection.requester_user_id, connection.recipient_user_id),
            (connection.recipient_user_id, connection.requester_user_id),
        ] {
            approved_entries += sqlx::query(
                r#"
                UPDATE offer_vault SET status = 'approved'
                WHERE user_id = $1 AND owner_user_id = $2 AND status = 'pending_connection'
                "#,
            )
            .bind(saver)
            .bind(owner)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }

        let notification = sqlx::query_as::<_, Notification>(&format!(
            r#"
            INSERT INTO notifications (id, user_id, kind, title, body, link, is_read, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, FALSE, NOW())
            RETURNING {}
            "#,
            NOTIFICATION_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(notification.user_id)
        .bind(notification.kind)
        .bind(&notification.title)
        .bind(&notification.body)
        .bind(&notification.link)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

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
        let row = sqlx::query_as::<_, VaultEntry>(&format!(
            "SELECT {} FROM offer_vault WHERE user_id = $1 AND offer_id = $2",
            VAULT_COLUMNS
        ))
        .bind(user_id)
        .bind(offer_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn insert_vault_entry(&self, e: &VaultEntry) -> AppResult<VaultEntry> {
        sqlx::query_as::<_, VaultEntry>(&format!(
            r#"
            INSERT INTO offer_vault ({cols})
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {cols}
            "#,
            cols = VAULT_COLUMNS
        ))
        .bind(e.id)
        .bind(e.user_id)
        .bind(e.offer_id)
        .bind(e.business_id)
        .bind(e.owner_user_id)
        .bind(e.status)
        .bind(e.created_at)
        .fetch_one(&self.db)
        .await
        .map_err(|err| unique_as_duplicate(err, "offer"))
    }

    async fn list_vault_entries(&self, user_id: Uuid) -> AppResult<Vec<VaultEntry>> {
        let rows = sqlx::query_as::<_, VaultEntry>(&format!(
            "SELECT {} FROM offer_vault WHERE user_id = $1 ORDER BY created_at DESC",
            VAULT_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn delete_vault_entry(&self, user_id: Uuid, entry_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM offer_vault WHERE id = $1 AND user_id = $2")
            .bind(entry_id)
            .bind(user_id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn approve_vault_entries(&self, saver: Uuid, owner: Uuid) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE offer_vault SET status = 'approved'
            WHERE user_id = $1 AND owner_user_id = $2 AND status = 'pending_connection'
            "#,
        )
        .bind(saver)
        .bind(owner)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected())
    }

    async fn insert_notification(&self, n: NewNotification) -> AppResult<Notification> {
        let notification = sqlx::query_as::<_, Notification>(&format!(
            r#"
            INSERT INTO notifications (id, user_id, kind, title, body, link, is_read, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, FALSE, NOW())
            RETURNING {}
            "#,
            NOTIFICATION_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(n.user_id)
        .bind(n.kind)
        .bind(&n.title)
        .bind(&n.body)
        .bind(&n.link)
        .fetch_one(&self.db)
        .await?;
        Ok(notification)
    }

    async fn list_notifications(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: i64,
    ) -> AppResult<Vec<Notification>> {
        let rows = sqlx::query_as::<_, Notification>(&format!(
            r#"
            SELECT {} FROM notifications
            WHERE user_id = $1 AND ($2 = FALSE OR is_read = FALSE)
            ORDER BY created_at DESC
            LIMIT $3
            "#,
            NOTIFICATION_COLUMNS
        ))
        .bind(user_id)
        .bind(unread_only)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn count_unread_notifications(&self, user_id: Uuid) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;
        Ok(count)
    }

    async fn mark_notification_read(
        &self,
        user_id: Uuid,
        notification_id: Uuid,
    ) -> AppResult<bool> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1 AND user_id = $2")
                .bind(notification_id)
                .bind(user_id)
                .execute(&self.db)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_notifications_read(&self, user_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected())
    }

    async fn find_affiliate_link(
        &self,
        affiliate_user_id: Uuid,
        offer_id: Uuid,
    ) -> AppResult<Option<AffiliateLink>> {
        let row = sqlx::query_as::<_, AffiliateLink>(&format!(
            "SELECT {} FROM affiliate_links WHERE affiliate_user_id = $1 AND offer_id = $2",
            LINK_COLUMNS
        ))
        .bind(affiliate_user_id)
        .bind(offer_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn find_affiliate_link_by_code(&self, code: &str) -> AppResult<Option<AffiliateLink>> {
        let row = sqlx::query_as::<_, AffiliateLink>(&format!(
            "SELECT {} FROM affiliate_links WHERE code = $1",
            LINK_COLUMNS
        ))
        .bind(code)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn insert_affiliate_link(&self, l: &AffiliateLink) -> AppResult<AffiliateLink> {
        sqlx::query_as::<_, AffiliateLink>(&format!(
            r#"
            INSERT INTO affiliate_links ({cols})
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {cols}
            "#,
            cols = LINK_COLUMNS
        ))
        .bind(l.id)
        .bind(l.affiliate_user_id)
        .bind(l.business_id)
        .bind(l.offer_id)
        .bind(&l.code)
        .bind(l.click_count)
        .bind(l.created_at)
        .fetch_one(&self.db)
        .await
        .map_err(|e| unique_as_duplicate(e, "code"))
    }

    async fn increment_link_clicks(&self, link_id: Uuid) -> AppResult<()> {
        let result =
            sqlx::query("UPDATE affiliate_links SET click_count = click_count + 1 WHERE id = $1")
                .bind(link_id)
                .execute(&self.db)
                .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Affiliate link".to_string()));
        }
        Ok(())
    }

    async fn list_links_for_business(&self, business_id: Uuid) -> AppResult<Vec<AffiliateLink>> {
        let rows = sqlx::query_as::<_, AffiliateLink>(&format!(
            "SELECT {} FROM affiliate_links WHERE business_id = $1",
            LINK_COLUMNS
        ))
        .bind(business_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn insert_lead(&self, l: &Lead) -> AppResult<Lead> {
        let lead = sqlx::query_as::<_, Lead>(
            r#"
            INSERT INTO leads (id, affiliate_link_id, affiliate_user_id, business_id, offer_id,
                               name, email, sale_amount, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, affiliate_link_id, affiliate_user_id, business_id, offer_id,
                      name, email, sale_amount, created_at
            "#,
        )
        .bind(l.id)
        .bind(l.affiliate_link_id)
        .bind(l.affiliate_user_id)
        .bind(l.business_id)
        .bind(l.offer_id)
        .bind(&l.name)
        .bind(&l.email)
        .bind(l.sale_amount)
        .bind(l.created_at)
        .fetch_one(&self.db)
        .await?;
        Ok(lead)
    }

    async fn insert_commission_event(&self, e: &CommissionEvent) -> AppResult<CommissionEvent> {
        let event = sqlx::query_as::<_, CommissionEvent>(&format!(
            r#"
            INSERT INTO commission_events ({cols})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {cols}
            "#,
            cols = EVENT_COLUMNS
        ))
        .bind(e.id)
        .bind(e.lead_id)
        .bind(e.affiliate_user_id)
        .bind(e.business_id)
        .bind(e.offer_id)
        .bind(e.sale_amount)
        .bind(e.affiliate_amount)
        .bind(e.platform_amount)
        .bind(e.status)
        .bind(e.payable_at)
        .bind(e.paid_at)
        .bind(e.created_at)
        .fetch_one(&self.db)
        .await?;
        Ok(event)
    }

    async fn list_commission_events_for_business(
        &self,
        business_id: Uuid,
    ) -> AppResult<Vec<CommissionEvent>> {
        let rows = sqlx::query_as::<_, CommissionEvent>(&format!(
            "SELECT {} FROM commission_events WHERE business_id = $1 ORDER BY created_at ASC",
            EVENT_COLUMNS
        ))
        .bind(business_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn list_commission_events_for_affiliate(
        &self,
        affiliate_user_id: Uuid,
    ) -> AppResult<Vec<CommissionEvent>> {
        let rows = sqlx::query_as::<_, CommissionEvent>(&format!(
            "SELECT {} FROM commission_events WHERE affiliate_user_id = $1 ORDER BY created_at ASC",
            EVENT_COLUMNS
        ))
        .bind(affiliate_user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn mark_commissions_payable(
        &self,
        ids: &[Uuid],
        payable_at: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE commission_events SET status = 'payable', payable_at = $2
            WHERE id = ANY($1) AND status = 'pending'
            "#,
        )
        .bind(ids)
        .bind(payable_at)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected())
    }

    async fn mark_commissions_paid(
        &self,
        business_id: Uuid,
        affiliate_user_id: Uuid,
        paid_at: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE commission_events SET status = 'paid', paid_at = $3
            WHERE business_id = $1 AND affiliate_user_id = $2 AND status = 'payable'
            "#,
        )
        .bind(business_id)
        .bind(affiliate_user_id)
        .bind(paid_at)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected())
    }

    async fn get_or_create_conversation(&self, a: Uuid, b: Uuid) -> AppResult<Conversation> {
        let conversation = sqlx::query_as::<_, Conversation>(&format!(
            "SELECT {} FROM get_or_create_conversation($1, $2)",
            CONVERSATION_COLUMNS
        ))
        .bind(a)
        .bind(b)
        .fetch_one(&self.db)
        .await?;
        Ok(conversation)
    }

    async fn get_conversation(&self, conversation_id: Uuid) -> AppResult<Option<Conversation>> {
        let row = sqlx::query_as::<_, Conversation>(&format!(
            "SELECT {} FROM conversations WHERE id = $1",
            CONVERSATION_COLUMNS
        ))
        .bind(conversation_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn list_conversations(&self, user_id: Uuid) -> AppResult<Vec<Conversation>> {
        let rows = sqlx::query_as::<_, Conversation>(&format!(
            r#"
            SELECT {} FROM conversations
            WHERE user_a_id = $1 OR user_b_id = $1
            ORDER BY COALESCE(last_message_at, created_at) DESC
            "#,
            CONVERSATION_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn insert_message(&self, m: &Message) -> AppResult<Message> {
        let mut tx = self.db.begin().await?;

        let message = sqlx::query_as::<_, Message>(&format!(
            r#"
            INSERT INTO messages ({cols})
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {cols}
            "#,
            cols = MESSAGE_COLUMNS
        ))
        .bind(m.id)
        .bind(m.conversation_id)
        .bind(m.sender_user_id)
        .bind(&m.body)
        .bind(m.is_system)
        .bind(m.read_at)
        .bind(m.created_at)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE conversations SET last_message_at = $2 WHERE id = $1")
            .bind(m.conversation_id)
            .bind(m.created_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(message)
    }

    async fn list_messages(&self, conversation_id: Uuid) -> AppResult<Vec<Message>> {
        let rows = sqlx::query_as::<_, Message>(&format!(
            "SELECT {} FROM messages WHERE conversation_id = $1 ORDER BY created_at ASC, id ASC",
            MESSAGE_COLUMNS
        ))
        .bind(conversation_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn mark_conversation_messages_read(
        &self,
        conversation_id: Uuid,
        reader: Uuid,
    ) -> AppResult<u64> {
        let marked =
            sqlx::query_scalar::<_, i64>("SELECT mark_conversation_messages_read($1, $2)::bigint")
                .bind(conversation_id)
                .bind(reader)
                .fetch_one(&self.db)
                .await?;
        Ok(marked.max(0) as u64)
    }

    async fn insert_referral_click(&self, c: &ReferralClick) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO referral_clicks (id, referrer_user_id, code, landing_path, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(c.id)
        .bind(c.referrer_user_id)
        .bind(&c.code)
        .bind(&c.landing_path)
        .bind(c.created_at)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn count_referral_clicks(&self, referrer: Uuid) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM referral_clicks WHERE referrer_user_id = $1",
        )
        .bind(referrer)
        .fetch_one(&self.db)
        .await?;
        Ok(count)
    }

    async fn insert_referral_conversion(
        &self,
        conversion: &ReferralConversion,
        commission: &ReferralCommission,
    ) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO referral_conversions (id, referrer_user_id, referred_user_id,
                                              checkout_session_id, plan, amount, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(conversion.id)
        .bind(conversion.referrer_user_id)
        .bind(conversion.referred_user_id)
        .bind(&conversion.checkout_session_id)
        .bind(conversion.plan)
        .bind(conversion.amount)
        .bind(conversion.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| unique_as_duplicate(e, "checkout_session_id"))?;

        sqlx::query(
            r#"
            INSERT INTO referral_commissions (id, conversion_id, referrer_user_id, amount, status,
                                              payable_at, paid_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(commission.id)
        .bind(commission.conversion_id)
        .bind(commission.referrer_user_id)
        .bind(commission.amount)
        .bind(commission.status)
        .bind(commission.payable_at)
        .bind(commission.paid_at)
        .bind(commission.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn list_referral_conversions(
        &self,
        referrer: Uuid,
    ) -> AppResult<Vec<ReferralConversion>> {
        let rows = sqlx::query_as::<_, ReferralConversion>(
            r#"
            SELECT id, referrer_user_id, referred_user_id, checkout_session_id, plan, amount,
                   created_at
            FROM referral_conversions
            WHERE referrer_user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(referrer)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn list_referral_commissions(
        &self,
        referrer: Uuid,
    ) -> AppResult<Vec<ReferralCommission>> {
        let rows = sqlx::query_as::<_, ReferralCommission>(
            r#"
            SELECT id, conversion_id, referrer_user_id, amount, status, payable_at, paid_at, created_at
            FROM referral_commissions
            WHERE referrer_user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(referrer)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }
}
