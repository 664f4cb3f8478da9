//! In-app notification service
//!
//! Notifications are rows in the data service; the front-end subscribes to
//! inserts on `notifications` filtered by `user_id`.

use std::sync::Arc;

use shared::{NewNotification, Notification};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::store::Store;

/// Largest page the notification list returns
const MAX_PAGE: i64 = 100;

#[derive(Clone)]
pub struct NotificationService {
    store: Arc<dyn Store>,
}

impl NotificationService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Create a notification. Delivery failures are logged, never raised,
    /// so the action that triggered them still succeeds.
    pub async fn notify(&self, notification: NewNotification) -> Option<Notification> {
        let user_id = notification.user_id;
        match self.store.insert_notification(notification).await {
            Ok(n) => {
                tracing::debug!(user_id = %user_id, kind = ?n.kind, "notification created");
                Some(n)
            }
            Err(e) => {
                tracing::warn!(user_id = %user_id, "failed to create notification: {}", e);
                None
            }
        }
    }

    pub async fn list(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: Option<i64>,
    ) -> AppResult<Vec<Notification>> {
        let limit = limit.unwrap_or(50).clamp(1, MAX_PAGE);
        self.store.list_notifications(user_id, unread_only, limit).await
    }

    pub async fn unread_count(&self, user_id: Uuid) -> AppResult<i64> {
        self.store.count_unread_notifications(user_id).await
    }

    pub async fn mark_as_read(&self, user_id: Uuid, notification_id: Uuid) -> AppResult<()> {
        if !self
            .store
            .mark_notification_read(user_id, notification_id)
            .await?
        {
            return Err(AppError::NotFound("Notification".to_string()));
        }
        Ok(())
    }

    pub async fn mark_all_as_read(&self, user_id: Uuid) -> AppResult<u64> {
        self.store.mark_all_notifications_read(user_id).await
    }
}
