//! In-app notification models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "text", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ConnectionRequest,
    ConnectionAccepted,
    NewMessage,
    Commission,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub link: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Notification to be written for a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub link: Option<String>,
}

impl NewNotification {
    pub fn connection_request(recipient: Uuid, requester_name: &str) -> Self {
        Self {
            user_id: recipient,
            kind: NotificationKind::ConnectionRequest,
            title: "New connection request".to_string(),
            body: format!("{} wants to connect with you", requester_name),
            link: Some("/connections".to_string()),
        }
    }

    pub fn connection_accepted(requester: Uuid, acceptor_name: &str) -> Self {
        Self {
            user_id: requester,
            kind: NotificationKind::ConnectionAccepted,
            title: "Connection accepted".to_string(),
            body: format!("{} accepted your connection request", acceptor_name),
            link: Some("/connections".to_string()),
        }
    }

    pub fn new_message(recipient: Uuid, sender_name: &str, conversation_id: Uuid) -> Self {
        Self {
            user_id: recipient,
            kind: NotificationKind::NewMessage,
            title: "New message".to_string(),
            body: format!("{} sent you a message", sender_name),
            link: Some(format!("/messages/{}", conversation_id)),
        }
    }

    pub fn commission_recorded(affiliate: Uuid, company_name: &str) -> Self {
        Self {
            user_id: affiliate,
            kind: NotificationKind::Commission,
            title: "Commission recorded".to_string(),
            body: format!("You earned a commission from {}", company_name),
            link: Some("/earnings".to_string()),
        }
    }
}
