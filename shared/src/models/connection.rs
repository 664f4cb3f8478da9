//! Partner connection models and status resolution

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::business::BusinessSummary;

/// Stored state of a connection row
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "text", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Pending,
    Accepted,
    Declined,
}

/// A relationship between two users. At most one row exists per unordered pair;
/// the requester/recipient direction is kept for notification routing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Connection {
    pub id: Uuid,
    pub requester_user_id: Uuid,
    pub recipient_user_id: Uuid,
    pub status: ConnectionState,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

impl Connection {
    /// Whether this row links `a` and `b` in either direction
    pub fn links(&self, a: Uuid, b: Uuid) -> bool {
        (self.requester_user_id == a && self.recipient_user_id == b)
            || (self.requester_user_id == b && self.recipient_user_id == a)
    }

    /// The other participant, if `user_id` is one of the two
    pub fn counterpart(&self, user_id: Uuid) -> Option<Uuid> {
        if self.requester_user_id == user_id {
            Some(self.recipient_user_id)
        } else if self.recipient_user_id == user_id {
            Some(self.requester_user_id)
        } else {
            None
        }
    }

    /// Display status from `viewer`'s side of the row
    pub fn status_for(&self, viewer: Uuid) -> ConnectionStatus {
        match self.status {
            ConnectionState::Accepted => ConnectionStatus::Accepted,
            ConnectionState::Declined => ConnectionStatus::None,
            ConnectionState::Pending if self.requester_user_id == viewer => {
                ConnectionStatus::PendingSent
            }
            ConnectionState::Pending => ConnectionStatus::PendingReceived,
        }
    }
}

/// Connection status as shown to one of the two users
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    None,
    PendingSent,
    PendingReceived,
    Accepted,
}

impl ConnectionStatus {
    /// Resolve the display status for `viewer` from the (at most one) row of the pair
    pub fn resolve(row: Option<&Connection>, viewer: Uuid) -> Self {
        row.map_or(ConnectionStatus::None, |c| c.status_for(viewer))
    }

    /// The same relationship seen from the other user
    pub fn swap_perspective(self) -> Self {
        match self {
            ConnectionStatus::PendingSent => ConnectionStatus::PendingReceived,
            ConnectionStatus::PendingReceived => ConnectionStatus::PendingSent,
            other => other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::None => "none",
            ConnectionStatus::PendingSent => "pending_sent",
            ConnectionStatus::PendingReceived => "pending_received",
            ConnectionStatus::Accepted => "accepted",
        }
    }
}

/// A connection as listed on the user's connections page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionView {
    pub connection_id: Uuid,
    pub other_user_id: Uuid,
    pub status: ConnectionStatus,
    pub business: Option<BusinessSummary>,
    pub created_at: DateTime<Utc>,
}
