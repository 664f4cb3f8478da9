//! Offer vault models and the add-to-vault decision table

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::connection::ConnectionStatus;
use super::offer::Offer;

/// Approval state of a saved offer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "text", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum VaultStatus {
    PendingConnection,
    Approved,
}

impl VaultStatus {
    /// The status implied by the connection between saver and offer owner
    pub fn from_connection(status: ConnectionStatus) -> Self {
        if status == ConnectionStatus::Accepted {
            VaultStatus::Approved
        } else {
            VaultStatus::PendingConnection
        }
    }
}

/// A user's saved reference to an offer. Unique per (user, offer).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct VaultEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub offer_id: Uuid,
    pub business_id: Uuid,
    /// Owner of the offer's business at the time the entry was saved
    pub owner_user_id: Uuid,
    pub status: VaultStatus,
    pub created_at: DateTime<Utc>,
}

/// Vault entry with its offer, as listed on the vault page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultItem {
    pub entry: VaultEntry,
    pub offer: Option<Offer>,
    pub company_name: Option<String>,
}

/// What the add-to-vault flow does for a given connection status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VaultDecision {
    pub entry_status: VaultStatus,
    pub send_connection_request: bool,
}

/// Decide the entry status and whether a connection request must be sent.
///
/// Only a missing connection triggers a request; an outstanding request in
/// either direction is left alone.
pub fn vault_decision(status: ConnectionStatus) -> VaultDecision {
    match status {
        ConnectionStatus::None => VaultDecision {
            entry_status: VaultStatus::PendingConnection,
            send_connection_request: true,
        },
        ConnectionStatus::PendingSent | ConnectionStatus::PendingReceived => VaultDecision {
            entry_status: VaultStatus::PendingConnection,
            send_connection_request: false,
        },
        ConnectionStatus::Accepted => VaultDecision {
            entry_status: VaultStatus::Approved,
            send_connection_request: false,
        },
    }
}
