//! Offer vault service
//!
//! Saving an offer is gated on the connection between the saver and the
//! offer's business owner; see `shared::vault_decision`.

use std::sync::Arc;

use chrono::Utc;
use shared::{vault_decision, ActionResult, VaultEntry, VaultItem, VaultStatus};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::connection::ConnectionService;
use crate::store::Store;

#[derive(Clone)]
pub struct VaultService {
    store: Arc<dyn Store>,
}

impl VaultService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    fn connections(&self) -> ConnectionService {
        ConnectionService::new(self.store.clone())
    }

    /// Save an offer to the user's vault
    pub async fn add(&self, user_id: Uuid, offer_id: Uuid) -> AppResult<ActionResult<VaultEntry>> {
        let offer = self
            .store
            .get_offer(offer_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Offer".to_string()))?;
        let business = self
            .store
            .get_business(offer.business_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Business".to_string()))?;
        let owner = business.owner_user_id;

        if owner == user_id {
            return Ok(ActionResult::failure("You cannot add your own offer to your vault"));
        }
        if self.store.find_vault_entry(user_id, offer_id).await?.is_some() {
            return Ok(ActionResult::failure("This offer is already in your vault"));
        }

        let connections = self.connections();
        let decision = vault_decision(connections.status(user_id, owner).await?);

        let entry = VaultEntry {
            id: Uuid::new_v4(),
            user_id,
            offer_id,
            business_id: business.id,
            owner_user_id: owner,
            status: decision.entry_status,
            created_at: Utc::now(),
        };
        let entry = match self.store.insert_vault_entry(&entry).await {
            Ok(e) => e,
            Err(AppError::DuplicateEntry(_)) => {
                return Ok(ActionResult::failure("This offer is already in your vault"));
            }
            Err(e) => return Err(e),
        };

        let message = if decision.send_connection_request {
            let sent = connections.send_request(user_id, owner).await?;
            if !sent.success {
                tracing::warn!(user_id = %user_id, owner = %owner, "vault connection request not sent: {}", sent.message);
            }
            format!(
                "Offer saved. A connection request was sent to {}",
                business.company_name
            )
        } else if entry.status == VaultStatus::Approved {
            "Offer added to your vault".to_string()
        } else {
            "Offer saved. It unlocks once your connection is accepted".to_string()
        };

        tracing::info!(
            user_id = %user_id,
            offer_id = %offer_id,
            status = ?entry.status,
            "offer saved to vault"
        );

        Ok(ActionResult::ok(message, entry))
    }

    /// The user's vault with each entry's status re-derived from the
    /// current connection, so a missed approval never shows as locked
    pub async fn list(&self, user_id: Uuid) -> AppResult<Vec<VaultItem>> {
        let connections = self.connections();
        let entries = self.store.list_vault_entries(user_id).await?;
        let mut items = Vec::with_capacity(entries.len());
        for mut entry in entries {
            entry.status =
                VaultStatus::from_connection(connections.status(user_id, entry.owner_user_id).await?);
            let offer = self.store.get_offer(entry.offer_id).await?;
            let company_name = self
                .store
                .get_business(entry.business_id)
                .await?
                .map(|b| b.company_name);
            items.push(VaultItem {
                entry,
                offer,
                company_name,
            });
        }
        Ok(items)
    }

    pub async fn remove(&self, user_id: Uuid, entry_id: Uuid) -> AppResult<ActionResult<()>> {
        if !self.store.delete_vault_entry(user_id, entry_id).await? {
            return Ok(ActionResult::failure("This offer is not in your vault"));
        }
        Ok(ActionResult::ok("Offer removed from your vault", ()))
    }

    /// Approve stored entries whose connection is already accepted.
    /// Returns how many rows changed.
    pub async fn reconcile(&self, user_id: Uuid) -> AppResult<u64> {
        let connections = self.connections();
        let mut owners: Vec<Uuid> = self
            .store
            .list_vault_entries(user_id)
            .await?
            .into_iter()
            .filter(|e| e.status == VaultStatus::PendingConnection)
            .map(|e| e.owner_user_id)
            .collect();
        owners.sort();
        owners.dedup();

        let mut approved = 0;
        for owner in owners {
            if connections.are_connected(user_id, owner).await? {
                approved += self.store.approve_vault_entries(user_id, owner).await?;
            }
        }
        if approved > 0 {
            tracing::info!(user_id = %user_id, approved, "vault reconciled");
        }
        Ok(approved)
    }
}
