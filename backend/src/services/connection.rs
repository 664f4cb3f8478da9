//! Connection service
//!
//! One row per unordered user pair. Display status is always resolved from
//! the viewer's side of that row.

use std::sync::Arc;

use chrono::Utc;
use shared::{
    ActionResult, BusinessSummary, Connection, ConnectionState, ConnectionStatus, ConnectionView,
    Message, NewNotification,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::notification::NotificationService;
use crate::store::Store;

/// Posted into the pair's conversation once a request is accepted
pub const CONNECTED_SYSTEM_MESSAGE: &str = "You are now connected. Say hello!";

#[derive(Clone)]
pub struct ConnectionService {
    store: Arc<dyn Store>,
}

impl ConnectionService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    fn notifications(&self) -> NotificationService {
        NotificationService::new(self.store.clone())
    }

    /// Display status of the pair from `viewer`'s side
    pub async fn status(&self, viewer: Uuid, other: Uuid) -> AppResult<ConnectionStatus> {
        let row = self.store.find_connection_between(viewer, other).await?;
        Ok(ConnectionStatus::resolve(row.as_ref(), viewer))
    }

    /// Name shown to the other side: the company name, else the account name
    pub async fn display_name(&self, user_id: Uuid) -> AppResult<String> {
        if let Some(business) = self.store.get_business_by_owner(user_id).await? {
            if !business.company_name.trim().is_empty() {
                return Ok(business.company_name);
            }
        }
        Ok(self
            .store
            .get_user(user_id)
            .await?
            .map(|u| u.full_name)
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| "A member".to_string()))
    }

    /// Send a connection request. A declined pair is reopened with the new
    /// requester; a pending or accepted pair is refused.
    pub async fn send_request(
        &self,
        requester: Uuid,
        recipient: Uuid,
    ) -> AppResult<ActionResult<Connection>> {
        if requester == recipient {
            return Ok(ActionResult::failure("You cannot connect with yourself"));
        }
        if self.store.get_user(recipient).await?.is_none() {
            return Err(AppError::NotFound("User".to_string()));
        }

        let now = Utc::now();
        let connection = match self.store.find_connection_between(requester, recipient).await? {
            Some(existing) => match existing.status {
                ConnectionState::Pending => {
                    return Ok(ActionResult::failure("A connection request is already pending"));
                }
                ConnectionState::Accepted => {
                    return Ok(ActionResult::failure("You are already connected"));
                }
                ConnectionState::Declined => {
                    let reopened = Connection {
                        requester_user_id: requester,
                        recipient_user_id: recipient,
                        status: ConnectionState::Pending,
                        created_at: now,
                        responded_at: None,
                        ..existing
                    };
                    self.store.update_connection(&reopened).await?
                }
            },
            None => {
                let row = Connection {
                    id: Uuid::new_v4(),
                    requester_user_id: requester,
                    recipient_user_id: recipient,
                    status: ConnectionState::Pending,
                    created_at: now,
                    responded_at: None,
                };
                match self.store.insert_connection(&row).await {
                    Ok(c) => c,
                    Err(AppError::DuplicateEntry(_)) => {
                        return Ok(ActionResult::failure(
                            "A connection request is already pending",
                        ));
                    }
                    Err(e) => return Err(e),
                }
            }
        };

        let name = self.display_name(requester).await?;
        self.notifications()
            .notify(NewNotification::connection_request(recipient, &name))
            .await;

        tracing::info!(
            connection_id = %connection.id,
            requester = %requester,
            recipient = %recipient,
            "connection request sent"
        );

        Ok(ActionResult::ok("Connection request sent", connection))
    }

    /// Load a row and check `actor` is on the expected side of a pending request
    async fn pending_for(
        &self,
        connection_id: Uuid,
        actor: Uuid,
        as_recipient: bool,
    ) -> AppResult<Result<Connection, &'static str>> {
        let connection = self
            .store
            .get_connection(connection_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Connection".to_string()))?;

        if connection.counterpart(actor).is_none() {
            return Err(AppError::NotFound("Connection".to_string()));
        }
        if connection.status != ConnectionState::Pending {
            return Ok(Err("This request is no longer pending"));
        }
        let on_side = if as_recipient {
            connection.recipient_user_id == actor
        } else {
            connection.requester_user_id == actor
        };
        if !on_side {
            return Ok(Err(if as_recipient {
                "Only the recipient can respond to this request"
            } else {
                "Only the sender can cancel this request"
            }));
        }
        Ok(Ok(connection))
    }

    /// Accept a pending request. The status change, vault approvals for both
    /// users and the requester's notification land together.
    pub async fn accept(
        &self,
        connection_id: Uuid,
        acceptor: Uuid,
    ) -> AppResult<ActionResult<Connection>> {
        let connection = match self.pending_for(connection_id, acceptor, true).await? {
            Ok(c) => c,
            Err(reason) => return Ok(ActionResult::failure(reason)),
        };

        let name = self.display_name(acceptor).await?;
        let notification = NewNotification::connection_accepted(connection.requester_user_id, &name);
        let Some(outcome) = self
            .store
            .accept_connection(connection.id, Utc::now(), notification)
            .await?
        else {
            return Ok(ActionResult::failure("This request is no longer pending"));
        };

        tracing::info!(
            connection_id = %outcome.connection.id,
            approved_entries = outcome.approved_entries,
            "connection accepted"
        );

        if let Err(e) = self.post_system_message(&outcome.connection, acceptor).await {
            tracing::warn!(connection_id = %outcome.connection.id, "failed to post system message: {}", e);
        }

        Ok(ActionResult::ok("Connection accepted", outcome.connection))
    }

    async fn post_system_message(&self, connection: &Connection, sender: Uuid) -> AppResult<()> {
        let conversation = self
            .store
            .get_or_create_conversation(connection.requester_user_id, connection.recipient_user_id)
            .await?;
        let message = Message {
            id: Uuid::new_v4(),
            conversation_id: conversation.id,
            sender_user_id: sender,
            body: CONNECTED_SYSTEM_MESSAGE.to_string(),
            is_system: true,
            read_at: None,
            created_at: Utc::now(),
        };
        self.store.insert_message(&message).await?;
        Ok(())
    }

    pub async fn decline(
        &self,
        connection_id: Uuid,
        actor: Uuid,
    ) -> AppResult<ActionResult<Connection>> {
        let connection = match self.pending_for(connection_id, actor, true).await? {
            Ok(c) => c,
            Err(reason) => return Ok(ActionResult::failure(reason)),
        };
        let declined = Connection {
            status: ConnectionState::Declined,
            responded_at: Some(Utc::now()),
            ..connection
        };
        let declined = self.store.update_connection(&declined).await?;
        tracing::info!(connection_id = %declined.id, "connection declined");
        Ok(ActionResult::ok("Connection request declined", declined))
    }

    /// Withdraw a request the actor sent
    pub async fn cancel(&self, connection_id: Uuid, actor: Uuid) -> AppResult<ActionResult<()>> {
        let connection = match self.pending_for(connection_id, actor, false).await? {
            Ok(c) => c,
            Err(reason) => return Ok(ActionResult::failure(reason)),
        };
        self.store.delete_connection(connection.id).await?;
        tracing::info!(connection_id = %connection.id, "connection request cancelled");
        Ok(ActionResult::ok("Connection request cancelled", ()))
    }

    /// Pending and accepted connections with the counterpart's business card
    pub async fn list(&self, user_id: Uuid) -> AppResult<Vec<ConnectionView>> {
        let rows = self.store.list_connections_for(user_id).await?;
        let mut views = Vec::with_capacity(rows.len());
        for row in rows {
            let status = row.status_for(user_id);
            if status == ConnectionStatus::None {
                continue;
            }
            let Some(other) = row.counterpart(user_id) else {
                continue;
            };
            let business = self
                .store
                .get_business_by_owner(other)
                .await?
                .as_ref()
                .map(BusinessSummary::from);
            views.push(ConnectionView {
                connection_id: row.id,
                other_user_id: other,
                status,
                business,
                created_at: row.created_at,
            });
        }
        Ok(views)
    }

    /// Whether the two users have an accepted connection
    pub async fn are_connected(&self, a: Uuid, b: Uuid) -> AppResult<bool> {
        Ok(self.status(a, b).await? == ConnectionStatus::Accepted)
    }
}
