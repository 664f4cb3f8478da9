//! Direct messaging between connected users
//!
//! One conversation per pair, created through the data service's
//! `get_or_create_conversation` function. Clients follow new rows on the
//! `messages` channel filtered by `conversation_id`.

use std::sync::Arc;

use chrono::Utc;
use shared::{
    validate_message_body, ActionResult, ChannelFilter, Conversation, ConversationView, Message,
    NewNotification,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::connection::ConnectionService;
use crate::services::notification::NotificationService;
use crate::store::Store;

#[derive(Clone)]
pub struct MessageService {
    store: Arc<dyn Store>,
}

impl MessageService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    fn connections(&self) -> ConnectionService {
        ConnectionService::new(self.store.clone())
    }

    /// Load a conversation the user takes part in
    async fn participant_of(&self, user_id: Uuid, conversation_id: Uuid) -> AppResult<Conversation> {
        self.store
            .get_conversation(conversation_id)
            .await?
            .filter(|c| c.includes(user_id))
            .ok_or_else(|| AppError::NotFound("Conversation".to_string()))
    }

    /// Open (or reopen) the conversation with a connection
    pub async fn open(&self, user_id: Uuid, other: Uuid) -> AppResult<ActionResult<Conversation>> {
        if user_id == other {
            return Ok(ActionResult::failure("You cannot message yourself"));
        }
        if !self.connections().are_connected(user_id, other).await? {
            return Ok(ActionResult::failure("You can only message your connections"));
        }
        let conversation = self.store.get_or_create_conversation(user_id, other).await?;
        Ok(ActionResult::ok("Conversation ready", conversation))
    }

    /// Inbox, most recent first, with unread counts
    pub async fn list(&self, user_id: Uuid) -> AppResult<Vec<ConversationView>> {
        let conversations = self.store.list_conversations(user_id).await?;
        let mut views = Vec::with_capacity(conversations.len());
        for conversation in conversations {
            let messages = self.store.list_messages(conversation.id).await?;
            let unread_count = messages
                .iter()
                .filter(|m| m.sender_user_id != user_id && m.read_at.is_none())
                .count() as i64;
            views.push(ConversationView {
                other_user_id: conversation.other_participant(user_id),
                unread_count,
                last_message: messages.last().cloned(),
                conversation,
            });
        }
        Ok(views)
    }

    pub async fn messages(&self, user_id: Uuid, conversation_id: Uuid) -> AppResult<Vec<Message>> {
        let conversation = self.participant_of(user_id, conversation_id).await?;
        self.store.list_messages(conversation.id).await
    }

    pub async fn send(
        &self,
        sender: Uuid,
        conversation_id: Uuid,
        body: &str,
    ) -> AppResult<ActionResult<Message>> {
        validate_message_body(body).map_err(|m| AppError::validation("body", m))?;
        let conversation = self.participant_of(sender, conversation_id).await?;
        let recipient = conversation.other_participant(sender);
        if !self.connections().are_connected(sender, recipient).await? {
            return Ok(ActionResult::failure("You can only message your connections"));
        }

        let message = Message {
            id: Uuid::new_v4(),
            conversation_id: conversation.id,
            sender_user_id: sender,
            body: body.trim().to_string(),
            is_system: false,
            read_at: None,
            created_at: Utc::now(),
        };
        let message = self.store.insert_message(&message).await?;

        let name = self.connections().display_name(sender).await?;
        NotificationService::new(self.store.clone())
            .notify(NewNotification::new_message(recipient, &name, conversation.id))
            .await;

        tracing::debug!(conversation_id = %conversation.id, message_id = %message.id, "message sent");
        Ok(ActionResult::ok("Message sent", message))
    }

    pub async fn mark_read(&self, user_id: Uuid, conversation_id: Uuid) -> AppResult<u64> {
        let conversation = self.participant_of(user_id, conversation_id).await?;
        self.store
            .mark_conversation_messages_read(conversation.id, user_id)
            .await
    }

    /// Realtime subscription filter for a conversation
    pub async fn channel(&self, user_id: Uuid, conversation_id: Uuid) -> AppResult<ChannelFilter> {
        let conversation = self.participant_of(user_id, conversation_id).await?;
        Ok(ChannelFilter::conversation(conversation.id))
    }
}
