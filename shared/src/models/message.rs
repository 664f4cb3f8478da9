//! Conversation and message models
//!
//! One conversation exists per unordered pair of users. Realtime insert
//! events are folded into a [`MessageFeed`], which tolerates duplicate and
//! out-of-order delivery.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Conversation {
    pub id: Uuid,
    pub user_a_id: Uuid,
    pub user_b_id: Uuid,
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    pub fn includes(&self, user_id: Uuid) -> bool {
        self.user_a_id == user_id || self.user_b_id == user_id
    }

    pub fn other_participant(&self, user_id: Uuid) -> Uuid {
        if self.user_a_id == user_id {
            self.user_b_id
        } else {
            self.user_a_id
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_user_id: Uuid,
    pub body: String,
    /// Generated by the platform ("connection accepted") rather than typed
    pub is_system: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Inbox row: a conversation with its unread count for the viewer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationView {
    pub conversation: Conversation,
    pub other_user_id: Uuid,
    pub unread_count: i64,
    pub last_message: Option<Message>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageInput {
    pub body: String,
}

/// Realtime subscription filter, e.g. `conversation_id=eq.<id>` on `messages`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelFilter {
    pub table: String,
    pub column: String,
    pub value: String,
}

impl ChannelFilter {
    pub fn conversation(conversation_id: Uuid) -> Self {
        Self {
            table: "messages".to_string(),
            column: "conversation_id".to_string(),
            value: conversation_id.to_string(),
        }
    }

    pub fn notifications(user_id: Uuid) -> Self {
        Self {
            table: "notifications".to_string(),
            column: "user_id".to_string(),
            value: user_id.to_string(),
        }
    }

    /// Row filter in the realtime service's syntax
    pub fn filter_expr(&self) -> String {
        format!("{}=eq.{}", self.column, self.value)
    }

    /// Parse a `column=eq.value` expression for `table`
    pub fn parse(table: &str, expr: &str) -> Option<Self> {
        let (column, value) = expr.split_once("=eq.")?;
        if column.is_empty() || value.is_empty() {
            return None;
        }
        Some(Self {
            table: table.to_string(),
            column: column.to_string(),
            value: value.to_string(),
        })
    }
}

/// Local, ordered view of one conversation's messages
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageFeed {
    messages: Vec<Message>,
}

impl MessageFeed {
    pub fn new(initial: Vec<Message>) -> Self {
        let mut feed = Self::default();
        for m in initial {
            feed.apply(m);
        }
        feed
    }

    /// Apply an insert or update event. Returns `true` when the feed changed.
    ///
    /// A repeated id replaces the stored copy (read receipts arrive as updates);
    /// new ids are placed by `(created_at, id)`.
    pub fn apply(&mut self, message: Message) -> bool {
        if let Some(existing) = self.messages.iter_mut().find(|m| m.id == message.id) {
            if *existing == message {
                return false;
            }
            *existing = message;
            return true;
        }
        let pos = self
            .messages
            .partition_point(|m| (m.created_at, m.id) < (message.created_at, message.id));
        self.messages.insert(pos, message);
        true
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn unread_for(&self, viewer: Uuid) -> usize {
        self.messages
            .iter()
            .filter(|m| m.sender_user_id != viewer && m.read_at.is_none())
            .count()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn msg(conversation: Uuid, sender: Uuid, at: DateTime<Utc>, body: &str) -> Message {
        Message {
            id: Uuid::new_v4(),
            conversation_id: conversation,
            sender_user_id: sender,
            body: body.to_string(),
            is_system: false,
            read_at: None,
            created_at: at,
        }
    }

    #[test]
    fn test_duplicate_delivery_is_ignored() {
        let (conv, sender) = (Uuid::new_v4(), Uuid::new_v4());
        let m = msg(conv, sender, Utc::now(), "hello");
        let mut feed = MessageFeed::default();
        assert!(feed.apply(m.clone()));
        assert!(!feed.apply(m));
        assert_eq!(feed.len(), 1);
    }

    #[test]
    fn test_out_of_order_delivery_is_sorted() {
        let (conv, sender) = (Uuid::new_v4(), Uuid::new_v4());
        let now = Utc::now();
        let first = msg(conv, sender, now - Duration::seconds(10), "first");
        let second = msg(conv, sender, now, "second");
        let mut feed = MessageFeed::default();
        feed.apply(second);
        feed.apply(first);
        let bodies: Vec<_> = feed.messages().iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, vec!["first", "second"]);
    }

    #[test]
    fn test_update_replaces_read_state() {
        let (conv, sender, viewer) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let m = msg(conv, sender, Utc::now(), "ping");
        let mut feed = MessageFeed::new(vec![m.clone()]);
        assert_eq!(feed.unread_for(viewer), 1);
        let read = Message {
            read_at: Some(Utc::now()),
            ..m
        };
        assert!(feed.apply(read));
        assert_eq!(feed.unread_for(viewer), 0);
    }

    #[test]
    fn test_channel_filter_round_trip() {
        let id = Uuid::new_v4();
        let filter = ChannelFilter::conversation(id);
        assert_eq!(filter.filter_expr(), format!("conversation_id=eq.{}", id));
        assert_eq!(ChannelFilter::parse("messages", &filter.filter_expr()), Some(filter));
        assert_eq!(ChannelFilter::parse("messages", "conversation_id"), None);
    }
}
