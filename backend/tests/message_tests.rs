//! Messaging tests
//!
//! Conversations between connected users, unread counts, read receipts and
//! the realtime channel filter.

mod common;

use proptest::prelude::*;
use shared::{ChannelFilter, NotificationKind};
use uuid::Uuid;

use partner_marketplace_backend::{error::AppError, AppState};

/// Two users with an accepted connection; `alice` sent the request
async fn connected_pair(state: &AppState) -> (Uuid, Uuid) {
    let alice = common::user(state, "Alice Adams").await;
    let bob = common::user(state, "Bob Brown").await;
    let connection = state
        .connections()
        .send_request(alice, bob)
        .await
        .unwrap()
        .data
        .unwrap();
    state.connections().accept(connection.id, bob).await.unwrap();
    (alice, bob)
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[tokio::test]
    async fn test_open_requires_connection() {
        let state = common::state();
        let alice = common::user(&state, "Alice Adams").await;
        let bob = common::user(&state, "Bob Brown").await;
        let messages = state.messages();

        let refused = messages.open(alice, bob).await.unwrap();
        assert!(!refused.success);
        assert_eq!(refused.message, "You can only message your connections");
        assert!(!messages.open(alice, alice).await.unwrap().success);
    }

    #[tokio::test]
    async fn test_open_returns_the_pair_conversation() {
        let state = common::state();
        let (alice, bob) = connected_pair(&state).await;
        let messages = state.messages();

        let from_alice = messages.open(alice, bob).await.unwrap().data.unwrap();
        let from_bob = messages.open(bob, alice).await.unwrap().data.unwrap();
        assert_eq!(from_alice.id, from_bob.id);
        assert_eq!(messages.list(alice).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_send_counts_unread_and_notifies() {
        let state = common::state();
        let (alice, bob) = connected_pair(&state).await;
        let messages = state.messages();
        let conversation = messages.open(alice, bob).await.unwrap().data.unwrap();

        // The acceptance message from Bob is already waiting for Alice
        assert_eq!(messages.list(alice).await.unwrap()[0].unread_count, 1);
        assert_eq!(messages.list(bob).await.unwrap()[0].unread_count, 0);

        let sent = messages.send(alice, conversation.id, "  Hi Bob!  ").await.unwrap();
        assert!(sent.success);
        assert_eq!(sent.data.unwrap().body, "Hi Bob!");
        messages.send(alice, conversation.id, "Free to talk?").await.unwrap();

        let inbox = messages.list(bob).await.unwrap();
        assert_eq!(inbox[0].unread_count, 2);
        assert_eq!(inbox[0].other_user_id, alice);
        assert_eq!(inbox[0].last_message.as_ref().unwrap().body, "Free to talk?");

        let notes = state.notifications().list(bob, true, None).await.unwrap();
        assert_eq!(
            notes.iter().filter(|n| n.kind == NotificationKind::NewMessage).count(),
            2
        );
    }

    #[tokio::test]
    async fn test_mark_read_clears_only_incoming() {
        let state = common::state();
        let (alice, bob) = connected_pair(&state).await;
        let messages = state.messages();
        let conversation = messages.open(alice, bob).await.unwrap().data.unwrap();
        messages.send(alice, conversation.id, "Hello").await.unwrap();

        assert_eq!(messages.mark_read(bob, conversation.id).await.unwrap(), 1);
        assert_eq!(messages.mark_read(bob, conversation.id).await.unwrap(), 0);
        assert_eq!(messages.list(bob).await.unwrap()[0].unread_count, 0);
        // Alice still has Bob's acceptance message unread
        assert_eq!(messages.list(alice).await.unwrap()[0].unread_count, 1);
    }

    #[tokio::test]
    async fn test_outsiders_cannot_read_or_write() {
        let state = common::state();
        let (alice, bob) = connected_pair(&state).await;
        let outsider = common::user(&state, "Oscar Outsider").await;
        let messages = state.messages();
        let conversation = messages.open(alice, bob).await.unwrap().data.unwrap();

        assert!(matches!(
            messages.messages(outsider, conversation.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            messages.send(outsider, conversation.id, "Let me in").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_body_rejected() {
        let state = common::state();
        let (alice, bob) = connected_pair(&state).await;
        let conversation = state.messages().open(alice, bob).await.unwrap().data.unwrap();

        let result = state.messages().send(alice, conversation.id, "   ").await;
        assert!(matches!(result, Err(AppError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_channel_filter_targets_conversation() {
        let state = common::state();
        let (alice, bob) = connected_pair(&state).await;
        let conversation = state.messages().open(alice, bob).await.unwrap().data.unwrap();

        let channel = state.messages().channel(bob, conversation.id).await.unwrap();
        assert_eq!(channel.table, "messages");
        assert_eq!(
            channel.filter_expr(),
            format!("conversation_id=eq.{}", conversation.id)
        );
        assert_eq!(
            ChannelFilter::parse("messages", &channel.filter_expr()),
            Some(channel)
        );
    }

    #[tokio::test]
    async fn test_notification_read_flow() {
        let state = common::state();
        let (alice, _) = connected_pair(&state).await;
        let notifications = state.notifications();

        // Alice was told her request was accepted
        let unread = notifications.list(alice, true, None).await.unwrap();
        assert_eq!(unread.len(), 1);
        notifications.mark_as_read(alice, unread[0].id).await.unwrap();
        assert_eq!(notifications.unread_count(alice).await.unwrap(), 0);
        assert_eq!(notifications.list(alice, false, None).await.unwrap().len(), 1);
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        /// The recipient's unread count equals the messages sent since their
        /// last read
        #[test]
        fn prop_unread_count_tracks_sends(before in 0usize..5, after in 0usize..5) {
            tokio_test::block_on(async {
                let state = common::state();
                let (alice, bob) = connected_pair(&state).await;
                let messages = state.messages();
                let conversation = messages.open(alice, bob).await.unwrap().data.unwrap();

                for i in 0..before {
                    messages.send(alice, conversation.id, &format!("before {}", i)).await.unwrap();
                }
                messages.mark_read(bob, conversation.id).await.unwrap();
                for i in 0..after {
                    messages.send(alice, conversation.id, &format!("after {}", i)).await.unwrap();
                }

                let inbox = messages.list(bob).await.unwrap();
                assert_eq!(inbox[0].unread_count, after as i64);
            });
        }
    }
}
