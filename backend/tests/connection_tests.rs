//! Connection lifecycle tests against the in-memory store
//!
//! Covers request, accept, decline, cancel and the perspective symmetry of
//! the displayed status.

mod common;

use proptest::prelude::*;
use shared::{ConnectionStatus, NotificationKind};

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;
    use partner_marketplace_backend::services::connection::CONNECTED_SYSTEM_MESSAGE;

    #[tokio::test]
    async fn test_request_then_accept() {
        let state = common::state();
        let alice = common::user(&state, "Alice Adams").await;
        let bob = common::user(&state, "Bob Brown").await;
        let connections = state.connections();

        let sent = connections.send_request(alice, bob).await.unwrap();
        assert!(sent.success);
        let connection = sent.data.unwrap();
        assert_eq!(connections.status(alice, bob).await.unwrap(), ConnectionStatus::PendingSent);
        assert_eq!(
            connections.status(bob, alice).await.unwrap(),
            ConnectionStatus::PendingReceived
        );

        let inbox = state.notifications().list(bob, true, None).await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].kind, NotificationKind::ConnectionRequest);

        let accepted = connections.accept(connection.id, bob).await.unwrap();
        assert!(accepted.success, "{}", accepted.message);
        assert!(connections.are_connected(alice, bob).await.unwrap());
        assert!(connections.are_connected(bob, alice).await.unwrap());

        let requester_inbox = state.notifications().list(alice, true, None).await.unwrap();
        assert!(requester_inbox
            .iter()
            .any(|n| n.kind == NotificationKind::ConnectionAccepted));

        // The pair's conversation opens with a system message
        let conversations = state.messages().list(alice).await.unwrap();
        assert_eq!(conversations.len(), 1);
        let last = conversations[0].last_message.as_ref().unwrap();
        assert!(last.is_system);
        assert_eq!(last.body, CONNECTED_SYSTEM_MESSAGE);
    }

    #[tokio::test]
    async fn test_self_and_duplicate_requests_fail() {
        let state = common::state();
        let alice = common::user(&state, "Alice Adams").await;
        let bob = common::user(&state, "Bob Brown").await;
        let connections = state.connections();

        assert!(!connections.send_request(alice, alice).await.unwrap().success);
        assert!(connections.send_request(alice, bob).await.unwrap().success);

        let again = connections.send_request(alice, bob).await.unwrap();
        assert!(!again.success);
        assert_eq!(again.message, "A connection request is already pending");

        // The other direction sees the same single row
        let reverse = connections.send_request(bob, alice).await.unwrap();
        assert!(!reverse.success);
    }

    #[tokio::test]
    async fn test_only_recipient_accepts() {
        let state = common::state();
        let alice = common::user(&state, "Alice Adams").await;
        let bob = common::user(&state, "Bob Brown").await;
        let connections = state.connections();

        let connection = connections.send_request(alice, bob).await.unwrap().data.unwrap();
        let by_requester = connections.accept(connection.id, alice).await.unwrap();
        assert!(!by_requester.success);
        assert_eq!(by_requester.message, "Only the recipient can respond to this request");
        assert_eq!(connections.status(alice, bob).await.unwrap(), ConnectionStatus::PendingSent);
    }

    #[tokio::test]
    async fn test_decline_then_reopen() {
        let state = common::state();
        let alice = common::user(&state, "Alice Adams").await;
        let bob = common::user(&state, "Bob Brown").await;
        let connections = state.connections();

        let connection = connections.send_request(alice, bob).await.unwrap().data.unwrap();
        assert!(connections.decline(connection.id, bob).await.unwrap().success);
        assert_eq!(connections.status(alice, bob).await.unwrap(), ConnectionStatus::None);
        assert!(connections.list(alice).await.unwrap().is_empty());

        // Bob now asks Alice; the declined row is reused with the new direction
        let reopened = connections.send_request(bob, alice).await.unwrap();
        assert!(reopened.success);
        let reopened = reopened.data.unwrap();
        assert_eq!(reopened.id, connection.id);
        assert_eq!(reopened.requester_user_id, bob);
        assert_eq!(
            connections.status(alice, bob).await.unwrap(),
            ConnectionStatus::PendingReceived
        );
    }

    #[tokio::test]
    async fn test_cancel_by_requester_only() {
        let state = common::state();
        let alice = common::user(&state, "Alice Adams").await;
        let bob = common::user(&state, "Bob Brown").await;
        let connections = state.connections();

        let connection = connections.send_request(alice, bob).await.unwrap().data.unwrap();
        assert!(!connections.cancel(connection.id, bob).await.unwrap().success);
        assert!(connections.cancel(connection.id, alice).await.unwrap().success);
        assert_eq!(connections.status(alice, bob).await.unwrap(), ConnectionStatus::None);
    }

    #[tokio::test]
    async fn test_accept_twice_is_refused() {
        let state = common::state();
        let alice = common::user(&state, "Alice Adams").await;
        let bob = common::user(&state, "Bob Brown").await;
        let connections = state.connections();

        let connection = connections.send_request(alice, bob).await.unwrap().data.unwrap();
        assert!(connections.accept(connection.id, bob).await.unwrap().success);
        let second = connections.accept(connection.id, bob).await.unwrap();
        assert!(!second.success);
        assert_eq!(second.message, "This request is no longer pending");
    }

    #[tokio::test]
    async fn test_list_shows_counterpart_business() {
        let state = common::state();
        let (owner, business, _) = common::owner_with_offer(&state, "Olive Owner", "Acme Growth").await;
        let partner = common::user(&state, "Pat Partner").await;
        let connections = state.connections();

        connections.send_request(partner, owner).await.unwrap();
        let listed = connections.list(partner).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].other_user_id, owner);
        assert_eq!(listed[0].status, ConnectionStatus::PendingSent);
        assert_eq!(listed[0].business.as_ref().unwrap().id, business.id);
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    #[derive(Debug, Clone, Copy)]
    enum Step {
        Request(bool),
        Accept(bool),
        Decline(bool),
        Cancel(bool),
    }

    fn step_strategy() -> impl Strategy<Value = Step> {
        prop_oneof![
            any::<bool>().prop_map(Step::Request),
            any::<bool>().prop_map(Step::Accept),
            any::<bool>().prop_map(Step::Decline),
            any::<bool>().prop_map(Step::Cancel),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        /// Whatever happens to the pair, each side's status is the other's
        /// mirror image
        #[test]
        fn prop_status_is_symmetric(steps in prop::collection::vec(step_strategy(), 1..12)) {
            tokio_test::block_on(async {
                let state = common::state();
                let a = common::user(&state, "Alice Adams").await;
                let b = common::user(&state, "Bob Brown").await;
                let connections = state.connections();

                for step in steps {
                    let (actor, other) = match step {
                        Step::Request(flip) | Step::Accept(flip) | Step::Decline(flip) | Step::Cancel(flip) => {
                            if flip { (b, a) } else { (a, b) }
                        }
                    };
                    match step {
                        Step::Request(_) => {
                            connections.send_request(actor, other).await.unwrap();
                        }
                        Step::Accept(_) | Step::Decline(_) | Step::Cancel(_) => {
                            let rows = connections.list(actor).await.unwrap();
                            if let Some(row) = rows.first() {
                                let id = row.connection_id;
                                match step {
                                    Step::Accept(_) => { connections.accept(id, actor).await.unwrap(); }
                                    Step::Decline(_) => { connections.decline(id, actor).await.unwrap(); }
                                    _ => { connections.cancel(id, actor).await.unwrap(); }
                                }
                            }
                        }
                    }

                    let ab = connections.status(a, b).await.unwrap();
                    let ba = connections.status(b, a).await.unwrap();
                    assert_eq!(ab, ba.swap_perspective());
                }
            });
        }
    }
}
