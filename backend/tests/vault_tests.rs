//! Offer vault tests
//!
//! The add flow, the acceptance cascade that unlocks saved offers and the
//! reconcile sweep.

mod common;

use proptest::prelude::*;
use shared::{ConnectionStatus, NotificationKind, VaultStatus};

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[tokio::test]
    async fn test_save_offer_sends_request_and_unlocks_on_accept() {
        let state = common::state();
        let (owner, _, offer) = common::owner_with_offer(&state, "Olive Owner", "Acme Growth").await;
        let saver = common::user(&state, "Sam Saver").await;

        let added = state.vault().add(saver, offer.id).await.unwrap();
        assert!(added.success, "{}", added.message);
        let entry = added.data.unwrap();
        assert_eq!(entry.status, VaultStatus::PendingConnection);
        assert_eq!(entry.owner_user_id, owner);

        // The save sent a request to the owner
        let connections = state.connections();
        assert_eq!(
            connections.status(saver, owner).await.unwrap(),
            ConnectionStatus::PendingSent
        );
        let owner_inbox = state.notifications().list(owner, true, None).await.unwrap();
        assert_eq!(owner_inbox[0].kind, NotificationKind::ConnectionRequest);

        let connection_id = connections.list(owner).await.unwrap()[0].connection_id;
        assert!(connections.accept(connection_id, owner).await.unwrap().success);

        let vault = state.vault().list(saver).await.unwrap();
        assert_eq!(vault.len(), 1);
        assert_eq!(vault[0].entry.status, VaultStatus::Approved);
        assert_eq!(vault[0].company_name.as_deref(), Some("Acme Growth"));

        let saver_inbox = state.notifications().list(saver, true, None).await.unwrap();
        assert!(saver_inbox
            .iter()
            .any(|n| n.kind == NotificationKind::ConnectionAccepted));
    }

    #[tokio::test]
    async fn test_accept_unlocks_both_directions() {
        let state = common::state();
        let (alice, _, alice_offer) = common::owner_with_offer(&state, "Alice Adams", "Alpha Co").await;
        let (bob, _, bob_offer) = common::owner_with_offer(&state, "Bob Brown", "Beta Co").await;

        // Alice saves Bob's offer (request goes out), then Bob saves Alice's
        assert!(state.vault().add(alice, bob_offer.id).await.unwrap().success);
        let bob_add = state.vault().add(bob, alice_offer.id).await.unwrap();
        assert!(bob_add.success);
        assert_eq!(bob_add.data.unwrap().status, VaultStatus::PendingConnection);
        // No second request: Bob already has one pending from Alice
        assert_eq!(state.connections().list(bob).await.unwrap().len(), 1);

        let connection_id = state.connections().list(bob).await.unwrap()[0].connection_id;
        assert!(state.connections().accept(connection_id, bob).await.unwrap().success);

        assert_eq!(
            state.vault().list(alice).await.unwrap()[0].entry.status,
            VaultStatus::Approved
        );
        assert_eq!(
            state.vault().list(bob).await.unwrap()[0].entry.status,
            VaultStatus::Approved
        );
        // Stored rows were flipped too, so there is nothing left to reconcile
        assert_eq!(state.vault().reconcile(alice).await.unwrap(), 0);
        assert_eq!(state.vault().reconcile(bob).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_connected_save_is_approved_immediately() {
        let state = common::state();
        let (owner, _, offer) = common::owner_with_offer(&state, "Olive Owner", "Acme Growth").await;
        let saver = common::user(&state, "Sam Saver").await;
        let connection = state
            .connections()
            .send_request(owner, saver)
            .await
            .unwrap()
            .data
            .unwrap();
        state.connections().accept(connection.id, saver).await.unwrap();

        let added = state.vault().add(saver, offer.id).await.unwrap();
        assert_eq!(added.data.unwrap().status, VaultStatus::Approved);
        assert_eq!(added.message, "Offer added to your vault");
    }

    #[tokio::test]
    async fn test_own_offer_and_duplicates_rejected() {
        let state = common::state();
        let (owner, _, offer) = common::owner_with_offer(&state, "Olive Owner", "Acme Growth").await;
        let saver = common::user(&state, "Sam Saver").await;

        let own = state.vault().add(owner, offer.id).await.unwrap();
        assert!(!own.success);

        assert!(state.vault().add(saver, offer.id).await.unwrap().success);
        let again = state.vault().add(saver, offer.id).await.unwrap();
        assert!(!again.success);
        assert_eq!(again.message, "This offer is already in your vault");
    }

    #[tokio::test]
    async fn test_remove_entry() {
        let state = common::state();
        let (_, _, offer) = common::owner_with_offer(&state, "Olive Owner", "Acme Growth").await;
        let saver = common::user(&state, "Sam Saver").await;
        let entry = state.vault().add(saver, offer.id).await.unwrap().data.unwrap();

        assert!(state.vault().remove(saver, entry.id).await.unwrap().success);
        assert!(!state.vault().remove(saver, entry.id).await.unwrap().success);
        assert!(state.vault().list(saver).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_offer_is_not_found() {
        let state = common::state();
        let saver = common::user(&state, "Sam Saver").await;
        let result = state.vault().add(saver, uuid::Uuid::new_v4()).await;
        assert!(matches!(
            result,
            Err(partner_marketplace_backend::error::AppError::NotFound(_))
        ));
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

        /// Saving the same offer any number of times leaves exactly one entry
        /// and at most one connection request
        #[test]
        fn prop_vault_add_is_idempotent(attempts in 1usize..6) {
            tokio_test::block_on(async {
                let state = common::state();
                let (owner, _, offer) = common::owner_with_offer(&state, "Olive Owner", "Acme Growth").await;
                let saver = common::user(&state, "Sam Saver").await;

                let successes = {
                    let mut n = 0;
                    for _ in 0..attempts {
                        if state.vault().add(saver, offer.id).await.unwrap().success {
                            n += 1;
                        }
                    }
                    n
                };
                assert_eq!(successes, 1);
                assert_eq!(state.vault().list(saver).await.unwrap().len(), 1);
                assert_eq!(state.connections().list(owner).await.unwrap().len(), 1);
                assert_eq!(
                    state.notifications().unread_count(owner).await.unwrap(),
                    1
                );
            });
        }
    }
}
