//! End-to-end tests for the stock transfer request lifecycle: creation
//! invariants, per-actor authorization, the transition graph, and the
//! conditional-write race guarantee. Everything runs on in-memory SQLite
//! through the real migrator and services.

mod common;

use assert_matches::assert_matches;
use common::TestApp;
use uuid::Uuid;

use stocktransfer_api::errors::ServiceError;
use stocktransfer_api::services::locations::HomeLocation;
use stocktransfer_api::services::transfers::CreateTransferRequest;
use stocktransfer_api::workflow::{ActionPayload, TransferAction, TransferStatus};

fn request(sender_location_id: Uuid, item_code: &str) -> CreateTransferRequest {
    CreateTransferRequest {
        sender_location_id,
        item_code: item_code.to_string(),
        style_code: None,
    }
}

fn ship_payload(shipment_ref: &str) -> ActionPayload {
    ActionPayload {
        shipment_ref: Some(shipment_ref.to_string()),
        remarks: None,
    }
}

// ==================== Creation ====================

#[tokio::test]
async fn create_request_starts_pending() {
    let app = TestApp::new().await;
    let loc_a = app.seed_location("Store A", Some("GATI-A")).await;
    let loc_b = app.seed_location("Store B", Some("GATI-B")).await;
    let u1 = app.seed_employee("U1", Some(loc_a)).await;

    let order = app
        .transfers
        .create_request(&u1, request(loc_b, "RING-001"))
        .await
        .unwrap();

    assert_eq!(order.status, TransferStatus::Pending);
    assert_eq!(order.item_code, "RING-001");
    assert_eq!(order.requester_id, u1.user_id);
    assert_eq!(order.requester_location_id, loc_a);
    assert_eq!(order.sender_location_id, loc_b);
    assert_eq!(order.shipment_ref, None);
}

#[tokio::test]
async fn self_transfer_is_rejected() {
    let app = TestApp::new().await;
    let loc_a = app.seed_location("Store A", Some("GATI-A")).await;
    let u1 = app.seed_employee("U1", Some(loc_a)).await;

    let result = app
        .transfers
        .create_request(&u1, request(loc_a, "RING-001"))
        .await;

    assert_matches!(result, Err(ServiceError::SelfTransfer));
}

#[tokio::test]
async fn duplicate_active_request_is_rejected() {
    let app = TestApp::new().await;
    let loc_a = app.seed_location("Store A", Some("GATI-A")).await;
    let loc_b = app.seed_location("Store B", Some("GATI-B")).await;
    let u1 = app.seed_employee("U1", Some(loc_a)).await;

    app.transfers
        .create_request(&u1, request(loc_b, "RING-001"))
        .await
        .unwrap();

    let second = app
        .transfers
        .create_request(&u1, request(loc_b, "RING-001"))
        .await;
    assert_matches!(second, Err(ServiceError::DuplicateActiveRequest));

    // A different item from the same store is a different triple
    let other_item = app
        .transfers
        .create_request(&u1, request(loc_b, "RING-002"))
        .await;
    assert!(other_item.is_ok());
}

#[tokio::test]
async fn cancelled_request_no_longer_blocks_a_new_one() {
    let app = TestApp::new().await;
    let loc_a = app.seed_location("Store A", Some("GATI-A")).await;
    let loc_b = app.seed_location("Store B", Some("GATI-B")).await;
    let u1 = app.seed_employee("U1", Some(loc_a)).await;

    let order = app
        .transfers
        .create_request(&u1, request(loc_b, "RING-001"))
        .await
        .unwrap();
    app.transfers
        .act(&u1, order.id, TransferAction::Cancel, ActionPayload::default())
        .await
        .unwrap();

    let again = app
        .transfers
        .create_request(&u1, request(loc_b, "RING-001"))
        .await;
    assert!(again.is_ok());
}

#[tokio::test]
async fn unknown_sender_location_is_rejected() {
    let app = TestApp::new().await;
    let loc_a = app.seed_location("Store A", Some("GATI-A")).await;
    let u1 = app.seed_employee("U1", Some(loc_a)).await;

    let result = app
        .transfers
        .create_request(&u1, request(Uuid::new_v4(), "RING-001"))
        .await;
    assert_matches!(result, Err(ServiceError::InvalidLocation(_)));
}

#[tokio::test]
async fn unusable_sender_location_is_rejected() {
    let app = TestApp::new().await;
    let loc_a = app.seed_location("Store A", Some("GATI-A")).await;
    let unlinked = app.seed_location("Store U", None).await;
    let inactive = app.seed_inactive_location("Store I", Some("GATI-I")).await;
    let u1 = app.seed_employee("U1", Some(loc_a)).await;

    assert_matches!(
        app.transfers
            .create_request(&u1, request(unlinked, "RING-001"))
            .await,
        Err(ServiceError::InvalidLocation(_))
    );
    assert_matches!(
        app.transfers
            .create_request(&u1, request(inactive, "RING-001"))
            .await,
        Err(ServiceError::InvalidLocation(_))
    );
}

#[tokio::test]
async fn requester_without_home_location_cannot_create() {
    let app = TestApp::new().await;
    let loc_b = app.seed_location("Store B", Some("GATI-B")).await;

    // Never assigned to a store
    let unassigned = app.seed_employee("Drifter", None).await;
    let result = app
        .transfers
        .create_request(&unassigned, request(loc_b, "RING-001"))
        .await;
    assert_matches!(result, Err(ServiceError::InvalidLocation(msg)) => {
        assert!(msg.contains("not linked to a store"));
    });

    // Assigned to a store with no ledger routing code: a different message
    let unlinked_store = app.seed_location("Store U", None).await;
    let stranded = app.seed_employee("Stranded", Some(unlinked_store)).await;
    let result = app
        .transfers
        .create_request(&stranded, request(loc_b, "RING-001"))
        .await;
    assert_matches!(result, Err(ServiceError::InvalidLocation(msg)) => {
        assert!(msg.contains("inventory ledger"));
    });
}

// ==================== Lifecycle scenarios ====================

#[tokio::test]
async fn full_lifecycle_accept_ship_receive() {
    let app = TestApp::new().await;
    let loc_a = app.seed_location("Store A", Some("GATI-A")).await;
    let loc_b = app.seed_location("Store B", Some("GATI-B")).await;
    let u1 = app.seed_employee("U1", Some(loc_a)).await;
    let sender = app.seed_employee("SenderB", Some(loc_b)).await;

    let order = app
        .transfers
        .create_request(&u1, request(loc_b, "RING-001"))
        .await
        .unwrap();
    assert_eq!(order.status, TransferStatus::Pending);

    // Accept by sender staff
    let accepted = app
        .transfers
        .act(&sender, order.id, TransferAction::Accept, ActionPayload::default())
        .await
        .unwrap();
    assert_eq!(accepted.status, TransferStatus::Accepted);

    // Repeating the accept fails: transitions are not idempotent
    let again = app
        .transfers
        .act(&sender, order.id, TransferAction::Accept, ActionPayload::default())
        .await;
    assert_matches!(again, Err(ServiceError::InvalidTransition(_)));

    // Ship with a carrier reference
    let shipped = app
        .transfers
        .act(&sender, order.id, TransferAction::Ship, ship_payload("AWB123"))
        .await
        .unwrap();
    assert_eq!(shipped.status, TransferStatus::Shipped);
    assert_eq!(shipped.shipment_ref.as_deref(), Some("AWB123"));

    // Receive by the requester; the order is now terminal
    let received = app
        .transfers
        .act(&u1, order.id, TransferAction::Receive, ActionPayload::default())
        .await
        .unwrap();
    assert_eq!(received.status, TransferStatus::Received);

    let after_terminal = app
        .transfers
        .act(&u1, order.id, TransferAction::Receive, ActionPayload::default())
        .await;
    assert_matches!(after_terminal, Err(ServiceError::InvalidTransition(_)));

    let sender_after_terminal = app
        .transfers
        .act(&sender, order.id, TransferAction::Ship, ship_payload("AWB999"))
        .await;
    assert_matches!(sender_after_terminal, Err(ServiceError::InvalidTransition(_)));
}

#[tokio::test]
async fn ship_requires_a_shipment_reference() {
    let app = TestApp::new().await;
    let loc_a = app.seed_location("Store A", Some("GATI-A")).await;
    let loc_b = app.seed_location("Store B", Some("GATI-B")).await;
    let u1 = app.seed_employee("U1", Some(loc_a)).await;
    let sender = app.seed_employee("SenderB", Some(loc_b)).await;

    let order = app
        .transfers
        .create_request(&u1, request(loc_b, "RING-001"))
        .await
        .unwrap();
    app.transfers
        .act(&sender, order.id, TransferAction::Accept, ActionPayload::default())
        .await
        .unwrap();

    let result = app
        .transfers
        .act(&sender, order.id, TransferAction::Ship, ActionPayload::default())
        .await;
    assert_matches!(result, Err(ServiceError::ValidationError(_)));

    // The failed ship left the order untouched
    let current = app.transfers.get(&sender, order.id).await.unwrap();
    assert_eq!(current.status, TransferStatus::Accepted);
    assert_eq!(current.shipment_ref, None);
}

#[tokio::test]
async fn cancel_is_only_legal_while_pending() {
    let app = TestApp::new().await;
    let loc_a = app.seed_location("Store A", Some("GATI-A")).await;
    let loc_b = app.seed_location("Store B", Some("GATI-B")).await;
    let u1 = app.seed_employee("U1", Some(loc_a)).await;
    let sender = app.seed_employee("SenderB", Some(loc_b)).await;

    let order = app
        .transfers
        .create_request(&u1, request(loc_b, "RING-001"))
        .await
        .unwrap();
    app.transfers
        .act(&sender, order.id, TransferAction::Accept, ActionPayload::default())
        .await
        .unwrap();

    let result = app
        .transfers
        .act(&u1, order.id, TransferAction::Cancel, ActionPayload::default())
        .await;
    assert_matches!(result, Err(ServiceError::InvalidTransition(_)));
}

#[tokio::test]
async fn reject_records_remarks_and_terminates() {
    let app = TestApp::new().await;
    let loc_a = app.seed_location("Store A", Some("GATI-A")).await;
    let loc_b = app.seed_location("Store B", Some("GATI-B")).await;
    let u1 = app.seed_employee("U1", Some(loc_a)).await;
    let sender = app.seed_employee("SenderB", Some(loc_b)).await;

    let order = app
        .transfers
        .create_request(&u1, request(loc_b, "RING-001"))
        .await
        .unwrap();

    let rejected = app
        .transfers
        .act(
            &sender,
            order.id,
            TransferAction::Reject,
            ActionPayload {
                shipment_ref: None,
                remarks: Some("Display piece, cannot release".to_string()),
            },
        )
        .await
        .unwrap();

    assert_eq!(rejected.status, TransferStatus::Rejected);
    assert_eq!(
        rejected.remarks.as_deref(),
        Some("Rejected: Display piece, cannot release")
    );

    let after = app
        .transfers
        .act(&sender, order.id, TransferAction::Accept, ActionPayload::default())
        .await;
    assert_matches!(after, Err(ServiceError::InvalidTransition(_)));
}

#[tokio::test]
async fn cancel_appends_the_default_remark() {
    let app = TestApp::new().await;
    let loc_a = app.seed_location("Store A", Some("GATI-A")).await;
    let loc_b = app.seed_location("Store B", Some("GATI-B")).await;
    let u1 = app.seed_employee("U1", Some(loc_a)).await;

    let order = app
        .transfers
        .create_request(&u1, request(loc_b, "RING-001"))
        .await
        .unwrap();
    let cancelled = app
        .transfers
        .act(&u1, order.id, TransferAction::Cancel, ActionPayload::default())
        .await
        .unwrap();

    assert_eq!(cancelled.status, TransferStatus::Cancelled);
    assert_eq!(cancelled.remarks.as_deref(), Some("Cancelled by requester"));
}

// ==================== Authorization ====================

#[tokio::test]
async fn sender_actions_require_the_sender_location() {
    let app = TestApp::new().await;
    let loc_a = app.seed_location("Store A", Some("GATI-A")).await;
    let loc_b = app.seed_location("Store B", Some("GATI-B")).await;
    let loc_c = app.seed_location("Store C", Some("GATI-C")).await;
    let u1 = app.seed_employee("U1", Some(loc_a)).await;
    let outsider = app.seed_employee("OutsiderC", Some(loc_c)).await;

    let order = app
        .transfers
        .create_request(&u1, request(loc_b, "RING-001"))
        .await
        .unwrap();

    // The requester cannot accept their own request
    assert_matches!(
        app.transfers
            .act(&u1, order.id, TransferAction::Accept, ActionPayload::default())
            .await,
        Err(ServiceError::Forbidden(_))
    );

    // Staff from an unrelated store cannot accept, reject or ship
    for action in [
        TransferAction::Accept,
        TransferAction::Reject,
        TransferAction::Ship,
    ] {
        let result = app
            .transfers
            .act(&outsider, order.id, action, ship_payload("AWB123"))
            .await;
        assert_matches!(result, Err(ServiceError::Forbidden(_)));
    }
}

#[tokio::test]
async fn requester_actions_require_the_requester_identity() {
    let app = TestApp::new().await;
    let loc_a = app.seed_location("Store A", Some("GATI-A")).await;
    let loc_b = app.seed_location("Store B", Some("GATI-B")).await;
    let u1 = app.seed_employee("U1", Some(loc_a)).await;
    let colleague = app.seed_employee("ColleagueA", Some(loc_a)).await;
    let sender = app.seed_employee("SenderB", Some(loc_b)).await;

    let order = app
        .transfers
        .create_request(&u1, request(loc_b, "RING-001"))
        .await
        .unwrap();

    // Even a colleague at the same store cannot cancel someone else's request
    assert_matches!(
        app.transfers
            .act(&colleague, order.id, TransferAction::Cancel, ActionPayload::default())
            .await,
        Err(ServiceError::Forbidden(_))
    );

    app.transfers
        .act(&sender, order.id, TransferAction::Accept, ActionPayload::default())
        .await
        .unwrap();
    app.transfers
        .act(&sender, order.id, TransferAction::Ship, ship_payload("AWB123"))
        .await
        .unwrap();

    assert_matches!(
        app.transfers
            .act(&colleague, order.id, TransferAction::Receive, ActionPayload::default())
            .await,
        Err(ServiceError::Forbidden(_))
    );
}

// ==================== Location directory ====================

#[tokio::test]
async fn home_location_resolution_is_three_way() {
    let app = TestApp::new().await;
    let linked = app.seed_location("Store A", Some("GATI-A")).await;
    let unlinked = app.seed_location("Store U", None).await;

    let at_linked = app.seed_employee("Linked", Some(linked)).await;
    let at_unlinked = app.seed_employee("Unlinked", Some(unlinked)).await;
    let nowhere = app.seed_employee("Nowhere", None).await;

    let resolved = app
        .locations
        .resolve_home_location(app.tenant_id, at_linked.user_id)
        .await
        .unwrap();
    assert_matches!(resolved, HomeLocation::Linked { location_id, routing_code, .. } => {
        assert_eq!(location_id, linked);
        assert_eq!(routing_code, "GATI-A");
    });

    // Assigned to a store with no routing code: unusable, not absent
    let resolved = app
        .locations
        .resolve_home_location(app.tenant_id, at_unlinked.user_id)
        .await
        .unwrap();
    assert_matches!(resolved, HomeLocation::LocationUnusable { store_name } => {
        assert_eq!(store_name, "Store U");
    });

    let resolved = app
        .locations
        .resolve_home_location(app.tenant_id, nowhere.user_id)
        .await
        .unwrap();
    assert_matches!(resolved, HomeLocation::NoLocationAssigned);
}

#[tokio::test]
async fn location_validation_checks_tenancy_and_activity() {
    let app = TestApp::new().await;
    let active = app.seed_location("Store A", Some("GATI-A")).await;
    let inactive = app.seed_inactive_location("Store I", Some("GATI-I")).await;

    assert!(app
        .locations
        .validate_location(app.tenant_id, active)
        .await
        .unwrap());
    assert!(!app
        .locations
        .validate_location(app.tenant_id, inactive)
        .await
        .unwrap());
    assert!(!app
        .locations
        .validate_location(Uuid::new_v4(), active)
        .await
        .unwrap());
    assert!(!app
        .locations
        .validate_location(app.tenant_id, Uuid::new_v4())
        .await
        .unwrap());

    let store = app.locations.get_location(app.tenant_id, active).await.unwrap();
    assert_eq!(store.store_name, "Store A");
    assert_matches!(
        app.locations.get_location(app.tenant_id, Uuid::new_v4()).await,
        Err(ServiceError::NotFound(_))
    );

    // The create-form listing only offers active stores
    let listed = app.locations.list_active(app.tenant_id).await.unwrap();
    assert!(listed.iter().any(|l| l.id == active));
    assert!(!listed.iter().any(|l| l.id == inactive));
}

// ==================== Tenancy ====================

#[tokio::test]
async fn orders_are_invisible_across_tenants() {
    let app = TestApp::new().await;
    let loc_a = app.seed_location("Store A", Some("GATI-A")).await;
    let loc_b = app.seed_location("Store B", Some("GATI-B")).await;
    let u1 = app.seed_employee("U1", Some(loc_a)).await;

    let order = app
        .transfers
        .create_request(&u1, request(loc_b, "RING-001"))
        .await
        .unwrap();

    let other_tenant = Uuid::new_v4();
    let found = app.orders.find(other_tenant, order.id).await;
    assert_matches!(found, Err(ServiceError::NotFound(_)));
}

// ==================== Listings ====================

#[tokio::test]
async fn incoming_queue_holds_open_requests_only() {
    let app = TestApp::new().await;
    let loc_a = app.seed_location("Store A", Some("GATI-A")).await;
    let loc_b = app.seed_location("Store B", Some("GATI-B")).await;
    let u1 = app.seed_employee("U1", Some(loc_a)).await;
    let sender = app.seed_employee("SenderB", Some(loc_b)).await;

    let pending = app
        .transfers
        .create_request(&u1, request(loc_b, "RING-001"))
        .await
        .unwrap();
    let accepted = app
        .transfers
        .create_request(&u1, request(loc_b, "RING-002"))
        .await
        .unwrap();
    let shipped = app
        .transfers
        .create_request(&u1, request(loc_b, "RING-003"))
        .await
        .unwrap();

    app.transfers
        .act(&sender, accepted.id, TransferAction::Accept, ActionPayload::default())
        .await
        .unwrap();
    app.transfers
        .act(&sender, shipped.id, TransferAction::Accept, ActionPayload::default())
        .await
        .unwrap();
    app.transfers
        .act(&sender, shipped.id, TransferAction::Ship, ship_payload("AWB123"))
        .await
        .unwrap();

    let queue = app.transfers.list_incoming(&sender).await.unwrap();
    let ids: Vec<Uuid> = queue.iter().map(|o| o.id).collect();
    assert!(ids.contains(&pending.id));
    assert!(ids.contains(&accepted.id));
    assert!(!ids.contains(&shipped.id));

    // The requester sees every order, shipped included
    let outgoing = app.transfers.list_outgoing(&u1).await.unwrap();
    assert_eq!(outgoing.len(), 3);
}

#[tokio::test]
async fn unassigned_users_have_no_incoming_queue() {
    let app = TestApp::new().await;
    let unassigned = app.seed_employee("Drifter", None).await;

    let result = app.transfers.list_incoming(&unassigned).await;
    assert_matches!(result, Err(ServiceError::InvalidLocation(_)));
}

// ==================== Races ====================

#[tokio::test]
async fn concurrent_identical_transitions_one_wins() {
    let app = TestApp::new().await;
    let loc_a = app.seed_location("Store A", Some("GATI-A")).await;
    let loc_b = app.seed_location("Store B", Some("GATI-B")).await;
    let u1 = app.seed_employee("U1", Some(loc_a)).await;
    let sender = app.seed_employee("SenderB", Some(loc_b)).await;

    let order = app
        .transfers
        .create_request(&u1, request(loc_b, "RING-001"))
        .await
        .unwrap();

    let (first, second) = tokio::join!(
        app.transfers
            .act(&sender, order.id, TransferAction::Accept, ActionPayload::default()),
        app.transfers
            .act(&sender, order.id, TransferAction::Accept, ActionPayload::default()),
    );

    let successes = [&first, &second].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one of two identical accepts may win");

    let loser = if first.is_ok() { second } else { first };
    assert_matches!(loser, Err(ServiceError::InvalidTransition(_)));
}

#[tokio::test]
async fn accept_racing_cancel_resolves_to_one_winner() {
    let app = TestApp::new().await;
    let loc_a = app.seed_location("Store A", Some("GATI-A")).await;
    let loc_b = app.seed_location("Store B", Some("GATI-B")).await;
    let u1 = app.seed_employee("U1", Some(loc_a)).await;
    let sender = app.seed_employee("SenderB", Some(loc_b)).await;

    let order = app
        .transfers
        .create_request(&u1, request(loc_b, "RING-001"))
        .await
        .unwrap();

    let (accept, cancel) = tokio::join!(
        app.transfers
            .act(&sender, order.id, TransferAction::Accept, ActionPayload::default()),
        app.transfers
            .act(&u1, order.id, TransferAction::Cancel, ActionPayload::default()),
    );

    let successes = [&accept, &cancel].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "conflicting transitions cannot both win");

    let current = app.orders.find(app.tenant_id, order.id).await.unwrap();
    assert!(
        current.status == TransferStatus::Accepted
            || current.status == TransferStatus::Cancelled
    );
}
