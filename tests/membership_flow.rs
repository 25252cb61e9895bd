//! Membership lifecycle over the in-memory event log

use membership_sync::domain::subscription::{STATUS_ACTIVE, STATUS_ON_HOLD};
use membership_sync::projection::card_requests;
use membership_sync::{
    AppError, CardUpdateOutcome, CustomerRecord, InMemoryEventStore, Membership, MembershipError,
    MembershipHandler, OperationContext, SubscriptionRecord,
};

const CUSTOMER: &str = "5150";

async fn member(handler: &MembershipHandler<InMemoryEventStore>) -> Membership {
    handler.load(CUSTOMER).await.unwrap()
}

fn cards(set: &indexmap::IndexSet<String>) -> Vec<&str> {
    set.iter().map(String::as_str).collect()
}

#[tokio::test]
async fn test_card_reader_round_trip() {
    let handler = MembershipHandler::new(InMemoryEventStore::new());
    let context = OperationContext::new().with_source("storefront");

    handler
        .create_customer(CustomerRecord::new(CUSTOMER).with_cards("100, 200"), &context)
        .await
        .unwrap();
    handler
        .create_subscription(CUSTOMER, SubscriptionRecord::new("1", STATUS_ON_HOLD), &context)
        .await
        .unwrap();

    // Not a member yet, so nothing goes to the card readers
    let membership = member(&handler).await;
    assert!(!membership.is_active_member());
    assert_eq!(cards(membership.cards_needing_activation()), vec!["100", "200"]);

    let outcome = handler
        .update_subscription(CUSTOMER, SubscriptionRecord::new("1", STATUS_ACTIVE), &context)
        .await
        .unwrap();

    let requests = card_requests(&outcome.events).unwrap();
    assert_eq!(
        requests.iter().map(|p| p.request.card.as_str()).collect::<Vec<_>>(),
        vec!["100", "200"]
    );

    for pending in requests {
        handler
            .update_card_status(pending.request, CardUpdateOutcome::Success, &context)
            .await
            .unwrap();
    }

    let membership = member(&handler).await;
    assert!(membership.cards_needing_activation().is_empty());
    assert!(membership.cards_sent_for_activation().is_empty());

    // Dropping a card while active sends it for deactivation
    let outcome = handler
        .update_customer(CustomerRecord::new(CUSTOMER).with_cards("200"), &context)
        .await
        .unwrap();
    let requests = card_requests(&outcome.events).unwrap();
    assert_eq!(requests.len(), 1);
    let deactivation = requests[0].request.clone();
    assert_eq!(deactivation.request_type, "deactivation");
    assert_eq!(deactivation.card, "100");

    let result = handler
        .update_card_status(deactivation.clone(), CardUpdateOutcome::Failure, &context)
        .await;
    assert!(matches!(
        result,
        Err(AppError::Membership(MembershipError::CardUpdateFailed { .. }))
    ));
    assert_eq!(cards(member(&handler).await.cards_sent_for_deactivation()), vec!["100"]);

    handler
        .update_card_status(deactivation, CardUpdateOutcome::Success, &context)
        .await
        .unwrap();

    let membership = member(&handler).await;
    assert!(membership.cards_sent_for_deactivation().is_empty());
    assert_eq!(cards(membership.cards_on_account()), vec!["200"]);
}

#[tokio::test]
async fn test_card_added_to_active_member_is_sent_straight_away() {
    let handler = MembershipHandler::new(InMemoryEventStore::new());
    let context = OperationContext::new();

    handler
        .create_subscription(CUSTOMER, SubscriptionRecord::new("1", STATUS_ON_HOLD), &context)
        .await
        .unwrap();
    handler
        .update_subscription(CUSTOMER, SubscriptionRecord::new("1", STATUS_ACTIVE), &context)
        .await
        .unwrap();

    let outcome = handler
        .update_customer(CustomerRecord::new(CUSTOMER).with_cards("300"), &context)
        .await
        .unwrap();

    let requests = card_requests(&outcome.events).unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].request.request_type, "activation");
    assert_eq!(requests[0].aggregate_id, outcome.aggregate_id);

    let membership = member(&handler).await;
    assert!(membership.cards_needing_activation().is_empty());
    assert_eq!(cards(membership.cards_sent_for_activation()), vec!["300"]);
}

#[tokio::test]
async fn test_replay_is_deterministic() {
    let handler = MembershipHandler::new(InMemoryEventStore::new());
    let context = OperationContext::new();

    handler
        .create_customer(CustomerRecord::new(CUSTOMER).with_cards("1,2,3"), &context)
        .await
        .unwrap();
    handler
        .update_customer(CustomerRecord::new(CUSTOMER).with_cards("3,4"), &context)
        .await
        .unwrap();

    let first = member(&handler).await;
    let second = member(&handler).await;

    assert_eq!(cards(first.cards_on_account()), vec!["3", "4"]);
    assert_eq!(first.cards_on_account(), second.cards_on_account());
    assert_eq!(first.cards_needing_activation(), second.cards_needing_activation());
    assert_eq!(first.cards_sent_for_deactivation(), second.cards_sent_for_deactivation());
}

#[tokio::test]
async fn test_card_dropped_while_on_hold_stays_off_the_readers() {
    let handler = MembershipHandler::new(InMemoryEventStore::new());
    let context = OperationContext::new();

    handler
        .create_customer(CustomerRecord::new(CUSTOMER).with_cards("A"), &context)
        .await
        .unwrap();
    handler
        .create_subscription(CUSTOMER, SubscriptionRecord::new("1", STATUS_ON_HOLD), &context)
        .await
        .unwrap();
    handler
        .update_customer(CustomerRecord::new(CUSTOMER).with_cards(""), &context)
        .await
        .unwrap();

    let outcome = handler
        .update_subscription(CUSTOMER, SubscriptionRecord::new("1", STATUS_ACTIVE), &context)
        .await
        .unwrap();

    assert!(card_requests(&outcome.events).unwrap().is_empty());

    let membership = member(&handler).await;
    assert!(membership.is_active_member());
    assert!(membership.cards_sent_for_activation().is_empty());
    assert_eq!(cards(membership.cards_sent_for_deactivation()), vec!["A"]);
}
