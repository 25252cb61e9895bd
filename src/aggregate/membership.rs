//! Membership Aggregate
//!
//! Single source of truth for a member's cards, subscription status and
//! activation lifecycle. State is rebuilt by replaying the member's stream;
//! commands record new events which are applied immediately so later steps
//! of the same command see them.

use indexmap::IndexSet;
use uuid::Uuid;

use crate::domain::{
    derive_identity, transition_for, CardUpdateOutcome, CardUpdateRequest, CardUpdateType,
    CustomerRecord, MembershipError, MembershipEvent, StatusTransition, SubscriptionRecord,
};

use super::Aggregate;

/// Membership Aggregate
///
/// Card sets keep insertion order so replays and activation drains emit
/// events in the order the cards were declared.
#[derive(Debug, Clone, Default)]
pub struct Membership {
    /// Derived from `customer_id`
    id: Uuid,

    /// Storefront customer id
    customer_id: String,

    /// Cards currently declared on the customer record
    cards_on_account: IndexSet<String>,

    /// Added while not yet an active member
    cards_needing_activation: IndexSet<String>,

    /// Activation requested, not yet confirmed
    cards_sent_for_activation: IndexSet<String>,

    /// Deactivation requested, not yet confirmed
    cards_sent_for_deactivation: IndexSet<String>,

    /// Last observed subscription status
    subscription_status: Option<String>,

    /// `None` until a membership activation has been observed
    currently_a_member: Option<bool>,

    /// Number of events applied
    version: i64,

    /// Recorded by commands, not yet persisted
    uncommitted: Vec<MembershipEvent>,
}

impl Membership {
    /// Empty projection for a customer that has no history yet
    pub fn new(customer_id: impl Into<String>) -> Self {
        let customer_id = customer_id.into();
        Self {
            id: derive_identity(&customer_id),
            customer_id,
            ..Self::default()
        }
    }

    /// Rebuild a member's state from their event history
    pub fn load<I>(customer_id: impl Into<String>, history: I) -> Self
    where
        I: IntoIterator<Item = MembershipEvent>,
    {
        Self::new(customer_id).replay(history)
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Storefront created the customer
    pub fn create_customer(&mut self, customer: CustomerRecord) {
        self.record_that(MembershipEvent::CustomerCreated {
            customer: customer.clone(),
        });
        self.reconcile_cards(&customer);
    }

    /// Storefront updated the customer
    pub fn update_customer(&mut self, customer: CustomerRecord) {
        self.record_that(MembershipEvent::CustomerUpdated {
            customer: customer.clone(),
        });
        self.reconcile_cards(&customer);
    }

    /// Storefront created a subscription
    pub fn create_subscription(&mut self, subscription: SubscriptionRecord) {
        self.record_that(MembershipEvent::SubscriptionCreated {
            subscription: subscription.clone(),
        });
        self.handle_subscription_status(&subscription.id, &subscription.status);
    }

    /// Storefront updated a subscription
    pub fn update_subscription(&mut self, subscription: SubscriptionRecord) {
        self.record_that(MembershipEvent::SubscriptionUpdated {
            subscription: subscription.clone(),
        });
        self.handle_subscription_status(&subscription.id, &subscription.status);
    }

    /// Card readers reported back on an activation or deactivation request.
    ///
    /// The report itself is always recorded. A failed or unrecognized request
    /// leaves the card in its sent-for set and comes back as an error.
    pub fn update_card_status(
        &mut self,
        request: &CardUpdateRequest,
        outcome: CardUpdateOutcome,
    ) -> Result<(), MembershipError> {
        self.record_that(MembershipEvent::CardStatusUpdated {
            request_type: request.request_type.clone(),
            customer_id: request.customer_id.clone(),
            card_number: request.card.clone(),
        });

        if outcome == CardUpdateOutcome::Failure {
            return Err(MembershipError::CardUpdateFailed {
                customer_id: request.customer_id.clone(),
                card_number: request.card.clone(),
                request_type: request.request_type.clone(),
            });
        }

        let event = match request.kind() {
            Some(CardUpdateType::Activation) => MembershipEvent::CardActivated {
                customer_id: self.customer_id.clone(),
                card_number: request.card.clone(),
            },
            Some(CardUpdateType::Deactivation) => MembershipEvent::CardDeactivated {
                customer_id: self.customer_id.clone(),
                card_number: request.card.clone(),
            },
            None => {
                return Err(MembershipError::UnrecognizedRequestType(
                    request.request_type.clone(),
                ))
            }
        };

        self.record_that(event);
        Ok(())
    }

    // =========================================================================
    // Command internals
    // =========================================================================

    /// Diff the declared card list against `cards_on_account`.
    /// Additions are emitted before removals.
    fn reconcile_cards(&mut self, customer: &CustomerRecord) {
        let Some(declared) = customer.card_numbers() else {
            return;
        };

        for card in &declared {
            if self.cards_on_account.contains(card) {
                continue;
            }

            self.record_that(MembershipEvent::CardAdded {
                customer_id: self.customer_id.clone(),
                card_number: card.clone(),
            });

            if self.is_active_member() {
                self.record_that(MembershipEvent::CardSentForActivation {
                    customer_id: self.customer_id.clone(),
                    card_number: card.clone(),
                });
            }
        }

        let removed: Vec<String> = self
            .cards_on_account
            .iter()
            .filter(|card| !declared.contains(card))
            .cloned()
            .collect();

        for card in removed {
            self.record_that(MembershipEvent::CardRemoved {
                customer_id: self.customer_id.clone(),
                card_number: card.clone(),
            });
            self.record_that(MembershipEvent::CardSentForDeactivation {
                customer_id: self.customer_id.clone(),
                card_number: card,
            });
        }
    }

    fn handle_subscription_status(&mut self, subscription_id: &str, new_status: &str) {
        let old_status = self.subscription_status.clone();

        self.record_that(MembershipEvent::SubscriptionStatusChanged {
            subscription_id: subscription_id.to_string(),
            old_status: old_status.clone(),
            new_status: new_status.to_string(),
        });

        // First observation can't be a transition
        let previous = old_status.as_deref().unwrap_or(new_status);

        match transition_for(previous, new_status) {
            Some(StatusTransition::ActivateMembership) => self.activate_membership(),
            None => {}
        }
    }

    fn activate_membership(&mut self) {
        tracing::info!(
            customer_id = %self.customer_id,
            pending_cards = self.cards_needing_activation.len(),
            "Membership activated"
        );

        self.record_that(MembershipEvent::MembershipActivated {
            customer_id: self.customer_id.clone(),
        });

        let backlog: Vec<String> = self.cards_needing_activation.iter().cloned().collect();
        for card in backlog {
            self.record_that(MembershipEvent::CardSentForActivation {
                customer_id: self.customer_id.clone(),
                card_number: card,
            });
        }
    }

    /// Append to the uncommitted buffer, then apply
    fn record_that(&mut self, event: MembershipEvent) {
        tracing::debug!(
            customer_id = %self.customer_id,
            event_type = event.event_type(),
            card = event.card_number(),
            "Recording membership event"
        );

        self.uncommitted.push(event.clone());
        let current = std::mem::take(self);
        *self = current.apply(event);
    }

    // =========================================================================
    // Uncommitted events
    // =========================================================================

    /// Events recorded since load, oldest first
    pub fn uncommitted(&self) -> &[MembershipEvent] {
        &self.uncommitted
    }

    /// Drain recorded events for persistence
    pub fn take_uncommitted(&mut self) -> Vec<MembershipEvent> {
        std::mem::take(&mut self.uncommitted)
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    pub fn cards_on_account(&self) -> &IndexSet<String> {
        &self.cards_on_account
    }

    pub fn cards_needing_activation(&self) -> &IndexSet<String> {
        &self.cards_needing_activation
    }

    pub fn cards_sent_for_activation(&self) -> &IndexSet<String> {
        &self.cards_sent_for_activation
    }

    pub fn cards_sent_for_deactivation(&self) -> &IndexSet<String> {
        &self.cards_sent_for_deactivation
    }

    pub fn subscription_status(&self) -> Option<&str> {
        self.subscription_status.as_deref()
    }

    pub fn is_active_member(&self) -> bool {
        self.currently_a_member == Some(true)
    }
}

impl Aggregate for Membership {
    type Event = MembershipEvent;

    fn aggregate_type() -> &'static str {
        "Membership"
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(mut self, event: Self::Event) -> Self {
        match event {
            MembershipEvent::CardAdded { card_number, .. } => {
                let card_number = card_key(card_number);
                self.cards_on_account.insert(card_number.clone());
                self.cards_needing_activation.insert(card_number);
            }

            MembershipEvent::CardSentForActivation { card_number, .. } => {
                let card_number = card_key(card_number);
                self.cards_needing_activation.shift_remove(&card_number);
                self.cards_sent_for_activation.insert(card_number);
            }

            MembershipEvent::CardActivated { card_number, .. } => {
                let card_number = card_key(card_number);
                self.cards_sent_for_activation.shift_remove(&card_number);
            }

            MembershipEvent::CardRemoved { card_number, .. } => {
                let card_number = card_key(card_number);
                self.cards_on_account.shift_remove(&card_number);
                self.cards_needing_activation.shift_remove(&card_number);
            }

            MembershipEvent::CardSentForDeactivation { card_number, .. } => {
                let card_number = card_key(card_number);
                self.cards_sent_for_deactivation.insert(card_number);
            }

            MembershipEvent::CardDeactivated { card_number, .. } => {
                let card_number = card_key(card_number);
                self.cards_sent_for_deactivation.shift_remove(&card_number);
            }

            MembershipEvent::SubscriptionStatusChanged { new_status, .. } => {
                self.subscription_status = Some(new_status);
            }

            MembershipEvent::MembershipActivated { .. } => {
                self.currently_a_member = Some(true);
            }

            // Facts only
            MembershipEvent::CustomerCreated { .. }
            | MembershipEvent::CustomerUpdated { .. }
            | MembershipEvent::SubscriptionCreated { .. }
            | MembershipEvent::SubscriptionUpdated { .. }
            | MembershipEvent::CardStatusUpdated { .. } => {}
        }

        self.version += 1;
        self
    }
}

/// Stored card numbers compare the way the declaration parser reads them
fn card_key(card_number: String) -> String {
    let trimmed = card_number.trim();
    if trimmed.len() == card_number.len() {
        card_number
    } else {
        trimmed.to_string()
    }
}
