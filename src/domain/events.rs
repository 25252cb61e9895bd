//! Domain Events
//!
//! Event definitions for the membership stream.
//! Events are immutable facts that have happened in the system.

use serde::{Deserialize, Serialize};

use super::records::{CustomerRecord, SubscriptionRecord};

/// Membership-related events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MembershipEvent {
    /// Storefront reported a new customer
    CustomerCreated { customer: CustomerRecord },

    /// Storefront reported a customer change
    CustomerUpdated { customer: CustomerRecord },

    /// Storefront reported a new subscription
    SubscriptionCreated { subscription: SubscriptionRecord },

    /// Storefront reported a subscription change
    SubscriptionUpdated { subscription: SubscriptionRecord },

    /// Subscription status observed; `old_status` is `None` on first sight
    SubscriptionStatusChanged {
        subscription_id: String,
        old_status: Option<String>,
        new_status: String,
    },

    /// Customer became an active, paying member
    MembershipActivated { customer_id: String },

    /// Card declared on the customer record
    CardAdded {
        customer_id: String,
        card_number: String,
    },

    /// Card no longer declared on the customer record
    CardRemoved {
        customer_id: String,
        card_number: String,
    },

    /// Activation requested from the card readers
    CardSentForActivation {
        customer_id: String,
        card_number: String,
    },

    /// Deactivation requested from the card readers
    CardSentForDeactivation {
        customer_id: String,
        card_number: String,
    },

    /// Card readers confirmed activation
    CardActivated {
        customer_id: String,
        card_number: String,
    },

    /// Card readers confirmed deactivation
    CardDeactivated {
        customer_id: String,
        card_number: String,
    },

    /// Card readers reported back on a request, successful or not
    CardStatusUpdated {
        request_type: String,
        customer_id: String,
        card_number: String,
    },
}

impl MembershipEvent {
    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            MembershipEvent::CustomerCreated { .. } => "CustomerCreated",
            MembershipEvent::CustomerUpdated { .. } => "CustomerUpdated",
            MembershipEvent::SubscriptionCreated { .. } => "SubscriptionCreated",
            MembershipEvent::SubscriptionUpdated { .. } => "SubscriptionUpdated",
            MembershipEvent::SubscriptionStatusChanged { .. } => "SubscriptionStatusChanged",
            MembershipEvent::MembershipActivated { .. } => "MembershipActivated",
            MembershipEvent::CardAdded { .. } => "CardAdded",
            MembershipEvent::CardRemoved { .. } => "CardRemoved",
            MembershipEvent::CardSentForActivation { .. } => "CardSentForActivation",
            MembershipEvent::CardSentForDeactivation { .. } => "CardSentForDeactivation",
            MembershipEvent::CardActivated { .. } => "CardActivated",
            MembershipEvent::CardDeactivated { .. } => "CardDeactivated",
            MembershipEvent::CardStatusUpdated { .. } => "CardStatusUpdated",
        }
    }

    /// Card number this event concerns, if any
    pub fn card_number(&self) -> Option<&str> {
        match self {
            MembershipEvent::CardAdded { card_number, .. }
            | MembershipEvent::CardRemoved { card_number, .. }
            | MembershipEvent::CardSentForActivation { card_number, .. }
            | MembershipEvent::CardSentForDeactivation { card_number, .. }
            | MembershipEvent::CardActivated { card_number, .. }
            | MembershipEvent::CardDeactivated { card_number, .. }
            | MembershipEvent::CardStatusUpdated { card_number, .. } => Some(card_number),
            _ => None,
        }
    }
}
