//! Command definitions
//!
//! Commands represent intentions to change a member's state. Each one maps
//! onto a single `Membership` command method.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::Membership;
use crate::domain::{
    CardUpdateOutcome, CardUpdateRequest, CustomerRecord, MembershipError, SubscriptionRecord,
};
use crate::event_store::StoredEvent;

/// Inbound membership command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum MembershipCommand {
    CreateCustomer { customer: CustomerRecord },
    UpdateCustomer { customer: CustomerRecord },
    CreateSubscription { subscription: SubscriptionRecord },
    UpdateSubscription { subscription: SubscriptionRecord },
    UpdateCardStatus {
        request: CardUpdateRequest,
        outcome: CardUpdateOutcome,
    },
}

impl MembershipCommand {
    pub fn name(&self) -> &'static str {
        match self {
            MembershipCommand::CreateCustomer { .. } => "create_customer",
            MembershipCommand::UpdateCustomer { .. } => "update_customer",
            MembershipCommand::CreateSubscription { .. } => "create_subscription",
            MembershipCommand::UpdateSubscription { .. } => "update_subscription",
            MembershipCommand::UpdateCardStatus { .. } => "update_card_status",
        }
    }

    /// Run the command against a loaded aggregate
    pub fn run(&self, membership: &mut Membership) -> Result<(), MembershipError> {
        match self {
            MembershipCommand::CreateCustomer { customer } => {
                membership.create_customer(customer.clone());
            }
            MembershipCommand::UpdateCustomer { customer } => {
                membership.update_customer(customer.clone());
            }
            MembershipCommand::CreateSubscription { subscription } => {
                membership.create_subscription(subscription.clone());
            }
            MembershipCommand::UpdateSubscription { subscription } => {
                membership.update_subscription(subscription.clone());
            }
            MembershipCommand::UpdateCardStatus { request, outcome } => {
                membership.update_card_status(request, *outcome)?;
            }
        }
        Ok(())
    }
}

/// Result of a successfully persisted command
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    pub aggregate_id: Uuid,
    /// Stream version after the append
    pub version: i64,
    /// Events appended by this command, in order
    pub events: Vec<StoredEvent>,
}
