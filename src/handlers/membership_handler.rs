//! Membership Handler
//!
//! Loads a member's aggregate, runs one command and persists what it
//! recorded. Commands for the same member are serialized; a conflicting
//! append from another writer causes a reload and a rerun.

use std::time::Duration;

use uuid::Uuid;

use crate::aggregate::{Aggregate, Membership};
use crate::config::Config;
use crate::domain::{
    derive_identity, CardUpdateOutcome, CardUpdateRequest, CustomerRecord, MembershipEvent,
    OperationContext, SubscriptionRecord,
};
use crate::error::AppResult;
use crate::event_store::{EventLog, EventStoreError, NewEvent, StoredEvent};

use super::commands::{CommandOutcome, MembershipCommand};
use super::locks::IdentityLocks;

pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Handler for membership commands
#[derive(Debug)]
pub struct MembershipHandler<L> {
    log: L,
    locks: IdentityLocks,
    max_retries: u32,
}

impl<L: EventLog> MembershipHandler<L> {
    pub fn new(log: L) -> Self {
        Self {
            log,
            locks: IdentityLocks::new(),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn from_config(log: L, config: &Config) -> Self {
        Self::new(log).with_max_retries(config.command_max_retries)
    }

    /// Attempts per command, including the first
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    pub fn log(&self) -> &L {
        &self.log
    }

    /// Current projection of a member, read-only
    pub async fn load(&self, customer_id: &str) -> AppResult<Membership> {
        self.replay(customer_id, derive_identity(customer_id)).await
    }

    async fn replay(&self, customer_id: &str, aggregate_id: Uuid) -> AppResult<Membership> {
        let history = self.log.load_history(aggregate_id).await?;

        Ok(Membership::load(customer_id, decode_events(&history)?))
    }

    // =========================================================================
    // execute
    // =========================================================================

    /// Run a command for a member and append the events it recorded.
    ///
    /// Events recorded before a command error are still appended; the error
    /// is returned afterwards.
    pub async fn execute(
        &self,
        customer_id: &str,
        command: MembershipCommand,
        context: &OperationContext,
    ) -> AppResult<CommandOutcome> {
        let aggregate_id = derive_identity(customer_id);
        let _guard = self.locks.acquire(aggregate_id).await;

        for attempt in 1..=self.max_retries {
            let mut membership = self.replay(customer_id, aggregate_id).await?;
            let expected_version = membership.version();

            let result = command.run(&mut membership);

            let new_events = membership
                .take_uncommitted()
                .iter()
                .map(|event| NewEvent::new(Membership::aggregate_type(), event.event_type(), event))
                .collect::<Result<Vec<_>, _>>()?;

            match self
                .log
                .append(aggregate_id, expected_version, new_events, context)
                .await
            {
                Ok(events) => {
                    if let Err(e) = result {
                        tracing::warn!(
                            customer_id,
                            command = command.name(),
                            card = e.card_number(),
                            "Membership command rejected after recording {} events: {}",
                            events.len(),
                            e
                        );
                        return Err(e.into());
                    }

                    tracing::debug!(
                        customer_id,
                        command = command.name(),
                        version = membership.version(),
                        "Membership command applied"
                    );

                    return Ok(CommandOutcome {
                        aggregate_id,
                        version: membership.version(),
                        events,
                    });
                }
                Err(e) if e.is_concurrency_conflict() => {
                    tracing::warn!(
                        customer_id,
                        command = command.name(),
                        "Concurrency conflict, retrying (attempt {}/{})",
                        attempt,
                        self.max_retries
                    );
                    if attempt < self.max_retries {
                        tokio::time::sleep(Duration::from_millis(50 * attempt as u64)).await;
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(EventStoreError::MaxRetriesExceeded(aggregate_id).into())
    }

    // =========================================================================
    // One entry point per inbound change
    // =========================================================================

    pub async fn create_customer(
        &self,
        customer: CustomerRecord,
        context: &OperationContext,
    ) -> AppResult<CommandOutcome> {
        let customer_id = customer.id.clone();
        self.execute(&customer_id, MembershipCommand::CreateCustomer { customer }, context)
            .await
    }

    pub async fn update_customer(
        &self,
        customer: CustomerRecord,
        context: &OperationContext,
    ) -> AppResult<CommandOutcome> {
        let customer_id = customer.id.clone();
        self.execute(&customer_id, MembershipCommand::UpdateCustomer { customer }, context)
            .await
    }

    pub async fn create_subscription(
        &self,
        customer_id: &str,
        subscription: SubscriptionRecord,
        context: &OperationContext,
    ) -> AppResult<CommandOutcome> {
        self.execute(
            customer_id,
            MembershipCommand::CreateSubscription { subscription },
            context,
        )
        .await
    }

    pub async fn update_subscription(
        &self,
        customer_id: &str,
        subscription: SubscriptionRecord,
        context: &OperationContext,
    ) -> AppResult<CommandOutcome> {
        self.execute(
            customer_id,
            MembershipCommand::UpdateSubscription { subscription },
            context,
        )
        .await
    }

    pub async fn update_card_status(
        &self,
        request: CardUpdateRequest,
        outcome: CardUpdateOutcome,
        context: &OperationContext,
    ) -> AppResult<CommandOutcome> {
        let customer_id = request.customer_id.clone();
        self.execute(
            &customer_id,
            MembershipCommand::UpdateCardStatus { request, outcome },
            context,
        )
        .await
    }
}

/// Decode stored events back into domain events
pub fn decode_events(events: &[StoredEvent]) -> Result<Vec<MembershipEvent>, EventStoreError> {
    events.iter().map(StoredEvent::decode::<MembershipEvent>).collect()
}
