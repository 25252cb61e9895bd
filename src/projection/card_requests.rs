//! Card reader requests derived from stored membership events.

use uuid::Uuid;

use crate::domain::{CardUpdateRequest, MembershipEvent};
use crate::event_store::{EventStoreError, StoredEvent};

/// A request the card readers still have to act on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCardRequest {
    /// Event that asked for the change; one request per event
    pub event_id: Uuid,
    pub aggregate_id: Uuid,
    pub request: CardUpdateRequest,
}

/// Turn `CardSentForActivation` / `CardSentForDeactivation` events into
/// card reader requests, in stream order. Other events are skipped.
pub fn card_requests(events: &[StoredEvent]) -> Result<Vec<PendingCardRequest>, EventStoreError> {
    let mut requests = Vec::new();

    for stored in events {
        if !matches!(
            stored.event_type.as_str(),
            "CardSentForActivation" | "CardSentForDeactivation"
        ) {
            continue;
        }

        let request = match stored.decode::<MembershipEvent>()? {
            MembershipEvent::CardSentForActivation {
                customer_id,
                card_number,
            } => CardUpdateRequest::activation(customer_id, card_number),
            MembershipEvent::CardSentForDeactivation {
                customer_id,
                card_number,
            } => CardUpdateRequest::deactivation(customer_id, card_number),
            other => {
                return Err(EventStoreError::InvalidEventData(format!(
                    "event {} is typed {} but holds {}",
                    stored.id,
                    stored.event_type,
                    other.event_type()
                )))
            }
        };

        requests.push(PendingCardRequest {
            event_id: stored.id,
            aggregate_id: stored.aggregate_id,
            request,
        });
    }

    Ok(requests)
}
