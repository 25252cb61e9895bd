//! In-memory event log.
//!
//! Same contract as the PostgreSQL store, kept in a map. Used by tests and
//! by callers that embed the aggregate without a database.

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::OperationContext;

use super::{EventLog, EventStoreError, NewEvent, StoredEvent};

/// Thread-safe in-memory event log
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventStore {
    streams: Arc<RwLock<HashMap<Uuid, Vec<StoredEvent>>>>,
}

impl InMemoryEventStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of events stored for an aggregate
    pub fn stream_len(&self, aggregate_id: Uuid) -> usize {
        self.streams
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&aggregate_id)
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl EventLog for InMemoryEventStore {
    async fn load_history(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, EventStoreError> {
        let streams = self
            .streams
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        Ok(streams.get(&aggregate_id).cloned().unwrap_or_default())
    }

    async fn append(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: Vec<NewEvent>,
        context: &OperationContext,
    ) -> Result<Vec<StoredEvent>, EventStoreError> {
        if events.is_empty() {
            return Ok(Vec::new());
        }

        let context_json = serde_json::to_value(context)?;
        let mut streams = self
            .streams
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let stream = streams.entry(aggregate_id).or_default();

        let current_version = stream.last().map_or(0, |event| event.version);
        if current_version != expected_version {
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id,
                expected: expected_version,
                actual: current_version,
            });
        }

        let created_at = Utc::now();
        let stored: Vec<StoredEvent> = events
            .into_iter()
            .zip(expected_version + 1..)
            .map(|(event, version)| StoredEvent {
                id: Uuid::new_v4(),
                aggregate_type: event.aggregate_type,
                aggregate_id,
                version,
                event_type: event.event_type,
                event_data: event.event_data,
                context: context_json.clone(),
                created_at,
            })
            .collect();

        stream.extend(stored.iter().cloned());

        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MembershipEvent;

    fn card_added(card: &str) -> NewEvent {
        let event = MembershipEvent::CardAdded {
            customer_id: "1234".to_string(),
            card_number: card.to_string(),
        };
        NewEvent::new("Membership", event.event_type(), &event).unwrap()
    }

    #[tokio::test]
    async fn test_append_and_load_in_order() {
        let store = InMemoryEventStore::new();
        let aggregate_id = Uuid::new_v4();
        let context = OperationContext::new().with_source("test");

        let stored = store
            .append(aggregate_id, 0, vec![card_added("A"), card_added("B")], &context)
            .await
            .unwrap();
        assert_eq!(stored.iter().map(|e| e.version).collect::<Vec<_>>(), vec![1, 2]);

        store
            .append(aggregate_id, 2, vec![card_added("C")], &context)
            .await
            .unwrap();

        let history = store.load_history(aggregate_id).await.unwrap();
        let cards: Vec<String> = history
            .iter()
            .map(|e| e.event_data["card_number"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(cards, vec!["A", "B", "C"]);
        assert_eq!(history[2].version, 3);
        assert_eq!(history[0].context["source"], "test");
        assert_eq!(store.stream_len(aggregate_id), 3);
    }

    #[tokio::test]
    async fn test_stale_expected_version_conflicts() {
        let store = InMemoryEventStore::new();
        let aggregate_id = Uuid::new_v4();
        let context = OperationContext::new();

        store
            .append(aggregate_id, 0, vec![card_added("A")], &context)
            .await
            .unwrap();

        let result = store
            .append(aggregate_id, 0, vec![card_added("B")], &context)
            .await;

        match result {
            Err(EventStoreError::ConcurrencyConflict { expected, actual, .. }) => {
                assert_eq!(expected, 0);
                assert_eq!(actual, 1);
            }
            other => panic!("expected conflict, got {:?}", other),
        }
        assert_eq!(store.stream_len(aggregate_id), 1);
    }

    #[tokio::test]
    async fn test_empty_append_is_no_op() {
        let store = InMemoryEventStore::new();
        let aggregate_id = Uuid::new_v4();

        let stored = store
            .append(aggregate_id, 5, Vec::new(), &OperationContext::new())
            .await
            .unwrap();

        assert!(stored.is_empty());
        assert!(store.load_history(aggregate_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_streams_are_independent() {
        let store = InMemoryEventStore::new();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let context = OperationContext::new();

        store.append(first, 0, vec![card_added("A")], &context).await.unwrap();
        store.append(second, 0, vec![card_added("B")], &context).await.unwrap();

        assert_eq!(store.stream_len(first), 1);
        assert_eq!(store.stream_len(second), 1);
    }
}
