//! Event Store Repository
//!
//! The event log boundary and its PostgreSQL implementation.
//! Appends are guarded by optimistic concurrency on the stream head.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::domain::OperationContext;

use super::EventStoreError;

/// Stored event from the log
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct StoredEvent {
    pub id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: Uuid,
    pub version: i64,
    pub event_type: String,
    pub event_data: serde_json::Value,
    pub context: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl StoredEvent {
    /// Deserialize the payload into a domain event
    pub fn decode<E: DeserializeOwned>(&self) -> Result<E, EventStoreError> {
        Ok(serde_json::from_value(self.event_data.clone())?)
    }
}

/// Event waiting to be appended
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub aggregate_type: String,
    pub event_type: String,
    pub event_data: serde_json::Value,
}

impl NewEvent {
    /// Serialize a domain event for appending
    pub fn new<E: Serialize>(
        aggregate_type: &str,
        event_type: &str,
        event: &E,
    ) -> Result<Self, EventStoreError> {
        let event_data = serde_json::to_value(event)?;
        Ok(Self {
            aggregate_type: aggregate_type.to_string(),
            event_type: event_type.to_string(),
            event_data,
        })
    }
}

/// Ordered, append-only, per-aggregate event log.
///
/// Events appended for an aggregate must be visible, in order, to the next
/// `load_history` of that aggregate.
#[async_trait]
pub trait EventLog: Send + Sync {
    /// All events of an aggregate, ordered by version
    async fn load_history(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, EventStoreError>;

    /// Append events after `expected_version`.
    ///
    /// Fails with [`EventStoreError::ConcurrencyConflict`] if the stream has
    /// moved on. An empty batch is a no-op.
    async fn append(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: Vec<NewEvent>,
        context: &OperationContext,
    ) -> Result<Vec<StoredEvent>, EventStoreError>;
}

/// PostgreSQL-backed event log
#[derive(Debug, Clone)]
pub struct EventStore {
    pool: PgPool,
}

impl EventStore {
    /// Create a new EventStore with a database pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get current version of an aggregate (0 when it has no events)
    async fn head_version<'e, E>(executor: E, aggregate_id: Uuid) -> Result<i64, EventStoreError>
    where
        E: PgExecutor<'e>,
    {
        let version: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(MAX(version), 0) FROM events WHERE aggregate_id = $1
            "#,
        )
        .bind(aggregate_id)
        .fetch_one(executor)
        .await?;

        Ok(version)
    }
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db_error) => db_error.is_unique_violation(),
        _ => false,
    }
}

#[async_trait]
impl EventLog for EventStore {
    async fn load_history(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, EventStoreError> {
        let events = sqlx::query_as::<_, StoredEvent>(
            r#"
            SELECT id, aggregate_type, aggregate_id, version, event_type, event_data, context, created_at
            FROM events
            WHERE aggregate_id = $1
            ORDER BY version ASC
            "#,
        )
        .bind(aggregate_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
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
        let mut tx = self.pool.begin().await?;

        let current_version = Self::head_version(&mut *tx, aggregate_id).await?;
        if current_version != expected_version {
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id,
                expected: expected_version,
                actual: current_version,
            });
        }

        let mut stored = Vec::with_capacity(events.len());
        let mut version = expected_version;

        for event in events {
            version += 1;

            // (aggregate_id, version) is unique; a racing writer trips it
            let inserted: Result<(Uuid, DateTime<Utc>), sqlx::Error> = sqlx::query_as(
                r#"
                INSERT INTO events (
                    aggregate_type, aggregate_id, version,
                    event_type, event_data, context
                )
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id, created_at
                "#,
            )
            .bind(&event.aggregate_type)
            .bind(aggregate_id)
            .bind(version)
            .bind(&event.event_type)
            .bind(&event.event_data)
            .bind(&context_json)
            .fetch_one(&mut *tx)
            .await;

            let (id, created_at) = match inserted {
                Ok(row) => row,
                Err(e) if is_unique_violation(&e) => {
                    tx.rollback().await?;
                    let actual = Self::head_version(&self.pool, aggregate_id).await?;
                    return Err(EventStoreError::ConcurrencyConflict {
                        aggregate_id,
                        expected: expected_version,
                        actual,
                    });
                }
                Err(e) => return Err(e.into()),
            };

            stored.push(StoredEvent {
                id,
                aggregate_type: event.aggregate_type,
                aggregate_id,
                version,
                event_type: event.event_type,
                event_data: event.event_data,
                context: context_json.clone(),
                created_at,
            });
        }

        tx.commit().await?;

        tracing::info!(
            aggregate_id = %aggregate_id,
            from_version = expected_version,
            to_version = version,
            "Appended {} events",
            stored.len()
        );

        Ok(stored)
    }
}
