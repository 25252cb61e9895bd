//! Projection Service
//!
//! Keeps the `card_update_requests` read model in step with the membership
//! stream. Card readers pick up pending rows and report back through
//! `Membership::update_card_status`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{CardUpdateOutcome, CardUpdateRequest};
use crate::event_store::{EventStoreError, StoredEvent};

use super::card_requests::{card_requests, PendingCardRequest};

/// Projection Service for the card request read model
#[derive(Debug, Clone)]
pub struct ProjectionService {
    pool: PgPool,
}

impl ProjectionService {
    /// Create a new ProjectionService
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a pending request for every sent-for-(de)activation event.
    ///
    /// Safe to call again with the same events. Returns the rows inserted.
    pub async fn record_card_requests(
        &self,
        events: &[StoredEvent],
    ) -> Result<u64, ProjectionError> {
        let requests = card_requests(events)?;
        if requests.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for pending in &requests {
            let result = sqlx::query(
                r#"
                INSERT INTO card_update_requests (
                    event_id, aggregate_id, customer_id, card, type, status
                )
                VALUES ($1, $2, $3, $4, $5, 'pending')
                ON CONFLICT (event_id) DO NOTHING
                "#,
            )
            .bind(pending.event_id)
            .bind(pending.aggregate_id)
            .bind(&pending.request.customer_id)
            .bind(&pending.request.card)
            .bind(&pending.request.request_type)
            .execute(&mut *tx)
            .await?;

            inserted += result.rows_affected();
        }

        tx.commit().await?;

        tracing::debug!(
            requests = requests.len(),
            inserted,
            "Card update requests projected"
        );

        Ok(inserted)
    }

    /// Oldest pending requests first
    pub async fn pending_requests(
        &self,
        limit: i64,
    ) -> Result<Vec<PendingCardRequest>, ProjectionError> {
        let rows: Vec<(Uuid, Uuid, String, String, String)> = sqlx::query_as(
            r#"
            SELECT event_id, aggregate_id, customer_id, card, type
            FROM card_update_requests
            WHERE status = 'pending'
            ORDER BY created_at ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(event_id, aggregate_id, customer_id, card, request_type)| PendingCardRequest {
                    event_id,
                    aggregate_id,
                    request: CardUpdateRequest::new(request_type, customer_id, card),
                },
            )
            .collect())
    }

    /// Mark a request done or failed. Returns false if it wasn't pending.
    pub async fn complete_request(
        &self,
        event_id: Uuid,
        outcome: CardUpdateOutcome,
    ) -> Result<bool, ProjectionError> {
        let status = match outcome {
            CardUpdateOutcome::Success => "success",
            CardUpdateOutcome::Failure => "failure",
        };

        let completed_at: DateTime<Utc> = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE card_update_requests
            SET status = $2, completed_at = $3
            WHERE event_id = $1 AND status = 'pending'
            "#,
        )
        .bind(event_id)
        .bind(status)
        .bind(completed_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

/// Projection errors
#[derive(Debug, thiserror::Error)]
pub enum ProjectionError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Events(#[from] EventStoreError),
}
