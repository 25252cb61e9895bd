//! Error handling module
//!
//! Centralized error type for callers of the crate.

use crate::config::ConfigError;
use crate::domain::MembershipError;
use crate::event_store::EventStoreError;
use crate::projection::ProjectionError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Command rejected by the membership aggregate
    #[error(transparent)]
    Membership(#[from] MembershipError),

    #[error(transparent)]
    EventStore(#[from] EventStoreError),

    #[error(transparent)]
    Projection(#[from] ProjectionError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl AppError {
    /// Whether running the same command again may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::EventStore(e) => e.is_retryable(),
            AppError::Database(_) => true,
            AppError::Projection(ProjectionError::Database(_)) => true,
            _ => false,
        }
    }
}
