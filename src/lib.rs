//! membership_sync
//!
//! Event-sourced membership aggregate for a storefront: access cards,
//! subscription status and the card reader activation lifecycle.

pub mod aggregate;
pub mod config;
pub mod db;
pub mod domain;
pub mod event_store;
pub mod handlers;
pub mod projection;
pub mod telemetry;

mod error;

pub use aggregate::{Aggregate, Membership};
pub use config::Config;
pub use domain::{
    derive_identity, CardUpdateOutcome, CardUpdateRequest, CustomerRecord, MembershipError,
    MembershipEvent, OperationContext, SubscriptionRecord,
};
pub use error::{AppError, AppResult};
pub use event_store::{EventLog, EventStore, EventStoreError, InMemoryEventStore};
pub use handlers::{CommandOutcome, MembershipCommand, MembershipHandler};
pub use projection::{ProjectionError, ProjectionService};
