//! Event Store module
//!
//! The ordered, append-only, per-aggregate event log the membership
//! aggregate is replayed from. [`EventLog`] is the boundary; [`EventStore`]
//! backs it with PostgreSQL and [`InMemoryEventStore`] with a map.

mod error;
mod memory;
mod repository;

pub use error::EventStoreError;
pub use memory::InMemoryEventStore;
pub use repository::{EventLog, EventStore, NewEvent, StoredEvent};
