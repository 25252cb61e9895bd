//! Aggregate module
//!
//! Aggregate Root pattern implementation for Event Sourcing.

pub mod membership;

pub use membership::Membership;

/// Aggregate trait that all aggregates must implement
pub trait Aggregate: Sized + Default {
    /// The type of events this aggregate handles
    type Event;

    /// Get the aggregate type name (for storage)
    fn aggregate_type() -> &'static str;

    /// Get the aggregate ID
    fn id(&self) -> uuid::Uuid;

    /// Get the current version (number of events applied)
    fn version(&self) -> i64;

    /// Apply an event to update the aggregate state.
    ///
    /// Must depend only on the current state and the event itself.
    fn apply(self, event: Self::Event) -> Self;

    /// Apply a history of events in order
    fn replay<I>(self, events: I) -> Self
    where
        I: IntoIterator<Item = Self::Event>,
    {
        events.into_iter().fold(self, Self::apply)
    }
}
