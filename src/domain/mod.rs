//! Domain module
//!
//! Event catalog, external records and the pure rules around them.

pub mod context;
pub mod error;
pub mod events;
pub mod identity;
pub mod records;
pub mod subscription;

pub use context::OperationContext;
pub use error::MembershipError;
pub use events::MembershipEvent;
pub use identity::derive_identity;
pub use records::{
    CardUpdateOutcome, CardUpdateRequest, CardUpdateType, CustomerRecord, MetaDataEntry,
    SubscriptionRecord, ACCESS_CARD_META_KEY,
};
pub use subscription::{transition_for, StatusTransition};
