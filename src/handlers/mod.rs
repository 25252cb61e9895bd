//! Command Handlers module
//!
//! Command callers that load a member's aggregate, run a command and
//! persist the recorded events.

mod commands;
mod locks;
mod membership_handler;


pub use commands::{CommandOutcome, MembershipCommand};
pub use locks::IdentityLocks;
pub use membership_handler::{decode_events, MembershipHandler, DEFAULT_MAX_RETRIES};
