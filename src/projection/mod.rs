//! Projection module
//!
//! Read models fed from the membership stream. Card readers poll the
//! `card_update_requests` table built here.

mod card_requests;
mod service;

pub use card_requests::{card_requests, PendingCardRequest};
pub use service::{ProjectionError, ProjectionService};
