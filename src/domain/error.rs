//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use thiserror::Error;

/// Errors returned by membership commands.
///
/// Events recorded before the error (the `CardStatusUpdated` fact, for
/// instance) stay in the aggregate's uncommitted buffer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MembershipError {
    /// Card readers echoed back a request type we never send
    #[error("Card update request type wasn't one of the expected values: {0}")]
    UnrecognizedRequestType(String),

    /// Card readers could not apply the request
    #[error("Card update (customer: {customer_id}, card: {card_number}, type: {request_type}) not successful")]
    CardUpdateFailed {
        customer_id: String,
        card_number: String,
        request_type: String,
    },
}

impl MembershipError {
    /// Card left waiting in a sent-for-(de)activation set
    pub fn card_number(&self) -> Option<&str> {
        match self {
            Self::CardUpdateFailed { card_number, .. } => Some(card_number),
            Self::UnrecognizedRequestType(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_update_failed_message() {
        let err = MembershipError::CardUpdateFailed {
            customer_id: "12".to_string(),
            card_number: "0042".to_string(),
            request_type: "activation".to_string(),
        };

        let message = err.to_string();
        assert!(message.contains("12"));
        assert!(message.contains("0042"));
        assert!(message.contains("activation"));
        assert_eq!(err.card_number(), Some("0042"));
    }

    #[test]
    fn test_unrecognized_request_type_message() {
        let err = MembershipError::UnrecognizedRequestType("suspend".to_string());
        assert!(err.to_string().contains("suspend"));
        assert_eq!(err.card_number(), None);
    }
}
