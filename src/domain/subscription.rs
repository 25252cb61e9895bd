//! Subscription Status Transitions
//!
//! Subscription status is an open set of vendor strings. Only transitions
//! listed in [`TRANSITIONS`] have an effect on the membership; every other
//! change is just recorded.

pub const STATUS_ON_HOLD: &str = "on-hold";
pub const STATUS_ACTIVE: &str = "active";

/// Side effect triggered by a status transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTransition {
    /// Member becomes active and pending cards go out for activation
    ActivateMembership,
}

/// (from, to, effect)
// TODO: add rows for cancelled/expired/pending-cancel once we have seen how
// the storefront reports those transitions.
const TRANSITIONS: &[(&str, &str, StatusTransition)] = &[(
    STATUS_ON_HOLD,
    STATUS_ACTIVE,
    StatusTransition::ActivateMembership,
)];

/// Look up the effect of moving from `old` to `new`
pub fn transition_for(old: &str, new: &str) -> Option<StatusTransition> {
    TRANSITIONS
        .iter()
        .find(|(from, to, _)| *from == old && *to == new)
        .map(|(_, _, effect)| *effect)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_on_hold_to_active_activates() {
        assert_eq!(
            transition_for("on-hold", "active"),
            Some(StatusTransition::ActivateMembership)
        );
    }

    #[test]
    fn test_other_transitions_have_no_effect() {
        assert_eq!(transition_for("active", "on-hold"), None);
        assert_eq!(transition_for("on-hold", "on-hold"), None);
        assert_eq!(transition_for("active", "active"), None);
        assert_eq!(transition_for("pending", "active"), None);
        assert_eq!(transition_for("on-hold", "cancelled"), None);
    }
}
