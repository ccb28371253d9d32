use serde::{Deserialize, Serialize};

use crate::model::apperror::{ApplicationError, BusinessRule, ErrorType};

/**
 * Lifecycle status of a reference.
 *
 * pending -> contacted -> business done | rejected
 *
 * `converted` is a legacy wire alias for business done and is accepted on
 * input only. Business done and rejected are terminal.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceStatus {
    Pending,
    Contacted,
    #[serde(alias = "converted")]
    BusinessDone,
    Rejected,
}

impl ReferenceStatus {
    /**
     * Parses a stored status string.
     */
    pub fn parse(value: &str) -> Result<Self, ApplicationError> {
        match value {
            "pending" => Ok(ReferenceStatus::Pending),
            "contacted" => Ok(ReferenceStatus::Contacted),
            "business_done" | "converted" => Ok(ReferenceStatus::BusinessDone),
            "rejected" => Ok(ReferenceStatus::Rejected),
            other => Err(ApplicationError::new(ErrorType::Application, format!("Unknown reference status: {other}"))),
        }
    }

    /**
     * Returns the canonical stored form.
     */
    pub fn as_str(self) -> &'static str {
        match self {
            ReferenceStatus::Pending => "pending",
            ReferenceStatus::Contacted => "contacted",
            ReferenceStatus::BusinessDone => "business_done",
            ReferenceStatus::Rejected => "rejected",
        }
    }

    /**
     * Whether no further transition is allowed from this status.
     */
    pub fn is_terminal(self) -> bool {
        matches!(self, ReferenceStatus::BusinessDone | ReferenceStatus::Rejected)
    }

    /**
     * Checks a requested transition, the backend being the sole authority on
     * what is allowed.
     *
     * # Arguments
     * `next`: The requested target status.
     *
     * # Returns
     * Ok when the transition is allowed, otherwise a status-locked
     * business-rule error.
     */
    pub fn check_transition(self, next: ReferenceStatus) -> Result<(), ApplicationError> {
        let allowed = match self {
            ReferenceStatus::Pending => matches!(next, ReferenceStatus::Contacted | ReferenceStatus::BusinessDone | ReferenceStatus::Rejected),
            ReferenceStatus::Contacted => matches!(next, ReferenceStatus::BusinessDone | ReferenceStatus::Rejected),
            ReferenceStatus::BusinessDone | ReferenceStatus::Rejected => false,
        };
        if allowed {
            Ok(())
        } else {
            Err(ApplicationError::new(
                ErrorType::BusinessRule(BusinessRule::StatusLocked),
                format!("Status cannot change from {} to {}", self.as_str(), next.as_str()),
            ))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_forward_transitions_allowed() {
        assert!(ReferenceStatus::Pending.check_transition(ReferenceStatus::Contacted).is_ok());
        assert!(ReferenceStatus::Pending.check_transition(ReferenceStatus::BusinessDone).is_ok());
        assert!(ReferenceStatus::Contacted.check_transition(ReferenceStatus::Rejected).is_ok());
        assert!(ReferenceStatus::Contacted.check_transition(ReferenceStatus::BusinessDone).is_ok());
    }

    #[test]
    fn test_terminal_states_locked() {
        assert!(ReferenceStatus::BusinessDone.check_transition(ReferenceStatus::Pending).is_err());
        assert!(ReferenceStatus::Rejected.check_transition(ReferenceStatus::Contacted).is_err());
        assert!(ReferenceStatus::BusinessDone.is_terminal());
        assert!(ReferenceStatus::Rejected.is_terminal());
        assert!(!ReferenceStatus::Pending.is_terminal());
    }

    #[test]
    fn test_backwards_transition_rejected() {
        let error = ReferenceStatus::Contacted.check_transition(ReferenceStatus::Pending).unwrap_err();
        assert_eq!(error.error_type, ErrorType::BusinessRule(BusinessRule::StatusLocked));
    }

    #[test]
    fn test_legacy_converted_alias() {
        assert_eq!(ReferenceStatus::parse("converted").unwrap(), ReferenceStatus::BusinessDone);
        let parsed: ReferenceStatus = serde_json::from_str("\"converted\"").unwrap();
        assert_eq!(parsed, ReferenceStatus::BusinessDone);
        // Canonical form is what gets stored and serialized.
        assert_eq!(serde_json::to_string(&ReferenceStatus::BusinessDone).unwrap(), "\"business_done\"");
    }

    #[test]
    fn test_parse_round_trip() {
        for status in [ReferenceStatus::Pending, ReferenceStatus::Contacted, ReferenceStatus::BusinessDone, ReferenceStatus::Rejected] {
            assert_eq!(ReferenceStatus::parse(status.as_str()).unwrap(), status);
        }
    }
}
