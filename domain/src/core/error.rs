//! Domain error types

use crate::capability::CapabilityKind;
use crate::state::AgentState;
use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Invalid transition {from} -> {to}: {reason}")]
    InvalidTransition {
        from: AgentState,
        to: AgentState,
        reason: String,
    },

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("No available provider for capability '{0}'")]
    NoAvailableProvider(CapabilityKind),

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Priority {0} is outside 0..=10")]
    InvalidPriority(u8),

    #[error("Invariant violated: {0}")]
    InvariantViolation(String),
}

impl DomainError {
    /// Configuration errors are fatal for the thought they concern and must
    /// never be retried or coerced into a different action.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DomainError::ConfigurationError(_) | DomainError::InvariantViolation(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transition_display() {
        let error = DomainError::InvalidTransition {
            from: AgentState::Bootstrap,
            to: AgentState::Exploratory,
            reason: "no such edge".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid transition bootstrap -> exploratory: no such edge"
        );
    }

    #[test]
    fn test_is_fatal() {
        assert!(DomainError::ConfigurationError("x".into()).is_fatal());
        assert!(DomainError::InvariantViolation("x".into()).is_fatal());
        assert!(!DomainError::NoAvailableProvider(CapabilityKind::Reasoning).is_fatal());
        assert!(!DomainError::InvalidPriority(11).is_fatal());
    }
}
