//! Task priority on a 0..=10 scale.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Priority of a task (and of every thought derived from it).
///
/// Higher is more urgent. Low-activity and idle-reflection modes only admit
/// work at or above their configured threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Priority(u8);

impl Priority {
    pub const MIN: Priority = Priority(0);
    pub const NORMAL: Priority = Priority(5);
    pub const MAX: Priority = Priority(10);

    /// Create a priority, rejecting values above 10.
    pub fn new(value: u8) -> Result<Self, DomainError> {
        if value > Self::MAX.0 {
            return Err(DomainError::InvalidPriority(value));
        }
        Ok(Self(value))
    }

    /// Create a priority, clamping values above 10.
    pub fn saturating(value: u8) -> Self {
        Self(value.min(Self::MAX.0))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl TryFrom<u8> for Priority {
    type Error = DomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Priority> for u8 {
    fn from(p: Priority) -> Self {
        p.0
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_out_of_range() {
        assert!(Priority::new(10).is_ok());
        assert_eq!(Priority::new(11), Err(DomainError::InvalidPriority(11)));
    }

    #[test]
    fn test_saturating() {
        assert_eq!(Priority::saturating(200), Priority::MAX);
        assert_eq!(Priority::saturating(3).value(), 3);
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Priority = serde_json::from_str("8").unwrap();
        assert_eq!(ok.value(), 8);
        assert!(serde_json::from_str::<Priority>("42").is_err());
    }
}
