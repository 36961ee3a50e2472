//! Permitted-action profiles.
//!
//! Every task names a profile; a decision whose action is outside that
//! profile's permitted set is a configuration error. It is never retried
//! and never substituted with a different action.

use super::decision::ActionType;
use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// A named set of permitted actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionProfile {
    pub name: String,
    pub permitted: BTreeSet<ActionType>,
}

impl ActionProfile {
    pub fn new(name: impl Into<String>, permitted: impl IntoIterator<Item = ActionType>) -> Self {
        Self {
            name: name.into(),
            permitted: permitted.into_iter().collect(),
        }
    }

    /// A profile permitting all ten actions.
    pub fn unrestricted(name: impl Into<String>) -> Self {
        Self::new(name, ActionType::ALL)
    }

    pub fn permits(&self, action: ActionType) -> bool {
        self.permitted.contains(&action)
    }
}

/// Lookup of profiles by name.
#[derive(Debug, Clone)]
pub struct ProfileCatalog {
    profiles: HashMap<String, ActionProfile>,
}

impl ProfileCatalog {
    /// Catalog containing only the unrestricted `default` profile.
    pub fn new() -> Self {
        let mut profiles = HashMap::new();
        profiles.insert(
            crate::task::Task::DEFAULT_PROFILE.to_string(),
            ActionProfile::unrestricted(crate::task::Task::DEFAULT_PROFILE),
        );
        Self { profiles }
    }

    /// Add or replace a profile.
    pub fn with_profile(mut self, profile: ActionProfile) -> Self {
        self.profiles.insert(profile.name.clone(), profile);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ActionProfile> {
        self.profiles.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.profiles.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Verify that `action` is permitted for the named profile.
    pub fn check(&self, profile: &str, action: ActionType) -> Result<(), DomainError> {
        let Some(found) = self.profiles.get(profile) else {
            return Err(DomainError::ConfigurationError(format!(
                "unknown action profile '{}'",
                profile
            )));
        };
        if found.permits(action) {
            Ok(())
        } else {
            Err(DomainError::ConfigurationError(format!(
                "action '{}' is not permitted by profile '{}'",
                action, profile
            )))
        }
    }
}

impl Default for ProfileCatalog {
    fn default() -> Self {
        Self::new()
    }
}
