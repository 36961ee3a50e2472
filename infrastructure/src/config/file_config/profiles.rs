//! Action profiles (`[[profiles]]` entries)

use mindloop_domain::{ActionProfile, ActionType, ProfileCatalog};
use serde::{Deserialize, Serialize};

/// A named set of permitted actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileProfileConfig {
    pub name: String,
    pub permitted: Vec<String>,
}

impl FileProfileConfig {
    /// Parse the permitted actions; unknown names come back in the second
    /// element.
    pub fn parse_permitted(&self) -> (Vec<ActionType>, Vec<String>) {
        let mut actions = Vec::new();
        let mut unknown = Vec::new();
        for name in &self.permitted {
            match name.parse::<ActionType>() {
                Ok(action) => actions.push(action),
                Err(_) => unknown.push(name.clone()),
            }
        }
        (actions, unknown)
    }
}

/// The built-in catalog extended (or overridden) by configured profiles.
pub fn to_profile_catalog(profiles: &[FileProfileConfig]) -> ProfileCatalog {
    profiles.iter().fold(ProfileCatalog::new(), |catalog, profile| {
        catalog.with_profile(ActionProfile::new(&profile.name, profile.parse_permitted().0))
    })
}
