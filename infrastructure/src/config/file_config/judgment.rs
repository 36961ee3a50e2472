//! Judgment module configuration (`[judgment]` section)

use serde::{Deserialize, Serialize};

/// One `[[judgment.domains]]` entry: a domain evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDomainModule {
    /// Knowledge domain; the module is registered as `domain:<name>`
    pub name: String,
    #[serde(default)]
    pub knowledge: Vec<String>,
}

/// Raw `[judgment]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileJudgmentConfig {
    pub ethical: bool,
    pub common_sense: bool,
    /// Overrides the built-in ethical principles
    pub principles: Option<Vec<String>>,
    /// Overrides the built-in common-sense checks
    pub checks: Option<Vec<String>>,
    pub domains: Vec<FileDomainModule>,
}

impl Default for FileJudgmentConfig {
    fn default() -> Self {
        Self {
            ethical: true,
            common_sense: true,
            principles: None,
            checks: None,
            domains: Vec::new(),
        }
    }
}

impl FileJudgmentConfig {
    /// Module names in registration order.
    pub fn module_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        if self.ethical {
            names.push("ethical".to_string());
        }
        if self.common_sense {
            names.push("common_sense".to_string());
        }
        names.extend(self.domains.iter().map(|d| domain_module_name(&d.name)));
        names
    }
}

pub fn domain_module_name(domain: &str) -> String {
    format!("domain:{}", domain)
}
