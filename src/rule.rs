//! Rule metadata shown by `--list-rules` and `--explain`

use crate::rules::RuleId;
use serde::Serialize;

/// Descriptive information about a rule
#[derive(Debug, Clone, Serialize)]
pub struct Rule {
    /// Rule identifier
    pub id: RuleId,

    /// One-line description, also used as finding help text
    pub description: String,

    /// Rationale explaining why this rule exists
    pub rationale: Option<String>,

    /// Example of a package layout that violates this rule
    pub example_bad: Option<String>,

    /// Example of a correct package layout
    pub example_good: Option<String>,

    /// Whether findings of this rule can carry a fix
    pub fixable: bool,
}

impl Rule {
    /// Create a new rule with minimal required fields
    pub fn new(id: RuleId, description: &str) -> Self {
        Self {
            id,
            description: description.to_string(),
            rationale: None,
            example_bad: None,
            example_good: None,
            fixable: false,
        }
    }

    /// Set the rationale
    pub fn with_rationale(mut self, rationale: &str) -> Self {
        self.rationale = Some(rationale.to_string());
        self
    }

    /// Set bad example
    pub fn with_example_bad(mut self, example: &str) -> Self {
        self.example_bad = Some(example.to_string());
        self
    }

    /// Set good example
    pub fn with_example_good(mut self, example: &str) -> Self {
        self.example_good = Some(example.to_string());
        self
    }

    /// Mark the rule as able to propose fixes
    pub fn fixable(mut self) -> Self {
        self.fixable = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_builder() {
        let rule = Rule::new(RuleId::MtlDiffuse, "Diffuse must be 0.8")
            .with_rationale("Consistent shading")
            .with_example_bad("Kd 0.5 0.5 0.5")
            .with_example_good("Kd 0.8 0.8 0.8")
            .fixable();

        assert_eq!(rule.id, RuleId::MtlDiffuse);
        assert!(rule.fixable);
        assert_eq!(rule.example_good.as_deref(), Some("Kd 0.8 0.8 0.8"));
    }

    #[test]
    fn test_rule_defaults() {
        let rule = Rule::new(RuleId::FolderStructure, "Layout");
        assert!(!rule.fixable);
        assert!(rule.rationale.is_none());
    }
}
