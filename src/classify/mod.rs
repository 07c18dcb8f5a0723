//! Change-type classification of a diff.
//!
//! Classification is an ordered list of pure rules ([`Rule::ORDER`]); the
//! first rule that produces a label wins. When no rule fires the result is
//! [`ChangeType::Unknown`] and the prompt builder falls back to its generic
//! template.

pub mod rules;

use std::fmt;

use tracing::debug;

use crate::diff::DiffSummary;

pub use rules::Rule;

/// Label assigned to a set of changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeType {
    Feature,
    Fix,
    Refactor,
    Docs,
    Style,
    Test,
    Build,
    Ci,
    Chore,
    Unknown,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Feature => "feature",
            ChangeType::Fix => "fix",
            ChangeType::Refactor => "refactor",
            ChangeType::Docs => "docs",
            ChangeType::Style => "style",
            ChangeType::Test => "test",
            ChangeType::Build => "build",
            ChangeType::Ci => "ci",
            ChangeType::Chore => "chore",
            ChangeType::Unknown => "unknown",
        }
    }

    /// Conventional commit type token suggested for this label.
    pub fn commit_token(&self) -> Option<&'static str> {
        match self {
            ChangeType::Feature => Some("feat"),
            ChangeType::Unknown => None,
            other => Some(other.as_str()),
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification result together with the rule that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub change_type: ChangeType,
    /// `None` when the summary was empty or no rule fired.
    pub rule: Option<Rule>,
}

/// Classify a diff summary. Deterministic; an empty summary is `Unknown`.
pub fn classify(summary: &DiffSummary) -> ChangeType {
    classify_detailed(summary).change_type
}

/// Classify a diff summary and report which rule decided.
pub fn classify_detailed(summary: &DiffSummary) -> Classification {
    if summary.is_empty() {
        return Classification {
            change_type: ChangeType::Unknown,
            rule: None,
        };
    }

    for rule in Rule::ORDER {
        if let Some(change_type) = rule.evaluate(summary) {
            debug!("Rule {} classified diff as {}", rule, change_type);
            return Classification {
                change_type,
                rule: Some(rule),
            };
        }
    }

    debug!("No classification rule fired");
    Classification {
        change_type: ChangeType::Unknown,
        rule: None,
    }
}
