//! Conventional commit messages: structure, parsing, formatting, validation.
//!
//! [`parse`] and [`format`] are inverses for well-formed [`MessageParts`]:
//! `parse(&format(&parts).message) == Ok(parts)`.

pub mod format;
pub mod parser;
pub mod validate;

use std::fmt;
use std::str::FromStr;

pub use format::{FormattedMessage, MAX_BODY_LINE_LENGTH, MAX_DESCRIPTION_LENGTH, format};
pub use parser::{ParsedResponse, parse, parse_message, parse_or_fallback};
pub use validate::{ValidationReport, Violation, validate};

/// Conventional commit types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommitType {
    Feat,
    Fix,
    Docs,
    Style,
    Refactor,
    Perf,
    Test,
    Build,
    Ci,
    Chore,
}

impl CommitType {
    pub const ALL: [CommitType; 10] = [
        CommitType::Feat,
        CommitType::Fix,
        CommitType::Docs,
        CommitType::Style,
        CommitType::Refactor,
        CommitType::Perf,
        CommitType::Test,
        CommitType::Build,
        CommitType::Ci,
        CommitType::Chore,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommitType::Feat => "feat",
            CommitType::Fix => "fix",
            CommitType::Docs => "docs",
            CommitType::Style => "style",
            CommitType::Refactor => "refactor",
            CommitType::Perf => "perf",
            CommitType::Test => "test",
            CommitType::Build => "build",
            CommitType::Ci => "ci",
            CommitType::Chore => "chore",
        }
    }
}

impl FromStr for CommitType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "feat" => Ok(Self::Feat),
            "fix" => Ok(Self::Fix),
            "docs" => Ok(Self::Docs),
            "style" => Ok(Self::Style),
            "refactor" => Ok(Self::Refactor),
            "perf" => Ok(Self::Perf),
            "test" => Ok(Self::Test),
            "build" => Ok(Self::Build),
            "ci" => Ok(Self::Ci),
            "chore" => Ok(Self::Chore),
            _ => Err(format!("Unknown commit type: {}", s)),
        }
    }
}

impl fmt::Display for CommitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured decomposition of a commit message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageParts {
    pub commit_type: CommitType,
    pub scope: Option<String>,
    /// Imperative sentence fragment after `type(scope): `.
    pub description: String,
    pub body: Option<String>,
    /// Trailing `Token: value` / `Token #value` lines.
    pub footer: Option<String>,
    /// Set by a `!` before the colon or a `BREAKING CHANGE:` line.
    pub breaking: bool,
}

impl MessageParts {
    pub fn new(commit_type: CommitType, description: impl Into<String>) -> Self {
        Self {
            commit_type,
            scope: None,
            description: description.into(),
            body: None,
            footer: None,
            breaking: false,
        }
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    pub fn with_breaking(mut self, breaking: bool) -> Self {
        self.breaking = breaking;
        self
    }
}
