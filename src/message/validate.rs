//! Checking a commit message against the conventional format rules.

use std::fmt;

use super::CommitType;
use super::format::{MAX_BODY_LINE_LENGTH, MAX_DESCRIPTION_LENGTH, is_capitalized};
use super::parser::{HEADER, is_footer_start};

/// One broken rule. Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// The first line is not `type(scope): description`.
    MissingHeader,
    UnknownType(String),
    TypeNotLowercase(String),
    EmptyScope,
    InvalidScope(String),
    /// Not exactly one space after the colon.
    HeaderSpacing,
    EmptyDescription,
    DescriptionCapitalized,
    DescriptionTrailingPeriod,
    DescriptionTooLong { length: usize },
    MissingBlankLineAfterHeader,
    BodyLineTooLong { line: usize, length: usize },
    ConsecutiveBlankLines { line: usize },
    TrailingWhitespace { line: usize },
}

impl Violation {
    /// Whether re-formatting fixes this without changing what the message says.
    pub fn is_mechanical(&self) -> bool {
        !matches!(
            self,
            Violation::MissingHeader | Violation::UnknownType(_) | Violation::EmptyDescription
        )
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::MissingHeader => {
                write!(f, "first line is not a conventional header 'type(scope): description'")
            }
            Violation::UnknownType(t) => write!(f, "unknown commit type '{}'", t),
            Violation::TypeNotLowercase(t) => write!(f, "commit type '{}' should be lowercase", t),
            Violation::EmptyScope => write!(f, "scope is empty"),
            Violation::InvalidScope(s) => {
                write!(f, "scope '{}' contains whitespace or parentheses", s)
            }
            Violation::HeaderSpacing => write!(f, "expected exactly one space after the colon"),
            Violation::EmptyDescription => write!(f, "description is empty"),
            Violation::DescriptionCapitalized => {
                write!(f, "description should start with a lowercase letter")
            }
            Violation::DescriptionTrailingPeriod => write!(f, "description ends with a period"),
            Violation::DescriptionTooLong { length } => write!(
                f,
                "description is {} characters (max {})",
                length, MAX_DESCRIPTION_LENGTH
            ),
            Violation::MissingBlankLineAfterHeader => {
                write!(f, "expected a blank line after the header")
            }
            Violation::BodyLineTooLong { line, length } => write!(
                f,
                "line {} is {} characters (max {})",
                line, length, MAX_BODY_LINE_LENGTH
            ),
            Violation::ConsecutiveBlankLines { line } => {
                write!(f, "line {} repeats a blank line", line)
            }
            Violation::TrailingWhitespace { line } => {
                write!(f, "line {} has trailing whitespace", line)
            }
        }
    }
}

/// All violations found in a message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Violations that re-formatting cannot repair.
    pub fn non_mechanical(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| !v.is_mechanical())
    }
}

/// Check `message`, reporting every violation.
pub fn validate(message: &str) -> ValidationReport {
    let mut violations = Vec::new();
    let lines: Vec<&str> = message.split('\n').collect();
    let header = lines.first().copied().unwrap_or_default();

    check_header(header, &mut violations);

    if lines.get(1).is_some_and(|l| !l.trim().is_empty()) {
        violations.push(Violation::MissingBlankLineAfterHeader);
    }

    for (idx, line) in lines.iter().enumerate() {
        let line_no = idx + 1;
        if line.ends_with(char::is_whitespace) {
            violations.push(Violation::TrailingWhitespace { line: line_no });
        }
        if idx > 0 && line.trim().is_empty() && lines[idx - 1].trim().is_empty() {
            violations.push(Violation::ConsecutiveBlankLines { line: line_no });
        }
    }
    if lines.len() > 1 && lines.last().is_some_and(|l| l.is_empty()) {
        violations.push(Violation::TrailingWhitespace { line: lines.len() });
    }

    check_body_lengths(&lines, &mut violations);

    ValidationReport { violations }
}

fn check_header(header: &str, violations: &mut Vec<Violation>) {
    let Some(captures) = HEADER.captures(header) else {
        violations.push(Violation::MissingHeader);
        return;
    };

    let commit_type = &captures["type"];
    if commit_type.parse::<CommitType>().is_err() {
        violations.push(Violation::UnknownType(commit_type.to_string()));
    } else if commit_type.chars().any(|c| c.is_uppercase()) {
        violations.push(Violation::TypeNotLowercase(commit_type.to_string()));
    }

    if let Some(scope) = captures.name("scope").map(|m| m.as_str()) {
        if scope.trim().is_empty() {
            violations.push(Violation::EmptyScope);
        } else if scope.contains(|c: char| c.is_whitespace() || c == '(' || c == ')') {
            violations.push(Violation::InvalidScope(scope.to_string()));
        }
    }

    let description = &captures["desc"];
    if description.trim().is_empty() {
        violations.push(Violation::EmptyDescription);
        return;
    }
    if &captures["space"] != " " {
        violations.push(Violation::HeaderSpacing);
    }

    let description = description.trim();
    if is_capitalized(description) {
        violations.push(Violation::DescriptionCapitalized);
    }
    if description.ends_with('.') {
        violations.push(Violation::DescriptionTrailingPeriod);
    }
    let length = description.chars().count();
    if length > MAX_DESCRIPTION_LENGTH {
        violations.push(Violation::DescriptionTooLong { length });
    }
}

/// Body lines over the limit, skipping the trailer block and single
/// unbreakable words.
fn check_body_lengths(lines: &[&str], violations: &mut Vec<Violation>) {
    if lines.len() < 2 {
        return;
    }
    let rest = &lines[1..];
    let footer_start = rest
        .iter()
        .rposition(|l| !l.trim().is_empty())
        .map(|end| {
            rest[..end]
                .iter()
                .rposition(|l| l.trim().is_empty())
                .map_or(0, |blank| blank + 1)
        })
        .filter(|&start| is_footer_start(rest[start]))
        .unwrap_or(rest.len());

    for (idx, line) in rest[..footer_start].iter().enumerate() {
        let length = line.chars().count();
        if length > MAX_BODY_LINE_LENGTH && line.trim().contains(char::is_whitespace) {
            violations.push(Violation::BodyLineTooLong {
                line: idx + 2,
                length,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{MessageParts, format};

    #[test]
    fn test_valid_message() {
        let report = validate("feat(auth): add login guard\n\nGuards the login route.\n\nCloses #7");
        assert!(report.is_valid(), "{:?}", report.violations);
    }

    #[test]
    fn test_reports_all_header_violations() {
        let report = validate("Feat(user auth):  Add login guard.");
        assert_eq!(
            report.violations,
            vec![
                Violation::TypeNotLowercase("Feat".to_string()),
                Violation::InvalidScope("user auth".to_string()),
                Violation::HeaderSpacing,
                Violation::DescriptionCapitalized,
                Violation::DescriptionTrailingPeriod,
            ]
        );
        assert!(report.violations.iter().all(Violation::is_mechanical));
    }

    #[test]
    fn test_non_mechanical_violations() {
        let report = validate("added a login guard");
        assert_eq!(report.violations, vec![Violation::MissingHeader]);
        assert_eq!(report.non_mechanical().count(), 1);

        let report = validate("feature: add login guard");
        assert_eq!(report.violations, vec![Violation::UnknownType("feature".to_string())]);

        let report = validate("fix(api):");
        assert_eq!(report.violations, vec![Violation::EmptyDescription]);
        assert!(!report.violations[0].is_mechanical());
    }

    #[test]
    fn test_empty_scope() {
        let report = validate("fix(): handle it");
        assert_eq!(report.violations, vec![Violation::EmptyScope]);
    }

    #[test]
    fn test_acronym_may_stay_capitalised() {
        assert!(validate("docs: README covers install").is_valid());
        assert!(!validate("docs: Readme covers install").is_valid());
    }

    #[test]
    fn test_description_too_long() {
        let message = format!("feat: {}", "word ".repeat(15).trim_end());
        let report = validate(&message);
        assert_eq!(report.violations, vec![Violation::DescriptionTooLong { length: 74 }]);
    }

    #[test]
    fn test_layout_violations() {
        let report = validate("fix: x\nbody right away\n\n\nmore  \n");
        assert_eq!(
            report.violations,
            vec![
                Violation::MissingBlankLineAfterHeader,
                Violation::ConsecutiveBlankLines { line: 4 },
                Violation::TrailingWhitespace { line: 5 },
                Violation::TrailingWhitespace { line: 6 },
            ]
        );
    }

    #[test]
    fn test_body_line_length() {
        let long_line = "word ".repeat(25);
        let long_line = long_line.trim_end();
        let message = format!("fix: x\n\n{}", long_line);
        assert_eq!(
            validate(&message).violations,
            vec![Violation::BodyLineTooLong { line: 3, length: 124 }]
        );

        let url = format!("https://example.com/{}", "a".repeat(120));
        assert!(validate(&format!("fix: x\n\nSee\n{}", url)).is_valid());
    }

    #[test]
    fn test_long_trailer_is_not_a_body_violation() {
        let trailer = format!("Co-authored-by: {}", "name ".repeat(25).trim_end());
        assert!(validate(&format!("fix: x\n\nBody.\n\n{}", trailer)).is_valid());
    }

    #[test]
    fn test_formatted_messages_are_valid() {
        let samples = [
            MessageParts::new(super::CommitType::Feat, "Add a login guard."),
            MessageParts::new(super::CommitType::Fix, "")
                .with_scope("user auth")
                .with_body("A body line\n\n\n\nwith gaps   ")
                .with_footer("Fixes #1"),
            MessageParts::new(super::CommitType::Refactor, "x".repeat(200))
                .with_breaking(true)
                .with_body("long ".repeat(80)),
            MessageParts::new(super::CommitType::Chore, "...").with_scope("()"),
        ];
        for parts in samples {
            let formatted = format(&parts);
            let report = validate(&formatted.message);
            assert!(report.is_valid(), "{:?} -> {:?}", formatted.message, report.violations);
        }
    }
}
