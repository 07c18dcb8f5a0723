//! Typed representation of staged changes.
//!
//! A [`DiffSummary`] is built once per run from the unified diff text that
//! the version-control collaborator hands over, and is never mutated
//! afterwards: all totals are derived in the constructor.

pub mod language;
pub mod parser;
pub mod paths;

use std::collections::BTreeSet;
use std::fmt;

pub use language::detect_language;
pub use parser::parse_diff;
pub use paths::{infer_scope, is_doc_path, is_source_path, is_test_path};

/// Placeholder content recorded for binary files.
pub const BINARY_CONTENT: &str = "[Binary file]";

/// How a single path changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
    Renamed,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Added => "added",
            ChangeKind::Modified => "modified",
            ChangeKind::Deleted => "deleted",
            ChangeKind::Renamed => "renamed",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One modified path with its hunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    path: String,
    old_path: Option<String>,
    kind: ChangeKind,
    additions: usize,
    deletions: usize,
    language: Option<&'static str>,
    diff_content: String,
}

impl FileChange {
    /// Create a file change. The language is inferred from `path`.
    pub fn new(
        path: impl Into<String>,
        kind: ChangeKind,
        additions: usize,
        deletions: usize,
        diff_content: impl Into<String>,
    ) -> Self {
        let path = path.into();
        let language = detect_language(&path);
        Self {
            path,
            old_path: None,
            kind,
            additions,
            deletions,
            language,
            diff_content: diff_content.into(),
        }
    }

    /// Create a file change whose counts are taken from its hunk lines.
    pub fn from_hunks(path: impl Into<String>, kind: ChangeKind, diff_content: impl Into<String>) -> Self {
        let diff_content = diff_content.into();
        let (additions, deletions) = count_changed_lines(&diff_content);
        Self::new(path, kind, additions, deletions, diff_content)
    }

    /// Record the previous path of a renamed file.
    pub fn with_old_path(mut self, old_path: impl Into<String>) -> Self {
        self.old_path = Some(old_path.into());
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn old_path(&self) -> Option<&str> {
        self.old_path.as_deref()
    }

    pub fn kind(&self) -> ChangeKind {
        self.kind
    }

    pub fn additions(&self) -> usize {
        self.additions
    }

    pub fn deletions(&self) -> usize {
        self.deletions
    }

    /// Additions plus deletions.
    pub fn changed_lines(&self) -> usize {
        self.additions + self.deletions
    }

    pub fn language(&self) -> Option<&'static str> {
        self.language
    }

    /// Raw hunk text, starting at the first `@@` header.
    pub fn diff_content(&self) -> &str {
        &self.diff_content
    }

    pub fn is_binary(&self) -> bool {
        self.diff_content == BINARY_CONTENT
    }

    /// Added lines without their `+` marker.
    pub fn added_lines(&self) -> impl Iterator<Item = &str> {
        hunk_body(&self.diff_content).filter_map(|l| l.strip_prefix('+'))
    }

    /// Removed lines without their `-` marker.
    pub fn removed_lines(&self) -> impl Iterator<Item = &str> {
        hunk_body(&self.diff_content).filter_map(|l| l.strip_prefix('-'))
    }
}

/// Lines inside hunks, without the `@@` headers themselves.
///
/// Text with no `@@` header is treated as a single hunk, minus any
/// `+++`/`---` file header lines.
fn hunk_body(content: &str) -> impl Iterator<Item = &str> {
    let has_hunks = content.lines().any(|l| l.starts_with("@@"));
    let mut in_hunk = !has_hunks;
    content.lines().filter(move |line| {
        if line.starts_with("@@") {
            in_hunk = true;
            return false;
        }
        if !has_hunks && (line.starts_with("+++") || line.starts_with("---")) {
            return false;
        }
        in_hunk
    })
}

/// Count `+`/`-` lines in hunk text.
pub fn count_changed_lines(diff_content: &str) -> (usize, usize) {
    let mut additions = 0;
    let mut deletions = 0;
    for line in hunk_body(diff_content) {
        if line.starts_with('+') {
            additions += 1;
        } else if line.starts_with('-') {
            deletions += 1;
        }
    }
    (additions, deletions)
}

/// Aggregate over an ordered set of file changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffSummary {
    files: Vec<FileChange>,
    total_additions: usize,
    total_deletions: usize,
    languages: BTreeSet<&'static str>,
}

impl DiffSummary {
    /// Build a summary, preserving the order of `files`.
    pub fn new(files: Vec<FileChange>) -> Self {
        let total_additions = files.iter().map(FileChange::additions).sum();
        let total_deletions = files.iter().map(FileChange::deletions).sum();
        let languages = files.iter().filter_map(FileChange::language).collect();
        Self {
            files,
            total_additions,
            total_deletions,
            languages,
        }
    }

    pub fn files(&self) -> &[FileChange] {
        &self.files
    }

    pub fn total_files(&self) -> usize {
        self.files.len()
    }

    pub fn total_additions(&self) -> usize {
        self.total_additions
    }

    pub fn total_deletions(&self) -> usize {
        self.total_deletions
    }

    pub fn total_changes(&self) -> usize {
        self.total_additions + self.total_deletions
    }

    /// Distinct languages, sorted by name.
    pub fn languages(&self) -> &BTreeSet<&'static str> {
        &self.languages
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FromIterator<FileChange> for DiffSummary {
    fn from_iter<I: IntoIterator<Item = FileChange>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_kind_display() {
        assert_eq!(ChangeKind::Added.to_string(), "added");
        assert_eq!(ChangeKind::Modified.to_string(), "modified");
        assert_eq!(ChangeKind::Deleted.to_string(), "deleted");
        assert_eq!(ChangeKind::Renamed.to_string(), "renamed");
    }

    #[test]
    fn test_summary_totals_are_derived() {
        let summary = DiffSummary::new(vec![
            FileChange::new("src/main.rs", ChangeKind::Modified, 10, 2, ""),
            FileChange::new("README.md", ChangeKind::Modified, 3, 1, ""),
            FileChange::new("src/lib.rs", ChangeKind::Added, 5, 0, ""),
        ]);

        assert_eq!(summary.total_files(), 3);
        assert_eq!(summary.total_additions(), 18);
        assert_eq!(summary.total_deletions(), 3);
        assert_eq!(summary.total_changes(), 21);
        let languages: Vec<_> = summary.languages().iter().copied().collect();
        assert_eq!(languages, vec!["Markdown", "Rust"]);
    }

    #[test]
    fn test_summary_preserves_order() {
        let summary: DiffSummary = ["b.rs", "a.rs", "c.rs"]
            .iter()
            .map(|p| FileChange::new(*p, ChangeKind::Modified, 1, 1, ""))
            .collect();
        let paths: Vec<_> = summary.files().iter().map(FileChange::path).collect();
        assert_eq!(paths, vec!["b.rs", "a.rs", "c.rs"]);
    }

    #[test]
    fn test_empty_summary() {
        let summary = DiffSummary::default();
        assert!(summary.is_empty());
        assert_eq!(summary.total_files(), 0);
        assert_eq!(summary.total_changes(), 0);
    }

    #[test]
    fn test_from_hunks_counts_lines() {
        let hunk = "@@ -1,3 +1,4 @@\n context\n-old\n+new\n+another\n";
        let change = FileChange::from_hunks("a.py", ChangeKind::Modified, hunk);
        assert_eq!(change.additions(), 2);
        assert_eq!(change.deletions(), 1);
        assert_eq!(change.language(), Some("Python"));
        assert_eq!(change.added_lines().collect::<Vec<_>>(), vec!["new", "another"]);
        assert_eq!(change.removed_lines().collect::<Vec<_>>(), vec!["old"]);
    }

    #[test]
    fn test_binary_marker() {
        let change = FileChange::new("logo.png", ChangeKind::Added, 0, 0, BINARY_CONTENT);
        assert!(change.is_binary());
        assert_eq!(change.changed_lines(), 0);
    }
}
