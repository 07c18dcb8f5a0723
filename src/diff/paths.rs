//! Path heuristics: test files, documentation, source code and scope inference.

use std::collections::HashMap;

use super::language::{LanguageCategory, language_category};
use super::DiffSummary;

/// Directory names that mark test code.
const TEST_DIRS: &[&str] = &["test", "tests", "__tests__", "spec", "specs"];

/// Directory names that mark documentation.
const DOC_DIRS: &[&str] = &["doc", "docs"];

/// Extensions treated as documentation.
const DOC_EXTENSIONS: &[&str] = &["md", "markdown", "rst", "adoc", "txt"];

/// Directory names too generic to serve as a commit scope.
const GENERIC_DIRS: &[&str] = &[
    "src", "lib", "app", "apps", "pkg", "packages", "internal", "cmd", "source", "sources",
    "main", "java", "kotlin", "python", "test", "tests", "__tests__", "spec", "specs", "doc",
    "docs", "include", "crates",
];

fn split_path(path: &str) -> (Vec<&str>, &str) {
    let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let file_name = segments.pop().unwrap_or("");
    (segments, file_name)
}

/// Split a file name into (stem, extension) at the last dot.
fn split_file_name(file_name: &str) -> (&str, Option<&str>) {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => (&file_name[..idx], Some(&file_name[idx + 1..])),
        _ => (file_name, None),
    }
}

/// Whether `path` looks like a test file.
///
/// Matches a test directory segment (`tests/`, `__tests__/`, `spec/`, ...)
/// or a test file naming convention (`*_test.*`, `test_*.*`, `*.test.*`,
/// `*.spec.*`, `*_spec.*`, `*Test.*`).
pub fn is_test_path(path: &str) -> bool {
    let (dirs, file_name) = split_path(path);
    if dirs
        .iter()
        .any(|d| TEST_DIRS.contains(&d.to_ascii_lowercase().as_str()))
    {
        return true;
    }

    let (stem, _) = split_file_name(file_name);
    let lower = stem.to_ascii_lowercase();
    lower.starts_with("test_")
        || lower.ends_with("_test")
        || lower.ends_with("_spec")
        || lower.ends_with(".test")
        || lower.ends_with(".spec")
        || lower.contains(".test.")
        || lower.contains(".spec.")
        || stem.ends_with("Test")
        || stem.ends_with("Tests")
}

/// Whether `path` looks like documentation.
pub fn is_doc_path(path: &str) -> bool {
    let (dirs, file_name) = split_path(path);
    if dirs
        .iter()
        .any(|d| DOC_DIRS.contains(&d.to_ascii_lowercase().as_str()))
    {
        return true;
    }

    let upper = file_name.to_ascii_uppercase();
    if upper.starts_with("README") || upper.starts_with("CHANGELOG") {
        return true;
    }

    if matches!(language_category(path), Some(LanguageCategory::Build)) {
        return false;
    }

    let (_, extension) = split_file_name(file_name);
    extension.is_some_and(|ext| DOC_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Whether `path` is program source code (and not documentation).
pub fn is_source_path(path: &str) -> bool {
    matches!(language_category(path), Some(LanguageCategory::Source)) && !is_doc_path(path)
}

/// Infer a commit scope from the changed paths.
///
/// The scope is the innermost non-generic directory, weighted by changed
/// lines across all files; ties go to the directory seen first. When every
/// directory is generic, the stem of the most changed file is used.
pub fn infer_scope(summary: &DiffSummary) -> Option<String> {
    let mut weights: HashMap<String, (usize, usize)> = HashMap::new();

    for (position, file) in summary.files().iter().enumerate() {
        let (dirs, _) = split_path(file.path());
        let candidate = dirs
            .iter()
            .rev()
            .find(|d| !GENERIC_DIRS.contains(&d.to_ascii_lowercase().as_str()) && !d.starts_with('.'));
        if let Some(dir) = candidate {
            let entry = weights
                .entry(normalize_scope_name(dir))
                .or_insert((0, position));
            entry.0 += file.changed_lines().max(1);
        }
    }

    let best_dir = weights
        .into_iter()
        .max_by(|(_, (wa, pa)), (_, (wb, pb))| wa.cmp(wb).then(pb.cmp(pa)))
        .map(|(name, _)| name)
        .filter(|name| !name.is_empty());
    if best_dir.is_some() {
        return best_dir;
    }

    // Earliest file wins on equal change counts.
    let most_changed = summary
        .files()
        .iter()
        .rev()
        .max_by_key(|f| f.changed_lines())?;
    let (_, file_name) = split_path(most_changed.path());
    let stem = file_name.split('.').next().unwrap_or(file_name);
    let scope = normalize_scope_name(stem);
    (!scope.is_empty()).then_some(scope)
}

/// Lowercase and strip anything that can't appear in a scope.
fn normalize_scope_name(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}
