//! Unified diff text parser.
//!
//! Splits `git diff --cached` style output into one [`FileChange`] per
//! `diff --git` section, keeping the hunks verbatim.

use std::sync::LazyLock;

use regex_lite::Regex;
use tracing::{debug, warn};

use super::{BINARY_CONTENT, ChangeKind, DiffSummary, FileChange, count_changed_lines};

static FILE_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^diff --git a/(.*) b/(.*)$").expect("Invalid regex"));

/// Second path of a header whose old path is plain and new path quoted.
static QUOTED_NEW_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^(.*) ("b/.*")$"#).expect("Invalid regex"));

/// Parse unified diff text into a [`DiffSummary`].
///
/// Blank input yields an empty summary. Sections whose path cannot be
/// determined are skipped with a warning.
pub fn parse_diff(diff_text: &str) -> DiffSummary {
    if diff_text.trim().is_empty() {
        debug!("Empty diff text");
        return DiffSummary::default();
    }

    let files: Vec<FileChange> = split_sections(diff_text)
        .into_iter()
        .filter_map(|section| {
            let parsed = parse_section(&section);
            if parsed.is_none() {
                warn!("Could not determine file path from diff section");
            }
            parsed
        })
        .collect();

    let summary = DiffSummary::new(files);
    debug!(
        "Parsed diff with {} files, {} additions, {} deletions",
        summary.total_files(),
        summary.total_additions(),
        summary.total_deletions()
    );
    summary
}

/// Split diff text into per-file sections, each starting at `diff --git`.
fn split_sections(diff_text: &str) -> Vec<Vec<&str>> {
    let mut sections: Vec<Vec<&str>> = Vec::new();
    for line in diff_text.lines() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.starts_with("diff --git ") || sections.is_empty() {
            sections.push(Vec::new());
        }
        if let Some(current) = sections.last_mut() {
            current.push(line);
        }
    }
    sections
        .into_iter()
        .filter(|s| s.first().is_some_and(|l| l.starts_with("diff --git ")))
        .collect()
}

/// Old and new path from a `diff --git` line. Git C-quotes paths with
/// non-ASCII or control characters, e.g. `"a/caf\303\251.txt"`.
fn header_paths(line: &str) -> Option<(String, String)> {
    let rest = line.strip_prefix("diff --git ")?;
    if rest.starts_with('"') {
        let (old, remainder) = unquote(rest)?;
        let new = diff_path(remainder.trim_start(), "b/")?;
        return Some((old.strip_prefix("a/")?.to_string(), new));
    }
    if let Some(caps) = QUOTED_NEW_PATH.captures(rest) {
        let old = caps.get(1)?.as_str().strip_prefix("a/")?;
        let new = diff_path(caps.get(2)?.as_str(), "b/")?;
        return Some((old.to_string(), new));
    }
    let caps = FILE_HEADER.captures(line)?;
    Some((caps.get(1)?.as_str().to_string(), caps.get(2)?.as_str().to_string()))
}

/// A path as written after `---`, `+++`, `rename from` or `rename to`.
///
/// `prefix` is the `a/`/`b/` side marker; `None` for `/dev/null` or when
/// the prefix is missing.
fn diff_path(raw: &str, prefix: &str) -> Option<String> {
    let path = if raw.starts_with('"') {
        unquote(raw)?.0
    } else {
        // Git ends names containing spaces with a tab on ---/+++ lines.
        raw.strip_suffix('\t').unwrap_or(raw).to_string()
    };
    path.strip_prefix(prefix).map(str::to_string)
}

/// Decode a C-style quoted string at the start of `raw`.
///
/// Returns the decoded text and whatever follows the closing quote.
/// Octal escapes are bytes, so `\303\251` decodes to `é`.
fn unquote(raw: &str) -> Option<(String, &str)> {
    let inner = raw.strip_prefix('"')?;
    let bytes = inner.as_bytes();
    let mut decoded: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                let text = String::from_utf8_lossy(&decoded).into_owned();
                return Some((text, &inner[i + 1..]));
            }
            b'\\' => {
                let escaped = *bytes.get(i + 1)?;
                i += 2;
                let byte = match escaped {
                    b'0'..=b'7' => {
                        let mut value = u32::from(escaped - b'0');
                        for _ in 0..2 {
                            match bytes.get(i).copied() {
                                Some(d @ b'0'..=b'7') => {
                                    value = value * 8 + u32::from(d - b'0');
                                    i += 1;
                                }
                                _ => break,
                            }
                        }
                        u8::try_from(value).ok()?
                    }
                    b'a' => 0x07,
                    b'b' => 0x08,
                    b'f' => 0x0c,
                    b'n' => b'\n',
                    b'r' => b'\r',
                    b't' => b'\t',
                    b'v' => 0x0b,
                    other => other,
                };
                decoded.push(byte);
            }
            other => {
                decoded.push(other);
                i += 1;
            }
        }
    }
    None
}

fn parse_section(lines: &[&str]) -> Option<FileChange> {
    let (old, new) = header_paths(lines.first()?)?;
    let mut old_path = Some(old);
    let mut new_path = Some(new);

    let mut kind = ChangeKind::Modified;
    let mut binary = false;
    let mut hunk_start = None;

    // Extended header lines come before the first hunk.
    for (idx, line) in lines.iter().enumerate().skip(1) {
        if line.starts_with("@@") {
            hunk_start = Some(idx);
            break;
        }
        if line.starts_with("new file mode") {
            kind = ChangeKind::Added;
        } else if line.starts_with("deleted file mode") {
            kind = ChangeKind::Deleted;
        } else if let Some(from) = line.strip_prefix("rename from ") {
            kind = ChangeKind::Renamed;
            old_path = diff_path(from, "").or(old_path);
        } else if let Some(to) = line.strip_prefix("rename to ") {
            kind = ChangeKind::Renamed;
            new_path = diff_path(to, "").or(new_path);
        } else if let Some(to) = line.strip_prefix("+++ ") {
            if let Some(path) = diff_path(to, "b/") {
                new_path = Some(path);
            }
        } else if let Some(from) = line.strip_prefix("--- ") {
            if let Some(path) = diff_path(from, "a/") {
                old_path = Some(path);
            }
        } else if line.starts_with("Binary files") || line.starts_with("GIT binary patch") {
            binary = true;
        }
    }

    let path = match kind {
        ChangeKind::Deleted => old_path.clone().or(new_path),
        _ => new_path.or_else(|| old_path.clone()),
    }
    .filter(|p| !p.is_empty())?;

    if binary {
        debug!("Binary file detected: {}", path);
        return Some(FileChange::new(path, kind, 0, 0, BINARY_CONTENT));
    }

    let diff_content = hunk_start
        .map(|start| lines[start..].join("\n"))
        .unwrap_or_default();
    let (additions, deletions) = count_changed_lines(&diff_content);

    let change = FileChange::new(path, kind, additions, deletions, diff_content);
    Some(match (kind, old_path) {
        (ChangeKind::Renamed, Some(old)) => change.with_old_path(old),
        _ => change,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODIFIED: &str = "\
diff --git a/src/auth.js b/src/auth.js
index 3b18e51..a9c4f2d 100644
--- a/src/auth.js
+++ b/src/auth.js
@@ -1,5 +1,6 @@
 function validateToken(token) {
-  if (!token) {
+  if (!token || typeof token !== 'string') {
     return false;
   }
+  // checked
 }
";

    #[test]
    fn test_parse_modified_file() {
        let summary = parse_diff(MODIFIED);
        assert_eq!(summary.total_files(), 1);

        let file = &summary.files()[0];
        assert_eq!(file.path(), "src/auth.js");
        assert_eq!(file.kind(), ChangeKind::Modified);
        assert_eq!(file.additions(), 2);
        assert_eq!(file.deletions(), 1);
        assert_eq!(file.language(), Some("JavaScript"));
        assert!(file.diff_content().starts_with("@@ -1,5 +1,6 @@"));
        assert!(!file.diff_content().contains("index 3b18e51"));
    }

    #[test]
    fn test_parse_new_and_deleted_files() {
        let diff = "\
diff --git a/new.py b/new.py
new file mode 100644
index 0000000..e69de29
--- /dev/null
+++ b/new.py
@@ -0,0 +1,2 @@
+def main():
+    pass
diff --git a/old.py b/old.py
deleted file mode 100644
index e69de29..0000000
--- a/old.py
+++ /dev/null
@@ -1 +0,0 @@
-print('bye')
";
        let summary = parse_diff(diff);
        assert_eq!(summary.total_files(), 2);
        assert_eq!(summary.files()[0].path(), "new.py");
        assert_eq!(summary.files()[0].kind(), ChangeKind::Added);
        assert_eq!(summary.files()[0].additions(), 2);
        assert_eq!(summary.files()[1].path(), "old.py");
        assert_eq!(summary.files()[1].kind(), ChangeKind::Deleted);
        assert_eq!(summary.files()[1].deletions(), 1);
        assert_eq!(summary.total_additions(), 2);
        assert_eq!(summary.total_deletions(), 1);
    }

    #[test]
    fn test_parse_rename() {
        let diff = "\
diff --git a/src/util.rs b/src/helpers.rs
similarity index 90%
rename from src/util.rs
rename to src/helpers.rs
index 1111111..2222222 100644
--- a/src/util.rs
+++ b/src/helpers.rs
@@ -1,2 +1,2 @@
-pub fn util() {}
+pub fn helper() {}
";
        let summary = parse_diff(diff);
        let file = &summary.files()[0];
        assert_eq!(file.kind(), ChangeKind::Renamed);
        assert_eq!(file.path(), "src/helpers.rs");
        assert_eq!(file.old_path(), Some("src/util.rs"));
    }

    #[test]
    fn test_parse_pure_rename_without_hunks() {
        let diff = "\
diff --git a/a.txt b/b.txt
similarity index 100%
rename from a.txt
rename to b.txt
";
        let summary = parse_diff(diff);
        let file = &summary.files()[0];
        assert_eq!(file.kind(), ChangeKind::Renamed);
        assert_eq!(file.path(), "b.txt");
        assert_eq!(file.changed_lines(), 0);
        assert_eq!(file.diff_content(), "");
    }

    #[test]
    fn test_parse_binary_file() {
        let diff = "\
diff --git a/logo.png b/logo.png
new file mode 100644
index 0000000..1234567
Binary files /dev/null and b/logo.png differ
";
        let summary = parse_diff(diff);
        let file = &summary.files()[0];
        assert!(file.is_binary());
        assert_eq!(file.kind(), ChangeKind::Added);
        assert_eq!(file.changed_lines(), 0);
    }

    #[test]
    fn test_removed_line_starting_with_dashes_is_counted() {
        let diff = "\
diff --git a/notes.md b/notes.md
index 1..2 100644
--- a/notes.md
+++ b/notes.md
@@ -1,2 +1 @@
 # Notes
--- a separator that used to be here
";
        let summary = parse_diff(diff);
        assert_eq!(summary.files()[0].deletions(), 1);
        assert_eq!(summary.files()[0].additions(), 0);
    }

    #[test]
    fn test_parse_quoted_non_ascii_path() {
        let diff = "\
diff --git \"a/caf\\303\\251.txt\" \"b/caf\\303\\251.txt\"
new file mode 100644
index 0000000..ce01362
--- /dev/null
+++ \"b/caf\\303\\251.txt\"
@@ -0,0 +1 @@
+hello
";
        let summary = parse_diff(diff);
        assert_eq!(summary.total_files(), 1);
        assert_eq!(summary.files()[0].path(), "café.txt");
        assert_eq!(summary.files()[0].kind(), ChangeKind::Added);
        assert_eq!(summary.files()[0].additions(), 1);
    }

    #[test]
    fn test_parse_quoted_rename_and_mixed_header() {
        let diff = "\
diff --git a/plain.txt \"b/tab\\there.txt\"
similarity index 100%
rename from plain.txt
rename to \"tab\\there.txt\"
";
        let summary = parse_diff(diff);
        let file = &summary.files()[0];
        assert_eq!(file.kind(), ChangeKind::Renamed);
        assert_eq!(file.path(), "tab\there.txt");
        assert_eq!(file.old_path(), Some("plain.txt"));
    }

    #[test]
    fn test_parse_path_with_spaces_and_trailing_tab() {
        let diff = "diff --git a/my file.rs b/my file.rs\n--- a/my file.rs\t\n+++ b/my file.rs\t\n@@ -1 +1 @@\n-a\n+b\n";
        let summary = parse_diff(diff);
        assert_eq!(summary.files()[0].path(), "my file.rs");
    }

    #[test]
    fn test_unquote_escapes() {
        assert_eq!(
            unquote(r#""a\"b\\c\nd" tail"#),
            Some((String::from("a\"b\\c\nd"), " tail"))
        );
        assert_eq!(unquote(r#""unterminated"#), None);
    }

    #[test]
    fn test_parse_empty_input() {
        assert!(parse_diff("").is_empty());
        assert!(parse_diff("   \n").is_empty());
    }

    #[test]
    fn test_parse_ignores_preamble_and_crlf() {
        let diff = "warning: something\r\ndiff --git a/a.rs b/a.rs\r\n--- a/a.rs\r\n+++ b/a.rs\r\n@@ -1 +1 @@\r\n-a\r\n+b\r\n";
        let summary = parse_diff(diff);
        assert_eq!(summary.total_files(), 1);
        assert_eq!(summary.files()[0].path(), "a.rs");
        assert_eq!(summary.files()[0].additions(), 1);
        assert_eq!(summary.files()[0].deletions(), 1);
    }
}
