//! Ordered classification rules.
//!
//! Each [`Rule`] is a pure predicate over a [`DiffSummary`] that either
//! yields a [`ChangeType`] or declines. Rules are tried in [`Rule::ORDER`];
//! the order is part of the contract (a test-only docs change is `test`,
//! not `docs`).

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use regex_lite::Regex;
use tracing::trace;

use super::ChangeType;
use crate::diff::{ChangeKind, DiffSummary, FileChange, is_doc_path, is_source_path, is_test_path};

/// Minimum weight a keyword signal needs before it can decide.
pub const KEYWORD_CONFIDENCE_THRESHOLD: usize = 3;

/// Weight given to each newly added source file.
const NEW_SOURCE_FILE_WEIGHT: usize = 2;

/// Summaries smaller than this are too small for the ratio tie-break.
pub const RATIO_MIN_CHANGED_LINES: usize = 10;

/// Summaries larger than this are never called a refactor by ratio alone.
pub const RATIO_MAX_REFACTOR_LINES: usize = 500;

/// Smaller/larger line count ratio at or above which a file counts as a
/// balanced rewrite.
const NEAR_EQUAL_RATIO: f64 = 0.75;

static DECLARATION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // fn/def/class/struct/... with optional visibility and modifiers
        r"^(export\s+)?(default\s+)?(pub(\([\w:]+\))?\s+)?(async\s+)?(unsafe\s+)?(fn|def|func|function\*?|class|struct|trait|interface|enum|impl|module|protocol)\s",
        // Java/C#/Kotlin style members
        r"^(public|private|protected|internal)\s+[\w<>\[\],.?\s]*\w+\s*\(",
        // arrow function components: const Foo = (props) => ...
        r"^(export\s+)?(const|let|var)\s+[A-Za-z_$][\w$]*\s*=\s*(async\s+)?(\([^)]*\)|[A-Za-z_$][\w$]*)\s*=>",
        r"^export\s+(default\s+)?(const|let|var|class|function|async|interface|type|enum)\b",
        // HTTP endpoints
        r"^@(\w+\.)?(get|post|put|delete|patch|route|api_view)\b",
        r"^(app|router|server|api)\.(get|post|put|delete|patch)\(",
        r"^#\[(get|post|put|delete|patch|route)\(",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Invalid regex"))
    .collect()
});

static GUARD_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^(\}\s*)?(if|elif|else\s+if|unless|guard|when)\b",
        r"^return\s+(false|null|nil|None|undefined|-1|Err\b|err\b)",
        r"^(throw|raise)\b",
        r"^(bail!|ensure!|panic!|assert(_eq|_ne)?!|assert\b)",
        r"typeof\s+[\w.$]+\s*[!=]==?",
        r"\binstanceof\b",
        r"\bisinstance\(",
        r"\bis\s+(not\s+)?None\b",
        r"[!=]==?\s*(null|undefined|nil|None)\b",
        r"\.is_(none|some|empty)\(\)",
        r"\b(Number\.isNaN|isNaN|Array\.isArray)\(",
        r"\?\?",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Invalid regex"))
    .collect()
});

/// Whether an added line declares a new function, type, component or endpoint.
pub fn is_declaration(line: &str) -> bool {
    let line = line.trim();
    DECLARATION_PATTERNS.iter().any(|re| re.is_match(line))
}

/// Whether a line introduces a condition, check or early exit.
pub fn is_guard(line: &str) -> bool {
    let line = line.trim();
    !line.starts_with("//")
        && !line.starts_with('#')
        && GUARD_PATTERNS.iter().any(|re| re.is_match(line))
}

/// A single classification rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    /// A strict majority of files are tests.
    TestPaths,
    /// A strict majority of files are documentation and no source is touched.
    DocsPaths,
    /// Declaration, guard and rewrite signals in the hunks.
    KeywordSignals,
    /// Whole-summary addition/deletion ratio.
    LineRatio,
}

impl Rule {
    /// Evaluation order; the first rule that fires wins.
    pub const ORDER: [Rule; 4] = [
        Rule::TestPaths,
        Rule::DocsPaths,
        Rule::KeywordSignals,
        Rule::LineRatio,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Rule::TestPaths => "test-paths",
            Rule::DocsPaths => "docs-paths",
            Rule::KeywordSignals => "keyword-signals",
            Rule::LineRatio => "line-ratio",
        }
    }

    /// Evaluate the rule. `None` means the rule does not fire.
    pub fn evaluate(&self, summary: &DiffSummary) -> Option<ChangeType> {
        if summary.is_empty() {
            return None;
        }
        match self {
            Rule::TestPaths => test_paths(summary),
            Rule::DocsPaths => docs_paths(summary),
            Rule::KeywordSignals => keyword_signals(summary),
            Rule::LineRatio => line_ratio(summary),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn is_strict_majority(count: usize, total: usize) -> bool {
    count * 2 > total
}

fn test_paths(summary: &DiffSummary) -> Option<ChangeType> {
    let tests = summary.files().iter().filter(|f| is_test_path(f.path())).count();
    is_strict_majority(tests, summary.total_files()).then_some(ChangeType::Test)
}

fn docs_paths(summary: &DiffSummary) -> Option<ChangeType> {
    let files = summary.files();
    let docs = files.iter().filter(|f| is_doc_path(f.path())).count();
    let touches_source = files.iter().any(|f| is_source_path(f.path()));
    (is_strict_majority(docs, files.len()) && !touches_source).then_some(ChangeType::Docs)
}

/// Accumulated keyword weights for one summary.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SignalWeights {
    pub feature: usize,
    pub fix: usize,
    pub refactor: usize,
}

impl SignalWeights {
    /// The label whose weight reaches the threshold and beats both others.
    pub fn decide(&self) -> Option<ChangeType> {
        let candidates = [
            (ChangeType::Feature, self.feature),
            (ChangeType::Fix, self.fix),
            (ChangeType::Refactor, self.refactor),
        ];
        let (best, weight) = candidates.iter().copied().max_by_key(|(_, w)| *w)?;
        let beats_others = candidates
            .iter()
            .filter(|(label, _)| *label != best)
            .all(|(_, w)| *w < weight);
        (weight >= KEYWORD_CONFIDENCE_THRESHOLD && beats_others).then_some(best)
    }
}

/// Compute keyword weights over the non-test, non-doc files of `summary`.
pub fn keyword_weights(summary: &DiffSummary) -> SignalWeights {
    let mut weights = SignalWeights::default();

    for file in summary.files() {
        if file.is_binary() || is_test_path(file.path()) || is_doc_path(file.path()) {
            continue;
        }

        let added_decls = file.added_lines().filter(|l| is_declaration(l)).count();
        let removed_decls = file.removed_lines().filter(|l| is_declaration(l)).count();

        match file.kind() {
            ChangeKind::Added => {
                if is_source_path(file.path()) {
                    weights.feature += NEW_SOURCE_FILE_WEIGHT;
                }
                weights.feature += added_decls;
            }
            ChangeKind::Deleted => {}
            ChangeKind::Modified | ChangeKind::Renamed => {
                let new_decls = added_decls.saturating_sub(removed_decls);
                let new_guards = count_new_guards(file);
                weights.feature += new_decls;

                if file.deletions() <= file.additions() {
                    weights.fix += new_guards;
                }

                if new_guards == 0
                    && new_decls == 0
                    && is_near_equal(file.additions(), file.deletions())
                {
                    let rewritten = file.additions().min(file.deletions());
                    weights.refactor += if file.kind() == ChangeKind::Renamed {
                        rewritten.max(1)
                    } else {
                        rewritten
                    };
                }
            }
        }
        trace!(path = file.path(), ?weights, "Keyword weights after file");
    }

    weights
}

/// Added guard lines whose text was not simply moved from a removed line.
fn count_new_guards(file: &FileChange) -> usize {
    let removed: HashSet<&str> = file.removed_lines().map(str::trim).collect();
    file.added_lines()
        .filter(|l| is_guard(l) && !removed.contains(l.trim()))
        .count()
}

fn is_near_equal(additions: usize, deletions: usize) -> bool {
    let (small, large) = if additions < deletions {
        (additions, deletions)
    } else {
        (deletions, additions)
    };
    large == 0 || small as f64 / large as f64 >= NEAR_EQUAL_RATIO
}

fn keyword_signals(summary: &DiffSummary) -> Option<ChangeType> {
    let weights = keyword_weights(summary);
    trace!(?weights, "Keyword signal weights");
    weights.decide()
}

fn line_ratio(summary: &DiffSummary) -> Option<ChangeType> {
    let additions = summary.total_additions();
    let deletions = summary.total_deletions();
    let total = additions + deletions;
    if total < RATIO_MIN_CHANGED_LINES {
        return None;
    }

    if deletions == 0 || additions as f64 / deletions as f64 > 3.0 {
        return Some(ChangeType::Feature);
    }
    if deletions > additions * 2 {
        return Some(ChangeType::Fix);
    }
    let ratio = additions as f64 / deletions as f64;
    if (0.8..=1.25).contains(&ratio) && total <= RATIO_MAX_REFACTOR_LINES {
        return Some(ChangeType::Refactor);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn modified(path: &str, hunk: &str) -> FileChange {
        FileChange::from_hunks(path, ChangeKind::Modified, hunk)
    }

    #[test]
    fn test_rule_order_is_fixed() {
        assert_eq!(
            Rule::ORDER,
            [Rule::TestPaths, Rule::DocsPaths, Rule::KeywordSignals, Rule::LineRatio]
        );
    }

    #[test]
    fn test_is_declaration() {
        assert!(is_declaration("pub fn parse(input: &str) -> Result<()> {"));
        assert!(is_declaration("  pub(crate) async fn run() {"));
        assert!(is_declaration("def create_user(data):"));
        assert!(is_declaration("export default function UserDashboard({ userId }) {"));
        assert!(is_declaration("export const fetchStats = async (id) => {"));
        assert!(is_declaration("const Card = ({ title }) => ("));
        assert!(is_declaration("class UserService {"));
        assert!(is_declaration("public List<User> findAll() {"));
        assert!(is_declaration("@app.get('/users')"));
        assert!(is_declaration("router.post('/login', handler);"));
        assert!(!is_declaration("const total = a + b;"));
        assert!(!is_declaration("return result;"));
        assert!(!is_declaration("// function in a comment"));
    }

    #[test]
    fn test_is_guard() {
        assert!(is_guard("if (!token || typeof token !== 'string') {"));
        assert!(is_guard("} else if (x > 3) {"));
        assert!(is_guard("return false;"));
        assert!(is_guard("raise ValueError('bad input')"));
        assert!(is_guard("throw new Error('missing id');"));
        assert!(is_guard("if value is None:"));
        assert!(is_guard("let name = input ?? 'anonymous';"));
        assert!(is_guard("return Err(Error::Empty);"));
        assert!(!is_guard("const total = a + b;"));
        assert!(!is_guard("// if this breaks, blame the cache"));
        assert!(!is_guard("return user;"));
    }

    #[test]
    fn test_test_paths_needs_strict_majority() {
        let half = DiffSummary::new(vec![
            modified("src/auth.js", "+a\n"),
            modified("tests/auth.test.js", "+b\n"),
        ]);
        assert_eq!(Rule::TestPaths.evaluate(&half), None);

        let majority = DiffSummary::new(vec![
            modified("src/auth.js", "+a\n"),
            modified("tests/auth.test.js", "+b\n"),
            modified("tests/login.test.js", "+c\n"),
        ]);
        assert_eq!(Rule::TestPaths.evaluate(&majority), Some(ChangeType::Test));
    }

    #[test]
    fn test_docs_paths_declines_when_source_touched() {
        let docs_only = DiffSummary::new(vec![
            modified("README.md", "+a\n"),
            modified("docs/usage.md", "+b\n"),
            modified("config.yml", "+c\n"),
        ]);
        assert_eq!(Rule::DocsPaths.evaluate(&docs_only), Some(ChangeType::Docs));

        let with_source = DiffSummary::new(vec![
            modified("README.md", "+a\n"),
            modified("docs/usage.md", "+b\n"),
            modified("src/main.rs", "+c\n"),
        ]);
        assert_eq!(Rule::DocsPaths.evaluate(&with_source), None);
    }

    #[test]
    fn test_keyword_feature_from_new_source_file() {
        let summary = DiffSummary::new(vec![FileChange::from_hunks(
            "src/billing.py",
            ChangeKind::Added,
            "@@ -0,0 +1,4 @@\n+def charge(amount):\n+    pass\n+def refund(amount):\n+    pass\n",
        )]);
        let weights = keyword_weights(&summary);
        assert_eq!(weights.feature, 4);
        assert_eq!(Rule::KeywordSignals.evaluate(&summary), Some(ChangeType::Feature));
    }

    #[test]
    fn test_keyword_fix_ignores_moved_guards() {
        let hunk = "\
@@ -1,6 +1,8 @@
-  if (!a) {
+  if (!a) {
+  if (typeof b !== 'number') {
+    return false;
+  }
+  if (c === null) {
";
        let summary = DiffSummary::new(vec![modified("src/check.js", hunk)]);
        let weights = keyword_weights(&summary);
        // `if (!a)` was moved, not added.
        assert_eq!(weights.fix, 3);
        assert_eq!(Rule::KeywordSignals.evaluate(&summary), Some(ChangeType::Fix));
    }

    #[test]
    fn test_keyword_refactor_for_balanced_rewrite() {
        let hunk = "\
@@ -1,4 +1,4 @@
-export function fmtDate(d) {
-  return d.toISOString().slice(0, 10);
-const a = 1;
-const b = 2;
+export function formatDate(date) {
+  return date.toISOString().slice(0, 10);
+const first = 1;
+const second = 2;
";
        let summary = DiffSummary::new(vec![modified("src/format.js", hunk)]);
        let weights = keyword_weights(&summary);
        assert_eq!(weights.feature, 0);
        assert_eq!(weights.fix, 0);
        assert_eq!(weights.refactor, 4);
        assert_eq!(Rule::KeywordSignals.evaluate(&summary), Some(ChangeType::Refactor));
    }

    #[test]
    fn test_signal_weights_require_threshold_and_strict_lead() {
        let tied = SignalWeights { feature: 4, fix: 4, refactor: 0 };
        assert_eq!(tied.decide(), None);

        let weak = SignalWeights { feature: 2, fix: 0, refactor: 0 };
        assert_eq!(weak.decide(), None);

        let clear = SignalWeights { feature: 1, fix: 5, refactor: 2 };
        assert_eq!(clear.decide(), Some(ChangeType::Fix));
    }

    #[test]
    fn test_keyword_skips_test_and_doc_files() {
        let summary = DiffSummary::new(vec![
            FileChange::from_hunks(
                "tests/api_test.py",
                ChangeKind::Added,
                "@@ -0,0 +1,3 @@\n+def test_a():\n+def test_b():\n+def test_c():\n",
            ),
            modified("docs/guide.md", "@@ -1 +1 @@\n+if you want to\n"),
        ]);
        assert_eq!(keyword_weights(&summary), SignalWeights::default());
    }

    #[test]
    fn test_line_ratio() {
        let grow = DiffSummary::new(vec![FileChange::new("a.rs", ChangeKind::Modified, 40, 5, "")]);
        assert_eq!(Rule::LineRatio.evaluate(&grow), Some(ChangeType::Feature));

        let shrink = DiffSummary::new(vec![FileChange::new("a.rs", ChangeKind::Modified, 4, 20, "")]);
        assert_eq!(Rule::LineRatio.evaluate(&shrink), Some(ChangeType::Fix));

        let balanced = DiffSummary::new(vec![FileChange::new("a.rs", ChangeKind::Modified, 30, 28, "")]);
        assert_eq!(Rule::LineRatio.evaluate(&balanced), Some(ChangeType::Refactor));

        let huge = DiffSummary::new(vec![FileChange::new("a.rs", ChangeKind::Modified, 400, 390, "")]);
        assert_eq!(Rule::LineRatio.evaluate(&huge), None);

        let tiny = DiffSummary::new(vec![FileChange::new("a.rs", ChangeKind::Modified, 4, 0, "")]);
        assert_eq!(Rule::LineRatio.evaluate(&tiny), None);

        let between = DiffSummary::new(vec![FileChange::new("a.rs", ChangeKind::Modified, 20, 10, "")]);
        assert_eq!(Rule::LineRatio.evaluate(&between), None);
    }
}
