//! Static prompt templates, one per change type.
//!
//! Templates carry three insertion points: `{file_summary}`,
//! `{diff_content}` and `{scope_rule}`. Rendering scans the template only,
//! so braces inside the inserted diff are never interpreted.

use crate::classify::ChangeType;

/// A named template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate {
    pub name: &'static str,
    pub text: &'static str,
}

/// Values substituted into a template.
#[derive(Debug, Clone, Copy)]
pub struct TemplateValues<'a> {
    pub file_summary: &'a str,
    pub diff_content: &'a str,
    pub scope_rule: &'a str,
}

pub const SCOPE_REQUIRED: &str = "Scope: REQUIRED. Name the component, module or directory most affected, lowercase, one word or hyphenated (e.g. auth, api, ui).";
pub const SCOPE_OPTIONAL: &str = "Scope: optional. Add one only when a single component is clearly affected.";

macro_rules! format_rules {
    () => {
        concat!(
            "## Output format\n<type>(<scope>): <description>\n\n[optional body]\n\n[optional footer(s)]\n\n",
            "- Types: feat, fix, docs, style, refactor, perf, test, build, ci, chore\n",
            "- Description: imperative mood (\"add\", not \"added\"), lowercase first letter, no period, at most 72 characters\n",
            "- Body: explain what changed and why, wrapped at 100 characters\n",
            "- Footer: issue references (\"Fixes #123\") or \"BREAKING CHANGE: <description>\"\n\n",
            "Reply with the commit message only. No code fences, no commentary."
        )
    };
}

macro_rules! template {
    ($intro:literal, $guidance:literal) => {
        concat!(
            $intro,
            "\n\n## Changed files\n{file_summary}\n\n## Diff\n{diff_content}\n\n",
            $guidance,
            "\n\n{scope_rule}\n\n",
            format_rules!()
        )
    };
}

pub static GENERIC: PromptTemplate = PromptTemplate {
    name: "generic",
    text: template!(
        "You are an expert developer writing a git commit message that follows the Conventional Commits specification.",
        "## Analysis\n\
         - Decide what kind of change this is (feature, fix, refactor, docs, tests, build, ...)\n\
         - Identify the component or module affected\n\
         - Note test or documentation updates and any breaking change"
    ),
};

pub static FEATURE: PromptTemplate = PromptTemplate {
    name: "feature",
    text: template!(
        "You are writing a commit message for a new feature. Use type \"feat\".",
        "## Look for\n\
         - New functions, classes, components or API endpoints\n\
         - New configuration options or supported formats\n\
         - Tests and documentation that accompany the feature\n\n\
         Describe what the feature enables, not how it is implemented."
    ),
};

pub static FIX: PromptTemplate = PromptTemplate {
    name: "fix",
    text: template!(
        "You are writing a commit message for a bug fix. Use type \"fix\".",
        "## Look for\n\
         - Corrected conditions and boundary handling\n\
         - Added null, undefined or type checks\n\
         - New error handling and input validation\n\n\
         Describe what was fixed, not the symptoms. The body should say what caused the bug."
    ),
};

pub static REFACTOR: PromptTemplate = PromptTemplate {
    name: "refactor",
    text: template!(
        "You are writing a commit message for a refactoring: code structure changes without behaviour changes. Use type \"refactor\".",
        "## Look for\n\
         - Renamed functions, variables or files\n\
         - Extracted, merged or moved code\n\
         - Simplified expressions and removed duplication\n\n\
         Say specifically what was restructured and why."
    ),
};

pub static DOCS: PromptTemplate = PromptTemplate {
    name: "docs",
    text: template!(
        "You are writing a commit message for documentation changes. Use type \"docs\".",
        "## Look for\n\
         - README, guide and usage updates\n\
         - API documentation and code comments\n\
         - Added or corrected examples\n\n\
         Say which documentation changed and for which component."
    ),
};

pub static TEST: PromptTemplate = PromptTemplate {
    name: "test",
    text: template!(
        "You are writing a commit message for test changes. Use type \"test\".",
        "## Look for\n\
         - New test cases and the behaviour they cover\n\
         - Updated fixtures, mocks or assertions\n\
         - Test infrastructure changes\n\n\
         Say what behaviour the tests now cover."
    ),
};

/// Template for `change_type`; the generic template when none is specialised.
pub fn template_for(change_type: ChangeType) -> &'static PromptTemplate {
    match change_type {
        ChangeType::Feature => &FEATURE,
        ChangeType::Fix => &FIX,
        ChangeType::Refactor => &REFACTOR,
        ChangeType::Docs => &DOCS,
        ChangeType::Test => &TEST,
        _ => &GENERIC,
    }
}

/// Substitute the insertion points in a single pass over the template.
pub fn render(template: &PromptTemplate, values: &TemplateValues<'_>) -> String {
    let text = template.text;
    let mut out = String::with_capacity(
        text.len() + values.file_summary.len() + values.diff_content.len() + values.scope_rule.len(),
    );

    let mut rest = text;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open..];
        let replacement = [
            ("{file_summary}", values.file_summary),
            ("{diff_content}", values.diff_content),
            ("{scope_rule}", values.scope_rule),
        ]
        .into_iter()
        .find(|(placeholder, _)| after.starts_with(placeholder));

        match replacement {
            Some((placeholder, value)) => {
                out.push_str(value);
                rest = &after[placeholder.len()..];
            }
            None => {
                out.push('{');
                rest = &after[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
