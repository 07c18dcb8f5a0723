//! Rendering [`MessageParts`] as a conventional commit message.

use super::MessageParts;
use super::parser::paragraphs;

/// Maximum characters in the subject description.
pub const MAX_DESCRIPTION_LENGTH: usize = 72;

/// Maximum characters per body line.
pub const MAX_BODY_LINE_LENGTH: usize = 100;

/// Substituted for an empty description.
pub const EMPTY_DESCRIPTION: &str = "update code";

/// A rendered message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedMessage {
    pub message: String,
    /// Set when the description had to be shortened.
    pub description_truncated: bool,
}

/// Render `parts`, repairing every mechanical format problem on the way.
pub fn format(parts: &MessageParts) -> FormattedMessage {
    let (description, description_truncated) = normalize_description(&parts.description);

    let mut header = parts.commit_type.as_str().to_string();
    if let Some(scope) = parts.scope.as_deref().and_then(normalize_scope) {
        header.push('(');
        header.push_str(&scope);
        header.push(')');
    }
    if parts.breaking {
        header.push('!');
    }
    header.push_str(": ");
    header.push_str(&description);

    let mut sections = vec![header];
    sections.extend(parts.body.as_deref().and_then(format_block));
    sections.extend(parts.footer.as_deref().and_then(format_block));

    FormattedMessage {
        message: sections.join("\n\n"),
        description_truncated,
    }
}

/// Scope without whitespace or parentheses; `None` when nothing is left.
pub fn normalize_scope(scope: &str) -> Option<String> {
    let cleaned: String = scope
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .chars()
        .filter(|c| *c != '(' && *c != ')')
        .collect();
    if cleaned.is_empty() { None } else { Some(cleaned) }
}

/// Whether the first word of `text` is an all-caps acronym such as `API`.
pub fn starts_with_acronym(text: &str) -> bool {
    let Some(word) = text.split_whitespace().next() else {
        return false;
    };
    let letters: Vec<char> = word.chars().filter(|c| c.is_alphabetic()).collect();
    letters.len() >= 2 && letters.iter().all(|c| c.is_uppercase())
}

/// Whether `text` opens with a capital that has a lowercase form and is
/// not part of an acronym. Letters like `𝐀` have no lowercase mapping and
/// are left alone.
pub fn is_capitalized(text: &str) -> bool {
    let Some(first) = text.chars().next() else {
        return false;
    };
    first.is_uppercase()
        && !first.to_lowercase().eq(std::iter::once(first))
        && !starts_with_acronym(text)
}

fn normalize_description(description: &str) -> (String, bool) {
    let collapsed = description.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut text = strip_trailing_punctuation(&collapsed).to_string();

    if text.is_empty() {
        return (EMPTY_DESCRIPTION.to_string(), false);
    }

    if is_capitalized(&text) {
        text = lowercase_first(&text);
    }

    if text.chars().count() <= MAX_DESCRIPTION_LENGTH {
        return (text, false);
    }
    let mut cut = truncate_at_word(&text, MAX_DESCRIPTION_LENGTH);
    // Cutting can shorten a leading acronym to a single capital.
    if is_capitalized(&cut) {
        cut = truncate_at_word(&lowercase_first(&cut), MAX_DESCRIPTION_LENGTH);
    }
    (cut, true)
}

fn strip_trailing_punctuation(text: &str) -> &str {
    text.trim_end_matches(|c: char| c == '.' || c.is_whitespace())
}

fn lowercase_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Cut `text` to at most `max` characters, at a word boundary when possible.
fn truncate_at_word(text: &str, max: usize) -> String {
    let cut = text
        .char_indices()
        .nth(max)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len());
    let prefix = &text[..cut];

    let ends_on_boundary = text[cut..].starts_with(char::is_whitespace);
    let candidate = if ends_on_boundary {
        prefix
    } else {
        match prefix.rfind(char::is_whitespace) {
            Some(space) if space > 0 => &prefix[..space],
            _ => prefix,
        }
    };

    let trimmed = candidate.trim_end_matches(|c: char| matches!(c, '.' | ',' | ';' | ':' | '-') || c.is_whitespace());
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    let fallback = strip_trailing_punctuation(prefix);
    if fallback.is_empty() {
        EMPTY_DESCRIPTION.to_string()
    } else {
        fallback.to_string()
    }
}

/// Trim, collapse blank runs and wrap a body or footer block.
fn format_block(text: &str) -> Option<String> {
    let lines: Vec<&str> = text.lines().map(str::trim_end).collect();
    let paragraphs: Vec<String> = paragraphs(&lines)
        .into_iter()
        .map(|p| {
            p.into_iter()
                .flat_map(|line| wrap_line(line, MAX_BODY_LINE_LENGTH))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .collect();

    if paragraphs.is_empty() {
        None
    } else {
        Some(paragraphs.join("\n\n"))
    }
}

/// Soft-wrap one line at whitespace, keeping its indentation.
///
/// A word longer than `width` stays on its own line.
pub fn wrap_line(line: &str, width: usize) -> Vec<String> {
    if line.chars().count() <= width {
        return vec![line.to_string()];
    }

    let indent: String = line.chars().take_while(|c| c.is_whitespace()).collect();
    let indent_len = indent.chars().count();

    let mut wrapped = Vec::new();
    let mut current = indent.clone();
    let mut current_len = indent_len;
    for word in line.split_whitespace() {
        let word_len = word.chars().count();
        if current_len > indent_len && current_len + 1 + word_len > width {
            wrapped.push(std::mem::replace(&mut current, indent.clone()));
            current_len = indent_len;
        }
        if current_len > indent_len {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }
    if current_len > indent_len {
        wrapped.push(current);
    }
    wrapped
}
