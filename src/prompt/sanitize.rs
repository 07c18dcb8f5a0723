//! Cleaning of diff text before it is embedded in a prompt.

use std::sync::LazyLock;

use regex_lite::Regex;

/// Replacement for lines that try to steer the model.
pub const FILTERED: &str = "[filtered]";

static INJECTION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(ignore\s+(all\s+)?(the\s+)?(previous|prior|above)\s+(instructions|prompts?|rules)|disregard\s+(all\s+)?(the\s+)?(previous|prior|above)|forget\s+(all\s+)?(your|the)\s+(previous\s+)?instructions|you\s+are\s+now\s+|new\s+instructions\s*:|system\s+prompt\s*:|<\|?(im_start|im_end|system|endoftext)\|?>)",
    )
    .expect("Invalid regex")
});

/// Apply every cleaning step: control characters, ANSI escapes, injection phrases.
pub fn sanitize(text: &str) -> String {
    let text = remove_ansi_escapes(text);
    let text = remove_control_chars(&text);
    filter_injection_patterns(&text)
}

/// Strip ANSI CSI/OSC escape sequences.
pub fn remove_ansi_escapes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\u{1b}' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('[') => {
                chars.next();
                // Parameters and intermediates, then one final byte in @..~
                for next in chars.by_ref() {
                    if ('@'..='~').contains(&next) {
                        break;
                    }
                }
            }
            Some(']') => {
                chars.next();
                // OSC ends at BEL or ESC \
                while let Some(next) = chars.next() {
                    if next == '\u{7}' {
                        break;
                    }
                    if next == '\u{1b}' && chars.peek() == Some(&'\\') {
                        chars.next();
                        break;
                    }
                }
            }
            Some(_) => {
                chars.next();
            }
            None => {}
        }
    }

    out
}

/// Remove control characters except newline and tab.
pub fn remove_control_chars(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect()
}

/// Replace known prompt-injection phrases with [`FILTERED`].
pub fn filter_injection_patterns(text: &str) -> String {
    INJECTION_PATTERN.replace_all(text, FILTERED).into_owned()
}
