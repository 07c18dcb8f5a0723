//! Parsing raw model output into [`MessageParts`].

use std::sync::LazyLock;

use regex_lite::Regex;
use tracing::{debug, warn};

use super::{CommitType, MessageParts};
use crate::error::ParseError;

/// `type(scope)!: description`; scope and `!` optional.
pub(crate) static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<type>[A-Za-z]+)(?:\((?P<scope>[^)]*)\))?(?P<bang>!)?:(?P<space>\s*)(?P<desc>.*)$")
        .expect("Invalid regex")
});

/// First line of a trailer block: `Token: value` or `Token #value`.
static FOOTER_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(BREAKING CHANGE|[A-Za-z][A-Za-z0-9]*(-[A-Za-z0-9]+)*)(: | #)\S")
        .expect("Invalid regex")
});

static BREAKING_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^BREAKING[ -]CHANGE:").expect("Invalid regex"));

/// Chatty lead-ins such as `Here's the commit message:` or `Commit message: feat: ...`.
static LEAD_IN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(here(?:'s| is)\b[^:]*|(?:suggested |proposed |generated )?commit message[^:]*):\s*(?P<rest>.*)$")
        .expect("Invalid regex")
});

/// Result of [`parse_or_fallback`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResponse {
    pub parts: MessageParts,
    /// True when the text had no conventional header and was kept as `chore`.
    pub fallback: bool,
}

/// Parse model output.
///
/// The cleaned text's first non-blank line must be a conventional header
/// with a known type; otherwise [`ParseError::UnrecognizedFormat`].
pub fn parse(raw: &str) -> Result<MessageParts, ParseError> {
    parse_message(&clean_response(raw))
}

/// Parse a message as written, e.g. by the user in an editor.
///
/// Unlike [`parse`] nothing is removed first, so code fences and lines
/// that look like lead-ins stay in the body. CRLF line endings are accepted.
pub fn parse_message(text: &str) -> Result<MessageParts, ParseError> {
    let mut lines = text.trim_start().lines();
    let header_line = lines.next().map(unwrap_quotes).unwrap_or_default();

    let captures = HEADER
        .captures(header_line)
        .ok_or_else(|| ParseError::UnrecognizedFormat(header_line.to_string()))?;
    let commit_type: CommitType = captures["type"]
        .parse()
        .map_err(|_| ParseError::UnrecognizedFormat(header_line.to_string()))?;

    let scope = captures
        .name("scope")
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    let description = captures["desc"].trim().to_string();

    let rest: Vec<&str> = lines.map(str::trim_end).collect();
    let (body, footer) = split_body_and_footer(&rest);
    let breaking = captures.name("bang").is_some() || rest.iter().any(|l| BREAKING_LINE.is_match(l));

    debug!(
        "Parsed header type={} scope={:?} breaking={}",
        commit_type, scope, breaking
    );

    Ok(MessageParts {
        commit_type,
        scope,
        description,
        body,
        footer,
        breaking,
    })
}

/// Parse model output, keeping unrecognised text as a `chore` message.
///
/// On the fallback path the first non-blank line becomes the description
/// and the rest the body. When that line is longer than a description may
/// be, the whole text is kept as the body so nothing is lost.
pub fn parse_or_fallback(raw: &str) -> ParsedResponse {
    match parse(raw) {
        Ok(parts) => ParsedResponse {
            parts,
            fallback: false,
        },
        Err(e) => {
            warn!("{}; keeping the response as a chore message", e);
            let cleaned = clean_response(raw);
            let (first, remainder) = match cleaned.split_once('\n') {
                Some((first, remainder)) => (first.trim(), remainder.trim()),
                None => (cleaned.trim(), ""),
            };

            let body = if first.chars().count() > super::MAX_DESCRIPTION_LENGTH {
                Some(cleaned.clone())
            } else if remainder.is_empty() {
                None
            } else {
                Some(remainder.to_string())
            };

            let mut parts = MessageParts::new(CommitType::Chore, first);
            parts.body = body;
            ParsedResponse {
                parts,
                fallback: true,
            }
        }
    }
}

/// Remove code fences, lead-ins and surrounding blank lines.
pub fn clean_response(raw: &str) -> String {
    let mut lines: Vec<String> = raw
        .lines()
        .filter(|l| !l.trim_start().starts_with("```"))
        .map(|l| l.trim_end().to_string())
        .collect();

    if let Some(first) = lines.iter().position(|l| !l.trim().is_empty()) {
        lines.drain(..first);
    }

    if let Some(rest) = lines
        .first()
        .and_then(|first| LEAD_IN.captures(first.trim()))
        .map(|c| c["rest"].trim().to_string())
    {
        if rest.is_empty() {
            lines.remove(0);
        } else {
            lines[0] = rest;
        }
    }

    lines.join("\n").trim().to_string()
}

/// Split the lines after the header into body and trailing footer.
///
/// The last paragraph is the footer when its first line looks like a
/// trailer; a trailer-looking paragraph elsewhere stays in the body.
pub(crate) fn split_body_and_footer(lines: &[&str]) -> (Option<String>, Option<String>) {
    let mut paragraphs = paragraphs(lines);

    let has_footer = paragraphs
        .last()
        .and_then(|p| p.first())
        .is_some_and(|l| is_footer_start(l));
    let footer = if has_footer {
        paragraphs.pop().map(|p| p.join("\n"))
    } else {
        None
    };

    let body = if paragraphs.is_empty() {
        None
    } else {
        Some(
            paragraphs
                .iter()
                .map(|p| p.join("\n"))
                .collect::<Vec<_>>()
                .join("\n\n"),
        )
    };

    (body, footer)
}

/// Group lines into paragraphs separated by blank lines.
pub(crate) fn paragraphs<'a>(lines: &[&'a str]) -> Vec<Vec<&'a str>> {
    let mut paragraphs: Vec<Vec<&str>> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for &line in lines {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }
    paragraphs
}

/// Whether `line` starts a trailer block.
pub(crate) fn is_footer_start(line: &str) -> bool {
    FOOTER_TOKEN.is_match(line)
}

fn unwrap_quotes(line: &str) -> &str {
    let line = line.trim();
    for quote in ['`', '"', '\''] {
        if line.len() >= 2 && line.starts_with(quote) && line.ends_with(quote) {
            return line[1..line.len() - 1].trim();
        }
    }
    line
}
