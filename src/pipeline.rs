//! Staged diff in, commit message out.
//!
//! Classifier, prompt builder, model client, response parser and formatter
//! run in that order. The model call is the only suspension point; callers
//! cancel by dropping the future.

use tracing::{debug, info, warn};

use crate::classify::{Classification, classify_detailed};
use crate::config::{MessageFormat, Settings};
use crate::diff::{DiffSummary, infer_scope};
use crate::error::PipelineError;
use crate::git::VersionControl;
use crate::llm::{GenerationRequest, ModelClient};
use crate::message::{MessageParts, Violation, format, parse_message, parse_or_fallback, validate};
use crate::prompt::{PromptOptions, TruncationReport, build_prompt_with, file_summary};

/// Everything produced for one generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedMessage {
    /// Final, formatted commit message.
    pub message: String,
    pub parts: MessageParts,
    pub classification: Classification,
    /// Name of the prompt template used.
    pub template: &'static str,
    pub truncation: Option<TruncationReport>,
    pub description_truncated: bool,
    /// The response had no conventional header and was kept as `chore`.
    pub fallback: bool,
    /// Scope came from the changed paths rather than the model.
    pub scope_inferred: bool,
    pub raw_response: String,
}

/// Generate a commit message for `summary`.
///
/// An empty summary fails with `PromptError::EmptyDiff` before the client
/// is called. Model errors are returned as-is and never retried.
pub async fn generate_message<C: ModelClient + ?Sized>(
    summary: &DiffSummary,
    settings: &Settings,
    client: &C,
) -> Result<GeneratedMessage, PipelineError> {
    let classification = classify_detailed(summary);
    info!(
        "Classified {} files as {}",
        summary.total_files(),
        classification.change_type
    );

    let prompt = build_prompt_with(
        summary,
        classification.change_type,
        &PromptOptions {
            max_content_length: settings.max_content_length,
            require_scope: settings.with_scope,
            specialized: settings.format == MessageFormat::Conventional,
        },
    )?;

    let request = GenerationRequest::from_settings(prompt.text, settings);
    let raw_response = client.generate(&request).await?;
    debug!("Raw model response: {:?}", raw_response);

    let parsed = parse_or_fallback(&raw_response);
    let mut parts = parsed.parts;

    let mut scope_inferred = false;
    if settings.with_scope && parts.scope.is_none() {
        if let Some(scope) = infer_scope(summary) {
            debug!("Model gave no scope, using '{}' from changed paths", scope);
            parts.scope = Some(scope);
            scope_inferred = true;
        }
    }

    let formatted = format(&parts);
    if formatted.description_truncated {
        warn!("Description was longer than allowed and has been shortened");
    }

    Ok(GeneratedMessage {
        message: formatted.message,
        parts,
        classification,
        template: prompt.template,
        truncation: prompt.truncation,
        description_truncated: formatted.description_truncated,
        fallback: parsed.fallback,
        scope_inferred,
        raw_response,
    })
}

/// What the reviewer decided about a generated message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Commit with this (possibly edited) message.
    Commit(String),
    /// Leave the repository untouched.
    Abort,
}

/// How [`generate_and_commit`] ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed(String),
    Aborted,
}

/// Generate a message, hand it to `review`, and commit only on
/// [`Decision::Commit`].
///
/// A generation or review error returns before `repo` is touched.
pub async fn generate_and_commit<V, C, F>(
    repo: &V,
    summary: &DiffSummary,
    settings: &Settings,
    client: &C,
    review: F,
) -> Result<CommitOutcome, PipelineError>
where
    V: VersionControl + ?Sized,
    C: ModelClient + ?Sized,
    F: FnOnce(GeneratedMessage) -> Result<Decision, PipelineError>,
{
    let generated = generate_message(summary, settings, client).await?;
    match review(generated)? {
        Decision::Commit(message) => {
            let id = repo.commit(&message)?;
            info!("Created commit {}", id);
            Ok(CommitOutcome::Committed(id))
        }
        Decision::Abort => {
            debug!("Message rejected, nothing committed");
            Ok(CommitOutcome::Aborted)
        }
    }
}

/// A message edited by the user, after re-validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewedMessage {
    pub message: String,
    /// Problems re-formatting cannot fix; the user has to confirm these.
    pub violations: Vec<Violation>,
    /// Mechanical problems were fixed by re-formatting.
    pub repaired: bool,
}

/// Run user-edited text back through the formatter and validator.
///
/// A valid message is kept verbatim. A message with a recognisable header
/// is re-formatted. Anything else is kept as typed and its violations are
/// reported.
pub fn review_edited(text: &str) -> ReviewedMessage {
    let text = text.trim();
    let report = validate(text);
    if report.is_valid() {
        return ReviewedMessage {
            message: text.to_string(),
            violations: Vec::new(),
            repaired: false,
        };
    }

    let violations: Vec<Violation> = report.non_mechanical().cloned().collect();
    match parse_message(text) {
        Ok(parts) if violations.is_empty() => {
            let formatted = format(&parts);
            debug!(
                "Re-formatted edited message to fix {} violations",
                report.violations.len()
            );
            ReviewedMessage {
                message: formatted.message,
                violations,
                repaired: true,
            }
        }
        _ => ReviewedMessage {
            message: text.to_string(),
            violations,
            repaired: false,
        },
    }
}

/// Human-readable summary of the staged changes and their classification.
pub fn analysis_report(summary: &DiffSummary) -> String {
    let classification = classify_detailed(summary);
    let rule = classification
        .rule
        .map(|r| r.to_string())
        .unwrap_or_else(|| "none".to_string());
    let scope = infer_scope(summary).unwrap_or_else(|| "none".to_string());

    format!(
        "Files:\n{}\n\nChange type: {} (rule: {})\nSuggested scope: {}",
        file_summary(summary),
        classification.change_type,
        rule,
        scope
    )
}
