//! Terminal review of a generated message: accept, edit or reject.

use std::env;
use std::io::Write;
use std::process::Command;

use dialoguer::{Confirm, Select};
use tracing::debug;

use crate::error::InteractiveError;

const EDITOR_FALLBACKS: [&str; 3] = ["nano", "vim", "vi"];

const EDIT_HELP: &str = "\n\
# Edit the commit message above. Lines starting with '#' are ignored.\n\
# An empty message aborts the commit.\n";

/// What the user decided about a proposed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewChoice {
    Accept,
    Edit,
    Reject,
}

impl ReviewChoice {
    const ALL: [ReviewChoice; 3] = [ReviewChoice::Accept, ReviewChoice::Edit, ReviewChoice::Reject];

    fn label(self) -> &'static str {
        match self {
            ReviewChoice::Accept => "Commit with this message",
            ReviewChoice::Edit => "Edit the message",
            ReviewChoice::Reject => "Abort",
        }
    }
}

/// Ask what to do with the proposed message. Escape counts as reject.
pub fn prompt_review() -> Result<ReviewChoice, InteractiveError> {
    let labels: Vec<&str> = ReviewChoice::ALL.iter().map(|c| c.label()).collect();
    let selected = Select::new()
        .with_prompt("What next?")
        .items(&labels)
        .default(0)
        .interact_opt()?;
    Ok(selected
        .and_then(|idx| ReviewChoice::ALL.get(idx).copied())
        .unwrap_or(ReviewChoice::Reject))
}

/// Yes/no question, `default` on plain Enter.
pub fn confirm(prompt: &str, default: bool) -> Result<bool, InteractiveError> {
    Ok(Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()?)
}

/// Pick the editor command.
///
/// Order: the configured editor, `$VISUAL`, `$EDITOR`, then the first of
/// `nano`, `vim`, `vi` found on `PATH`.
pub fn resolve_editor(configured: Option<&str>) -> Result<String, InteractiveError> {
    let from_env = |key: &str| env::var(key).ok().filter(|v| !v.trim().is_empty());

    if let Some(editor) = configured
        .map(str::to_string)
        .filter(|v| !v.trim().is_empty())
        .or_else(|| from_env("VISUAL"))
        .or_else(|| from_env("EDITOR"))
    {
        return Ok(editor.trim().to_string());
    }

    EDITOR_FALLBACKS
        .iter()
        .find(|name| which::which(name).is_ok())
        .map(|name| name.to_string())
        .ok_or(InteractiveError::NoEditor)
}

/// Open `message` in `editor` and return the edited text without comments.
///
/// `editor` may carry arguments, e.g. `code --wait`.
pub fn edit_message(message: &str, editor: &str) -> Result<String, InteractiveError> {
    let mut file = tempfile::Builder::new()
        .prefix("COMMIT_EDITMSG")
        .suffix(".txt")
        .tempfile()?;
    file.write_all(message.as_bytes())?;
    file.write_all(b"\n")?;
    file.write_all(EDIT_HELP.as_bytes())?;
    file.flush()?;

    let (program, args) = editor_command(editor)?;
    debug!("Launching editor {} on {}", editor, file.path().display());

    let status = Command::new(program)
        .args(args)
        .arg(file.path())
        .status()?;
    if !status.success() {
        return Err(InteractiveError::EditorFailed {
            editor: editor.to_string(),
            status: status.to_string(),
        });
    }

    let edited = std::fs::read_to_string(file.path())?;
    Ok(strip_comments(&edited))
}

/// Split an editor setting into program and arguments with shell quoting,
/// so `"/Applications/Sublime Text.app/bin/subl" -w` keeps its path whole.
pub fn editor_command(editor: &str) -> Result<(String, Vec<String>), InteractiveError> {
    let mut words = shell_words::split(editor)
        .map_err(|err| InteractiveError::InvalidEditor {
            editor: editor.to_string(),
            reason: err.to_string(),
        })?
        .into_iter();
    let program = words.next().ok_or(InteractiveError::NoEditor)?;
    Ok((program, words.collect()))
}

/// Drop `#` comment lines and surrounding blank lines.
pub fn strip_comments(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
