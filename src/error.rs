//! Error types for committy modules using thiserror.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors from git operations.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Failed to open repository: {0}")]
    OpenRepository(#[source] git2::Error),

    #[error("No staged changes. Stage files with 'git add' or pass --all.")]
    NoStagedChanges,

    #[error("Failed to collect diff: {0}")]
    DiffFailed(#[source] git2::Error),

    #[error("Failed to stage changes: {0}")]
    StagingFailed(#[source] git2::Error),

    #[error("Failed to create commit: {0}")]
    CommitFailed(#[source] git2::Error),

    #[error("Git config error (user.name/user.email not set?): {0}")]
    ConfigError(#[source] git2::Error),
}

/// Errors from prompt construction.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PromptError {
    #[error("The diff is empty: there is nothing to describe")]
    EmptyDiff,
}

/// Errors from the generation service.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Ollama is not reachable at {url}. Start it with 'ollama serve'.")]
    ServiceUnreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Ollama did not respond within {:.1}s. Raise the limit with --timeout.", .0.as_secs_f64())]
    RequestTimeout(Duration),

    #[error("Failed to build the HTTP client: {0}")]
    ClientInit(#[source] reqwest::Error),

    #[error("Model '{0}' is not available. Pull it with 'ollama pull {0}'.")]
    ModelUnavailable(String),

    #[error("Ollama failed to generate a response{}: {message}", status_suffix(.status))]
    GenerationError {
        status: Option<u16>,
        message: String,
    },
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

/// Errors from parsing raw model output.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("Output does not start with a conventional commit header: '{0}'")]
    UnrecognizedFormat(String),
}

/// Errors from loading or writing configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("Could not determine a config directory; pass --config <path>")]
    NoConfigDir,

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Errors from the interactive review step.
#[derive(Error, Debug)]
pub enum InteractiveError {
    #[error("Prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("No editor found. Set $EDITOR or the 'editor' config key.")]
    NoEditor,

    #[error("Editor I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Editor '{editor}' exited with status {status}")]
    EditorFailed { editor: String, status: String },

    #[error("Cannot parse editor command '{editor}': {reason}")]
    InvalidEditor { editor: String, reason: String },
}

/// Errors from the diff-to-message pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Interactive(#[from] InteractiveError),
}
