//! committy - proposes Conventional Commit messages for staged git changes.
//!
//! # Overview
//!
//! The staged diff is parsed into a [`DiffSummary`], classified, turned into
//! a prompt for a local Ollama model, and the model's answer is parsed and
//! formatted into a conventional commit message that the user reviews
//! before anything is committed.

pub mod classify;
pub mod config;
pub mod diff;
pub mod error;
pub mod git;
pub mod interactive;
pub mod llm;
pub mod message;
pub mod pipeline;
pub mod prompt;

// Re-export commonly used types
pub use classify::{ChangeType, Classification, classify};
pub use config::{MessageFormat, Settings};
pub use diff::{DiffSummary, FileChange, parse_diff};
pub use error::{
    ConfigError, GitError, InteractiveError, ModelError, ParseError, PipelineError, PromptError,
};
pub use llm::{ModelClient, OllamaClient};
pub use message::{CommitType, MessageParts};
pub use pipeline::{GeneratedMessage, generate_message};
