//! Text generation backends.
//!
//! The pipeline only sees the [`ModelClient`] trait; [`OllamaClient`] is the
//! HTTP implementation talking to a local Ollama server.

pub mod ollama;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{self, Settings};
use crate::error::ModelError;

pub use ollama::OllamaClient;

/// Sampling parameters passed to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParameters {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub repeat_penalty: f32,
    pub max_tokens: u32,
    pub stop_sequences: Vec<String>,
}

impl Default for GenerationParameters {
    fn default() -> Self {
        Self {
            temperature: config::DEFAULT_TEMPERATURE,
            top_p: config::DEFAULT_TOP_P,
            top_k: config::DEFAULT_TOP_K,
            repeat_penalty: config::DEFAULT_REPEAT_PENALTY,
            max_tokens: config::DEFAULT_MAX_TOKENS,
            stop_sequences: config::default_stop_sequences(),
        }
    }
}

/// One generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub model: String,
    pub parameters: GenerationParameters,
    /// Upper bound for the whole request.
    pub timeout: Duration,
}

impl GenerationRequest {
    pub fn from_settings(prompt: impl Into<String>, settings: &Settings) -> Self {
        Self {
            prompt: prompt.into(),
            model: settings.model.clone(),
            parameters: GenerationParameters {
                temperature: settings.temperature,
                top_p: settings.top_p,
                top_k: settings.top_k,
                repeat_penalty: settings.repeat_penalty,
                max_tokens: settings.max_tokens,
                stop_sequences: settings.stop_sequences.clone(),
            },
            timeout: settings.timeout,
        }
    }
}

/// A model installed on the server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub modified_at: Option<String>,
}

/// Backend able to turn a prompt into text.
///
/// This abstraction allows mocking the model in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Run one generation and return the raw response text.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ModelError>;

    /// List the models the server can run.
    async fn list_models(&self) -> Result<Vec<ModelInfo>, ModelError>;
}
