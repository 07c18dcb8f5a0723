//! Ollama HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{GenerationRequest, ModelClient, ModelInfo};
use crate::error::ModelError;

/// Default Ollama address.
pub const DEFAULT_HOST: &str = "http://localhost:11434";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for a single Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: Client,
    host: String,
    /// Bound for requests that carry no timeout of their own (model listing).
    timeout: Duration,
}

#[derive(Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions<'a>,
}

#[derive(Serialize)]
struct GenerateOptions<'a> {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    repeat_penalty: f32,
    num_predict: u32,
    stop: &'a [String],
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
    #[serde(default)]
    eval_count: Option<u64>,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl OllamaClient {
    /// Create a client for `host`. A host without a scheme gets `http://`.
    pub fn new(host: &str, timeout: Duration) -> Result<Self, ModelError> {
        let http = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(ModelError::ClientInit)?;
        Ok(Self {
            http,
            host: normalize_host(host),
            timeout,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{}", self.host, path)
    }

    fn transport_error(&self, err: reqwest::Error, timeout: Duration) -> ModelError {
        if err.is_connect() {
            ModelError::ServiceUnreachable {
                url: self.host.clone(),
                source: err,
            }
        } else if err.is_timeout() {
            ModelError::RequestTimeout(timeout)
        } else {
            ModelError::GenerationError {
                status: err.status().map(|s| s.as_u16()),
                message: err.to_string(),
            }
        }
    }

    async fn post_generate(&self, request: &GenerationRequest) -> Result<String, ModelError> {
        let body = GenerateBody {
            model: &request.model,
            prompt: &request.prompt,
            stream: false,
            options: GenerateOptions {
                temperature: request.parameters.temperature,
                top_p: request.parameters.top_p,
                top_k: request.parameters.top_k,
                repeat_penalty: request.parameters.repeat_penalty,
                num_predict: request.parameters.max_tokens,
                stop: &request.parameters.stop_sequences,
            },
        };

        let url = self.endpoint("generate");
        debug!(
            "Sending {} character prompt to {} (model {})",
            request.prompt.len(),
            url,
            request.model
        );

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e, request.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(status, &text, &request.model));
        }

        let payload: GenerateResponse =
            response
                .json()
                .await
                .map_err(|e| ModelError::GenerationError {
                    status: Some(status.as_u16()),
                    message: format!("Invalid response body: {}", e),
                })?;

        if payload.response.trim().is_empty() {
            return Err(ModelError::GenerationError {
                status: Some(status.as_u16()),
                message: "The model returned an empty response".to_string(),
            });
        }

        debug!(
            "Received {} characters ({} tokens)",
            payload.response.len(),
            payload.eval_count.unwrap_or(0)
        );
        Ok(payload.response)
    }

    async fn get_tags(&self) -> Result<Vec<ModelInfo>, ModelError> {
        let url = self.endpoint("tags");
        debug!("Listing models at {}", url);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| self.transport_error(e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ModelError::GenerationError {
                status: Some(status.as_u16()),
                message: error_message(&text),
            });
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| ModelError::GenerationError {
                status: Some(status.as_u16()),
                message: format!("Invalid model list: {}", e),
            })?;
        Ok(tags.models)
    }
}

#[async_trait]
impl ModelClient for OllamaClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ModelError> {
        tokio::time::timeout(request.timeout, self.post_generate(request))
            .await
            .map_err(|_| ModelError::RequestTimeout(request.timeout))?
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>, ModelError> {
        tokio::time::timeout(self.timeout, self.get_tags())
            .await
            .map_err(|_| ModelError::RequestTimeout(self.timeout))?
    }
}

/// Add a scheme when missing and drop trailing slashes.
fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.is_empty() {
        DEFAULT_HOST.to_string()
    } else if host.contains("://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    }
}

/// Map a non-success status to an error.
fn status_error(status: StatusCode, body: &str, model: &str) -> ModelError {
    let message = error_message(body);
    let lower = message.to_lowercase();
    if status == StatusCode::NOT_FOUND || (lower.contains("model") && lower.contains("not found")) {
        return ModelError::ModelUnavailable(model.to_string());
    }
    ModelError::GenerationError {
        status: Some(status.as_u16()),
        message,
    }
}

/// The `error` field of an Ollama error body, or the body itself.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_else(|_| body.trim().to_string())
}
