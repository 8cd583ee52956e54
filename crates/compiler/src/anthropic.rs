//! Anthropic Messages API generator with retry and rate-limit handling.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{CompilerConfig, API_KEY_ENV, DEFAULT_MAX_TOKENS, DEFAULT_MODEL};
use crate::error::GeneratorError;
use crate::generator::{GenerationRequest, Generator};
use crate::prompt::{render, SYSTEM_PROMPT};

/// Anthropic Messages API endpoint.
const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";

/// Required API version header value.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Default maximum retries for transient errors.
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds (doubles each retry).
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Generator backed by the Anthropic Messages API.
pub struct AnthropicGenerator {
    api_key: String,
    model: String,
    max_tokens: u32,
    max_retries: u32,
}

impl AnthropicGenerator {
    /// Create a generator with the given API key and default model.
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Build from config; the key comes from the config or `ANTHROPIC_API_KEY`.
    pub fn from_config(config: &CompilerConfig) -> Result<Self, GeneratorError> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            GeneratorError::Config(format!(
                "{} environment variable is not set. \
                 Set it to your Anthropic API key to compile instructions.",
                API_KEY_ENV
            ))
        })?;
        Ok(Self {
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Generator for AnthropicGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GeneratorError> {
        let body = MessagesRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            system: SYSTEM_PROMPT.to_string(),
            messages: vec![ApiMessage {
                role: "user".to_string(),
                content: render(request),
            }],
        };
        let api_key = self.api_key.clone();
        let max_retries = self.max_retries;

        tracing::debug!(
            model = %self.model,
            repair = request.is_repair(),
            "calling Anthropic Messages API"
        );

        // ureq is synchronous, so wrap in spawn_blocking
        tokio::task::spawn_blocking(move || call_messages_api(&api_key, &body, max_retries))
            .await
            .map_err(|e| GeneratorError::Internal(format!("task join error: {}", e)))?
    }
}

// ── API call ─────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<ApiMessage>,
}

#[derive(Serialize)]
struct ApiMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[allow(dead_code)] // Required by serde for correct JSON deserialization
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

/// POST one request, retrying transient failures with exponential backoff.
fn call_messages_api(
    api_key: &str,
    body: &MessagesRequest,
    max_retries: u32,
) -> Result<String, GeneratorError> {
    let agent = ureq::Agent::new_with_defaults();
    let mut backoff_ms = INITIAL_BACKOFF_MS;
    let mut attempt = 0;

    let response = loop {
        let result = agent
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .send_json(body);

        match result {
            Ok(response) => break response,
            Err(e) if attempt < max_retries && is_retryable(&e) => {
                tracing::warn!(
                    attempt = attempt + 1,
                    of = max_retries + 1,
                    backoff_ms,
                    error = %e,
                    "retryable API error, backing off"
                );
                std::thread::sleep(Duration::from_millis(backoff_ms));
                backoff_ms *= 2;
                attempt += 1;
            }
            Err(e) => return Err(GeneratorError::Api(format!("API request failed: {}", e))),
        }
    };

    let resp: MessagesResponse = response
        .into_body()
        .read_json()
        .map_err(|e| GeneratorError::Parse(format!("failed to parse API response: {}", e)))?;

    resp.content
        .into_iter()
        .find_map(|block| block.text)
        .ok_or_else(|| GeneratorError::Parse("API response contained no text content".to_string()))
}

/// Rate limits, server errors, and network-level failures are worth retrying.
fn is_retryable(error: &ureq::Error) -> bool {
    match error {
        ureq::Error::StatusCode(status) => is_retryable_status(*status),
        ureq::Error::Io(_) | ureq::Error::Timeout(_) | ureq::Error::ConnectionFailed => true,
        _ => false,
    }
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503)
}
