use super::models::{Model, Usage};
use crate::config::EngineConfig;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// OpenRouter chat-completions endpoint
const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Rate limit retry configuration
const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 2000;
const BACKOFF_MULTIPLIER: u64 = 2;

/// Failure at the remote completion boundary.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompletionError {
    #[error("invalid or missing API key")]
    Auth,
    #[error("request rejected: {0}")]
    Validation(String),
    #[error("rate limited after {retries} retries")]
    RateLimited { retries: u32 },
    #[error("server error ({status})")]
    Server { status: u16 },
    #[error("network error: {0}")]
    Network(String),
    #[error("timed out")]
    Timeout,
    #[error("empty response")]
    EmptyResponse,
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl CompletionError {
    /// Fatal errors reach the caller instead of degrading to an empty result.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CompletionError::Auth | CompletionError::Validation(_))
    }
}

/// One prompt for the remote model.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: Option<String>,
    pub user: String,
    pub json: bool,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Prompt {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            system: None,
            user: text.into(),
            json: false,
            max_tokens: 500,
            temperature: 0.0,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn json(mut self) -> Self {
        self.json = true;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// The single async capability the engine needs from a language model.
pub trait Completer: Send + Sync {
    fn complete<'a>(
        &'a self,
        prompt: &'a Prompt,
    ) -> Pin<Box<dyn Future<Output = Result<String, CompletionError>> + Send + 'a>>;
}

/// Response from the model including usage stats
#[derive(Debug)]
pub struct LlmResponse {
    pub content: String,
    pub usage: Option<Usage>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Deserialize)]
struct MessageContent {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions client for OpenRouter-compatible endpoints.
#[derive(Debug, Clone)]
pub struct HttpCompleter {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: Model,
}

impl HttpCompleter {
    pub fn new(config: &EngineConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.remote_timeout_ms))
            .build()
            .unwrap_or_default();
        Self {
            client,
            endpoint: OPENROUTER_URL.to_string(),
            api_key: config.resolve_api_key(),
            model: Model::new(config.model.clone()),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    /// Call the endpoint, retrying with exponential backoff on HTTP 429.
    pub async fn complete_with_usage(&self, prompt: &Prompt) -> Result<LlmResponse, CompletionError> {
        let api_key = self.api_key.as_deref().ok_or(CompletionError::Auth)?;

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = prompt.system.as_deref() {
            messages.push(Message {
                role: "system",
                content: system,
            });
        }
        messages.push(Message {
            role: "user",
            content: &prompt.user,
        });

        let request = ChatRequest {
            model: self.model.id(),
            messages,
            max_tokens: prompt.max_tokens.min(self.model.max_tokens()),
            temperature: prompt.temperature,
            stream: false,
            response_format: prompt.json.then_some(ResponseFormat {
                format_type: "json_object",
            }),
        };

        let mut retry_count = 0;
        loop {
            let response = self
                .client
                .post(&self.endpoint)
                .header("Content-Type", "application/json")
                .header("X-Title", "Wordwise")
                .header("Authorization", format!("Bearer {}", api_key))
                .json(&request)
                .send()
                .await
                .map_err(map_transport_error)?;

            let status = response.status();
            let text = response.text().await.map_err(map_transport_error)?;

            if status.is_success() {
                let parsed: ChatResponse = serde_json::from_str(&text).map_err(|e| {
                    CompletionError::Malformed(format!("{}: {}", e, truncate_str(&text, 200)))
                })?;
                let content = parsed
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.message.content)
                    .unwrap_or_default();
                if content.trim().is_empty() {
                    return Err(CompletionError::EmptyResponse);
                }
                return Ok(LlmResponse {
                    content,
                    usage: parsed.usage,
                });
            }

            if status.as_u16() == 429 && retry_count < MAX_RETRIES {
                retry_count += 1;
                let retry_after = parse_retry_after(&text).unwrap_or_else(|| {
                    (INITIAL_BACKOFF_MS * BACKOFF_MULTIPLIER.pow(retry_count - 1)) / 1000
                });
                tracing::warn!(
                    retry_after_secs = retry_after,
                    attempt = retry_count,
                    max = MAX_RETRIES,
                    "completion rate limited; backing off"
                );
                tokio::time::sleep(Duration::from_secs(retry_after)).await;
                continue;
            }

            return Err(match status.as_u16() {
                401 | 403 => CompletionError::Auth,
                400 | 422 => CompletionError::Validation(truncate_str(&text, 200).to_string()),
                429 => CompletionError::RateLimited {
                    retries: retry_count,
                },
                code @ 500..=599 => CompletionError::Server { status: code },
                code => CompletionError::Validation(format!(
                    "API error {}: {}",
                    code,
                    truncate_str(&text, 200)
                )),
            });
        }
    }
}

impl Completer for HttpCompleter {
    fn complete<'a>(
        &'a self,
        prompt: &'a Prompt,
    ) -> Pin<Box<dyn Future<Output = Result<String, CompletionError>> + Send + 'a>> {
        Box::pin(async move {
            let response = self.complete_with_usage(prompt).await?;
            if let Some(usage) = &response.usage {
                tracing::debug!(
                    prompt_tokens = usage.prompt_tokens,
                    completion_tokens = usage.completion_tokens,
                    cost = usage.cost(),
                    "completion usage"
                );
            }
            Ok(response.content)
        })
    }
}

fn map_transport_error(err: reqwest::Error) -> CompletionError {
    if err.is_timeout() {
        CompletionError::Timeout
    } else {
        CompletionError::Network(err.to_string())
    }
}

/// Extract a retry-after hint ("retry after X seconds") from an error body.
fn parse_retry_after(text: &str) -> Option<u64> {
    let text_lower = text.to_lowercase();
    let pos = text_lower.find("retry")?;
    text_lower[pos..]
        .split_whitespace()
        .skip(1)
        .take(5)
        .filter_map(|word| {
            word.trim_matches(|c: char| !c.is_numeric())
                .parse::<u64>()
                .ok()
        })
        .find(|secs| *secs > 0 && *secs < 300)
}

/// Truncate a string for display (Unicode-safe)
pub(crate) fn truncate_str(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &s[..byte_idx],
        None => s,
    }
}
