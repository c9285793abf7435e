/// LLM client: the single point of entry for all completion API calls.
///
/// ARCHITECTURAL RULE: No other module may call the completion API directly.
/// All LLM interactions MUST go through this module.
///
/// Model, temperature and token cap are hardcoded. Every call is a single
/// attempt: there is no retry or backoff at this layer.
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// The model used for all tailoring calls.
pub const MODEL: &str = "gpt-4";
const TEMPERATURE: f64 = 0.7;
const MAX_TOKENS: u32 = 2000;
const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("completion service unreachable: {0}")]
    Unavailable(#[from] reqwest::Error),

    #[error("authentication failed")]
    AuthenticationFailed { message: Option<String> },

    #[error("rate limited")]
    RateLimited { message: Option<String> },

    #[error("API error (status {status})")]
    Api {
        status: u16,
        message: Option<String>,
    },

    #[error("malformed completion response: {0}")]
    Protocol(String),
}

impl LlmError {
    /// The error text the upstream service put in its response body, if any.
    pub fn upstream_message(&self) -> Option<&str> {
        match self {
            LlmError::AuthenticationFailed { message }
            | LlmError::RateLimited { message }
            | LlmError::Api { message, .. } => message.as_deref(),
            LlmError::Unavailable(_) | LlmError::Protocol(_) => None,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

/// The single LLM client used by the tailoring workflow.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl LlmClient {
    pub fn new(api_key: String, base_url: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            api_key,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
        })
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Sends `prompt` as a single user message and returns the first choice's text.
    pub async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        if !self.has_api_key() {
            return Err(LlmError::AuthenticationFailed { message: None });
        }

        let request_body = ChatCompletionRequest {
            model: MODEL,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("Completion API returned {status}");
            let message = parse_error_message(&body);
            return Err(match status {
                StatusCode::UNAUTHORIZED => LlmError::AuthenticationFailed { message },
                StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimited { message },
                _ => LlmError::Api {
                    status: status.as_u16(),
                    message,
                },
            });
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&body)
            .map_err(|e| LlmError::Protocol(format!("undecodable body: {e}")))?;

        if let Some(usage) = &parsed.usage {
            debug!(
                "Completion succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .ok_or_else(|| LlmError::Protocol("response has no choices".to_string()))
    }
}

/// Pulls `error.message` (or a bare string `error`) out of an upstream error body.
fn parse_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let error = value.get("error")?;
    error
        .get("message")
        .and_then(|m| m.as_str())
        .or_else(|| error.as_str())
        .filter(|m| !m.trim().is_empty())
        .map(String::from)
}
