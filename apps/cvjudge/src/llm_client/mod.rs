/// LLM Client — the single point of entry for all text-generation calls.
///
/// ARCHITECTURAL RULE: judges and the generation stage only see the
/// `TextGenerator` trait. Provider wire formats stay inside this module.
///
/// No retries: a failed call is returned to the caller, which checkpoints and aborts.
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::ProviderCredentials;

#[cfg(test)]
pub mod mock;
pub mod prompts;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1024;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// Supported text-generation backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    Gemini,
    Anthropic,
    /// Any OpenAI-compatible server, e.g. a GPT4All instance running a Llama model.
    Local,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Provider::OpenAi => "openai",
            Provider::Gemini => "gemini",
            Provider::Anthropic => "anthropic",
            Provider::Local => "local",
        };
        f.write_str(name)
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "gemini" => Ok(Provider::Gemini),
            "anthropic" => Ok(Provider::Anthropic),
            "local" => Ok(Provider::Local),
            other => Err(format!(
                "unknown provider '{other}' (expected openai, gemini, anthropic or local)"
            )),
        }
    }
}

/// The one operation the pipeline depends on: prompt in, completion text out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, temperature: f32) -> Result<String, LlmError>;

    /// Model identifier, for logs.
    fn model(&self) -> &str;
}

// ────────────────────────────────────────────────────────────────────────────
// Wire formats
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    role: &'a str,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiCandidatePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidatePart {
    text: Option<String>,
}

/// All three providers report failures as `{"error": {"message": ...}}`.
#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

/// HTTP-backed `TextGenerator` for one provider and model.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    provider: Provider,
    model: String,
    base_url: String,
    api_key: Option<String>,
}

impl LlmClient {
    pub fn new(
        provider: Provider,
        model: impl Into<String>,
        credentials: ProviderCredentials,
    ) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(credentials.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            provider,
            model: model.into(),
            base_url: credentials.base_url,
            api_key: credentials.api_key,
        })
    }

    fn build_request(&self, prompt: &str, temperature: f32) -> RequestBuilder {
        let messages = vec![ChatMessage {
            role: "user",
            content: prompt,
        }];

        match self.provider {
            Provider::OpenAi | Provider::Local => {
                let mut request = self
                    .client
                    .post(format!("{}/chat/completions", self.base_url))
                    .json(&OpenAiRequest {
                        model: &self.model,
                        messages,
                        temperature,
                    });
                if let Some(key) = &self.api_key {
                    request = request.bearer_auth(key);
                }
                request
            }
            Provider::Anthropic => self
                .client
                .post(format!("{}/messages", self.base_url))
                .header("x-api-key", self.api_key.as_deref().unwrap_or_default())
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&AnthropicRequest {
                    model: &self.model,
                    max_tokens: MAX_TOKENS,
                    temperature,
                    messages,
                }),
            Provider::Gemini => self
                .client
                .post(format!(
                    "{}/models/{}:generateContent",
                    self.base_url, self.model
                ))
                .header("x-goog-api-key", self.api_key.as_deref().unwrap_or_default())
                .json(&GeminiRequest {
                    contents: vec![GeminiContent {
                        role: "user",
                        parts: vec![GeminiPart { text: prompt }],
                    }],
                    generation_config: GeminiGenerationConfig { temperature },
                }),
        }
    }

    fn extract_text(&self, body: &str) -> Result<String, LlmError> {
        let text = match self.provider {
            Provider::OpenAi | Provider::Local => {
                let response: OpenAiResponse = serde_json::from_str(body)?;
                response
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.message.content)
            }
            Provider::Anthropic => {
                let response: AnthropicResponse = serde_json::from_str(body)?;
                response
                    .content
                    .into_iter()
                    .find(|b| b.block_type == "text")
                    .and_then(|b| b.text)
            }
            Provider::Gemini => {
                let response: GeminiResponse = serde_json::from_str(body)?;
                response
                    .candidates
                    .into_iter()
                    .next()
                    .and_then(|c| c.content)
                    .map(|c| {
                        c.parts
                            .into_iter()
                            .filter_map(|p| p.text)
                            .collect::<String>()
                    })
            }
        };

        // A blank answer is still an answer; callers score it as unparseable.
        let text = text.ok_or(LlmError::EmptyContent)?;
        Ok(if text.trim().is_empty() { String::new() } else { text })
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn generate(&self, prompt: &str, temperature: f32) -> Result<String, LlmError> {
        debug!(
            provider = %self.provider,
            model = %self.model,
            prompt_chars = prompt.len(),
            "LLM call"
        );

        let response = self.build_request(prompt, temperature).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let text = self.extract_text(&body)?;
        debug!(model = %self.model, response_chars = text.len(), "LLM call succeeded");
        Ok(text)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
