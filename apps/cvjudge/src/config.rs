use anyhow::{Context, Result};

use crate::errors::AppError;
use crate::llm_client::Provider;

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
/// GPT4All's built-in server speaks the OpenAI chat-completions dialect on this port.
const DEFAULT_LOCAL_BASE_URL: &str = "http://localhost:4891/v1";

/// Application configuration loaded from environment variables.
/// API keys are optional here; `credentials_for` turns a missing key into a
/// configuration error only for providers a judge actually uses.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub openai_base_url: String,
    pub gemini_base_url: String,
    pub anthropic_base_url: String,
    pub local_base_url: String,
    pub timeout_secs: u64,
    pub rust_log: String,
}

/// Everything an `LlmClient` needs to reach one provider.
#[derive(Debug, Clone)]
pub struct ProviderCredentials {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            openai_api_key: optional_env("OPENAI_API_KEY"),
            gemini_api_key: optional_env("GEMINI_API_KEY"),
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            openai_base_url: env_or("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL),
            gemini_base_url: env_or("GEMINI_BASE_URL", DEFAULT_GEMINI_BASE_URL),
            anthropic_base_url: env_or("ANTHROPIC_BASE_URL", DEFAULT_ANTHROPIC_BASE_URL),
            local_base_url: env_or("LOCAL_LLM_BASE_URL", DEFAULT_LOCAL_BASE_URL),
            timeout_secs: std::env::var("LLM_TIMEOUT_SECS")
                .unwrap_or_else(|_| "120".to_string())
                .parse::<u64>()
                .context("LLM_TIMEOUT_SECS must be a whole number of seconds")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }

    /// Resolves base URL and key for a provider. The local provider needs no key.
    pub fn credentials_for(&self, provider: Provider) -> Result<ProviderCredentials, AppError> {
        let (base_url, api_key, key_var) = match provider {
            Provider::OpenAi => (
                &self.openai_base_url,
                self.openai_api_key.clone(),
                Some("OPENAI_API_KEY"),
            ),
            Provider::Gemini => (
                &self.gemini_base_url,
                self.gemini_api_key.clone(),
                Some("GEMINI_API_KEY"),
            ),
            Provider::Anthropic => (
                &self.anthropic_base_url,
                self.anthropic_api_key.clone(),
                Some("ANTHROPIC_API_KEY"),
            ),
            Provider::Local => (&self.local_base_url, None, None),
        };

        if let Some(var) = key_var {
            if api_key.is_none() {
                return Err(AppError::Config(format!(
                    "Provider '{provider}' requires environment variable '{var}'"
                )));
            }
        }

        Ok(ProviderCredentials {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            timeout_secs: self.timeout_secs,
        })
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    optional_env(key).unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_config() -> Config {
        Config {
            openai_api_key: None,
            gemini_api_key: Some("g-key".to_string()),
            anthropic_api_key: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            gemini_base_url: format!("{DEFAULT_GEMINI_BASE_URL}/"),
            anthropic_base_url: DEFAULT_ANTHROPIC_BASE_URL.to_string(),
            local_base_url: DEFAULT_LOCAL_BASE_URL.to_string(),
            timeout_secs: 30,
            rust_log: "info".to_string(),
        }
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let err = bare_config().credentials_for(Provider::OpenAi).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_present_key_resolves_and_trims_slash() {
        let creds = bare_config().credentials_for(Provider::Gemini).unwrap();
        assert_eq!(creds.api_key.as_deref(), Some("g-key"));
        assert_eq!(creds.base_url, DEFAULT_GEMINI_BASE_URL);
        assert_eq!(creds.timeout_secs, 30);
    }

    #[test]
    fn test_local_provider_needs_no_key() {
        let creds = bare_config().credentials_for(Provider::Local).unwrap();
        assert!(creds.api_key.is_none());
        assert_eq!(creds.base_url, DEFAULT_LOCAL_BASE_URL);
    }
}
