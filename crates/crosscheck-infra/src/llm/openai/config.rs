//! Configuration for the OpenAI backend.

use std::time::Duration;

use secrecy::SecretString;

pub const PROVIDER_NAME: &str = "openai";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Used to construct an [`super::OpenAiGateway`].
pub struct OpenAiConfig {
    /// Base URL for the API (e.g., "https://api.openai.com/v1").
    pub base_url: String,
    pub api_key: SecretString,
    /// Model identifier (e.g., "gpt-4o").
    pub model: String,
    /// Upper bound for a single HTTP call.
    pub timeout: Duration,
}

/// OpenAI default configuration.
pub fn openai_defaults(api_key: SecretString, model: &str) -> OpenAiConfig {
    OpenAiConfig {
        base_url: DEFAULT_BASE_URL.into(),
        api_key,
        model: model.into(),
        timeout: DEFAULT_TIMEOUT,
    }
}

impl OpenAiConfig {
    /// Replace the base URL when one is configured.
    pub fn with_base_url(mut self, base_url: Option<&str>) -> Self {
        if let Some(url) = base_url.map(str::trim).filter(|u| !u.is_empty()) {
            self.base_url = url.trim_end_matches('/').to_string();
        }
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_override() {
        let config = openai_defaults(SecretString::from("sk-test".to_string()), "gpt-4o");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);

        let config = config.with_base_url(Some("http://localhost:4000/v1/"));
        assert_eq!(config.base_url, "http://localhost:4000/v1");

        let config = config.with_base_url(Some("  "));
        assert_eq!(config.base_url, "http://localhost:4000/v1");

        let config = config.with_timeout(Duration::from_secs(5));
        assert_eq!(config.timeout, Duration::from_secs(5));
    }
}
