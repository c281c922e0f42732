//! GeminiGateway -- backend A over the Gemini REST API.
//!
//! Sends `generateContent` requests with the `x-goog-api-key` header and
//! discovers the model to use from `GET /models`. The role instruction has
//! no native slot here and is inlined ahead of the prompt.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is never logged
//! or included in `Debug` output.

use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};
use secrecy::{ExposeSecret, SecretString};

use crosscheck_core::llm::discovery::ModelSelector;
use crosscheck_core::llm::gateway::{ModelCatalog, ModelGateway};
use crosscheck_observe::genai_attrs;
use crosscheck_types::llm::{Backend, GatewayError, GenerateRequest};

use super::types::{
    Content, ErrorEnvelope, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    ListModelsResponse, Part,
};

pub const PROVIDER_NAME: &str = "gemini";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Upper bound on `models.list` pages fetched during one discovery.
const MAX_MODEL_PAGES: usize = 10;

/// Gemini backend with cached model discovery.
///
/// # API Key Security
///
/// The key is only exposed when building request headers. The struct does
/// not derive Debug.
pub struct GeminiGateway {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    selector: ModelSelector,
}

impl GeminiGateway {
    pub fn new(
        api_key: SecretString,
        selector: ModelSelector,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            selector,
        })
    }

    /// Override the base URL (proxies, regional endpoints).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn selector(&self) -> &ModelSelector {
        &self.selector
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn generate_with(
        &self,
        model: &str,
        request: &GenerateRequest,
    ) -> Result<String, GatewayError> {
        let body = build_request(request);
        let url = self.url(&format!("/models/{model}:generateContent"));

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::provider(format!("failed to parse response: {e}")))?;

        if let Some(finish) = parsed.finish_reason() {
            tracing::Span::current().record(genai_attrs::GEN_AI_RESPONSE_FINISH_REASONS, finish);
        }
        response_text(&parsed)
    }
}

/// Pull the answer out of a successful response body.
fn response_text(parsed: &GenerateContentResponse) -> Result<String, GatewayError> {
    if let Some(reason) = parsed.block_reason() {
        return Err(GatewayError::provider(format!("prompt blocked: {reason}")));
    }
    if parsed.candidates.is_empty() {
        return Err(GatewayError::provider("no candidates returned"));
    }
    match parsed.text() {
        None => Err(GatewayError::provider(format!(
            "candidate had no content (finish reason: {})",
            parsed.finish_reason().unwrap_or("unknown")
        ))),
        Some(text) if text.trim().is_empty() => Err(GatewayError::EmptyResponse),
        Some(text) => Ok(text),
    }
}

// No Debug impl: the struct holds the API key.

impl ModelCatalog for GeminiGateway {
    #[tracing::instrument(
        name = "gen_ai.list_models",
        skip_all,
        fields(
            gen_ai.operation.name = genai_attrs::OP_LIST_MODELS,
            gen_ai.provider.name = PROVIDER_NAME
        )
    )]
    async fn list_models(&self) -> Result<Vec<String>, GatewayError> {
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;

        for _ in 0..MAX_MODEL_PAGES {
            let mut query = vec![("pageSize", "100".to_string())];
            if let Some(token) = page_token.take() {
                query.push(("pageToken", token));
            }

            let response = self
                .client
                .get(self.url("/models"))
                .header("x-goog-api-key", self.api_key.expose_secret())
                .query(&query)
                .send()
                .await
                .map_err(transport_error)?;

            if !response.status().is_success() {
                return Err(error_from_response(response).await);
            }

            let page: ListModelsResponse = response.json().await.map_err(|e| {
                GatewayError::provider(format!("failed to parse model listing: {e}"))
            })?;

            models.extend(
                page.models
                    .into_iter()
                    .filter(|m| m.supports_generate_content())
                    .map(|m| m.name),
            );

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        tracing::debug!(count = models.len(), "listed generation models");
        Ok(models)
    }
}

impl ModelGateway for GeminiGateway {
    fn backend(&self) -> Backend {
        Backend::A
    }

    fn provider_name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn active_model(&self) -> String {
        self.selector.current(self).await
    }

    #[tracing::instrument(
        name = "gen_ai.generate_content",
        skip_all,
        fields(
            gen_ai.operation.name = genai_attrs::OP_GENERATE_CONTENT,
            gen_ai.provider.name = PROVIDER_NAME,
            gen_ai.request.model = tracing::field::Empty,
            gen_ai.response.finish_reasons = tracing::field::Empty
        )
    )]
    async fn generate(&self, request: &GenerateRequest) -> Result<String, GatewayError> {
        if request.is_blank() {
            return Err(GatewayError::EmptyPrompt);
        }

        let model = self.active_model().await;
        tracing::Span::current().record(genai_attrs::GEN_AI_REQUEST_MODEL, model.as_str());

        let result = self.generate_with(&model, request).await;
        if let Err(GatewayError::ModelNotFound(_)) = &result {
            tracing::warn!(model = %model, "model not found, rediscovering on next call");
            self.selector.invalidate().await;
        }
        result
    }
}

/// Prefix the prompt with the role instruction, if any.
pub fn inline_role(role: Option<&str>, prompt: &str) -> String {
    match role.map(str::trim).filter(|r| !r.is_empty()) {
        Some(role) => format!("[Instructions]\n{role}\n\n{prompt}"),
        None => prompt.to_string(),
    }
}

fn build_request(request: &GenerateRequest) -> GenerateContentRequest {
    let generation_config = if request.temperature.is_some() || request.max_output_tokens.is_some() {
        Some(GenerationConfig {
            temperature: request.temperature,
            max_output_tokens: request.max_output_tokens,
        })
    } else {
        None
    };

    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".to_string()),
            parts: vec![Part {
                text: Some(inline_role(
                    request.role_instruction.as_deref(),
                    &request.prompt,
                )),
            }],
        }],
        generation_config,
    }
}

fn transport_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Transport(format!("request timed out: {err}"))
    } else {
        GatewayError::Transport(format!("HTTP request failed: {err}"))
    }
}

async fn error_from_response(response: reqwest::Response) -> GatewayError {
    let status = response.status().as_u16();
    let retry_after_ms = parse_retry_after(response.headers());
    let body = response.text().await.unwrap_or_default();
    classify_error(status, &body, retry_after_ms)
}

fn parse_retry_after(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(|secs| secs.saturating_mul(1_000))
}

/// Map an HTTP status and Gemini error body to a [`GatewayError`].
pub(crate) fn classify_error(status: u16, body: &str, retry_after_ms: Option<u64>) -> GatewayError {
    let (message, api_status) = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => (envelope.error.message, envelope.error.status),
        Err(_) => (body.trim().to_string(), String::new()),
    };
    let message = if message.is_empty() {
        format!("HTTP {status}")
    } else {
        message
    };

    if status == 429 || api_status == "RESOURCE_EXHAUSTED" {
        return GatewayError::RateLimited {
            message,
            retry_after_ms,
        };
    }
    match status {
        401 | 403 => GatewayError::AuthenticationFailed(message),
        400 if message.contains("API key not valid") => GatewayError::AuthenticationFailed(message),
        404 => GatewayError::ModelNotFound(message),
        _ => GatewayError::provider(format!("HTTP {status}: {message}")),
    }
}
