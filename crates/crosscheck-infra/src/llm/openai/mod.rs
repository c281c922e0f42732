//! Backend B: OpenAI chat completions.
//!
//! Uses [`async_openai`] for type-safe request/response handling. The role
//! instruction travels as a system message, the prompt as a single user
//! message.
//!
//! The client's built-in backoff is switched off: rate-limit retries belong
//! to the caller's retry policy, and each call is bounded by the configured
//! timeout.

pub mod config;

use std::time::Duration;

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
};
use secrecy::ExposeSecret;

use crosscheck_core::llm::gateway::ModelGateway;
use crosscheck_observe::genai_attrs;
use crosscheck_types::llm::{Backend, GatewayError, GenerateRequest};

use self::config::{OpenAiConfig, PROVIDER_NAME};

/// OpenAI backend with a fixed model.
///
/// # API Key Security
///
/// Does NOT derive Debug: the `async_openai::Client` holds the API key.
pub struct OpenAiGateway {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiGateway {
    pub fn new(config: OpenAiConfig) -> Result<Self, GatewayError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Transport(format!("failed to build HTTP client: {e}")))?;
        let openai_config = OpenAIConfig::new()
            .with_api_key(config.api_key.expose_secret())
            .with_api_base(&config.base_url);
        Ok(Self {
            client: Client::build(http_client, openai_config, single_attempt()),
            model: config.model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, request: &GenerateRequest) -> CreateChatCompletionRequest {
        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::new();

        if let Some(ref role) = request.role_instruction {
            messages.push(ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessage {
                    content: ChatCompletionRequestSystemMessageContent::Text(role.clone()),
                    name: None,
                },
            ));
        }
        messages.push(ChatCompletionRequestMessage::User(
            ChatCompletionRequestUserMessage {
                content: ChatCompletionRequestUserMessageContent::Text(request.prompt.clone()),
                name: None,
            },
        ));

        CreateChatCompletionRequest {
            model: self.model.clone(),
            messages,
            max_completion_tokens: request.max_output_tokens,
            temperature: request.temperature.map(|t| t as f32),
            ..Default::default()
        }
    }
}

impl ModelGateway for OpenAiGateway {
    fn backend(&self) -> Backend {
        Backend::B
    }

    fn provider_name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn active_model(&self) -> String {
        self.model.clone()
    }

    #[tracing::instrument(
        name = "gen_ai.chat",
        skip_all,
        fields(
            gen_ai.operation.name = genai_attrs::OP_CHAT,
            gen_ai.provider.name = PROVIDER_NAME,
            gen_ai.request.model = %self.model,
            gen_ai.usage.output_tokens = tracing::field::Empty
        )
    )]
    async fn generate(&self, request: &GenerateRequest) -> Result<String, GatewayError> {
        if request.is_blank() {
            return Err(GatewayError::EmptyPrompt);
        }

        let response = self
            .client
            .chat()
            .create(self.build_request(request))
            .await
            .map_err(map_openai_error)?;

        if let Some(usage) = &response.usage {
            tracing::Span::current()
                .record(genai_attrs::GEN_AI_USAGE_OUTPUT_TOKENS, usage.completion_tokens);
        }

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();
        if content.trim().is_empty() {
            return Err(GatewayError::EmptyResponse);
        }
        Ok(content)
    }
}

/// Backoff that gives up after the first failure.
fn single_attempt() -> backoff::ExponentialBackoff {
    backoff::ExponentialBackoff {
        max_elapsed_time: Some(Duration::ZERO),
        ..Default::default()
    }
}

/// Map an `async_openai::error::OpenAIError` to a [`GatewayError`].
fn map_openai_error(err: async_openai::error::OpenAIError) -> GatewayError {
    use async_openai::error::OpenAIError;

    match &err {
        OpenAIError::ApiError(api_err) => {
            let code = api_err.code.as_deref().unwrap_or("");
            let error_type = api_err.r#type.as_deref().unwrap_or("");
            let message = api_err.message.clone();

            if code == "invalid_api_key"
                || error_type == "authentication_error"
                || message.contains("Incorrect API key")
            {
                GatewayError::AuthenticationFailed(message)
            } else if code == "rate_limit_exceeded" || error_type == "rate_limit_error" {
                GatewayError::rate_limited(message)
            } else if code == "model_not_found" {
                GatewayError::ModelNotFound(message)
            } else {
                GatewayError::provider(err.to_string())
            }
        }
        OpenAIError::Reqwest(reqwest_err) if reqwest_err.is_timeout() => {
            GatewayError::Transport(format!("request timed out: {reqwest_err}"))
        }
        OpenAIError::Reqwest(reqwest_err) => match reqwest_err.status().map(|s| s.as_u16()) {
            Some(401 | 403) => GatewayError::AuthenticationFailed(err.to_string()),
            Some(404) => GatewayError::ModelNotFound(err.to_string()),
            Some(429) => GatewayError::rate_limited(err.to_string()),
            Some(_) => GatewayError::provider(err.to_string()),
            None => GatewayError::Transport(err.to_string()),
        },
        OpenAIError::JSONDeserialize(_, content) => {
            GatewayError::provider(format!("failed to parse response: {content}"))
        }
        _ => GatewayError::provider(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crosscheck_types::llm::ErrorKind;
    use secrecy::SecretString;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    fn gateway() -> OpenAiGateway {
        OpenAiGateway::new(config::openai_defaults(
            SecretString::from("sk-test".to_string()),
            "gpt-4o",
        ))
        .unwrap()
    }

    fn local_gateway(addr: SocketAddr, timeout: Duration) -> OpenAiGateway {
        let config = config::openai_defaults(SecretString::from("sk-test".to_string()), "gpt-4o")
            .with_base_url(Some(&format!("http://{addr}/v1")))
            .with_timeout(timeout);
        OpenAiGateway::new(config).unwrap()
    }

    /// Read one HTTP request (headers plus `content-length` body).
    async fn read_request(socket: &mut TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = match socket.read(&mut chunk).await {
                Ok(0) | Err(_) => return,
                Ok(n) => n,
            };
            buf.extend_from_slice(&chunk[..n]);
            let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let headers = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
            let body_len = headers
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + body_len {
                return;
            }
        }
    }

    /// Answer every request with 429 `rate_limit_exceeded`, counting requests.
    async fn spawn_rate_limited_server() -> (SocketAddr, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let counter = Arc::clone(&counter);
                tokio::spawn(async move {
                    read_request(&mut socket).await;
                    counter.fetch_add(1, Ordering::SeqCst);
                    let body = r#"{"error":{"message":"Rate limit reached for gpt-4o","type":"requests","param":null,"code":"rate_limit_exceeded"}}"#;
                    let response = format!(
                        "HTTP/1.1 429 Too Many Requests\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });
        (addr, hits)
    }

    #[test]
    fn test_gateway_identity() {
        let gw = gateway();
        assert_eq!(gw.provider_name(), "openai");
        assert_eq!(gw.backend(), Backend::B);
        assert_eq!(gw.model(), "gpt-4o");
    }

    #[test]
    fn test_build_request_role_as_system_message() {
        let gw = gateway();
        let request = GenerateRequest::new("What is 2+2?")
            .with_role(Some("You are a math tutor"))
            .with_max_output_tokens(64);
        let req = gw.build_request(&request);

        assert_eq!(req.model, "gpt-4o");
        assert_eq!(req.max_completion_tokens, Some(64));
        assert_eq!(req.messages.len(), 2);
        assert!(matches!(
            req.messages[0],
            ChatCompletionRequestMessage::System(_)
        ));
        assert!(matches!(req.messages[1], ChatCompletionRequestMessage::User(_)));
    }

    #[test]
    fn test_build_request_without_role() {
        let req = gateway().build_request(&GenerateRequest::new("hi"));
        assert_eq!(req.messages.len(), 1);
        assert!(req.temperature.is_none());
    }

    #[tokio::test]
    async fn test_blank_prompt_rejected_without_network() {
        assert_eq!(
            gateway().generate(&GenerateRequest::new("")).await,
            Err(GatewayError::EmptyPrompt)
        );
    }

    #[tokio::test]
    async fn test_rate_limit_surfaces_after_one_request() {
        let (addr, hits) = spawn_rate_limited_server().await;
        let gw = local_gateway(addr, Duration::from_secs(10));

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            gw.generate(&GenerateRequest::new("q")),
        )
        .await
        .expect("client retried internally instead of returning");

        let err = result.unwrap_err();
        assert!(err.is_retryable(), "expected rate limit, got {err:?}");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_hung_server_hits_request_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        let gw = local_gateway(addr, Duration::from_millis(300));

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            gw.generate(&GenerateRequest::new("q")),
        )
        .await
        .expect("request timeout not applied");

        assert!(matches!(result, Err(GatewayError::Transport(_))));
    }

    #[test]
    fn test_map_openai_error_api_auth() {
        use async_openai::error::{ApiError, OpenAIError};
        let api_err = ApiError {
            message: "Incorrect API key provided".to_string(),
            r#type: Some("invalid_request_error".to_string()),
            param: None,
            code: Some("invalid_api_key".to_string()),
        };
        let err = map_openai_error(OpenAIError::ApiError(api_err));
        assert_eq!(err.kind(), ErrorKind::Auth);
    }

    #[test]
    fn test_map_openai_error_rate_limit() {
        use async_openai::error::{ApiError, OpenAIError};
        let api_err = ApiError {
            message: "Rate limit reached for gpt-4o".to_string(),
            r#type: Some("requests".to_string()),
            param: None,
            code: Some("rate_limit_exceeded".to_string()),
        };
        let err = map_openai_error(OpenAIError::ApiError(api_err));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_map_openai_error_model_not_found() {
        use async_openai::error::{ApiError, OpenAIError};
        let api_err = ApiError {
            message: "The model `gpt-5o` does not exist".to_string(),
            r#type: Some("invalid_request_error".to_string()),
            param: None,
            code: Some("model_not_found".to_string()),
        };
        let err = map_openai_error(OpenAIError::ApiError(api_err));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_map_openai_error_invalid_argument() {
        use async_openai::error::OpenAIError;
        let err = map_openai_error(OpenAIError::InvalidArgument("bad arg".to_string()));
        assert_eq!(err.kind(), ErrorKind::Unknown);
        assert!(err.to_string().contains("bad arg"));
    }
}
