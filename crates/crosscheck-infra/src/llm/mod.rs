//! Model backend implementations.
//!
//! Contains the concrete [`ModelGateway`](crosscheck_core::llm::gateway::ModelGateway)
//! implementations for both backends, a factory ([`build_gateways`]) that
//! wires them from configuration, and a connection check
//! ([`check_connection`]) for the `doctor` command.

pub mod gemini;
pub mod openai;

use std::time::Duration;

use secrecy::SecretString;

use crosscheck_core::llm::box_gateway::BoxModelGateway;
use crosscheck_core::llm::discovery::ModelSelector;
use crosscheck_types::config::BackendsConfig;
use crosscheck_types::llm::{GatewayError, GenerateRequest};

use self::gemini::GeminiGateway;
use self::openai::OpenAiGateway;
use crate::secret::ApiCredentials;

/// Build the backend A gateway from configuration.
///
/// Exposed separately because model listing needs the concrete type.
pub fn gemini_gateway(
    config: &BackendsConfig,
    api_key: SecretString,
) -> Result<GeminiGateway, GatewayError> {
    let selector = ModelSelector::new(
        config.gemini_model_preferences.clone(),
        config.gemini_default_model.clone(),
    );
    let gateway = GeminiGateway::new(
        api_key,
        selector,
        Duration::from_secs(config.request_timeout_secs),
    )?;
    Ok(match config.gemini_base_url.as_deref() {
        Some(url) if !url.trim().is_empty() => gateway.with_base_url(url.trim()),
        _ => gateway,
    })
}

/// Build the backend B gateway from configuration.
pub fn openai_gateway(
    config: &BackendsConfig,
    api_key: SecretString,
) -> Result<OpenAiGateway, GatewayError> {
    let oai_config = openai::config::openai_defaults(api_key, &config.openai_model)
        .with_base_url(config.openai_base_url.as_deref())
        .with_timeout(Duration::from_secs(config.request_timeout_secs));
    OpenAiGateway::new(oai_config)
}

/// Create both gateways, backend A first.
pub fn build_gateways(
    config: &BackendsConfig,
    credentials: &ApiCredentials,
) -> Result<(BoxModelGateway, BoxModelGateway), GatewayError> {
    let a = gemini_gateway(config, credentials.gemini_api_key.clone())?;
    let b = openai_gateway(config, credentials.openai_api_key.clone())?;
    tracing::debug!(openai_model = %config.openai_model, "gateways built");
    Ok((BoxModelGateway::new(a), BoxModelGateway::new(b)))
}

/// Verify a backend answers by sending a minimal generation request.
///
/// Returns the model that answered.
pub async fn check_connection(gateway: &BoxModelGateway) -> Result<String, GatewayError> {
    let model = gateway.active_model().await;
    let request = GenerateRequest::new("Reply with the single word: pong").with_max_output_tokens(256);
    gateway.generate(&request).await?;
    Ok(model)
}
