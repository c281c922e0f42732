//! ModelGateway and ModelCatalog trait definitions.
//!
//! These are the core abstractions every backend adapter implements.
//! Both use RPITIT so implementations can be plain `async fn`.

use crosscheck_types::llm::{Backend, GatewayError, GenerateRequest};

/// Trait for a text generation backend.
///
/// Implementations hide the provider's request/response shapes and turn
/// every provider failure into a [`GatewayError`]; they never panic past
/// this boundary. Implementations live in crosscheck-infra.
pub trait ModelGateway: Send + Sync {
    /// Which slot of the pair this gateway fills.
    fn backend(&self) -> Backend;

    /// Human-readable provider name (e.g., "gemini", "openai").
    fn provider_name(&self) -> &str;

    /// The concrete model identifier the next call will use.
    ///
    /// For discovering backends this may trigger (and cache) discovery.
    fn active_model(&self) -> impl std::future::Future<Output = String> + Send;

    /// Generate text for a single prompt.
    ///
    /// Blank prompts fail with [`GatewayError::EmptyPrompt`] without any
    /// network traffic.
    fn generate(
        &self,
        request: &GenerateRequest,
    ) -> impl std::future::Future<Output = Result<String, GatewayError>> + Send;
}

/// Trait for backends that can list their currently enabled models.
pub trait ModelCatalog: Send + Sync {
    /// Names of models that support text generation, in provider order.
    fn list_models(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<String>, GatewayError>> + Send;
}
