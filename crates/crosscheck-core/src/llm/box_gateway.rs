//! BoxModelGateway -- object-safe dynamic dispatch wrapper for ModelGateway.
//!
//! 1. Define an object-safe `ModelGatewayDyn` trait with boxed futures
//! 2. Blanket-impl `ModelGatewayDyn` for all `T: ModelGateway`
//! 3. `BoxModelGateway` wraps `Box<dyn ModelGatewayDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use crosscheck_types::llm::{Backend, GatewayError, GenerateRequest};

use super::gateway::ModelGateway;

/// Object-safe version of [`ModelGateway`] with boxed futures.
pub trait ModelGatewayDyn: Send + Sync {
    fn backend(&self) -> Backend;

    fn provider_name(&self) -> &str;

    fn active_model_boxed<'a>(&'a self) -> Pin<Box<dyn Future<Output = String> + Send + 'a>>;

    fn generate_boxed<'a>(
        &'a self,
        request: &'a GenerateRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String, GatewayError>> + Send + 'a>>;
}

impl<T: ModelGateway> ModelGatewayDyn for T {
    fn backend(&self) -> Backend {
        ModelGateway::backend(self)
    }

    fn provider_name(&self) -> &str {
        ModelGateway::provider_name(self)
    }

    fn active_model_boxed<'a>(&'a self) -> Pin<Box<dyn Future<Output = String> + Send + 'a>> {
        Box::pin(self.active_model())
    }

    fn generate_boxed<'a>(
        &'a self,
        request: &'a GenerateRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String, GatewayError>> + Send + 'a>> {
        Box::pin(self.generate(request))
    }
}

/// Type-erased gateway so the orchestrator can hold two different backends.
///
/// Since `ModelGateway` uses RPITIT, it cannot be used as a trait object
/// directly; this wrapper provides the same methods over `dyn ModelGatewayDyn`.
pub struct BoxModelGateway {
    inner: Box<dyn ModelGatewayDyn + Send + Sync>,
}

impl BoxModelGateway {
    pub fn new<T: ModelGateway + 'static>(gateway: T) -> Self {
        Self {
            inner: Box::new(gateway),
        }
    }

    pub fn backend(&self) -> Backend {
        self.inner.backend()
    }

    pub fn provider_name(&self) -> &str {
        self.inner.provider_name()
    }

    pub async fn active_model(&self) -> String {
        self.inner.active_model_boxed().await
    }

    pub async fn generate(&self, request: &GenerateRequest) -> Result<String, GatewayError> {
        self.inner.generate_boxed(request).await
    }
}

impl std::fmt::Debug for BoxModelGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxModelGateway")
            .field("backend", &self.backend())
            .field("provider", &self.provider_name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl ModelGateway for Echo {
        fn backend(&self) -> Backend {
            Backend::B
        }

        fn provider_name(&self) -> &str {
            "echo"
        }

        async fn active_model(&self) -> String {
            "echo-1".to_string()
        }

        async fn generate(&self, request: &GenerateRequest) -> Result<String, GatewayError> {
            if request.is_blank() {
                return Err(GatewayError::EmptyPrompt);
            }
            Ok(request.prompt.clone())
        }
    }

    #[tokio::test]
    async fn test_box_gateway_delegates() {
        let gateway = BoxModelGateway::new(Echo);
        assert_eq!(gateway.backend(), Backend::B);
        assert_eq!(gateway.provider_name(), "echo");
        assert_eq!(gateway.active_model().await, "echo-1");
        assert_eq!(
            gateway.generate(&GenerateRequest::new("ping")).await.unwrap(),
            "ping"
        );
        assert_eq!(
            gateway.generate(&GenerateRequest::new("  ")).await,
            Err(GatewayError::EmptyPrompt)
        );
    }

    #[test]
    fn test_debug_does_not_panic() {
        let gateway = BoxModelGateway::new(Echo);
        let debug = format!("{gateway:?}");
        assert!(debug.contains("echo"));
    }
}
