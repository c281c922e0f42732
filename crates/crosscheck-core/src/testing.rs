//! Scripted gateways shared by the pipeline and chat tests.

use std::sync::{Arc, Mutex};

use crosscheck_types::llm::{Backend, GatewayError, GenerateRequest};
use tokio::sync::Barrier;

use crate::llm::gateway::ModelGateway;

type Responder = Box<dyn Fn(&GenerateRequest) -> Result<String, GatewayError> + Send + Sync>;

pub(crate) struct StubGateway {
    backend: Backend,
    model: String,
    respond: Responder,
    calls: Arc<Mutex<Vec<GenerateRequest>>>,
    answer_gate: Option<Arc<Barrier>>,
}

impl StubGateway {
    pub(crate) fn new(
        backend: Backend,
        respond: impl Fn(&GenerateRequest) -> Result<String, GatewayError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            backend,
            model: format!("stub-{backend}"),
            respond: Box::new(respond),
            calls: Arc::new(Mutex::new(Vec::new())),
            answer_gate: None,
        }
    }

    /// Answers "4" to questions and "looks correct" to critiques and synthesis.
    pub(crate) fn echo(backend: Backend) -> Self {
        Self::new(backend, |request| {
            if is_review_prompt(&request.prompt) {
                Ok("looks correct".to_string())
            } else {
                Ok("4".to_string())
            }
        })
    }

    /// Fails every call with `error`.
    pub(crate) fn failing(backend: Backend, error: GatewayError) -> Self {
        Self::new(backend, move |_| Err(error.clone()))
    }

    pub(crate) fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Answer calls wait on `gate` before responding.
    pub(crate) fn with_answer_gate(mut self, gate: Arc<Barrier>) -> Self {
        self.answer_gate = Some(gate);
        self
    }

    pub(crate) fn calls(&self) -> Arc<Mutex<Vec<GenerateRequest>>> {
        Arc::clone(&self.calls)
    }
}

pub(crate) fn is_review_prompt(prompt: &str) -> bool {
    prompt.starts_with("Another assistant") || prompt.starts_with("You are the chair")
}

impl ModelGateway for StubGateway {
    fn backend(&self) -> Backend {
        self.backend
    }

    fn provider_name(&self) -> &str {
        "stub"
    }

    async fn active_model(&self) -> String {
        self.model.clone()
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<String, GatewayError> {
        self.calls.lock().unwrap().push(request.clone());
        if request.is_blank() {
            return Err(GatewayError::EmptyPrompt);
        }
        if let Some(gate) = &self.answer_gate {
            if !is_review_prompt(&request.prompt) {
                gate.wait().await;
            }
        }
        (self.respond)(request)
    }
}
