//! Pipeline orchestrator: runs one turn through the three stages.
//!
//! Stages are strictly sequential because each prompt depends on the full
//! output of the previous stage. Within stages 1 and 2 the two backend calls
//! are independent and run concurrently via `tokio::join!` unless disabled.
//!
//! Per-call failures are soft: they become marked error text in the turn and
//! the pipeline keeps going. The only hard failure here is an empty question.

use tracing::Instrument;

use crosscheck_types::document::ReferenceDocument;
use crosscheck_types::error::PipelineError;
use crosscheck_types::llm::{Backend, GatewayError, GenerateRequest};
use crosscheck_types::session::{Stage, Turn, is_error_text, skipped_text, stage_text};

use super::prompts;
use super::{PipelineEvent, PipelineStage};
use crate::event::EventBus;
use crate::llm::box_gateway::BoxModelGateway;
use crate::llm::retry::{RetryPolicy, with_retry_notify};

/// What the user submitted for one turn.
#[derive(Debug, Clone, Default)]
pub struct TurnInput {
    pub question: String,
    /// Persona applied to every call of this turn.
    pub role_instruction: Option<String>,
    pub reference: Option<ReferenceDocument>,
}

impl TurnInput {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            role_instruction: None,
            reference: None,
        }
    }

    pub fn with_role(mut self, role: Option<String>) -> Self {
        self.role_instruction = role.filter(|r| !r.trim().is_empty());
        self
    }

    pub fn with_reference(mut self, reference: Option<ReferenceDocument>) -> Self {
        self.reference = reference;
        self
    }
}

/// A stage-2/3 call is either sent or skipped with placeholder text.
enum CallPlan {
    Send(GenerateRequest),
    Skip(String),
}

pub struct Orchestrator {
    gateway_a: BoxModelGateway,
    gateway_b: BoxModelGateway,
    retry: RetryPolicy,
    concurrent: bool,
    events: Option<EventBus>,
}

impl Orchestrator {
    pub fn new(gateway_a: BoxModelGateway, gateway_b: BoxModelGateway, retry: RetryPolicy) -> Self {
        if gateway_a.backend() != Backend::A || gateway_b.backend() != Backend::B {
            tracing::warn!(
                first = %gateway_a.backend(),
                second = %gateway_b.backend(),
                "gateways passed in unexpected slots"
            );
        }
        Self {
            gateway_a,
            gateway_b,
            retry,
            concurrent: true,
            events: None,
        }
    }

    pub fn with_concurrency(mut self, concurrent: bool) -> Self {
        self.concurrent = concurrent;
        self
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn gateway(&self, backend: Backend) -> &BoxModelGateway {
        match backend {
            Backend::A => &self.gateway_a,
            Backend::B => &self.gateway_b,
        }
    }

    pub fn events(&self) -> Option<&EventBus> {
        self.events.as_ref()
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Run stages 1-3 and assemble the turn. Nothing is persisted here.
    #[tracing::instrument(
        name = "pipeline.run",
        skip_all,
        fields(question_chars = input.question.chars().count(), concurrent = self.concurrent)
    )]
    pub async fn run(&self, input: &TurnInput) -> Result<Turn, PipelineError> {
        let question = input.question.trim();
        if question.is_empty() {
            self.enter(PipelineStage::Errored);
            return Err(PipelineError::EmptyQuestion);
        }
        let role = input.role_instruction.as_deref();

        let (backend_model_id, synthesis_model_id) =
            tokio::join!(self.gateway_a.active_model(), self.gateway_b.active_model());

        // Stage 1: independent answers.
        self.enter(PipelineStage::GeneratingAnswers);
        let request = GenerateRequest::new(prompts::generation_prompt(
            question,
            input.reference.as_ref(),
        ))
        .with_role(role);
        let (answer_a, answer_b) = self
            .run_pair(
                PipelineStage::GeneratingAnswers,
                Stage::Answer,
                CallPlan::Send(request.clone()),
                CallPlan::Send(request),
            )
            .await;

        // Stage 2: each backend critiques the other's answer.
        self.enter(PipelineStage::CrossCritiquing);
        let plan_a = critique_plan(Backend::A, question, &answer_b, role);
        let plan_b = critique_plan(Backend::B, question, &answer_a, role);
        let (critique_a_of_b, critique_b_of_a) = self
            .run_pair(
                PipelineStage::CrossCritiquing,
                Stage::Critique,
                plan_a,
                plan_b,
            )
            .await;

        // Stage 3: backend B resolves everything.
        self.enter(PipelineStage::Synthesizing);
        let plan = if is_error_text(&answer_a) && is_error_text(&answer_b) {
            CallPlan::Skip(skipped_text(
                Stage::Synthesis,
                Backend::B,
                "neither backend produced an answer",
            ))
        } else {
            CallPlan::Send(
                GenerateRequest::new(prompts::synthesis_prompt(
                    question,
                    &answer_a,
                    &answer_b,
                    &critique_a_of_b,
                    &critique_b_of_a,
                ))
                .with_role(role),
            )
        };
        let synthesis = self
            .execute(PipelineStage::Synthesizing, Stage::Synthesis, Backend::B, plan)
            .await;

        let turn = Turn {
            question: question.to_string(),
            created_at: chrono::Utc::now(),
            answer_a,
            answer_b,
            critique_a_of_b,
            critique_b_of_a,
            synthesis,
            backend_model_id,
            synthesis_model_id: Some(synthesis_model_id),
            role_instruction: input.role_instruction.clone(),
            reference_name: input.reference.as_ref().map(|doc| doc.name.clone()),
        };

        let failed = turn.failed_fields();
        if failed.is_empty() {
            tracing::debug!("turn assembled");
        } else {
            tracing::warn!(failed = ?failed, "turn assembled with failed calls");
        }
        Ok(turn)
    }

    async fn run_pair(
        &self,
        stage: PipelineStage,
        kind: Stage,
        plan_a: CallPlan,
        plan_b: CallPlan,
    ) -> (String, String) {
        if self.concurrent {
            tokio::join!(
                self.execute(stage, kind, Backend::A, plan_a),
                self.execute(stage, kind, Backend::B, plan_b)
            )
        } else {
            let a = self.execute(stage, kind, Backend::A, plan_a).await;
            let b = self.execute(stage, kind, Backend::B, plan_b).await;
            (a, b)
        }
    }

    async fn execute(
        &self,
        stage: PipelineStage,
        kind: Stage,
        backend: Backend,
        plan: CallPlan,
    ) -> String {
        match plan {
            CallPlan::Skip(text) => {
                tracing::warn!(%backend, stage = stage.label(), "call skipped");
                self.publish(PipelineEvent::CallFinished {
                    stage,
                    backend,
                    ok: false,
                });
                text
            }
            CallPlan::Send(request) => {
                let result = self.call(stage, backend, &request).await;
                stage_text(kind, backend, &result)
            }
        }
    }

    async fn call(
        &self,
        stage: PipelineStage,
        backend: Backend,
        request: &GenerateRequest,
    ) -> Result<String, GatewayError> {
        let gateway = self.gateway(backend);
        let span = tracing::info_span!(
            "gen_ai.generate",
            gen_ai.system = gateway.provider_name(),
            gen_ai.operation.name = stage.label(),
            backend = %backend,
            prompt_chars = request.prompt.chars().count(),
        );

        let result = with_retry_notify(
            &self.retry,
            move || gateway.generate(request),
            |notice| {
                self.publish(PipelineEvent::Retrying {
                    stage,
                    backend,
                    notice: notice.clone(),
                })
            },
        )
        .instrument(span)
        .await;

        match &result {
            Ok(text) => tracing::debug!(%backend, stage = stage.label(), chars = text.len(), "call finished"),
            Err(e) => tracing::warn!(
                %backend,
                stage = stage.label(),
                kind = %e.kind(),
                error = %e,
                "call failed, recording error text"
            ),
        }
        self.publish(PipelineEvent::CallFinished {
            stage,
            backend,
            ok: result.as_ref().is_ok_and(|text| !text.trim().is_empty()),
        });
        result
    }

    fn enter(&self, stage: PipelineStage) {
        tracing::debug!(stage = stage.label(), "pipeline stage");
        self.publish(PipelineEvent::StageStarted(stage));
    }

    fn publish(&self, event: PipelineEvent) {
        if let Some(events) = &self.events {
            events.publish(event);
        }
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("gateway_a", &self.gateway_a)
            .field("gateway_b", &self.gateway_b)
            .field("retry", &self.retry)
            .field("concurrent", &self.concurrent)
            .finish()
    }
}

/// Critique the peer's stage-1 text, or skip when the peer has nothing to show.
fn critique_plan(critic: Backend, question: &str, peer_answer: &str, role: Option<&str>) -> CallPlan {
    let peer = critic.peer();
    if is_error_text(peer_answer) {
        return CallPlan::Skip(skipped_text(
            Stage::Critique,
            critic,
            &format!("{} produced no answer to critique", peer.label()),
        ));
    }
    CallPlan::Send(
        GenerateRequest::new(prompts::critique_prompt(question, peer, peer_answer)).with_role(role),
    )
}
