//! Chat service: run a turn, then commit it to the active session.
//!
//! ChatService coordinates the `Orchestrator` and the `SessionBook`. A turn
//! is appended if and only if the pipeline and the save both succeed; any
//! hard failure aborts the turn and leaves the session untouched.

use tracing::{error, info};

use crosscheck_types::error::PipelineError;
use crosscheck_types::session::Turn;

use crate::pipeline::{Orchestrator, PipelineEvent, PipelineStage, TurnInput};
use crate::session::{SessionBook, SessionStore};

/// Generic over `SessionStore` so crosscheck-core never depends on
/// crosscheck-infra.
pub struct ChatService<S: SessionStore> {
    orchestrator: Orchestrator,
    book: SessionBook<S>,
}

impl<S: SessionStore> ChatService<S> {
    pub fn new(orchestrator: Orchestrator, book: SessionBook<S>) -> Self {
        Self { orchestrator, book }
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn book(&self) -> &SessionBook<S> {
        &self.book
    }

    /// Session management (new/select/rename/delete/clear) goes through here.
    pub fn book_mut(&mut self) -> &mut SessionBook<S> {
        &mut self.book
    }

    /// Run one turn against the active session.
    pub async fn ask(&mut self, input: &TurnInput) -> Result<Turn, PipelineError> {
        match self.run_and_commit(input).await {
            Ok((turn, turn_count)) => {
                info!(
                    session = self.book.active_index(),
                    turn_count,
                    failed = turn.failed_fields().len(),
                    "turn committed"
                );
                self.publish(PipelineEvent::StageStarted(PipelineStage::Complete));
                self.publish(PipelineEvent::TurnCommitted { turn_count });
                Ok(turn)
            }
            Err(e) => {
                error!(error = %e, "turn aborted");
                self.publish(PipelineEvent::StageStarted(PipelineStage::Errored));
                self.publish(PipelineEvent::TurnAborted {
                    reason: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn run_and_commit(&mut self, input: &TurnInput) -> Result<(Turn, usize), PipelineError> {
        let turn = self.orchestrator.run(input).await?;
        let turn_count = self.book.commit_turn(turn.clone()).await?;
        Ok((turn, turn_count))
    }

    fn publish(&self, event: PipelineEvent) {
        if let Some(events) = self.orchestrator.events() {
            events.publish(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventBus;
    use crate::llm::box_gateway::BoxModelGateway;
    use crate::llm::retry::RetryPolicy;
    use crate::session::MemorySessionStore;
    use crate::testing::StubGateway;
    use crosscheck_types::llm::{Backend, GatewayError};

    async fn service(a: StubGateway, b: StubGateway, bus: EventBus) -> ChatService<MemorySessionStore> {
        let orchestrator = Orchestrator::new(
            BoxModelGateway::new(a),
            BoxModelGateway::new(b),
            RetryPolicy::no_retry(),
        )
        .with_events(bus);
        let book = SessionBook::open(MemorySessionStore::new()).await.unwrap();
        ChatService::new(orchestrator, book)
    }

    #[tokio::test]
    async fn test_ask_appends_exactly_one_turn() {
        let bus = EventBus::new(64);
        let mut rx = bus.subscribe();
        let mut svc = service(
            StubGateway::echo(Backend::A),
            StubGateway::echo(Backend::B),
            bus,
        )
        .await;

        let before = svc.book().active().len();
        let turn = svc.ask(&TurnInput::new("What is 2+2?")).await.unwrap();
        assert_eq!(turn.synthesis, "looks correct");
        assert_eq!(svc.book().active().len(), before + 1);
        assert_eq!(svc.book().store().snapshot()[0].turns()[0], turn);

        let mut committed = false;
        while let Ok(event) = rx.try_recv() {
            if event == (PipelineEvent::TurnCommitted { turn_count: 1 }) {
                committed = true;
            }
        }
        assert!(committed);
    }

    #[tokio::test]
    async fn test_soft_failures_still_commit() {
        let mut svc = service(
            StubGateway::failing(Backend::A, GatewayError::AuthenticationFailed("401".into())),
            StubGateway::echo(Backend::B),
            EventBus::default(),
        )
        .await;

        let turn = svc.ask(&TurnInput::new("q")).await.unwrap();
        assert!(!turn.is_fully_successful());
        assert_eq!(svc.book().active().len(), 1);
    }

    #[tokio::test]
    async fn test_persistence_failure_aborts_turn() {
        let bus = EventBus::new(64);
        let mut rx = bus.subscribe();
        let mut svc = service(
            StubGateway::echo(Backend::A),
            StubGateway::echo(Backend::B),
            bus,
        )
        .await;
        svc.book().store().set_fail_saves(true);

        let err = svc.ask(&TurnInput::new("What is 2+2?")).await.unwrap_err();
        assert!(matches!(err, PipelineError::Persistence(_)));
        assert_eq!(svc.book().active().len(), 0);
        assert!(svc.book().store().snapshot().is_empty());

        let mut aborted = false;
        while let Ok(event) = rx.try_recv() {
            if matches!(event, PipelineEvent::TurnAborted { .. }) {
                aborted = true;
            }
        }
        assert!(aborted);
    }

    #[tokio::test]
    async fn test_empty_question_aborts_turn() {
        let mut svc = service(
            StubGateway::echo(Backend::A),
            StubGateway::echo(Backend::B),
            EventBus::default(),
        )
        .await;
        assert!(matches!(
            svc.ask(&TurnInput::new("")).await,
            Err(PipelineError::EmptyQuestion)
        ));
        assert!(svc.book().active().is_empty());
    }
}
