//! Spinner that follows pipeline events while a turn runs.

use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crosscheck_core::event::EventBus;
use crosscheck_core::pipeline::{PipelineEvent, PipelineStage};

/// A spinner fed by an [`EventBus`] subscription.
pub struct TurnProgress {
    bar: ProgressBar,
    task: JoinHandle<()>,
}

impl TurnProgress {
    /// Subscribe to `events` and start spinning. A hidden spinner is used
    /// when `hidden` is set (JSON or quiet output).
    pub fn start(events: &EventBus, hidden: bool) -> Self {
        let bar = if hidden {
            ProgressBar::hidden()
        } else {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.cyan} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            bar.enable_steady_tick(Duration::from_millis(80));
            bar
        };
        bar.set_message("starting...");

        let mut rx = events.subscribe();
        let task_bar = bar.clone();
        let task = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        if !apply_event(&task_bar, &event) {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "progress display lagged behind events");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        Self { bar, task }
    }

    pub fn finish(self) {
        self.task.abort();
        self.bar.finish_and_clear();
    }
}

/// Update the spinner for one event. Returns `false` once the turn is over.
fn apply_event(bar: &ProgressBar, event: &PipelineEvent) -> bool {
    match event {
        PipelineEvent::StageStarted(PipelineStage::Complete | PipelineStage::Errored) => {}
        PipelineEvent::StageStarted(stage) => bar.set_message(format!("{}...", stage.label())),
        PipelineEvent::CallFinished { stage, backend, ok } => {
            if !ok {
                bar.println(format!(
                    "  {} {} failed during {}",
                    style("!").yellow().bold(),
                    backend.label(),
                    stage.label()
                ));
            }
        }
        PipelineEvent::Retrying { backend, notice, .. } => {
            bar.set_message(retry_message(backend.label(), notice.attempt, notice.max_attempts, notice.delay));
        }
        PipelineEvent::TurnCommitted { .. } | PipelineEvent::TurnAborted { .. } => return false,
    }
    true
}

fn retry_message(label: &str, attempt: u32, max_attempts: u32, delay: Duration) -> String {
    format!(
        "{label} is rate limited, retrying in {:.1}s (attempt {}/{max_attempts})",
        delay.as_secs_f64(),
        attempt + 1
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosscheck_core::llm::retry::RetryNotice;
    use crosscheck_types::llm::{Backend, GatewayError};

    #[test]
    fn test_retry_message() {
        assert_eq!(
            retry_message("Model A", 1, 3, Duration::from_secs(2)),
            "Model A is rate limited, retrying in 2.0s (attempt 2/3)"
        );
    }

    #[test]
    fn test_apply_event_stops_on_turn_end() {
        let bar = ProgressBar::hidden();
        assert!(apply_event(
            &bar,
            &PipelineEvent::StageStarted(PipelineStage::CrossCritiquing)
        ));
        assert_eq!(bar.message(), "cross-critiquing...");

        let notice = RetryNotice {
            attempt: 1,
            max_attempts: 3,
            delay: Duration::from_secs(4),
            error: GatewayError::rate_limited("slow down"),
        };
        assert!(apply_event(
            &bar,
            &PipelineEvent::Retrying {
                stage: PipelineStage::GeneratingAnswers,
                backend: Backend::A,
                notice,
            }
        ));
        assert!(bar.message().contains("Model A is rate limited"));

        assert!(!apply_event(&bar, &PipelineEvent::TurnCommitted { turn_count: 1 }));
        assert!(!apply_event(
            &bar,
            &PipelineEvent::TurnAborted {
                reason: "disk full".into()
            }
        ));
    }

    #[tokio::test]
    async fn test_start_and_finish_hidden() {
        let events = EventBus::default();
        let progress = TurnProgress::start(&events, true);
        events.publish(PipelineEvent::StageStarted(PipelineStage::GeneratingAnswers));
        progress.finish();
    }
}
