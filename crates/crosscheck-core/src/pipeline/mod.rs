//! The three-stage answer -> cross-critique -> synthesis pipeline.

pub mod orchestrator;
pub mod prompts;

pub use orchestrator::{Orchestrator, TurnInput};

use crosscheck_types::llm::Backend;

use crate::llm::retry::RetryNotice;

/// States of one pipeline run.
///
/// `Idle -> GeneratingAnswers -> CrossCritiquing -> Synthesizing -> Complete`,
/// with `Errored` reachable from any working state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Idle,
    GeneratingAnswers,
    CrossCritiquing,
    Synthesizing,
    Complete,
    Errored,
}

impl PipelineStage {
    /// Short progress label for terminal output.
    pub fn label(&self) -> &'static str {
        match self {
            PipelineStage::Idle => "idle",
            PipelineStage::GeneratingAnswers => "generating answers",
            PipelineStage::CrossCritiquing => "cross-critiquing",
            PipelineStage::Synthesizing => "synthesizing",
            PipelineStage::Complete => "complete",
            PipelineStage::Errored => "errored",
        }
    }
}

/// Progress notifications published while a turn runs.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    StageStarted(PipelineStage),
    CallFinished {
        stage: PipelineStage,
        backend: Backend,
        ok: bool,
    },
    Retrying {
        stage: PipelineStage,
        backend: Backend,
        notice: RetryNotice,
    },
    TurnCommitted {
        turn_count: usize,
    },
    TurnAborted {
        reason: String,
    },
}
