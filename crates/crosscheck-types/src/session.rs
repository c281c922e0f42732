//! Turn and session types for Crosscheck.
//!
//! A `Turn` is one question and its full generate -> critique -> synthesize
//! result. A `Session` is a titled, append-only sequence of turns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::llm::{Backend, GatewayError};

/// Prefix carried by every field that holds a failure instead of model output.
pub const ERROR_MARKER: &str = "[error]";

/// Title given to a session before its first question arrives.
pub const DEFAULT_SESSION_TITLE: &str = "New conversation";

/// Number of question characters kept when deriving a session title.
pub const TITLE_PREFIX_CHARS: usize = 30;

/// One of the three sequential pipeline phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Answer,
    Critique,
    Synthesis,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Answer => write!(f, "answer"),
            Stage::Critique => write!(f, "critique"),
            Stage::Synthesis => write!(f, "synthesis"),
        }
    }
}

/// Render a failed call as field text.
///
/// Format: `[error] backend_a answer failed (rate_limited): <message>`
pub fn error_text(stage: Stage, backend: Backend, err: &GatewayError) -> String {
    format!("{ERROR_MARKER} {backend} {stage} failed ({}): {err}", err.kind())
}

/// Field text for a call that was never made because its input had failed.
pub fn skipped_text(stage: Stage, backend: Backend, reason: &str) -> String {
    format!("{ERROR_MARKER} {backend} {stage} skipped: {reason}")
}

/// Whether a field holds an error placeholder rather than model output.
pub fn is_error_text(text: &str) -> bool {
    text.starts_with(ERROR_MARKER)
}

/// Convert a call result into field text.
///
/// Never yields an empty string: blank successes are recorded as
/// [`GatewayError::EmptyResponse`].
pub fn stage_text(stage: Stage, backend: Backend, result: &Result<String, GatewayError>) -> String {
    match result {
        Ok(text) if !text.trim().is_empty() => text.clone(),
        Ok(_) => error_text(stage, backend, &GatewayError::EmptyResponse),
        Err(err) => error_text(stage, backend, err),
    }
}

/// One user question and its fully processed result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub question: String,
    pub created_at: DateTime<Utc>,
    pub answer_a: String,
    pub answer_b: String,
    pub critique_a_of_b: String,
    pub critique_b_of_a: String,
    pub synthesis: String,
    /// Concrete backend A model that answered.
    pub backend_model_id: String,
    /// Backend B model that answered and synthesized.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synthesis_model_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_instruction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_name: Option<String>,
}

impl Turn {
    /// The five text fields in display order, paired with their names.
    pub fn text_fields(&self) -> [(&'static str, &str); 5] {
        [
            ("answer_a", &self.answer_a),
            ("answer_b", &self.answer_b),
            ("critique_a_of_b", &self.critique_a_of_b),
            ("critique_b_of_a", &self.critique_b_of_a),
            ("synthesis", &self.synthesis),
        ]
    }

    /// Names of the fields that hold error placeholders.
    pub fn failed_fields(&self) -> Vec<&'static str> {
        self.text_fields()
            .into_iter()
            .filter(|(_, text)| is_error_text(text))
            .map(|(name, _)| name)
            .collect()
    }

    pub fn is_fully_successful(&self) -> bool {
        self.failed_fields().is_empty()
    }
}

/// An ordered sequence of turns sharing a display title.
///
/// Turns are append-only: the only way in is [`Session::push_turn`] and the
/// only way out is a shared slice. The title is the one mutable field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    title: String,
    #[serde(rename = "history", default)]
    turns: Vec<Turn>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            title: DEFAULT_SESSION_TITLE.to_string(),
            turns: Vec::new(),
        }
    }

    /// Rebuild a session from already-persisted parts.
    pub fn from_parts(title: impl Into<String>, turns: Vec<Turn>) -> Self {
        let title = title.into();
        let title = if title.trim().is_empty() {
            turns
                .first()
                .map(|t| title_from_question(&t.question))
                .unwrap_or_else(|| DEFAULT_SESSION_TITLE.to_string())
        } else {
            title
        };
        Self { title, turns }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Set a new title. Returns `false` (and changes nothing) for blank titles.
    pub fn set_title(&mut self, title: &str) -> bool {
        let title = title.trim();
        if title.is_empty() {
            return false;
        }
        self.title = title.to_string();
        true
    }

    /// Put back a title captured before a failed rename, blank or not.
    pub fn restore_title(&mut self, previous_title: String) {
        self.title = previous_title;
    }

    /// Append a turn. The first turn of an untitled session names it.
    pub fn push_turn(&mut self, turn: Turn) {
        if self.turns.is_empty() && self.title == DEFAULT_SESSION_TITLE {
            self.title = title_from_question(&turn.question);
        }
        self.turns.push(turn);
    }

    /// Remove the most recently appended turn.
    ///
    /// Only used to undo an append whose persistence failed.
    pub fn rollback_last_turn(&mut self, previous_title: String) -> Option<Turn> {
        let turn = self.turns.pop();
        self.title = previous_title;
        turn
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Derive a title from the leading characters of a question.
pub fn title_from_question(question: &str) -> String {
    let question = question.trim();
    if question.is_empty() {
        return DEFAULT_SESSION_TITLE.to_string();
    }
    let mut chars = question.chars();
    let prefix: String = chars.by_ref().take(TITLE_PREFIX_CHARS).collect();
    if chars.next().is_some() {
        format!("{}…", prefix.trim_end())
    } else {
        prefix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(question: &str) -> Turn {
        Turn {
            question: question.to_string(),
            created_at: Utc::now(),
            answer_a: "4".to_string(),
            answer_b: "4".to_string(),
            critique_a_of_b: "looks correct".to_string(),
            critique_b_of_a: "looks correct".to_string(),
            synthesis: "looks correct".to_string(),
            backend_model_id: "gemini-1.5-flash".to_string(),
            synthesis_model_id: Some("gpt-4o".to_string()),
            role_instruction: None,
            reference_name: None,
        }
    }

    #[test]
    fn test_error_text_is_marked() {
        let text = error_text(
            Stage::Answer,
            Backend::A,
            &GatewayError::rate_limited("quota"),
        );
        assert!(is_error_text(&text));
        assert!(text.contains("backend_a"));
        assert!(text.contains("answer"));
        assert!(text.contains("rate_limited"));
    }

    #[test]
    fn test_skipped_text_is_marked() {
        let text = skipped_text(Stage::Critique, Backend::B, "Model A produced no answer");
        assert!(is_error_text(&text));
        assert!(text.contains("skipped"));
    }

    #[test]
    fn test_stage_text_never_empty() {
        let ok = stage_text(Stage::Critique, Backend::B, &Ok("fine".to_string()));
        assert_eq!(ok, "fine");

        let blank = stage_text(Stage::Critique, Backend::B, &Ok("  \n".to_string()));
        assert!(is_error_text(&blank));
        assert!(blank.contains("empty response"));

        let err = stage_text(
            Stage::Synthesis,
            Backend::B,
            &Err(GatewayError::Transport("reset".into())),
        );
        assert!(is_error_text(&err));
    }

    #[test]
    fn test_failed_fields() {
        let mut t = turn("q");
        assert!(t.is_fully_successful());

        t.answer_a = error_text(Stage::Answer, Backend::A, &GatewayError::EmptyResponse);
        assert_eq!(t.failed_fields(), vec!["answer_a"]);
        assert!(!t.is_fully_successful());
    }

    #[test]
    fn test_first_turn_names_session() {
        let mut session = Session::new();
        assert_eq!(session.title(), DEFAULT_SESSION_TITLE);

        session.push_turn(turn("What is 2+2?"));
        assert_eq!(session.title(), "What is 2+2?");

        session.push_turn(turn("And 3+3?"));
        assert_eq!(session.title(), "What is 2+2?");
        assert_eq!(session.len(), 2);
    }

    #[test]
    fn test_renamed_session_keeps_title_on_first_turn() {
        let mut session = Session::new();
        assert!(session.set_title("Arithmetic"));
        session.push_turn(turn("What is 2+2?"));
        assert_eq!(session.title(), "Arithmetic");
    }

    #[test]
    fn test_set_title_rejects_blank() {
        let mut session = Session::new();
        assert!(!session.set_title("   "));
        assert_eq!(session.title(), DEFAULT_SESSION_TITLE);
    }

    #[test]
    fn test_title_from_long_question_is_truncated() {
        let q = "Explain the difference between a process and a thread in detail";
        let title = title_from_question(q);
        assert!(title.ends_with('…'));
        assert!(title.chars().count() <= TITLE_PREFIX_CHARS + 1);
    }

    #[test]
    fn test_title_from_multibyte_question() {
        let q = "다온과 루의 의견 차이를 설명해 주세요. 가능한 한 자세하게 부탁드립니다";
        let title = title_from_question(q);
        assert!(title.ends_with('…'));
    }

    #[test]
    fn test_rollback_restores_title() {
        let mut session = Session::new();
        let previous = session.title().to_string();
        session.push_turn(turn("What is 2+2?"));
        let removed = session.rollback_last_turn(previous);
        assert!(removed.is_some());
        assert!(session.is_empty());
        assert_eq!(session.title(), DEFAULT_SESSION_TITLE);
    }

    #[test]
    fn test_session_serializes_history_key() {
        let mut session = Session::new();
        session.push_turn(turn("What is 2+2?"));
        let value = serde_json::to_value(&session).unwrap();
        assert_eq!(value["title"], "What is 2+2?");
        assert_eq!(value["history"].as_array().unwrap().len(), 1);
        assert_eq!(value["history"][0]["answer_a"], "4");

        let back: Session = serde_json::from_value(value).unwrap();
        assert_eq!(back, session);
    }

    #[test]
    fn test_turn_without_audit_fields_deserializes() {
        let json = r#"{
            "question": "q",
            "created_at": "2025-01-01T00:00:00Z",
            "answer_a": "a",
            "answer_b": "b",
            "critique_a_of_b": "c",
            "critique_b_of_a": "d",
            "synthesis": "e",
            "backend_model_id": "gemini-pro"
        }"#;
        let t: Turn = serde_json::from_str(json).unwrap();
        assert!(t.synthesis_model_id.is_none());
        assert!(t.reference_name.is_none());
    }
}
