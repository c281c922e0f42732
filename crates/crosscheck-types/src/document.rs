//! Reference documents attached to a question.

use serde::{Deserialize, Serialize};

/// Default number of characters of a reference document kept for prompts.
pub const DEFAULT_DOCUMENT_CHAR_LIMIT: usize = 30_000;

/// Plain text supplied by the user as extra context for a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceDocument {
    pub name: String,
    pub text: String,
    /// Whether `text` was cut to the character limit.
    pub truncated: bool,
}

impl ReferenceDocument {
    /// Build a document, keeping at most `char_limit` characters of `text`.
    pub fn new(name: impl Into<String>, text: &str, char_limit: usize) -> Self {
        let (text, truncated) = match text.char_indices().nth(char_limit) {
            Some((byte_idx, _)) => (text[..byte_idx].to_string(), true),
            None => (text.to_string(), false),
        };
        Self {
            name: name.into(),
            text,
            truncated,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}
