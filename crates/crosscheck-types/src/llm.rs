//! Gateway request and error types for Crosscheck.
//!
//! These types model the contract between the pipeline and the two external
//! model backends: which backend is addressed, what is sent, and how a failed
//! call is classified.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the two external model backends queried per turn.
///
/// Backend A supports model discovery and receives role instructions as an
/// inline prefix. Backend B receives them as a system message and also
/// writes the final synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    A,
    B,
}

impl Backend {
    /// Human-readable label used inside prompts.
    pub fn label(&self) -> &'static str {
        match self {
            Backend::A => "Model A",
            Backend::B => "Model B",
        }
    }

    /// The other backend of the pair.
    pub fn peer(&self) -> Backend {
        match self {
            Backend::A => Backend::B,
            Backend::B => Backend::A,
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::A => write!(f, "backend_a"),
            Backend::B => write!(f, "backend_b"),
        }
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "a" | "backend_a" => Ok(Backend::A),
            "b" | "backend_b" => Ok(Backend::B),
            other => Err(format!("invalid backend: '{other}'")),
        }
    }
}

/// A single text generation request sent to a backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_instruction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            role_instruction: None,
            temperature: None,
            max_output_tokens: None,
        }
    }

    /// Attach a role instruction. Blank instructions are dropped.
    pub fn with_role(mut self, role: Option<&str>) -> Self {
        self.role_instruction = role
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string);
        self
    }

    pub fn with_max_output_tokens(mut self, max: u32) -> Self {
        self.max_output_tokens = Some(max);
        self
    }

    /// The prompt is blank (empty or whitespace only).
    pub fn is_blank(&self) -> bool {
        self.prompt.trim().is_empty()
    }
}

/// Coarse classification of a gateway failure.
///
/// Callers branch on the kind instead of matching on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    RateLimited,
    NotFound,
    Auth,
    Transport,
    Unknown,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::RateLimited => write!(f, "rate_limited"),
            ErrorKind::NotFound => write!(f, "not_found"),
            ErrorKind::Auth => write!(f, "auth"),
            ErrorKind::Transport => write!(f, "transport"),
            ErrorKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// Errors from a single backend call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GatewayError {
    #[error("rate limited: {message}")]
    RateLimited {
        message: String,
        retry_after_ms: Option<u64>,
    },

    #[error("model not found: {0}")]
    ModelNotFound(String),

    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("prompt must not be empty")]
    EmptyPrompt,

    #[error("backend returned an empty response")]
    EmptyResponse,

    #[error("provider error: {message}")]
    Provider { message: String },
}

impl GatewayError {
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::RateLimited {
            message: message.into(),
            retry_after_ms: None,
        }
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::RateLimited { .. } => ErrorKind::RateLimited,
            GatewayError::ModelNotFound(_) => ErrorKind::NotFound,
            GatewayError::AuthenticationFailed(_) => ErrorKind::Auth,
            GatewayError::Transport(_) => ErrorKind::Transport,
            GatewayError::EmptyPrompt
            | GatewayError::EmptyResponse
            | GatewayError::Provider { .. } => ErrorKind::Unknown,
        }
    }

    /// Only rate limits are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::RateLimited
    }
}
