//! Global configuration types for Crosscheck.
//!
//! `GlobalConfig` represents the top-level `config.toml` that controls
//! backend model selection, retry policy, pipeline behaviour and the
//! persistence recovery policy.

use serde::{Deserialize, Serialize};

use crate::document::DEFAULT_DOCUMENT_CHAR_LIMIT;

/// Top-level configuration. Loaded from `~/.crosscheck/config.toml`.
/// All fields have defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub backends: BackendsConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

/// Model selection and transport settings for both backends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendsConfig {
    /// Backend A models in descending order of preference.
    #[serde(default = "default_gemini_model_preferences")]
    pub gemini_model_preferences: Vec<String>,
    /// Backend A model used when discovery fails or finds nothing.
    #[serde(default = "default_gemini_default_model")]
    pub gemini_default_model: String,
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_base_url: Option<String>,
}

fn default_gemini_model_preferences() -> Vec<String> {
    vec![
        "gemini-2.5-flash".to_string(),
        "gemini-2.0-flash".to_string(),
        "gemini-1.5-flash".to_string(),
        "gemini-pro".to_string(),
    ]
}

fn default_gemini_default_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o".to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for BackendsConfig {
    fn default() -> Self {
        Self {
            gemini_model_preferences: default_gemini_model_preferences(),
            gemini_default_model: default_gemini_default_model(),
            openai_model: default_openai_model(),
            request_timeout_secs: default_request_timeout_secs(),
            gemini_base_url: None,
            openai_base_url: None,
        }
    }
}

/// How the delay between rate-limited attempts grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffKind {
    Fixed,
    Linear,
}

/// Retry policy for rate-limited backend calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts, including the first call.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_backoff")]
    pub backoff: BackoffKind,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    2_000
}

fn default_backoff() -> BackoffKind {
    BackoffKind::Linear
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            backoff: default_backoff(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Issue the two calls of the answer and critique stages concurrently.
    #[serde(default = "default_concurrent_calls")]
    pub concurrent_calls: bool,
    #[serde(default = "default_document_char_limit")]
    pub document_char_limit: usize,
}

fn default_concurrent_calls() -> bool {
    true
}

fn default_document_char_limit() -> usize {
    DEFAULT_DOCUMENT_CHAR_LIMIT
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrent_calls: default_concurrent_calls(),
            document_char_limit: default_document_char_limit(),
        }
    }
}

/// What to do when the session document exists but cannot be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorruptDocumentPolicy {
    /// Start over with one empty session.
    Reset,
    /// Copy the unreadable file aside, then start over.
    BackupAndReset,
    /// Refuse to start.
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    #[serde(default = "default_on_corrupt")]
    pub on_corrupt: CorruptDocumentPolicy,
    #[serde(default = "default_file_name")]
    pub file_name: String,
}

fn default_on_corrupt() -> CorruptDocumentPolicy {
    CorruptDocumentPolicy::BackupAndReset
}

fn default_file_name() -> String {
    "sessions.json".to_string()
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            on_corrupt: default_on_corrupt(),
            file_name: default_file_name(),
        }
    }
}
