//! OpenTelemetry GenAI Semantic Convention attribute constants.
//!
//! Usable as field names in `tracing::Span::record` so the backend spans
//! line up with the GenAI conventions when exported.

/// The name of the operation being performed (e.g., "chat", "generate_content").
pub const GEN_AI_OPERATION_NAME: &str = "gen_ai.operation.name";

/// The name of the GenAI provider (e.g., "gemini").
pub const GEN_AI_PROVIDER_NAME: &str = "gen_ai.provider.name";

/// The model ID requested.
pub const GEN_AI_REQUEST_MODEL: &str = "gen_ai.request.model";

pub const GEN_AI_REQUEST_TEMPERATURE: &str = "gen_ai.request.temperature";

pub const GEN_AI_REQUEST_MAX_TOKENS: &str = "gen_ai.request.max_tokens";

pub const GEN_AI_USAGE_OUTPUT_TOKENS: &str = "gen_ai.usage.output_tokens";

/// Finish reasons reported for the response (e.g., "STOP", "MAX_TOKENS").
pub const GEN_AI_RESPONSE_FINISH_REASONS: &str = "gen_ai.response.finish_reasons";

// --- Operation name values ---

/// OpenAI-style chat completion.
pub const OP_CHAT: &str = "chat";

/// Gemini `generateContent`.
pub const OP_GENERATE_CONTENT: &str = "generate_content";

/// Model catalog listing used by discovery.
pub const OP_LIST_MODELS: &str = "list_models";
