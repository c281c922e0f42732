//! Observability for Crosscheck: subscriber setup and the span attribute
//! names shared by the backend adapters.

pub mod genai_attrs;
pub mod tracing_setup;
