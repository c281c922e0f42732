//! Backend A: Google Gemini over its REST API.
//!
//! [`GeminiGateway`] implements both `ModelGateway` and `ModelCatalog`, so
//! it can discover its own model through a `ModelSelector`.

pub mod client;
pub mod types;

pub use client::GeminiGateway;
