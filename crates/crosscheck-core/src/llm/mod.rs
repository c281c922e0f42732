//! Model gateway abstractions for Crosscheck.
//!
//! - `ModelGateway` / `ModelCatalog`: RPITIT traits for concrete backends
//! - `BoxModelGateway`: object-safe wrapper for dynamic dispatch
//! - `discovery`: backend A model selection
//! - `retry`: bounded retry on rate limits

pub mod box_gateway;
pub mod discovery;
pub mod gateway;
pub mod retry;
