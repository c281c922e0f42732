//! Infrastructure layer for Crosscheck.
//!
//! Concrete implementations of the ports defined in `crosscheck-core`:
//! the two model backends, the JSON session store, configuration and
//! secret loading, and data directory helpers.

pub mod config;
pub mod document;
pub mod filesystem;
pub mod llm;
pub mod secret;
pub mod store;
