//! Shared domain types for Crosscheck.
//!
//! This crate contains the domain types used across the workspace:
//! backends and gateway errors, turns and sessions, reference documents,
//! configuration, and the store/pipeline error enums.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod config;
pub mod document;
pub mod error;
pub mod llm;
pub mod session;
