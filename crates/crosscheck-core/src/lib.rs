//! Business logic and port definitions for Crosscheck.
//!
//! This crate defines the "ports" (gateway, catalog and session store traits)
//! that the infrastructure layer implements, plus the three-stage pipeline
//! that drives them. It depends only on `crosscheck-types` -- never on
//! `crosscheck-infra` or any HTTP/filesystem crate.

pub mod chat;
pub mod event;
pub mod llm;
pub mod pipeline;
pub mod session;

#[cfg(test)]
mod testing;
