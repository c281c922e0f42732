//! Turn-level service tying the pipeline to session persistence.

pub mod service;

pub use service::ChatService;
