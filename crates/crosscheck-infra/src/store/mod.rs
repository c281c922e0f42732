//! Durable session storage.

pub mod json_file;

pub use json_file::JsonFileSessionStore;
