//! Session persistence port and the in-memory application state over it.

pub mod book;
pub mod store;

pub use book::SessionBook;
pub use store::{MemorySessionStore, SessionStore};
