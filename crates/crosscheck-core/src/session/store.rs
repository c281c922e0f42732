//! SessionStore trait definition.
//!
//! Follows the same RPITIT pattern as `ModelGateway`. The JSON file
//! implementation lives in crosscheck-infra.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crosscheck_types::error::StoreError;
use crosscheck_types::session::Session;

/// Durable storage for the whole session collection.
pub trait SessionStore: Send + Sync {
    /// Load every session in order.
    ///
    /// A missing or empty document is not an error; implementations decide
    /// how to treat unreadable documents.
    fn load(&self) -> impl std::future::Future<Output = Result<Vec<Session>, StoreError>> + Send;

    /// Replace the stored collection. Must be atomic from the caller's view.
    fn save(
        &self,
        sessions: &[Session],
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;
}

/// Volatile store that keeps the last saved collection in memory.
///
/// Used for tests and for runs that should leave nothing on disk. Saves can
/// be made to fail to exercise rollback paths.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: Mutex<Vec<Session>>,
    fail_saves: AtomicBool,
    save_count: AtomicUsize,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sessions(sessions: Vec<Session>) -> Self {
        Self {
            sessions: Mutex::new(sessions),
            ..Self::default()
        }
    }

    /// Make every subsequent `save` fail with an I/O error.
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.save_count.load(Ordering::SeqCst)
    }

    /// The collection as last saved.
    pub fn snapshot(&self) -> Vec<Session> {
        self.sessions
            .lock()
            .map(|sessions| sessions.clone())
            .unwrap_or_default()
    }
}

impl SessionStore for MemorySessionStore {
    async fn load(&self) -> Result<Vec<Session>, StoreError> {
        Ok(self.snapshot())
    }

    async fn save(&self, sessions: &[Session]) -> Result<(), StoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::other("store is read-only")));
        }
        let mut stored = self
            .sessions
            .lock()
            .map_err(|_| StoreError::Io(std::io::Error::other("store lock poisoned")))?;
        *stored = sessions.to_vec();
        self.save_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
