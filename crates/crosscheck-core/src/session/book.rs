//! SessionBook: the explicit application state for sessions.
//!
//! Lifecycle is init-on-start (`open`), mutate-on-action, persist-on-mutate.
//! Every mutating call saves the whole collection before returning; when the
//! save fails the in-memory change is undone so memory and disk never drift.

use crosscheck_types::error::PipelineError;
use crosscheck_types::session::{Session, Turn};

use super::store::SessionStore;

#[derive(Debug)]
pub struct SessionBook<S> {
    store: S,
    sessions: Vec<Session>,
    active: usize,
}

impl<S: SessionStore> SessionBook<S> {
    /// Load the collection, guaranteeing at least one session.
    ///
    /// The last session becomes active.
    pub async fn open(store: S) -> Result<Self, PipelineError> {
        let mut sessions = store.load().await?;
        if sessions.is_empty() {
            sessions.push(Session::new());
        }
        let active = sessions.len() - 1;
        tracing::debug!(sessions = sessions.len(), "session book opened");
        Ok(Self {
            store,
            sessions,
            active,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Always false after `open`.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn active(&self) -> &Session {
        &self.sessions[self.active]
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn get(&self, index: usize) -> Result<&Session, PipelineError> {
        self.sessions
            .get(index)
            .ok_or(PipelineError::SessionOutOfRange {
                index,
                len: self.sessions.len(),
            })
    }

    /// Make another session active. Selection is not persisted.
    pub fn select(&mut self, index: usize) -> Result<&Session, PipelineError> {
        self.get(index)?;
        self.active = index;
        Ok(&self.sessions[index])
    }

    /// Start a new conversation and make it active.
    ///
    /// An active session without turns is reused instead of piling up
    /// empty sessions.
    pub async fn new_session(&mut self) -> Result<usize, PipelineError> {
        if self.active().is_empty() {
            return Ok(self.active);
        }

        let previous_active = self.active;
        self.sessions.push(Session::new());
        self.active = self.sessions.len() - 1;

        if let Err(e) = self.store.save(&self.sessions).await {
            self.sessions.pop();
            self.active = previous_active;
            return Err(e.into());
        }
        tracing::info!(index = self.active, "new session started");
        Ok(self.active)
    }

    pub async fn rename(&mut self, index: usize, title: &str) -> Result<(), PipelineError> {
        let len = self.sessions.len();
        let session = self
            .sessions
            .get_mut(index)
            .ok_or(PipelineError::SessionOutOfRange { index, len })?;

        let previous = session.title().to_string();
        if !session.set_title(title) {
            return Err(PipelineError::InvalidTitle);
        }

        if let Err(e) = self.store.save(&self.sessions).await {
            self.sessions[index].restore_title(previous);
            return Err(e.into());
        }
        tracing::info!(index, title = %self.sessions[index].title(), "session renamed");
        Ok(())
    }

    /// Remove one session. Deleting the last remaining session leaves a
    /// fresh empty one in its place.
    pub async fn delete(&mut self, index: usize) -> Result<Session, PipelineError> {
        self.get(index)?;

        let previous_active = self.active;
        let removed = self.sessions.remove(index);
        let replaced = self.sessions.is_empty();
        if replaced {
            self.sessions.push(Session::new());
        }
        self.active = if previous_active > index {
            previous_active - 1
        } else {
            previous_active.min(self.sessions.len() - 1)
        };

        if let Err(e) = self.store.save(&self.sessions).await {
            if replaced {
                self.sessions.pop();
            }
            self.sessions.insert(index, removed);
            self.active = previous_active;
            return Err(e.into());
        }
        tracing::info!(index, title = %removed.title(), "session deleted");
        Ok(removed)
    }

    /// Drop every session and start over with one empty session.
    pub async fn clear(&mut self) -> Result<(), PipelineError> {
        let previous = std::mem::replace(&mut self.sessions, vec![Session::new()]);
        let previous_active = self.active;
        self.active = 0;

        if let Err(e) = self.store.save(&self.sessions).await {
            self.sessions = previous;
            self.active = previous_active;
            return Err(e.into());
        }
        tracing::info!(removed = previous.len(), "all sessions cleared");
        Ok(())
    }

    /// Append a finished turn to the active session and persist.
    ///
    /// Returns the active session's new turn count. On a failed save the
    /// turn is removed again, so the session gains zero turns.
    pub async fn commit_turn(&mut self, turn: Turn) -> Result<usize, PipelineError> {
        let index = self.active;
        let previous_title = self.sessions[index].title().to_string();
        self.sessions[index].push_turn(turn);

        if let Err(e) = self.store.save(&self.sessions).await {
            self.sessions[index].rollback_last_turn(previous_title);
            return Err(e.into());
        }
        Ok(self.sessions[index].len())
    }
}
