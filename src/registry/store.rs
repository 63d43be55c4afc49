//! Session registry implementation
//!
//! The authoritative ordered collection of active stream sessions. Insertion
//! order is display order for the grid; uniqueness by session id is the one
//! invariant everything above relies on.

use crate::session::{SessionId, StreamSession};

use super::error::RegistryError;

/// Ordered, dedup-enforcing store of active sessions
///
/// Performs no I/O. Owned by the orchestrator; all mutation goes through
/// `&mut self`, so there is nothing to lock.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Vec<StreamSession>,
}

impl SessionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            sessions: Vec::new(),
        }
    }

    /// Add a session, preserving insertion order
    ///
    /// Fails with `DuplicateSession` if a session with the same id is
    /// already tracked.
    pub fn add(&mut self, session: StreamSession) -> Result<(), RegistryError> {
        if self.sessions.iter().any(|s| s.id == session.id) {
            return Err(RegistryError::DuplicateSession(session.id));
        }

        tracing::info!(session = %session.id, url = %session.source_url, "Session registered");
        self.sessions.push(session);
        Ok(())
    }

    /// Remove a session by id
    ///
    /// Returns the removed session for caller-side cleanup. Absent ids are
    /// a no-op (`None`), not an error; late or repeated removals are
    /// expected during teardown races.
    pub fn remove(&mut self, id: &SessionId) -> Option<StreamSession> {
        let pos = self.sessions.iter().position(|s| &s.id == id)?;
        let session = self.sessions.remove(pos);

        tracing::info!(session = %id, "Session removed");
        Some(session)
    }

    /// Snapshot of the current sessions in insertion order
    ///
    /// The returned vector is owned; mutating it never touches the registry.
    pub fn list(&self) -> Vec<StreamSession> {
        self.sessions.clone()
    }

    /// Look up a session by id
    pub fn get(&self, id: &SessionId) -> Option<&StreamSession> {
        self.sessions.iter().find(|s| &s.id == id)
    }

    /// Look up a session by id, mutably
    pub fn get_mut(&mut self, id: &SessionId) -> Option<&mut StreamSession> {
        self.sessions.iter_mut().find(|s| &s.id == id)
    }

    /// Whether a session with this id is tracked
    pub fn contains(&self, id: &SessionId) -> bool {
        self.sessions.iter().any(|s| &s.id == id)
    }

    /// Number of tracked sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
