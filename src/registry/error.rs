//! Registry error types

use crate::session::SessionId;

/// Error type for registry operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// A session with this id is already tracked
    #[error("session already registered: {0}")]
    DuplicateSession(SessionId),
}
