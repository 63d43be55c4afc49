//! Stream session types
//!
//! A session is one backend-tracked live-to-playable conversion, identified
//! by an opaque backend-assigned id. The types here are shared between the
//! registry, the status channel, and the playback layer.

pub mod status;

pub use status::SessionStatus;

use std::fmt;

/// Opaque backend-assigned session identifier
///
/// Unique across the registry. The backend decides the format (currently a
/// random hex string); nothing here inspects it beyond equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Create a session id from a backend-assigned value
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One active stream session as tracked by the registry
///
/// Created when the backend acknowledges a start request. `source_url` is
/// the backend-assigned playable locator (the HLS playlist), not the raw
/// RTSP input the user typed.
#[derive(Debug, Clone)]
pub struct StreamSession {
    /// Backend-assigned unique id
    pub id: SessionId,

    /// Playable resource locator returned by the backend
    pub source_url: String,

    /// Last known status
    pub status: SessionStatus,

    /// Diagnostic message, present only when `status` is `Failed`
    pub last_error: Option<String>,
}

impl StreamSession {
    /// Create a new session in the initial `Connecting` state
    pub fn new(id: SessionId, source_url: impl Into<String>) -> Self {
        Self {
            id,
            source_url: source_url.into(),
            status: SessionStatus::Connecting,
            last_error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_starts_connecting() {
        let session = StreamSession::new(SessionId::from("s1"), "/hls/s1/index.m3u8");

        assert_eq!(session.id.as_str(), "s1");
        assert_eq!(session.status, SessionStatus::Connecting);
        assert!(session.last_error.is_none());
    }

    #[test]
    fn test_session_id_display() {
        let id = SessionId::new("deadbeef");
        assert_eq!(id.to_string(), "deadbeef");
    }
}
