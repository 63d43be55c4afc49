//! Wire-level status events
//!
//! The backend pushes one JSON object per frame over the shared channel:
//! `{"stream_id": "...", "status": "...", "error": "..."}`. A frame missing
//! its `stream_id` or carrying an unrecognized `status` is rejected here and
//! dropped by the reader, never raised to subscribers.

use crate::session::{SessionId, SessionStatus};

/// A parsed status update for one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEvent {
    /// Session the update applies to
    pub session_id: SessionId,

    /// New status, as reported by the backend
    pub status: SessionStatus,

    /// Diagnostic message accompanying a `failed` status
    pub error: Option<String>,
}

/// Why an inbound frame could not be turned into a `StatusEvent`
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// Frame was not valid JSON
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Frame had no `stream_id` field
    #[error("frame has no stream_id")]
    MissingSessionId,

    /// Frame had no `status` field
    #[error("frame has no status")]
    MissingStatus,

    /// `status` value is not one the state machine knows
    #[error("unrecognized status value {0:?}")]
    UnknownStatus(String),
}

/// Raw frame shape; fields are optional so validation errors stay precise
#[derive(Debug, serde::Deserialize)]
struct WireFrame {
    stream_id: Option<String>,
    status: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl StatusEvent {
    /// Parse a text frame from the push channel
    pub fn parse(text: &str) -> Result<Self, FrameError> {
        let frame: WireFrame = serde_json::from_str(text)?;

        let session_id = match frame.stream_id {
            Some(id) if !id.is_empty() => SessionId::from(id),
            _ => return Err(FrameError::MissingSessionId),
        };

        let status = match frame.status {
            Some(raw) => {
                SessionStatus::from_wire(&raw).ok_or(FrameError::UnknownStatus(raw))?
            }
            None => return Err(FrameError::MissingStatus),
        };

        // The backend sends an empty error string on non-failure updates
        let error = frame.error.filter(|e| !e.is_empty());

        Ok(Self {
            session_id,
            status,
            error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status_update() {
        let event =
            StatusEvent::parse(r#"{"stream_id": "s1", "status": "connected", "error": ""}"#)
                .unwrap();

        assert_eq!(event.session_id, SessionId::from("s1"));
        assert_eq!(event.status, SessionStatus::Connected);
        assert!(event.error.is_none());
    }

    #[test]
    fn test_parse_failure_carries_error() {
        let event = StatusEvent::parse(
            r#"{"stream_id": "s1", "status": "failed", "error": "upstream source disconnected"}"#,
        )
        .unwrap();

        assert_eq!(event.status, SessionStatus::Failed);
        assert_eq!(event.error.as_deref(), Some("upstream source disconnected"));
    }

    #[test]
    fn test_missing_stream_id_rejected() {
        let result = StatusEvent::parse(r#"{"status": "connected"}"#);
        assert!(matches!(result, Err(FrameError::MissingSessionId)));

        let result = StatusEvent::parse(r#"{"stream_id": "", "status": "connected"}"#);
        assert!(matches!(result, Err(FrameError::MissingSessionId)));
    }

    #[test]
    fn test_unknown_status_rejected() {
        let result = StatusEvent::parse(r#"{"stream_id": "s1", "status": "exploded"}"#);
        assert!(matches!(result, Err(FrameError::UnknownStatus(_))));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(
            StatusEvent::parse("not json at all"),
            Err(FrameError::Json(_))
        ));
    }
}
