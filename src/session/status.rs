//! Session status state machine
//!
//! Tracks a session from the initial start request through playback and
//! teardown. Two independent producers feed the same machine: events native
//! to the playback engine, and pushed status updates from the backend. The
//! merge rule is last-write-wins, except that the terminal states stick:
//! once a controller instance reaches `Failed` or `Stopped`, only a fresh
//! engine handle can bring the session back.

use std::fmt;

/// Status of a stream session
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Start acknowledged, waiting for the transcoder/engine to produce media
    Connecting,
    /// Engine is waiting on data (startup or mid-stream stall)
    Buffering,
    /// Media is flowing
    Connected,
    /// Transcoding or playback failed; terminal for this controller instance
    Failed,
    /// Explicitly stopped by the user; terminal for this controller instance
    Stopped,
}

impl SessionStatus {
    /// Whether this status admits no further transitions
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Failed | SessionStatus::Stopped)
    }

    /// Merge an incoming status into the current one
    ///
    /// Last write wins, but terminal states are sticky: a late engine or
    /// channel event must not resurrect a failed or stopped session.
    pub fn merge(self, incoming: SessionStatus) -> SessionStatus {
        if self.is_terminal() {
            self
        } else {
            incoming
        }
    }

    /// Parse a wire-level status value
    ///
    /// Returns `None` for unrecognized values so the caller can drop the
    /// payload instead of failing the whole channel.
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "connecting" => Some(SessionStatus::Connecting),
            "buffering" => Some(SessionStatus::Buffering),
            "connected" => Some(SessionStatus::Connected),
            "failed" => Some(SessionStatus::Failed),
            "stopped" => Some(SessionStatus::Stopped),
            _ => None,
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionStatus::Connecting => "connecting",
            SessionStatus::Buffering => "buffering",
            SessionStatus::Connected => "connected",
            SessionStatus::Failed => "failed",
            SessionStatus::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_progression() {
        let mut status = SessionStatus::Connecting;

        status = status.merge(SessionStatus::Buffering);
        assert_eq!(status, SessionStatus::Buffering);

        status = status.merge(SessionStatus::Connected);
        assert_eq!(status, SessionStatus::Connected);

        // Mid-stream stall and recovery
        status = status.merge(SessionStatus::Buffering);
        assert_eq!(status, SessionStatus::Buffering);

        status = status.merge(SessionStatus::Connected);
        assert_eq!(status, SessionStatus::Connected);
    }

    #[test]
    fn test_failed_is_sticky() {
        let status = SessionStatus::Failed;

        assert_eq!(status.merge(SessionStatus::Connected), SessionStatus::Failed);
        assert_eq!(status.merge(SessionStatus::Buffering), SessionStatus::Failed);
        assert_eq!(status.merge(SessionStatus::Stopped), SessionStatus::Failed);
    }

    #[test]
    fn test_stopped_is_sticky() {
        let status = SessionStatus::Stopped;

        assert_eq!(status.merge(SessionStatus::Connecting), SessionStatus::Stopped);
        assert_eq!(status.merge(SessionStatus::Failed), SessionStatus::Stopped);
    }

    #[test]
    fn test_from_wire() {
        assert_eq!(
            SessionStatus::from_wire("connected"),
            Some(SessionStatus::Connected)
        );
        assert_eq!(SessionStatus::from_wire("bogus"), None);
        // Wire values are lowercase only
        assert_eq!(SessionStatus::from_wire("Connected"), None);
    }
}
