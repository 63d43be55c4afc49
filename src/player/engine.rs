//! Playback engine capability interface
//!
//! The crate never talks to a concrete media renderer. It drives anything
//! that can turn a playable locator into a running player and report the
//! four lifecycle events below. Handles are exclusively owned: exactly one
//! live handle per controller, disposed exactly once.

use async_trait::async_trait;
use tokio::sync::mpsc;

/// Opaque handle to one live playback engine instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EngineHandle(u64);

impl EngineHandle {
    /// Wrap an engine-assigned instance id
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw instance id
    pub fn id(self) -> u64 {
        self.0
    }
}

/// Event native to the playback engine
///
/// These describe what the renderer can observe locally; transcoder-side
/// failures arrive over the push channel instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Player is waiting for data
    Waiting,
    /// Playback is running
    Playing,
    /// Playback stalled mid-stream
    Stalled,
    /// Internal player error; the message is engine-specific
    Error(String),
}

/// The playback engine rejected a source at creation time
#[derive(Debug, Clone, thiserror::Error)]
#[error("playback engine rejected {url}: {reason}")]
pub struct EngineInitError {
    /// The playable locator that was rejected
    pub url: String,
    /// Engine-specific reason
    pub reason: String,
}

impl EngineInitError {
    /// Build an init error for a rejected source
    pub fn new(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

/// A freshly created engine instance: the handle plus its event feed
pub struct EngineSession {
    /// Handle for later disposal
    pub handle: EngineHandle,
    /// Engine-native lifecycle events, in emission order
    pub events: mpsc::Receiver<EngineEvent>,
}

/// Capability interface over the media-playback engine
///
/// The contract has no in-place retarget operation: pointing a player at a
/// new source means disposing the old handle and creating a new one.
#[async_trait]
pub trait PlaybackEngine: Send + Sync {
    /// Create a player for a playable locator
    async fn create(&self, source_url: &str) -> Result<EngineSession, EngineInitError>;

    /// Dispose a previously created player
    ///
    /// Must be safe to call with a handle whose player already tore itself
    /// down internally; disposal of an unknown handle is a no-op.
    async fn dispose(&self, handle: EngineHandle);
}
