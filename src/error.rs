//! Crate error types
//!
//! Every failure here degrades a single session; none is fatal to the
//! process. Backend round-trip failures are surfaced to the caller so the
//! user can retry, engine rejections become a `Failed` session status, and
//! malformed push-channel payloads are dropped at the parse layer without
//! ever reaching these types.

pub use crate::player::engine::EngineInitError;
pub use crate::registry::RegistryError;

/// Result type alias for streamgrid operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for orchestrator-facing operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Raw input was not a well-formed RTSP locator; rejected before any I/O
    #[error("invalid source locator: {0}")]
    InvalidInput(String),

    /// Backend start round trip failed
    #[error(transparent)]
    Start(#[from] StartError),

    /// Backend stop round trip failed (local cleanup already completed)
    #[error(transparent)]
    Stop(#[from] StopError),

    /// Playback engine rejected a source
    #[error(transparent)]
    Engine(#[from] EngineInitError),

    /// Push channel connection failed
    #[error("push channel error: {0}")]
    Channel(#[from] tokio_tungstenite::tungstenite::Error),
}

/// Error starting a stream on the backend
#[derive(Debug, thiserror::Error)]
pub enum StartError {
    /// Request never completed (connection refused, timeout, DNS, ...)
    #[error("backend transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("backend rejected start ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("malformed backend response: {0}")]
    MalformedResponse(#[from] serde_json::Error),
}

/// Error stopping a stream on the backend
///
/// By the time this is returned, the session has already been removed
/// locally and its playback resources released.
#[derive(Debug, thiserror::Error)]
pub enum StopError {
    /// Request never completed
    #[error("backend transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("backend rejected stop ({status}): {message}")]
    Rejected { status: u16, message: String },
}
