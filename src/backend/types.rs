//! Backend wire types
//!
//! Request and response bodies for the transcoding backend's REST surface.
//! Field names follow the backend's JSON contract (`rtsp_url`, `stream_id`,
//! `stream_url`); the public types translate those into crate terms.

use crate::session::SessionId;

/// What the backend returns when it accepts a start request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamDescriptor {
    /// Backend-assigned session id
    pub session_id: SessionId,
    /// Playable resource locator (HLS playlist path or URL)
    pub playable_url: String,
}

/// Result of probing a source without starting a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    /// Whether the backend could read the source
    pub ok: bool,
    /// Backend diagnostic when the probe failed
    pub error: Option<String>,
}

#[derive(Debug, serde::Serialize)]
pub(super) struct StartRequest<'a> {
    pub rtsp_url: &'a str,
}

#[derive(Debug, serde::Deserialize)]
pub(super) struct StartResponse {
    pub stream_id: String,
    pub stream_url: String,
}

#[derive(Debug, serde::Serialize)]
pub(super) struct StopRequest<'a> {
    pub stream_id: &'a str,
}

#[derive(Debug, serde::Serialize)]
pub(super) struct ProbeRequest<'a> {
    pub rtsp_url: &'a str,
}

/// Error body the backend attaches to non-2xx responses
#[derive(Debug, Default, serde::Deserialize)]
pub(super) struct ErrorResponse {
    #[serde(default)]
    pub error: Option<String>,
}
