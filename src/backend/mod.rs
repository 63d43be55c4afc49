//! Transcoding backend client
//!
//! REST surface of the remote backend that converts RTSP sources into
//! playable HLS streams. The orchestrator only sees the [`StreamBackend`]
//! trait; [`HttpBackend`] is the wire implementation.

pub mod client;
pub mod types;

pub use client::{HttpBackend, StreamBackend};
pub use types::{ProbeReport, StreamDescriptor};
