//! Playback layer
//!
//! [`engine`] defines the capability interface the crate expects from a
//! media renderer; [`controller`] drives one engine instance per session
//! and merges engine-native events with backend push events into a single
//! observable status.

pub mod controller;
pub mod engine;

pub use controller::{PlaybackController, StatusSnapshot};
pub use engine::{EngineEvent, EngineHandle, EngineInitError, EngineSession, PlaybackEngine};
