//! # streamgrid
//!
//! Client-side session manager for watching live RTSP sources through a
//! remote transcoding backend. The backend turns each registered source
//! into a playable HLS stream and pushes per-session status updates over a
//! single shared WebSocket; this crate keeps the authoritative session set,
//! demultiplexes that channel, and drives one playback-engine instance per
//! session with safe teardown.
//!
//! # Architecture
//!
//! ```text
//!   operator input                     transcoding backend
//!        │                             (HTTP + push channel)
//!        ▼                                   ▲        │
//!  SessionOrchestrator ──start/stop──────────┘        │ status frames
//!        │    │                                       ▼
//!        │    ├── SessionRegistry (ordered, dedup)  StatusChannel
//!        │    │                                       │ demux by id
//!        │    └── PlaybackController (one per session)◄┘
//!        │              │       │
//!        ▼              ▼       ▼
//!    sessions()   PlaybackEngine (capability trait: create/dispose/events)
//! ```
//!
//! Status for a session is fed by two producers (events native to the
//! playback engine and authoritative pushes from the backend) merged into
//! one state machine, `Connecting → Buffering/Connected → Failed/Stopped`,
//! with sticky terminal states.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use streamgrid::{ClientConfig, PlaybackEngine, SessionOrchestrator};
//!
//! # async fn example(engine: Arc<dyn PlaybackEngine>) -> streamgrid::Result<()> {
//! let config = ClientConfig::default();
//! let mut grid = SessionOrchestrator::connect(&config, engine).await?;
//!
//! let view = grid.start("rtsp://camera1.local/stream").await?;
//! println!("watching {} at {}", view.id, view.playable_url);
//!
//! for session in grid.sessions() {
//!     println!("{}: {}", session.id, session.status);
//! }
//!
//! grid.stop(&view.id).await?;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod channel;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod player;
pub mod registry;
pub mod session;

pub use backend::{HttpBackend, ProbeReport, StreamBackend, StreamDescriptor};
pub use channel::{StatusChannel, StatusDemux, StatusEvent, SubscriptionToken};
pub use config::ClientConfig;
pub use error::{Error, Result, StartError, StopError};
pub use orchestrator::{SessionOrchestrator, SessionView};
pub use player::{
    EngineEvent, EngineHandle, EngineInitError, EngineSession, PlaybackController, PlaybackEngine,
    StatusSnapshot,
};
pub use registry::{RegistryError, SessionRegistry};
pub use session::{SessionId, SessionStatus, StreamSession};
