//! Status push channel
//!
//! One persistent server-to-client connection multiplexes status updates
//! for every active session. This module splits that into three pieces:
//!
//! - [`event`]: wire frame parsing into [`StatusEvent`]s
//! - [`demux`]: the per-session subscriber registry and fan-out
//! - [`connection`]: the WebSocket connection and reader task
//!
//! ```text
//!      backend ──ws──► read_loop ──parse──► StatusDemux
//!                                              │
//!                         ┌────────────────────┼─────────────────────┐
//!                         ▼                    ▼                     ▼
//!                  subscriber("s1")      subscriber("s2")     subscriber("s2")
//! ```
//!
//! Keeping the demux separate from the socket means routing and
//! unsubscription are plain testable code, and the controller layer never
//! touches the connection itself.

pub mod connection;
pub mod demux;
pub mod event;

pub use connection::StatusChannel;
pub use demux::{StatusDemux, SubscriptionToken, DEFAULT_EVENT_BUFFER};
pub use event::{FrameError, StatusEvent};
