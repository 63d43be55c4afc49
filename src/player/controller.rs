//! Per-session playback controller
//!
//! Binds one session's playable locator to one engine instance and merges
//! the two status producers, engine-native events and backend push events,
//! into a single observable state machine. Owns the engine handle and the
//! channel subscription; both are released exactly once, on every exit
//! path.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::channel::demux::{StatusDemux, SubscriptionToken};
use crate::channel::event::StatusEvent;
use crate::session::{SessionId, SessionStatus};

use super::engine::{EngineEvent, EngineHandle, EngineInitError, PlaybackEngine};

/// Observable status of one controller, published over a watch channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    /// Current merged status
    pub status: SessionStatus,
    /// Diagnostic message, present only when `status` is `Failed`
    pub error: Option<String>,
}

impl StatusSnapshot {
    fn connecting() -> Self {
        Self {
            status: SessionStatus::Connecting,
            error: None,
        }
    }
}

/// Controller for one session's playback lifecycle
///
/// Created per session by the orchestrator. `Failed` and `Stopped` are
/// terminal for this instance; retrying a failed session means building a
/// new controller (and with it a new engine handle).
pub struct PlaybackController {
    session_id: SessionId,
    source_url: String,
    engine: Arc<dyn PlaybackEngine>,
    demux: Arc<StatusDemux>,
    handle: Option<EngineHandle>,
    token: Option<SubscriptionToken>,
    pump: Option<JoinHandle<()>>,
    status: Arc<watch::Sender<StatusSnapshot>>,
    disposed: bool,
}

impl PlaybackController {
    /// Create a controller for a session; does not touch the engine yet
    pub fn new(
        session_id: SessionId,
        source_url: impl Into<String>,
        engine: Arc<dyn PlaybackEngine>,
        demux: Arc<StatusDemux>,
    ) -> Self {
        let (status_tx, _) = watch::channel(StatusSnapshot::connecting());

        Self {
            session_id,
            source_url: source_url.into(),
            engine,
            demux,
            handle: None,
            token: None,
            pump: None,
            status: Arc::new(status_tx),
            disposed: false,
        }
    }

    /// Session this controller belongs to
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Playable locator currently bound to the engine
    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// Current merged status
    pub fn status(&self) -> StatusSnapshot {
        self.status.borrow().clone()
    }

    /// Watch status transitions as they happen
    pub fn watch(&self) -> watch::Receiver<StatusSnapshot> {
        self.status.subscribe()
    }

    /// Whether `dispose` has completed
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Create the engine instance and begin listening to both event sources
    ///
    /// On engine rejection the controller transitions to `Failed` (terminal
    /// for this instance) and the error is also returned so the caller can
    /// log it; nothing is acquired on that path, so a later `dispose` has
    /// nothing extra to release.
    pub async fn start(&mut self) -> Result<(), EngineInitError> {
        let session = match self.engine.create(&self.source_url).await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(
                    session = %self.session_id,
                    url = %self.source_url,
                    error = %e,
                    "Playback engine rejected source"
                );
                self.status.send_replace(StatusSnapshot {
                    status: SessionStatus::Failed,
                    error: Some(e.reason.clone()),
                });
                return Err(e);
            }
        };

        let (token, status_rx) = self.demux.subscribe(&self.session_id).await;

        self.handle = Some(session.handle);
        self.token = Some(token);
        self.status.send_replace(StatusSnapshot::connecting());
        self.pump = Some(tokio::spawn(pump(
            self.session_id.clone(),
            session.events,
            status_rx,
            Arc::clone(&self.status),
        )));

        tracing::info!(
            session = %self.session_id,
            url = %self.source_url,
            handle = session.handle.id(),
            "Playback started"
        );
        Ok(())
    }

    /// Rebind this session to a new playable locator
    ///
    /// The engine contract has no in-place retarget, so the old handle is
    /// fully disposed before the new one is created; at no point are two
    /// handles live for this session. Begins a fresh state-machine run in
    /// `Connecting`.
    pub async fn set_source(&mut self, source_url: &str) -> Result<(), EngineInitError> {
        if self.disposed {
            tracing::warn!(
                session = %self.session_id,
                "Ignoring source change on disposed controller"
            );
            return Ok(());
        }
        if self.source_url == source_url && self.handle.is_some() {
            return Ok(());
        }

        tracing::info!(
            session = %self.session_id,
            old = %self.source_url,
            new = source_url,
            "Source changed, recreating engine instance"
        );

        self.release().await;
        self.source_url = source_url.to_string();
        self.start().await
    }

    /// Release the engine handle and the channel subscription
    ///
    /// Idempotent: the second and later calls are no-ops, so unmount and
    /// removal races cannot double-free the engine handle. The event pump
    /// is stopped before anything is released, so no handler ever fires
    /// against a disposed handle.
    pub async fn dispose(&mut self) {
        if self.disposed {
            tracing::debug!(session = %self.session_id, "Controller already disposed");
            return;
        }
        self.disposed = true;

        self.release().await;

        // Explicit removal is the only road to Stopped; a session that
        // already failed keeps its Failed status for the UI.
        self.status.send_modify(|snap| {
            snap.status = snap.status.merge(SessionStatus::Stopped);
        });

        tracing::info!(session = %self.session_id, "Controller disposed");
    }

    /// Tear down pump, subscription, and engine handle, in that order
    async fn release(&mut self) {
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
        if let Some(token) = self.token.take() {
            self.demux.unsubscribe(token).await;
        }
        if let Some(handle) = self.handle.take() {
            self.engine.dispose(handle).await;
        }
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
        if !self.disposed && self.handle.is_some() {
            tracing::warn!(
                session = %self.session_id,
                "Controller dropped without dispose; engine handle leaked"
            );
        }
    }
}

/// Merge both event sources into the status watch until they go quiet
///
/// Engine events map to status transitions; push-channel events set status
/// directly, since the backend sees transcoder-side failures the engine
/// cannot. Terminal states are sticky either way. Silence (both sources
/// closed) is not a transition.
async fn pump(
    session_id: SessionId,
    mut engine_rx: mpsc::Receiver<EngineEvent>,
    mut channel_rx: mpsc::Receiver<StatusEvent>,
    status: Arc<watch::Sender<StatusSnapshot>>,
) {
    let mut engine_open = true;
    let mut channel_open = true;

    while engine_open || channel_open {
        tokio::select! {
            event = engine_rx.recv(), if engine_open => match event {
                Some(event) => {
                    let (next, error) = match event {
                        EngineEvent::Waiting | EngineEvent::Stalled => {
                            (SessionStatus::Buffering, None)
                        }
                        EngineEvent::Playing => (SessionStatus::Connected, None),
                        EngineEvent::Error(message) => (SessionStatus::Failed, Some(message)),
                    };
                    apply(&session_id, &status, next, error, "engine");
                }
                None => engine_open = false,
            },
            event = channel_rx.recv(), if channel_open => match event {
                Some(event) => {
                    apply(&session_id, &status, event.status, event.error, "channel");
                }
                None => channel_open = false,
            },
        }
    }

    tracing::debug!(session = %session_id, "Event pump finished");
}

fn apply(
    session_id: &SessionId,
    status: &watch::Sender<StatusSnapshot>,
    incoming: SessionStatus,
    error: Option<String>,
    source: &str,
) {
    status.send_modify(|snap| {
        let merged = snap.status.merge(incoming);
        if merged != incoming {
            tracing::debug!(
                session = %session_id,
                held = %snap.status,
                ignored = %incoming,
                source,
                "Terminal status held, late event ignored"
            );
            return;
        }

        if merged != snap.status {
            tracing::debug!(
                session = %session_id,
                from = %snap.status,
                to = %merged,
                source,
                "Status transition"
            );
        }
        snap.status = merged;
        snap.error = if merged == SessionStatus::Failed {
            error.or_else(|| snap.error.take())
        } else {
            None
        };
    });
}
