//! Session orchestration
//!
//! The orchestrator is the crate's front door: validate the operator's
//! input, ask the backend to start or stop transcoding, keep the registry
//! authoritative, and run one playback controller per session. The
//! UI-facing contract is deliberately small (an ordered list of session
//! views plus start/stop/watch) so any rendering layer can present the
//! grid without knowing internals.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::watch;
use url::Url;

use crate::backend::{HttpBackend, ProbeReport, StreamBackend};
use crate::channel::{StatusChannel, StatusDemux};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::player::{PlaybackController, PlaybackEngine, StatusSnapshot};
use crate::registry::{RegistryError, SessionRegistry};
use crate::session::{SessionId, SessionStatus, StreamSession};

/// One row of the UI-facing session list
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SessionView {
    /// Backend-assigned session id
    pub id: SessionId,
    /// Playable resource locator for the tile's player
    pub playable_url: String,
    /// Current merged status
    pub status: SessionStatus,
    /// Diagnostic message when `status` is `failed`
    pub error: Option<String>,
}

/// Top-level coordinator for the stream grid
///
/// Owns the registry and the per-session controllers. All mutation goes
/// through `&mut self`; the async suspension points are the backend round
/// trips and controller teardown.
pub struct SessionOrchestrator {
    backend: Arc<dyn StreamBackend>,
    engine: Arc<dyn PlaybackEngine>,
    demux: Arc<StatusDemux>,
    registry: SessionRegistry,
    controllers: HashMap<SessionId, PlaybackController>,
    // Present when built via `connect`; keeps the push-channel reader alive
    // for as long as the orchestrator exists.
    _channel: Option<StatusChannel>,
}

impl SessionOrchestrator {
    /// Wire an orchestrator from parts
    ///
    /// Useful when the application manages its own backend client or push
    /// channel; most callers want [`SessionOrchestrator::connect`].
    pub fn new(
        backend: Arc<dyn StreamBackend>,
        engine: Arc<dyn PlaybackEngine>,
        demux: Arc<StatusDemux>,
    ) -> Self {
        Self {
            backend,
            engine,
            demux,
            registry: SessionRegistry::new(),
            controllers: HashMap::new(),
            _channel: None,
        }
    }

    /// Connect to a backend: HTTP client plus push channel
    pub async fn connect(config: &ClientConfig, engine: Arc<dyn PlaybackEngine>) -> Result<Self> {
        let backend = HttpBackend::new(config)?;
        let channel =
            StatusChannel::connect_with_buffer(&config.push_url, config.event_buffer).await?;
        let demux = channel.demux();

        Ok(Self {
            backend: Arc::new(backend),
            engine,
            demux,
            registry: SessionRegistry::new(),
            controllers: HashMap::new(),
            _channel: Some(channel),
        })
    }

    /// Register a source and begin playback
    ///
    /// The raw input is validated as an RTSP locator before any network
    /// call. A backend answer carrying an already-tracked session id (the
    /// backend is idempotent about identical sources) is treated as a
    /// no-op success: no second controller, no duplicate registry entry.
    /// An engine rejection is not an error here: the session stays in the
    /// grid with a `Failed` status for its tile.
    pub async fn start(&mut self, raw_input: &str) -> Result<SessionView> {
        validate_source(raw_input)?;

        let descriptor = self.backend.start_stream(raw_input).await?;
        let id = descriptor.session_id.clone();

        let session = StreamSession::new(id.clone(), descriptor.playable_url.clone());
        match self.registry.add(session) {
            Ok(()) => {
                let mut controller = PlaybackController::new(
                    id.clone(),
                    &descriptor.playable_url,
                    Arc::clone(&self.engine),
                    Arc::clone(&self.demux),
                );
                if let Err(e) = controller.start().await {
                    tracing::warn!(
                        session = %id,
                        error = %e,
                        "Session registered but playback failed to start"
                    );
                }
                self.controllers.insert(id.clone(), controller);
            }
            Err(RegistryError::DuplicateSession(_)) => {
                tracing::info!(
                    session = %id,
                    "Backend returned an already-tracked session; treating start as no-op"
                );
                self.rebind_source(&id, &descriptor.playable_url).await;
            }
        }

        let session = match self.registry.get(&id) {
            Some(session) => session.clone(),
            None => StreamSession::new(id, descriptor.playable_url),
        };
        Ok(self.view_of(&session))
    }

    /// Stop a session
    ///
    /// The backend stop is best-effort: local cleanup (registry removal
    /// and controller disposal) always runs, so a dead stream never
    /// lingers in the grid because the stop request was rejected or timed
    /// out. A backend failure is returned only after cleanup completed.
    pub async fn stop(&mut self, id: &SessionId) -> Result<()> {
        let backend_result = self.backend.stop_stream(id).await;

        self.registry.remove(id);
        if let Some(mut controller) = self.controllers.remove(id) {
            controller.dispose().await;
        }

        if let Err(ref e) = backend_result {
            tracing::warn!(
                session = %id,
                error = %e,
                "Backend stop failed; session cleaned up locally anyway"
            );
        }
        Ok(backend_result?)
    }

    /// Ordered snapshot of every session for the rendering layer
    pub fn sessions(&self) -> Vec<SessionView> {
        self.registry
            .list()
            .iter()
            .map(|session| self.view_of(session))
            .collect()
    }

    /// Watch one session's status transitions
    pub fn watch(&self, id: &SessionId) -> Option<watch::Receiver<StatusSnapshot>> {
        self.controllers.get(id).map(|c| c.watch())
    }

    /// Validate a source against the backend without starting a session
    pub async fn probe(&self, raw_input: &str) -> Result<ProbeReport> {
        validate_source(raw_input)?;
        Ok(self.backend.probe_stream(raw_input).await?)
    }

    /// Whether the backend answers at all
    pub async fn backend_health(&self) -> bool {
        self.backend.health().await
    }

    /// Number of active sessions
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Whether any session is active
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Point an existing session at a new playable locator
    ///
    /// The controller disposes its old engine handle before creating the
    /// new one; the registry record follows.
    async fn rebind_source(&mut self, id: &SessionId, playable_url: &str) {
        let Some(controller) = self.controllers.get_mut(id) else {
            return;
        };
        if controller.source_url() == playable_url {
            return;
        }

        if let Some(session) = self.registry.get_mut(id) {
            session.source_url = playable_url.to_string();
        }
        if let Err(e) = controller.set_source(playable_url).await {
            tracing::warn!(
                session = %id,
                error = %e,
                "Engine rejected new source; session marked failed"
            );
        }
    }

    fn view_of(&self, session: &StreamSession) -> SessionView {
        match self.controllers.get(&session.id) {
            Some(controller) => {
                let snap = controller.status();
                SessionView {
                    id: session.id.clone(),
                    playable_url: session.source_url.clone(),
                    status: snap.status,
                    error: snap.error,
                }
            }
            None => SessionView {
                id: session.id.clone(),
                playable_url: session.source_url.clone(),
                status: session.status,
                error: session.last_error.clone(),
            },
        }
    }
}

/// Check that raw input is a well-formed RTSP locator
///
/// Runs before any network call so obviously bad input never costs a
/// backend round trip.
fn validate_source(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput("empty source locator".into()));
    }

    let url = Url::parse(trimmed)
        .map_err(|e| Error::InvalidInput(format!("{trimmed:?} is not a URL: {e}")))?;

    match url.scheme() {
        "rtsp" | "rtsps" => {}
        other => {
            return Err(Error::InvalidInput(format!(
                "unsupported scheme {other:?}, expected rtsp:// or rtsps://"
            )));
        }
    }

    if url.host_str().map_or(true, |h| h.is_empty()) {
        return Err(Error::InvalidInput(format!("{trimmed:?} has no host")));
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    use crate::backend::StreamDescriptor;
    use crate::channel::event::StatusEvent;
    use crate::error::{StartError, StopError};
    use crate::player::{EngineEvent, EngineHandle, EngineInitError, EngineSession};

    use super::*;

    /// Scripted backend: fixed descriptor, optional stop failure, call log.
    struct FakeBackend {
        descriptor: Mutex<StreamDescriptor>,
        start_calls: Mutex<Vec<String>>,
        stop_calls: Mutex<Vec<SessionId>>,
        fail_stop: bool,
    }

    impl FakeBackend {
        fn new(id: &str, playable: &str) -> Self {
            Self {
                descriptor: Mutex::new(StreamDescriptor {
                    session_id: SessionId::from(id),
                    playable_url: playable.to_string(),
                }),
                start_calls: Mutex::new(Vec::new()),
                stop_calls: Mutex::new(Vec::new()),
                fail_stop: false,
            }
        }

        fn failing_stop(id: &str, playable: &str) -> Self {
            Self {
                fail_stop: true,
                ..Self::new(id, playable)
            }
        }

        fn set_playable(&self, playable: &str) {
            self.descriptor.lock().unwrap().playable_url = playable.to_string();
        }

        fn start_count(&self) -> usize {
            self.start_calls.lock().unwrap().len()
        }

        fn stop_count(&self) -> usize {
            self.stop_calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl StreamBackend for FakeBackend {
        async fn start_stream(&self, rtsp_url: &str) -> std::result::Result<StreamDescriptor, StartError> {
            self.start_calls.lock().unwrap().push(rtsp_url.to_string());
            Ok(self.descriptor.lock().unwrap().clone())
        }

        async fn stop_stream(&self, id: &SessionId) -> std::result::Result<(), StopError> {
            self.stop_calls.lock().unwrap().push(id.clone());
            if self.fail_stop {
                return Err(StopError::Rejected {
                    status: 500,
                    message: "internal error".into(),
                });
            }
            Ok(())
        }

        async fn probe_stream(&self, _rtsp_url: &str) -> std::result::Result<ProbeReport, StartError> {
            Ok(ProbeReport {
                ok: true,
                error: None,
            })
        }

        async fn health(&self) -> bool {
            true
        }
    }

    /// Counting engine; optionally rejects every source.
    #[derive(Default)]
    struct FakeEngine {
        next_id: AtomicU64,
        created: AtomicU64,
        disposed: AtomicU64,
        reject: bool,
    }

    impl FakeEngine {
        fn rejecting() -> Self {
            Self {
                reject: true,
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl PlaybackEngine for FakeEngine {
        async fn create(&self, source_url: &str) -> std::result::Result<EngineSession, EngineInitError> {
            if self.reject {
                return Err(EngineInitError::new(source_url, "no decoder for source"));
            }
            let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
            self.created.fetch_add(1, Ordering::Relaxed);
            let (_tx, rx) = mpsc::channel::<EngineEvent>(8);
            // The sender is dropped; the controller pump tolerates a silent
            // engine feed.
            Ok(EngineSession {
                handle: EngineHandle::new(id),
                events: rx,
            })
        }

        async fn dispose(&self, _handle: EngineHandle) {
            self.disposed.fetch_add(1, Ordering::Relaxed);
        }
    }

    struct Fixture {
        orchestrator: SessionOrchestrator,
        backend: Arc<FakeBackend>,
        engine: Arc<FakeEngine>,
        demux: Arc<StatusDemux>,
    }

    fn fixture(backend: FakeBackend, engine: FakeEngine) -> Fixture {
        let backend = Arc::new(backend);
        let engine = Arc::new(engine);
        let demux = Arc::new(StatusDemux::new());
        let orchestrator = SessionOrchestrator::new(
            Arc::clone(&backend) as Arc<dyn StreamBackend>,
            Arc::clone(&engine) as Arc<dyn PlaybackEngine>,
            Arc::clone(&demux),
        );
        Fixture {
            orchestrator,
            backend,
            engine,
            demux,
        }
    }

    #[tokio::test]
    async fn test_invalid_input_never_reaches_backend() {
        let mut f = fixture(
            FakeBackend::new("s1", "/hls/s1.m3u8"),
            FakeEngine::default(),
        );

        for input in ["http://cam1/stream", "not a url", "", "rtsp://"] {
            let result = f.orchestrator.start(input).await;
            assert!(matches!(result, Err(Error::InvalidInput(_))), "{input:?}");
        }

        assert_eq!(f.backend.start_count(), 0);
    }

    #[tokio::test]
    async fn test_start_registers_session_in_connecting() {
        let mut f = fixture(
            FakeBackend::new("s1", "/hls/s1.m3u8"),
            FakeEngine::default(),
        );

        let view = f.orchestrator.start("rtsp://cam1/stream").await.unwrap();

        assert_eq!(view.id, SessionId::from("s1"));
        assert_eq!(view.playable_url, "/hls/s1.m3u8");
        assert_eq!(view.status, SessionStatus::Connecting);

        let sessions = f.orchestrator.sessions();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].status, SessionStatus::Connecting);
    }

    #[tokio::test]
    async fn test_status_event_reaches_session_view() {
        let mut f = fixture(
            FakeBackend::new("s1", "/hls/s1.m3u8"),
            FakeEngine::default(),
        );
        f.orchestrator.start("rtsp://cam1/stream").await.unwrap();

        f.demux
            .dispatch(StatusEvent {
                session_id: SessionId::from("s1"),
                status: SessionStatus::Connected,
                error: None,
            })
            .await;

        let mut rx = f.orchestrator.watch(&SessionId::from("s1")).unwrap();
        timeout(
            Duration::from_secs(1),
            rx.wait_for(|snap| snap.status == SessionStatus::Connected),
        )
        .await
        .expect("status never became connected")
        .unwrap();

        assert_eq!(f.orchestrator.sessions()[0].status, SessionStatus::Connected);
    }

    #[tokio::test]
    async fn test_stop_cleans_up_even_when_backend_fails() {
        let mut f = fixture(
            FakeBackend::failing_stop("s1", "/hls/s1.m3u8"),
            FakeEngine::default(),
        );
        f.orchestrator.start("rtsp://cam1/stream").await.unwrap();

        let result = f.orchestrator.stop(&SessionId::from("s1")).await;

        assert!(matches!(result, Err(Error::Stop(_))));
        assert!(f.orchestrator.is_empty());
        assert_eq!(f.engine.disposed.load(Ordering::Relaxed), 1);
        assert_eq!(f.backend.stop_count(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_start_is_noop_success() {
        let mut f = fixture(
            FakeBackend::new("s1", "/hls/s1.m3u8"),
            FakeEngine::default(),
        );

        let first = f.orchestrator.start("rtsp://cam1/stream").await.unwrap();
        let second = f.orchestrator.start("rtsp://cam1/stream").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(f.orchestrator.len(), 1);
        // No second controller, no second engine instance
        assert_eq!(f.engine.created.load(Ordering::Relaxed), 1);
        assert_eq!(f.backend.start_count(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_start_with_new_url_rebinds_engine() {
        let mut f = fixture(
            FakeBackend::new("s1", "/hls/s1.m3u8"),
            FakeEngine::default(),
        );
        f.orchestrator.start("rtsp://cam1/stream").await.unwrap();

        f.backend.set_playable("/hls/s1/variant.m3u8");
        let view = f.orchestrator.start("rtsp://cam1/stream").await.unwrap();

        assert_eq!(view.playable_url, "/hls/s1/variant.m3u8");
        assert_eq!(f.orchestrator.len(), 1);
        // Old handle disposed, new one created
        assert_eq!(f.engine.created.load(Ordering::Relaxed), 2);
        assert_eq!(f.engine.disposed.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_engine_rejection_shows_failed_tile() {
        let mut f = fixture(
            FakeBackend::new("s1", "/hls/s1.m3u8"),
            FakeEngine::rejecting(),
        );

        let view = f.orchestrator.start("rtsp://cam1/stream").await.unwrap();

        assert_eq!(view.status, SessionStatus::Failed);
        assert_eq!(view.error.as_deref(), Some("no decoder for source"));
        // The session stays listed so the failure renders inline on its tile
        assert_eq!(f.orchestrator.len(), 1);
    }

    #[tokio::test]
    async fn test_full_session_lifecycle() {
        let mut f = fixture(
            FakeBackend::failing_stop("s1", "/hls/s1.m3u8"),
            FakeEngine::default(),
        );

        // Start: exactly one session, connecting
        f.orchestrator.start("rtsp://cam1").await.unwrap();
        let sessions = f.orchestrator.sessions();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].status, SessionStatus::Connecting);

        // Backend pushes connected
        f.demux
            .dispatch(StatusEvent {
                session_id: SessionId::from("s1"),
                status: SessionStatus::Connected,
                error: None,
            })
            .await;
        let mut rx = f.orchestrator.watch(&SessionId::from("s1")).unwrap();
        timeout(
            Duration::from_secs(1),
            rx.wait_for(|snap| snap.status == SessionStatus::Connected),
        )
        .await
        .expect("status never became connected")
        .unwrap();

        // Stop fails on the backend; the session is gone locally anyway
        let result = f.orchestrator.stop(&SessionId::from("s1")).await;
        assert!(result.is_err());
        assert!(f.orchestrator.sessions().is_empty());
        assert_eq!(f.engine.disposed.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_stop_unknown_session_is_clean() {
        let mut f = fixture(
            FakeBackend::new("s1", "/hls/s1.m3u8"),
            FakeEngine::default(),
        );

        // Backend acks the stop; locally there is nothing to remove
        let result = f.orchestrator.stop(&SessionId::from("ghost")).await;
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_source() {
        assert!(validate_source("rtsp://cam1/stream").is_ok());
        assert!(validate_source("rtsps://cam1:8554/stream").is_ok());
        assert!(validate_source("  rtsp://cam1  ").is_ok());

        assert!(validate_source("http://cam1/stream").is_err());
        assert!(validate_source("cam1/stream").is_err());
        assert!(validate_source("").is_err());
        assert!(validate_source("rtsp://").is_err());
    }
}
