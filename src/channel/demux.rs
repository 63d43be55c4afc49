//! Per-session event demultiplexing
//!
//! One push connection multiplexes status updates for every session. The
//! demux keeps an explicit subscriber registry keyed by session id so that
//! delivery is per-session, fan-out is supported, and unsubscription is
//! deterministic: no global event bus, no leaked callbacks.

use std::collections::HashMap;

use tokio::sync::{mpsc, Mutex};

use crate::session::SessionId;

use super::event::StatusEvent;

/// Default per-subscriber event buffer
pub const DEFAULT_EVENT_BUFFER: usize = 64;

/// Handle identifying one subscription
///
/// Returned by `subscribe`; pass it back to `unsubscribe`. Dropping the
/// token without unsubscribing leaves the slot in place until the sender
/// notices the closed receiver, so controllers always unsubscribe on
/// dispose.
#[derive(Debug)]
pub struct SubscriptionToken {
    session_id: SessionId,
    seq: u64,
}

struct Subscriber {
    seq: u64,
    tx: mpsc::Sender<StatusEvent>,
}

#[derive(Default)]
struct DemuxInner {
    next_seq: u64,
    subscribers: HashMap<SessionId, Vec<Subscriber>>,
}

/// Subscriber registry routing events to per-session consumers
///
/// Events for the same session are delivered in arrival order; ordering
/// across different sessions is unspecified, matching the wire contract.
pub struct StatusDemux {
    inner: Mutex<DemuxInner>,
    buffer: usize,
}

impl StatusDemux {
    /// Create a demux with the default per-subscriber buffer
    pub fn new() -> Self {
        Self::with_buffer(DEFAULT_EVENT_BUFFER)
    }

    /// Create a demux with a custom per-subscriber buffer
    pub fn with_buffer(buffer: usize) -> Self {
        Self {
            inner: Mutex::new(DemuxInner::default()),
            buffer: buffer.max(1),
        }
    }

    /// Subscribe to events for one session
    ///
    /// Multiple subscribers per session are permitted; each receives every
    /// matching event.
    pub async fn subscribe(
        &self,
        session_id: &SessionId,
    ) -> (SubscriptionToken, mpsc::Receiver<StatusEvent>) {
        let (tx, rx) = mpsc::channel(self.buffer);

        let mut inner = self.inner.lock().await;
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner
            .subscribers
            .entry(session_id.clone())
            .or_default()
            .push(Subscriber { seq, tx });

        tracing::debug!(session = %session_id, seq, "Status subscriber added");

        (
            SubscriptionToken {
                session_id: session_id.clone(),
                seq,
            },
            rx,
        )
    }

    /// Remove a subscription
    ///
    /// Idempotent: unknown or already-removed tokens are a no-op, so late
    /// unsubscribes after channel close are safe.
    pub async fn unsubscribe(&self, token: SubscriptionToken) {
        let mut inner = self.inner.lock().await;

        if let Some(subs) = inner.subscribers.get_mut(&token.session_id) {
            subs.retain(|s| s.seq != token.seq);
            if subs.is_empty() {
                inner.subscribers.remove(&token.session_id);
            }
            tracing::debug!(session = %token.session_id, seq = token.seq, "Status subscriber removed");
        }
    }

    /// Route one event to the subscribers of its session
    ///
    /// A subscriber whose buffer is full has the event dropped with a
    /// warning rather than stalling delivery to every other session.
    /// Closed subscribers are pruned on the way through.
    pub async fn dispatch(&self, event: StatusEvent) {
        let mut inner = self.inner.lock().await;

        let Some(subs) = inner.subscribers.get_mut(&event.session_id) else {
            tracing::trace!(session = %event.session_id, "Status event with no subscribers");
            return;
        };

        subs.retain(|s| !s.tx.is_closed());

        for sub in subs.iter() {
            match sub.tx.try_send(event.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(
                        session = %event.session_id,
                        seq = sub.seq,
                        "Subscriber buffer full, dropping status event"
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {}
            }
        }

        if subs.is_empty() {
            inner.subscribers.remove(&event.session_id);
        }
    }

    /// Number of live subscribers for a session
    pub async fn subscriber_count(&self, session_id: &SessionId) -> usize {
        let inner = self.inner.lock().await;
        inner
            .subscribers
            .get(session_id)
            .map_or(0, |subs| subs.len())
    }
}

impl Default for StatusDemux {
    fn default() -> Self {
        Self::new()
    }
}
