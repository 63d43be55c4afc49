//! Push channel connection
//!
//! Owns the one WebSocket connection to the backend's status endpoint and
//! feeds inbound frames through the demux. Reconnection is deliberately not
//! handled here: when the channel closes, subscribers simply see no further
//! events, and the controller layer treats that silence as "no more
//! transitions", not as a session failure.

use std::sync::Arc;

use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;

use crate::error::Result;
use crate::session::SessionId;

use super::demux::{StatusDemux, SubscriptionToken, DEFAULT_EVENT_BUFFER};
use super::event::StatusEvent;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Shared connection to the backend's status push endpoint
///
/// Constructing the channel opens the connection and spawns a reader task;
/// dropping it tears the reader down. Subscriptions go through the demux
/// and survive a dead connection (they just stop receiving).
pub struct StatusChannel {
    demux: Arc<StatusDemux>,
    reader: tokio::task::JoinHandle<()>,
}

impl StatusChannel {
    /// Connect to the push endpoint
    pub async fn connect(url: &Url) -> Result<Self> {
        Self::connect_with_buffer(url, DEFAULT_EVENT_BUFFER).await
    }

    /// Connect with a custom per-subscriber event buffer
    pub async fn connect_with_buffer(url: &Url, buffer: usize) -> Result<Self> {
        let (ws, _response) = connect_async(url.as_str()).await?;
        tracing::info!(url = %url, "Push channel connected");

        let demux = Arc::new(StatusDemux::with_buffer(buffer));
        let reader = tokio::spawn(read_loop(ws, Arc::clone(&demux)));

        Ok(Self { demux, reader })
    }

    /// Subscribe to status events for one session
    pub async fn subscribe(
        &self,
        session_id: &SessionId,
    ) -> (SubscriptionToken, mpsc::Receiver<StatusEvent>) {
        self.demux.subscribe(session_id).await
    }

    /// Remove a subscription; idempotent, safe after the channel closed
    pub async fn unsubscribe(&self, token: SubscriptionToken) {
        self.demux.unsubscribe(token).await
    }

    /// Handle to the demux, for layers that manage their own subscriptions
    pub fn demux(&self) -> Arc<StatusDemux> {
        Arc::clone(&self.demux)
    }
}

impl Drop for StatusChannel {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// Read frames until the connection ends, dispatching parsed events
///
/// A frame that fails to parse is logged and dropped; one malformed payload
/// must not stop delivery to the other sessions.
async fn read_loop(mut ws: WsStream, demux: Arc<StatusDemux>) {
    while let Some(frame) = ws.next().await {
        match frame {
            Ok(Message::Text(text)) => match StatusEvent::parse(text.as_str()) {
                Ok(event) => {
                    tracing::trace!(
                        session = %event.session_id,
                        status = %event.status,
                        "Status event received"
                    );
                    demux.dispatch(event).await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, frame = %text, "Dropping malformed status frame");
                }
            },
            Ok(Message::Close(_)) => {
                tracing::info!("Push channel closed by backend");
                break;
            }
            // Pings and pongs are handled by tungstenite; binary frames are
            // not part of the status contract.
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Push channel read failed");
                break;
            }
        }
    }

    tracing::info!("Push channel reader stopped; no further status transitions will arrive");
}
