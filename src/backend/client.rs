//! HTTP client for the transcoding backend
//!
//! The backend is an opaque service: start a stream, stop a stream, probe a
//! source, and a root health endpoint. `StreamBackend` is the seam the
//! orchestrator talks through; `HttpBackend` is the production
//! implementation over `reqwest`.

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{Error, StartError, StopError};
use crate::session::SessionId;

use super::types::{
    ErrorResponse, ProbeReport, ProbeRequest, StartRequest, StartResponse, StopRequest,
    StreamDescriptor,
};

/// Interface to the transcoding backend
///
/// Kept as a trait so orchestrator behavior is testable against scripted
/// backends; production code uses [`HttpBackend`].
#[async_trait]
pub trait StreamBackend: Send + Sync {
    /// Register a source for transcoding; returns the session descriptor
    async fn start_stream(&self, rtsp_url: &str) -> Result<StreamDescriptor, StartError>;

    /// Ask the backend to stop a session
    async fn stop_stream(&self, id: &SessionId) -> Result<(), StopError>;

    /// Validate a source without starting a session
    async fn probe_stream(&self, rtsp_url: &str) -> Result<ProbeReport, StartError>;

    /// Whether the backend answers at all
    async fn health(&self) -> bool;
}

/// `StreamBackend` over the backend's REST endpoints
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
}

impl HttpBackend {
    /// Build a backend client from configuration
    pub fn new(config: &ClientConfig) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(StartError::Transport)?;

        Ok(Self {
            client,
            base_url: config.api_base.clone(),
        })
    }

    /// Build a backend client around an existing `reqwest::Client`
    ///
    /// Useful for sharing a connection pool with other parts of an
    /// application.
    pub fn with_client(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    /// The configured base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Url {
        // Joining a relative path onto a base that ends in '/' cannot fail
        self.base_url
            .join(path)
            .unwrap_or_else(|_| self.base_url.clone())
    }

    async fn error_message(response: reqwest::Response) -> String {
        let fallback = "backend returned no error detail".to_string();
        match response.text().await {
            Ok(body) => serde_json::from_str::<ErrorResponse>(&body)
                .ok()
                .and_then(|e| e.error)
                .unwrap_or_else(|| if body.is_empty() { fallback } else { body }),
            Err(_) => fallback,
        }
    }
}

#[async_trait]
impl StreamBackend for HttpBackend {
    async fn start_stream(&self, rtsp_url: &str) -> Result<StreamDescriptor, StartError> {
        let response = self
            .client
            .post(self.endpoint("api/stream/start/"))
            .json(&StartRequest { rtsp_url })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = Self::error_message(response).await;
            tracing::warn!(status = status.as_u16(), detail = %message, "Backend rejected start");
            return Err(StartError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        let parsed: StartResponse = serde_json::from_str(&body)?;

        tracing::info!(
            session = %parsed.stream_id,
            url = %parsed.stream_url,
            "Backend started stream"
        );
        Ok(StreamDescriptor {
            session_id: SessionId::from(parsed.stream_id),
            playable_url: parsed.stream_url,
        })
    }

    async fn stop_stream(&self, id: &SessionId) -> Result<(), StopError> {
        let response = self
            .client
            .post(self.endpoint("api/stream/stop/"))
            .json(&StopRequest {
                stream_id: id.as_str(),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = Self::error_message(response).await;
            tracing::warn!(
                session = %id,
                status = status.as_u16(),
                detail = %message,
                "Backend rejected stop"
            );
            return Err(StopError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        tracing::info!(session = %id, "Backend stopped stream");
        Ok(())
    }

    async fn probe_stream(&self, rtsp_url: &str) -> Result<ProbeReport, StartError> {
        let response = self
            .client
            .post(self.endpoint("api/stream/test-rtsp/"))
            .json(&ProbeRequest { rtsp_url })
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(ProbeReport {
                ok: true,
                error: None,
            });
        }

        // A client error means the backend reached the source and found it
        // unusable; that is a probe result, not a transport failure.
        if status.is_client_error() {
            let message = Self::error_message(response).await;
            return Ok(ProbeReport {
                ok: false,
                error: Some(message),
            });
        }

        let message = Self::error_message(response).await;
        Err(StartError::Rejected {
            status: status.as_u16(),
            message,
        })
    }

    async fn health(&self) -> bool {
        match self.client.get(self.base_url.clone()).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!(error = %e, "Backend health check failed");
                false
            }
        }
    }
}
