//! Client configuration

use std::time::Duration;

use url::Url;

use crate::channel::DEFAULT_EVENT_BUFFER;

/// Default backend API base URL
pub const DEFAULT_API_BASE: &str = "http://localhost:8000/";

/// Default push-channel endpoint
pub const DEFAULT_PUSH_URL: &str = "ws://localhost:8000/ws/streams/";

/// Default timeout for backend round trips (30 seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Client configuration options
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend API base URL (must end with a slash so joins work)
    pub api_base: Url,

    /// Push-channel WebSocket endpoint
    pub push_url: Url,

    /// Timeout applied to every backend round trip
    pub request_timeout: Duration,

    /// Per-subscriber status event buffer
    pub event_buffer: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: Url::parse(DEFAULT_API_BASE).unwrap(),
            push_url: Url::parse(DEFAULT_PUSH_URL).unwrap(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

impl ClientConfig {
    /// Create a config pointing at a backend base URL
    ///
    /// The push endpoint is derived from the base (`ws://host/ws/streams/`).
    pub fn with_backend(base: &Url) -> Self {
        let mut push = base.clone();
        let scheme = if base.scheme() == "https" { "wss" } else { "ws" };
        // set_scheme only rejects cross-class changes; http(s)->ws(s) is fine
        let _ = push.set_scheme(scheme);
        let push_url = push.join("ws/streams/").unwrap_or(push);

        Self {
            api_base: base.clone(),
            push_url,
            ..Default::default()
        }
    }

    /// Set the API base URL
    pub fn api_base(mut self, url: Url) -> Self {
        self.api_base = url;
        self
    }

    /// Set the push-channel endpoint
    pub fn push_url(mut self, url: Url) -> Self {
        self.push_url = url;
        self
    }

    /// Set the backend request timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the per-subscriber event buffer
    pub fn event_buffer(mut self, buffer: usize) -> Self {
        self.event_buffer = buffer.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();

        assert_eq!(config.api_base.as_str(), DEFAULT_API_BASE);
        assert_eq!(config.push_url.as_str(), DEFAULT_PUSH_URL);
        assert_eq!(
            config.request_timeout,
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)
        );
        assert_eq!(config.event_buffer, DEFAULT_EVENT_BUFFER);
    }

    #[test]
    fn test_with_backend_derives_push_url() {
        let base = Url::parse("http://cams.example.net:8000/").unwrap();
        let config = ClientConfig::with_backend(&base);

        assert_eq!(
            config.push_url.as_str(),
            "ws://cams.example.net:8000/ws/streams/"
        );
    }

    #[test]
    fn test_with_backend_https_uses_wss() {
        let base = Url::parse("https://cams.example.net/").unwrap();
        let config = ClientConfig::with_backend(&base);

        assert_eq!(config.push_url.scheme(), "wss");
    }

    #[test]
    fn test_builder_chaining() {
        let config = ClientConfig::default()
            .request_timeout(Duration::from_secs(5))
            .event_buffer(8);

        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.event_buffer, 8);
    }

    #[test]
    fn test_event_buffer_floor() {
        let config = ClientConfig::default().event_buffer(0);
        assert_eq!(config.event_buffer, 1);
    }
}
