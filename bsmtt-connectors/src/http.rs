//! HTTP/HTTPS Connector for BSMTT - Collector Integration
//!
//! ## Overview
//!
//! Posts every telemetry document as a JSON body to one collector endpoint.
//! The connector implements [`TransportSink`], so it plugs directly into the
//! telemetry service.
//!
//! ## Delivery
//!
//! `send` never touches the network. A ready connector queues the document
//! for its worker thread; an unprovisioned one parks it in a bounded pending
//! buffer and reports the transport as unavailable. `set_ready(true)` moves
//! the pending documents to the worker in arrival order.
//!
//! The worker posts each document with retries:
//! 1. **2xx**: counted as sent
//! 2. **5xx / 429 / transport error**: retried with exponential backoff
//! 3. **other status**: counted as failed, not retried
//!
//! ## Security
//!
//! - **HTTPS**: plain HTTP is accepted for local collectors only by the caller's choice
//! - **Auth**: bearer token, basic credentials or an API key header
//!
//! ## Example Usage
//!
//! ```no_run
//! use bsmtt_connectors::http::{HttpConfig, HttpConnector};
//! use bsmtt_core::TransportSink;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HttpConfig::new("https://collector.example.com")
//!     .basic_auth("device", "secret")
//!     .max_retries(5)
//!     .buffer_capacity(64);
//!
//! let http = HttpConnector::new(config)?;
//! http.set_ready(true);
//! http.send(serde_json::json!({ "eventType": "basic", "@timestamp": 1 }))?;
//! # Ok(())
//! # }
//! ```

use crate::{ConnectionStats, Connector, ConnectorError};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bsmtt_core::{TelemetryError, TelemetryResult, TransportSink};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Base delay for the retry backoff
const RETRY_BASE_MS: u64 = 100;

/// HTTP-specific errors
#[derive(Debug, Error)]
pub enum HttpError {
    /// Network or request error
    #[error("Request failed: {0}")]
    Request(String),

    /// Server returned error status
    #[error("Server error {status}: {message}")]
    ServerError { status: u16, message: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl HttpError {
    fn is_retryable(&self) -> bool {
        match self {
            HttpError::Request(_) => true,
            HttpError::ServerError { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

impl From<HttpError> for ConnectorError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Config(msg) => ConnectorError::ConfigError(msg),
            other => ConnectorError::ProtocolError(other.to_string()),
        }
    }
}

/// HTTP configuration
#[derive(Clone)]
pub struct HttpConfig {
    /// Base URL of the collector
    pub base_url: String,
    /// Path documents are posted to
    pub endpoint: String,
    /// Request timeout
    pub timeout: Duration,
    /// Authentication method
    pub auth: AuthMethod,
    /// Custom headers
    pub headers: HashMap<String, String>,
    /// Retry configuration
    pub max_retries: u32,
    /// User agent string
    pub user_agent: String,
    /// Documents kept while unprovisioned
    pub buffer_capacity: usize,
    /// Documents queued for the worker thread
    pub queue_capacity: usize,
}

/// Authentication methods
#[derive(Clone)]
pub enum AuthMethod {
    /// No authentication
    None,
    /// Bearer token
    Bearer(String),
    /// Basic authentication
    Basic { username: String, password: String },
    /// API key in header
    ApiKey { header: String, value: String },
}

impl std::fmt::Debug for AuthMethod {
    // Credentials stay out of logs
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthMethod::None => f.write_str("None"),
            AuthMethod::Bearer(_) => f.write_str("Bearer(..)"),
            AuthMethod::Basic { username, .. } => write!(f, "Basic({username}, ..)"),
            AuthMethod::ApiKey { header, .. } => write!(f, "ApiKey({header}, ..)"),
        }
    }
}

impl std::fmt::Debug for HttpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpConfig")
            .field("base_url", &self.base_url)
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .field("auth", &self.auth)
            .field("max_retries", &self.max_retries)
            .field("buffer_capacity", &self.buffer_capacity)
            .finish_non_exhaustive()
    }
}

impl HttpConfig {
    /// Create new configuration with base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            endpoint: "/api/v1/events".to_string(),
            timeout: Duration::from_secs(30),
            auth: AuthMethod::None,
            headers: HashMap::new(),
            max_retries: 3,
            user_agent: format!("BSMTT/{}", env!("CARGO_PKG_VERSION")),
            buffer_capacity: 128,
            queue_capacity: 256,
        }
    }

    /// Set the path documents are posted to
    pub fn endpoint(mut self, path: impl Into<String>) -> Self {
        self.endpoint = path.into();
        self
    }

    /// Set bearer token authentication
    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.auth = AuthMethod::Bearer(token.into());
        self
    }

    /// Set basic authentication
    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = AuthMethod::Basic {
            username: username.into(),
            password: password.into(),
        };
        self
    }

    /// Set API key authentication
    pub fn api_key(mut self, header: impl Into<String>, value: impl Into<String>) -> Self {
        self.auth = AuthMethod::ApiKey {
            header: header.into(),
            value: value.into(),
        };
        self
    }

    /// Set request timeout in seconds
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Add custom header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Full URL documents are posted to
    pub fn url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.endpoint.trim_start_matches('/')
        )
    }

    fn validate(&self) -> Result<(), HttpError> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(HttpError::Config("Base URL must start with http:// or https://".into()));
        }
        if self.queue_capacity == 0 {
            return Err(HttpError::Config("queue_capacity must be positive".into()));
        }
        Ok(())
    }
}

/// State shared between the sink side and the worker
struct Shared {
    config: HttpConfig,
    agent: ureq::Agent,
    ready: AtomicBool,
    pending: Mutex<VecDeque<Value>>,
    stats: Mutex<ConnectionStats>,
    in_flight: AtomicUsize,
}

impl Shared {
    fn stats(&self) -> MutexGuard<'_, ConnectionStats> {
        // Counters stay usable even if a holder panicked
        self.stats.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn pending(&self) -> MutexGuard<'_, VecDeque<Value>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Build request with authentication and headers
    fn build_request(&self) -> ureq::Request {
        let mut request = self.agent.post(&self.config.url());

        match &self.config.auth {
            AuthMethod::None => {}
            AuthMethod::Bearer(token) => {
                request = request.set("Authorization", &format!("Bearer {}", token));
            }
            AuthMethod::Basic { username, password } => {
                let credentials = STANDARD.encode(format!("{}:{}", username, password));
                request = request.set("Authorization", &format!("Basic {}", credentials));
            }
            AuthMethod::ApiKey { header, value } => {
                request = request.set(header, value);
            }
        }

        for (name, value) in &self.config.headers {
            request = request.set(name, value);
        }

        request
            .set("Content-Type", "application/json")
            .set("Accept", "application/json")
    }

    /// Post one document, retrying with backoff
    fn post(&self, document: &Value) -> Result<(), HttpError> {
        let body = serde_json::to_string(document).map_err(|e| HttpError::Serialization(e.to_string()))?;
        let request = self.build_request();
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                self.stats().retries += 1;
                thread::sleep(Duration::from_millis(RETRY_BASE_MS << attempt.min(10)));
            }

            let err = match request.clone().send_string(&body) {
                Ok(_) => {
                    let mut stats = self.stats();
                    stats.messages_sent += 1;
                    stats.bytes_sent += body.len() as u64;
                    return Ok(());
                }
                Err(ureq::Error::Status(code, resp)) => HttpError::ServerError {
                    status: code,
                    message: resp.into_string().unwrap_or_default(),
                },
                Err(ureq::Error::Transport(e)) => HttpError::Request(e.to_string()),
            };

            if !err.is_retryable() {
                last_error = Some(err);
                break;
            }
            log::debug!("Attempt {} to {} failed: {}", attempt + 1, self.config.base_url, err);
            last_error = Some(err);
        }

        let err = last_error.unwrap_or_else(|| HttpError::Request("Unknown error".into()));
        let mut stats = self.stats();
        stats.messages_failed += 1;
        stats.last_error = Some(err.to_string());
        Err(err)
    }
}

/// HTTP connector using lightweight ureq client
pub struct HttpConnector {
    shared: Arc<Shared>,
    queue: Option<Sender<Value>>,
    worker: Option<JoinHandle<()>>,
}

impl HttpConnector {
    /// Create new HTTP connector and start its delivery thread
    pub fn new(config: HttpConfig) -> Result<Self, HttpError> {
        config.validate()?;

        let agent = ureq::AgentBuilder::new()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build();

        let (tx, rx) = bounded::<Value>(config.queue_capacity);
        let shared = Arc::new(Shared {
            config,
            agent,
            ready: AtomicBool::new(false),
            pending: Mutex::new(VecDeque::new()),
            stats: Mutex::new(ConnectionStats::default()),
            in_flight: AtomicUsize::new(0),
        });

        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("bsmtt-http".to_string())
            .spawn(move || deliver(&worker_shared, &rx))
            .map_err(|e| HttpError::Config(format!("cannot start delivery thread: {}", e)))?;

        Ok(Self {
            shared,
            queue: Some(tx),
            worker: Some(worker),
        })
    }

    pub fn config(&self) -> &HttpConfig {
        &self.shared.config
    }

    /// Hand a document to the worker thread
    fn enqueue(&self, document: Value) -> Result<(), ConnectorError> {
        let queue = self.queue.as_ref().ok_or(ConnectorError::NotReady)?;
        self.shared.in_flight.fetch_add(1, Ordering::AcqRel);
        match queue.try_send(document) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.shared.in_flight.fetch_sub(1, Ordering::AcqRel);
                let mut stats = self.shared.stats();
                stats.messages_failed += 1;
                stats.last_error = Some(ConnectorError::BufferFull.to_string());
                Err(ConnectorError::BufferFull)
            }
            Err(TrySendError::Disconnected(_)) => {
                self.shared.in_flight.fetch_sub(1, Ordering::AcqRel);
                Err(ConnectorError::ProtocolError("delivery thread stopped".into()))
            }
        }
    }

    /// Park a document until the gate opens
    ///
    /// The gate is re-read under the pending lock; a document that finds it
    /// open is handed back for immediate delivery.
    fn hold(&self, document: Value) -> Option<Value> {
        let capacity = self.shared.config.buffer_capacity;
        let mut pending = self.shared.pending();
        if self.shared.ready.load(Ordering::Acquire) {
            return Some(document);
        }
        let mut stats = self.shared.stats();
        if capacity == 0 {
            stats.messages_dropped += 1;
            return None;
        }
        if pending.len() >= capacity {
            pending.pop_front();
            stats.messages_dropped += 1;
        }
        pending.push_back(document);
        stats.messages_buffered += 1;
        None
    }

    /// Move parked documents to the worker in arrival order
    fn flush(&self, documents: Vec<Value>) {
        if documents.is_empty() {
            return;
        }
        log::info!("Flushing {} buffered telemetry documents", documents.len());
        for document in documents {
            if let Err(e) = self.enqueue(document) {
                log::warn!("Buffered document lost: {}", e);
            }
        }
    }

    /// Block until every queued document has been attempted
    pub fn wait_idle(&self, timeout: Duration) -> Result<(), ConnectorError> {
        let deadline = Instant::now() + timeout;
        while self.shared.in_flight.load(Ordering::Acquire) > 0 {
            if Instant::now() >= deadline {
                return Err(ConnectorError::Timeout);
            }
            thread::sleep(Duration::from_millis(5));
        }
        Ok(())
    }

    /// Stop accepting documents and wait for the worker to finish the queue
    pub fn shutdown(&mut self) {
        self.shared.ready.store(false, Ordering::Release);
        self.queue.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::warn!("HTTP delivery thread panicked");
            }
        }
    }
}

/// Worker loop; ends when the connector drops its sender
fn deliver(shared: &Shared, rx: &Receiver<Value>) {
    for document in rx.iter() {
        if let Err(e) = shared.post(&document) {
            log::warn!("Telemetry document not delivered: {}", e);
        }
        shared.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

impl TransportSink for HttpConnector {
    fn send(&self, document: Value) -> TelemetryResult<()> {
        let document = if self.is_ready() {
            document
        } else {
            match self.hold(document) {
                Some(document) => document,
                None => return Err(TelemetryError::TransportUnavailable),
            }
        };
        self.enqueue(document).map_err(TelemetryError::from)
    }

    fn set_ready(&self, ready: bool) {
        // Flip and drain under the pending lock so no parked document misses the flush
        let parked: Vec<Value> = {
            let mut pending = self.shared.pending();
            let was_ready = self.shared.ready.swap(ready, Ordering::AcqRel);
            if ready && !was_ready {
                pending.drain(..).collect()
            } else {
                Vec::new()
            }
        };
        self.flush(parked);
    }

    fn is_ready(&self) -> bool {
        self.shared.ready.load(Ordering::Acquire)
    }
}

impl Connector for HttpConnector {
    fn stats(&self) -> ConnectionStats {
        self.shared.stats().clone()
    }

    fn pending(&self) -> usize {
        self.shared.pending().len()
    }
}

impl Drop for HttpConnector {
    // Detach: the worker drains what is queued and exits on its own
    fn drop(&mut self) {
        self.queue.take();
        self.worker.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // Nothing listens on the discard port; requests fail fast
    const UNREACHABLE: &str = "http://127.0.0.1:9";

    fn offline(buffer: usize) -> HttpConnector {
        HttpConnector::new(HttpConfig::new(UNREACHABLE).max_retries(0).buffer_capacity(buffer)).unwrap()
    }

    #[test]
    fn test_config_builder() {
        let config = HttpConfig::new("https://collector.example.com/")
            .endpoint("/telemetry")
            .bearer_token("test-token")
            .timeout_secs(60)
            .buffer_capacity(50)
            .header("X-Custom", "value");

        assert_eq!(config.url(), "https://collector.example.com/telemetry");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.buffer_capacity, 50);
        assert!(config.headers.contains_key("X-Custom"));
        assert!(config.user_agent.starts_with("BSMTT/"));

        match config.auth {
            AuthMethod::Bearer(token) => assert_eq!(token, "test-token"),
            _ => panic!("Wrong auth method"),
        }
    }

    #[test]
    fn test_url_validation() {
        let result = HttpConnector::new(HttpConfig::new("not-a-url"));
        assert!(matches!(result, Err(HttpError::Config(_))));

        let result = HttpConnector::new(HttpConfig::new("https://valid.url"));
        assert!(result.is_ok());
    }

    #[test]
    fn debug_hides_credentials() {
        let config = HttpConfig::new("https://x.y").basic_auth("device", "hunter2");
        let printed = format!("{:?}", config);
        assert!(printed.contains("device"));
        assert!(!printed.contains("hunter2"));
    }

    #[test]
    fn basic_auth_header_is_base64() {
        let config = HttpConfig::new(UNREACHABLE).basic_auth("device", "secret");
        let connector = HttpConnector::new(config).unwrap();
        let request = connector.shared.build_request();
        assert_eq!(request.header("Authorization"), Some("Basic ZGV2aWNlOnNlY3JldA=="));
        assert_eq!(request.header("Content-Type"), Some("application/json"));
    }

    #[test]
    fn unprovisioned_connector_holds_documents() {
        let connector = offline(8);
        let result = connector.send(json!({ "n": 1 }));
        assert_eq!(result, Err(TelemetryError::TransportUnavailable));
        assert_eq!(connector.pending(), 1);
        assert_eq!(connector.stats().messages_buffered, 1);
    }

    #[test]
    fn full_buffer_drops_oldest() {
        let connector = offline(2);
        for n in 0..3 {
            let _ = connector.send(json!({ "n": n }));
        }
        let pending: Vec<Value> = connector.shared.pending().iter().cloned().collect();
        assert_eq!(pending, vec![json!({ "n": 1 }), json!({ "n": 2 })]);
        assert_eq!(connector.stats().messages_dropped, 1);
    }

    #[test]
    fn opening_gate_flushes_to_worker() {
        let connector = offline(8);
        let _ = connector.send(json!({ "n": 1 }));
        let _ = connector.send(json!({ "n": 2 }));

        connector.set_ready(true);
        assert_eq!(connector.pending(), 0);
        connector.wait_idle(Duration::from_secs(10)).unwrap();

        let stats = connector.stats();
        assert_eq!(stats.messages_failed, 2);
        assert_eq!(stats.messages_sent, 0);
        assert!(stats.last_error.is_some());
    }

    #[test]
    fn server_errors_are_retryable_client_errors_are_not() {
        let server = HttpError::ServerError { status: 503, message: String::new() };
        let limited = HttpError::ServerError { status: 429, message: String::new() };
        let client = HttpError::ServerError { status: 400, message: String::new() };
        assert!(server.is_retryable());
        assert!(limited.is_retryable());
        assert!(!client.is_retryable());
        assert!(HttpError::Request("refused".into()).is_retryable());
    }

    #[test]
    fn concurrent_gate_flips_leave_nothing_parked() {
        let connector = offline(1_024);
        thread::scope(|scope| {
            scope.spawn(|| {
                for n in 0..500 {
                    let _ = connector.send(json!({ "n": n }));
                }
            });
            scope.spawn(|| {
                for n in 0..500 {
                    connector.set_ready(n % 2 == 0);
                }
            });
        });

        connector.set_ready(true);
        assert_eq!(connector.pending(), 0);
    }

    #[test]
    fn drop_does_not_wait_for_retries() {
        let connector =
            HttpConnector::new(HttpConfig::new(UNREACHABLE).max_retries(3)).unwrap();
        connector.set_ready(true);
        for n in 0..5 {
            connector.send(json!({ "n": n })).unwrap();
        }

        let started = Instant::now();
        drop(connector);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn shutdown_closes_the_gate() {
        let mut connector = offline(8);
        connector.set_ready(true);
        connector.shutdown();
        assert!(!connector.is_ready());
        assert!(connector.enqueue(json!({})).is_err());
    }
}
