//! Transport Connectors for BSMTT Telemetry
//!
//! ## Overview
//!
//! A connector is the transport sink the telemetry service hands finished
//! documents to. The service does not queue or retry; everything past the
//! hand-off belongs to the connector.
//!
//! ## Connector Design Patterns
//!
//! ### 1. Provisioning Gate
//!
//! A connector starts unprovisioned. The service flips the gate when the
//! identity client reports a usable state. While the gate is closed the
//! connector refuses the document for the caller's accounting but keeps a
//! copy:
//! ```text
//! if ready {
//!     queue_for_worker(document)
//! } else {
//!     pending.push(document);
//!     if pending.full() {
//!         pending.drop_oldest();  // Prioritize recent data
//!     }
//! }
//! ```
//! Opening the gate flushes the pending documents in arrival order.
//!
//! ### 2. Retry Logic
//!
//! Exponential backoff on server errors (5xx, 429) and transport failures:
//! ```text
//! retry_delay = base * 2^attempt
//! ```
//! Client errors (4xx) are not retried.
//!
//! ### 3. Delivery Thread
//!
//! Requests run on a dedicated worker thread fed over a bounded channel, so
//! the telemetry thread never blocks on the network.
//!
//! ## Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use bsmtt_connectors::http::{HttpConfig, HttpConnector};
//!
//! let config = HttpConfig::new("https://collector.example.com")
//!     .endpoint("/api/v1/events")
//!     .bearer_token("device-token")
//!     .timeout_secs(15);
//! let connector = Arc::new(HttpConnector::new(config)?);
//! // Hand `connector.clone()` to `TelemetryService::new` as its sink
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(unsafe_code)]

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::{AuthMethod, HttpConfig, HttpConnector, HttpError};

use bsmtt_core::{TelemetryError, TransportSink};
use thiserror::Error;

/// Common connector errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectorError {
    #[error("Not ready")]
    NotReady,

    #[error("Buffer full")]
    BufferFull,

    #[error("Timeout")]
    Timeout,

    #[error("Protocol error: {0}")]
    ProtocolError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<ConnectorError> for TelemetryError {
    fn from(err: ConnectorError) -> Self {
        match err {
            ConnectorError::NotReady => TelemetryError::TransportUnavailable,
            ConnectorError::ConfigError(msg) => TelemetryError::Config(msg),
            other => TelemetryError::Runtime(other.to_string()),
        }
    }
}

/// A transport sink that reports delivery statistics
pub trait Connector: TransportSink {
    /// Get connection statistics
    fn stats(&self) -> ConnectionStats;

    /// Documents held back while the gate is closed
    fn pending(&self) -> usize;
}

/// Connection statistics common to all connectors
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConnectionStats {
    /// Total messages sent successfully
    pub messages_sent: u64,
    /// Total messages failed to send
    pub messages_failed: u64,
    /// Total bytes sent
    pub bytes_sent: u64,
    /// Messages held while unprovisioned
    pub messages_buffered: u64,
    /// Buffered messages evicted to make room for newer ones
    pub messages_dropped: u64,
    /// Retries performed
    pub retries: u64,
    /// Last error message
    pub last_error: Option<String>,
}
