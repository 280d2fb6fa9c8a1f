//! Error Types for Telemetry Collection and Dispatch
//!
//! ## Design Philosophy
//!
//! Every failure in the collector is local to the thing it concerns:
//!
//! 1. **Field scoped**: A data source that cannot be read (missing capability,
//!    driver fault) leaves its fields `null`. The refresh cycle continues.
//!
//! 2. **Record scoped**: A document that cannot be serialized is skipped for
//!    the current dispatch cycle. Sibling records still go out.
//!
//! 3. **Gating, not failing**: An unprovisioned transport is a state. The
//!    connector decides whether to buffer or drop; the core never retries.
//!
//! ## Error Categories
//!
//! ### Data Sources
//! - `PermissionDenied`: A required capability was not granted
//! - `SourceUnavailable`: The source exists but returned nothing usable
//!
//! ### Dispatch
//! - `MalformedDocument`: A record's document could not be produced
//! - `TransportUnavailable`: The sink is not provisioned yet
//!
//! ### Runtime
//! - `Config`: Invalid configuration value
//! - `TooManyObservers`: Observer registry full
//! - `Runtime`: Worker thread could not be started or died
//! - `Disconnected`: The observation channel is closed
//!
//! ## Error Handling Strategy
//!
//! ```rust
//! use bsmtt_core::errors::TelemetryError;
//!
//! fn read_subscriber(result: Result<Option<String>, TelemetryError>) -> Option<String> {
//!     match result {
//!         Ok(value) => value,
//!         Err(TelemetryError::PermissionDenied { .. }) => None,
//!         Err(_) => None,
//!     }
//! }
//! ```

use thiserror::Error;

/// Result type for telemetry operations
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Errors raised by the collector and its collaborators
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TelemetryError {
    /// A capability required by the data source was not granted
    #[error("Permission denied while reading {source_name}")]
    PermissionDenied {
        /// Name of the data source that refused access
        source_name: &'static str,
    },

    /// Data source present but unable to answer
    #[error("Source {source_name} unavailable: {reason}")]
    SourceUnavailable {
        /// Name of the data source
        source_name: &'static str,
        /// Driver-provided reason
        reason: String,
    },

    /// An event record could not be turned into a JSON document
    #[error("Malformed {event} document: {reason}")]
    MalformedDocument {
        /// Event record name (`basic`, `connection`, `phone`, `cell`)
        event: &'static str,
        /// What went wrong
        reason: String,
    },

    /// Transport sink has no provisioned identity yet
    #[error("Transport unavailable: identity not provisioned")]
    TransportUnavailable,

    /// Configuration rejected
    #[error("Configuration error: {0}")]
    Config(String),

    /// Observer registry is full
    #[error("Observer limit reached ({max})")]
    TooManyObservers {
        /// Registry capacity
        max: usize,
    },

    /// Runtime failure (thread spawn, worker panic)
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// Observation channel closed
    #[error("Observation channel disconnected")]
    Disconnected,
}

impl TelemetryError {
    /// Build a malformed-document error from a serde failure
    pub fn malformed(event: &'static str, err: &serde_json::Error) -> Self {
        Self::MalformedDocument {
            event,
            reason: err.to_string(),
        }
    }
}
