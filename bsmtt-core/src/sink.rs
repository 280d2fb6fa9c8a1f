//! Transport sink contract
//!
//! The sink delivers documents to the remote collector. Its readiness is
//! driven by the identity provisioning client and may flip at any time from
//! another thread, so implementations keep it in an atomic and never hold a
//! lock across a send.
//!
//! What happens to a document while the sink is not ready (buffer, drop) is
//! the sink's decision. The core only observes the result.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use serde_json::Value;

use crate::errors::{TelemetryError, TelemetryResult};

/// Outbound transport for telemetry documents
pub trait TransportSink: Send + Sync {
    /// Hand a document over for delivery
    ///
    /// `Err(TransportUnavailable)` reports that the sink is not provisioned
    /// and did not accept the document.
    fn send(&self, document: Value) -> TelemetryResult<()>;

    /// Flip the provisioning gate
    fn set_ready(&self, ready: bool);

    /// Current provisioning gate
    fn is_ready(&self) -> bool;
}

/// In-memory sink for tests and replay
///
/// Accepts documents only while ready; documents offered while not ready are
/// counted and dropped.
#[derive(Debug, Default)]
pub struct MemorySink {
    ready: AtomicBool,
    sent: Mutex<Vec<Value>>,
    rejected: AtomicU64,
}

impl MemorySink {
    /// Create a sink in the given provisioning state
    pub fn new(ready: bool) -> Self {
        Self {
            ready: AtomicBool::new(ready),
            ..Self::default()
        }
    }

    /// Documents accepted so far
    pub fn sent(&self) -> Vec<Value> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Remove and return accepted documents
    pub fn take(&self) -> Vec<Value> {
        self.sent.lock().map(|mut s| std::mem::take(&mut *s)).unwrap_or_default()
    }

    /// Documents refused while not ready
    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }
}

impl TransportSink for MemorySink {
    fn send(&self, document: Value) -> TelemetryResult<()> {
        if !self.is_ready() {
            self.rejected.fetch_add(1, Ordering::Relaxed);
            return Err(TelemetryError::TransportUnavailable);
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(document);
        }
        Ok(())
    }

    fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::Release);
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }
}
