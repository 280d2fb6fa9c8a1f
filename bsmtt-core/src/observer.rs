//! Observer notification
//!
//! Every dispatched document is mirrored to local listeners (bound UI
//! clients, loggers). Notification is fire-and-forget: a listener that
//! declines a document does not affect the others or the transport.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use heapless::Vec;
use serde_json::Value;

use crate::errors::{TelemetryError, TelemetryResult};

/// Maximum number of registered listeners
pub const MAX_OBSERVERS: usize = 8;

/// Receives mirrored documents
pub trait TelemetryListener: Send {
    /// Handle a document; returns whether it was processed
    fn on_receive(&mut self, document: &Value) -> bool;
}

/// Handle returned on registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u32);

/// Fixed-capacity listener registry
pub struct Observers {
    listeners: Vec<(ListenerId, Box<dyn TelemetryListener>), MAX_OBSERVERS>,
    next_id: u32,
}

impl Default for Observers {
    fn default() -> Self {
        Self::new()
    }
}

impl Observers {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
            next_id: 0,
        }
    }

    /// Add a listener
    pub fn register(&mut self, listener: Box<dyn TelemetryListener>) -> TelemetryResult<ListenerId> {
        let id = ListenerId(self.next_id);
        self.listeners
            .push((id, listener))
            .map_err(|_| TelemetryError::TooManyObservers { max: MAX_OBSERVERS })?;
        self.next_id = self.next_id.wrapping_add(1);
        Ok(id)
    }

    /// Remove a listener; returns whether it was registered
    pub fn unregister(&mut self, id: ListenerId) -> bool {
        match self.listeners.iter().position(|(lid, _)| *lid == id) {
            Some(pos) => {
                self.listeners.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Drop every listener
    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Mirror a document to every listener
    pub fn notify(&mut self, document: &Value) {
        for (id, listener) in self.listeners.iter_mut() {
            if !listener.on_receive(document) {
                log::debug!("Observer {:?} did not process document", id);
            }
        }
    }
}

/// Listener forwarding documents into a bounded channel
///
/// Full or disconnected channels drop the document.
pub struct ChannelListener {
    tx: Sender<Value>,
}

impl TelemetryListener for ChannelListener {
    fn on_receive(&mut self, document: &Value) -> bool {
        match self.tx.try_send(document.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Create a channel listener and the receiving end
pub fn channel_listener(capacity: usize) -> (ChannelListener, Receiver<Value>) {
    let (tx, rx) = bounded(capacity.max(1));
    (ChannelListener { tx }, rx)
}
