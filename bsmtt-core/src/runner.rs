//! Service runner
//!
//! Host callbacks are turned into [`Observation`] messages on a bounded
//! channel. One named worker thread owns the service and consumes them
//! serially, so the registry never needs a lock.
//!
//! Enqueueing never blocks the host callback: a full channel drops the
//! observation and counts it. Shutdown is a message; dropping every sender
//! has the same effect.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use crate::{
    errors::{TelemetryError, TelemetryResult},
    location::Location,
    phone::{PhoneResponse, RadioChange},
    service::{Observation, TelemetryService},
};

/// Cloneable inbound handle for host callbacks
#[derive(Debug, Clone)]
pub struct ObservationSender {
    tx: Sender<Observation>,
    dropped: Arc<AtomicU64>,
}

impl ObservationSender {
    /// Non-blocking enqueue
    pub fn send(&self, observation: Observation) -> TelemetryResult<()> {
        match self.tx.try_send(observation) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(observation)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                log::warn!("Observation queue full, dropping {:?}", observation);
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => Err(TelemetryError::Disconnected),
        }
    }

    pub fn location(&self, location: Location) -> TelemetryResult<()> {
        self.send(Observation::Location(location))
    }

    pub fn radio_state(&self, change: RadioChange, response: Option<PhoneResponse>) -> TelemetryResult<()> {
        self.send(Observation::RadioState { change, response })
    }

    pub fn refresh(&self) -> TelemetryResult<()> {
        self.send(Observation::Refresh)
    }

    pub fn provisioning(&self, state: impl Into<String>) -> TelemetryResult<()> {
        self.send(Observation::Provisioning(state.into()))
    }

    /// Observations dropped because the queue was full
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Worker thread owning a [`TelemetryService`]
#[derive(Debug)]
pub struct ServiceRunner {
    sender: ObservationSender,
    join: Option<JoinHandle<TelemetryService>>,
}

impl ServiceRunner {
    /// Move an initialized service onto its own thread
    pub fn spawn(service: TelemetryService) -> TelemetryResult<Self> {
        let capacity = service.config().observation_queue_capacity.max(1);
        let (tx, rx) = bounded::<Observation>(capacity);

        let join = thread::Builder::new()
            .name("bsmtt-telemetry".to_string())
            .spawn(move || {
                let mut service = service;
                run(&mut service, &rx);
                service
            })
            .map_err(|e| TelemetryError::Runtime(e.to_string()))?;

        Ok(Self {
            sender: ObservationSender {
                tx,
                dropped: Arc::new(AtomicU64::new(0)),
            },
            join: Some(join),
        })
    }

    /// Handle for host callbacks
    pub fn sender(&self) -> ObservationSender {
        self.sender.clone()
    }

    /// Stop the worker after it has handled everything queued before this
    /// call, and hand the service back
    pub fn shutdown(mut self) -> TelemetryResult<TelemetryService> {
        // Blocking send: shutdown must not be dropped on a full queue
        if self.sender.tx.send(Observation::Shutdown).is_err() {
            log::debug!("Telemetry worker already stopped");
        }
        let join = self.join.take().ok_or(TelemetryError::Disconnected)?;
        join.join()
            .map_err(|_| TelemetryError::Runtime("telemetry worker panicked".into()))
    }
}

/// Consume observations until shutdown or until every sender is gone
pub fn run(service: &mut TelemetryService, rx: &Receiver<Observation>) {
    for observation in rx.iter() {
        if !service.handle(observation) {
            return;
        }
    }
    service.shutdown();
}
