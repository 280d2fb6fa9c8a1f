//! Telemetry service: refresh orchestration and dispatch
//!
//! ## Overview
//!
//! The service owns the event registry and reacts to observations delivered
//! one at a time by the host:
//!
//! ```text
//! observation ──→ refresh_all_info() ──→ send_data_if_needed()
//!                  │                       │
//!                  ├ identity   → basic    ├ location gate
//!                  ├ operator   → all      ├ slot order: basic, connection, phone, cell
//!                  ├ roaming    → conn     ├ drain ready records
//!                  └ cell       → cell     └ sink + observers
//! ```
//!
//! ## Refresh Order
//!
//! 1. Identity fields into the basic record (best effort, per field)
//! 2. Network operator into every record holding network fields
//! 3. Roaming tri-state, data state and mobile flag into the connection record
//! 4. Cell location, then cell signal, merged into the cell record
//!
//! A location update runs the selector before all of this and stops early
//! when the sample is not better than the current one.
//!
//! ## Failure Isolation
//!
//! A data source error blanks one field and is logged. A document that fails
//! to build is logged and the record stays armed for the next cycle. An
//! unprovisioned sink is a gating state; the connector owns what happens to
//! the document.
//!
//! ## Threading
//!
//! All methods take `&mut self`. The service is meant to be owned by one
//! thread that receives observations serially (see `runner`). The only state
//! touched from elsewhere is the sink's provisioning gate, which is atomic.

use std::sync::Arc;

use serde_json::Value;

use crate::{
    config::TelemetryConfig,
    errors::{TelemetryError, TelemetryResult},
    events::{EventKind, EventRecord, NetworkOperator, PhoneInfo, Roaming},
    location::{is_better_location_with, Location},
    observer::Observers,
    phone::{PhoneResponse, RadioChange},
    provisioning::is_identity_ready,
    registry::EventRegistry,
    sink::TransportSink,
    sources::{DeviceSource, LocationSource},
    time::TimeSource,
};

/// Data state reported when the radio cannot tell
pub const DATA_STATE_UNKNOWN: i32 = -1;

/// Inbound message for the service
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    /// New location fix from a provider
    Location(Location),
    /// Radio state change; `response` is the listener's current snapshot
    RadioState {
        change: RadioChange,
        response: Option<PhoneResponse>,
    },
    /// Manual refresh trigger
    Refresh,
    /// Identity provisioning state string
    Provisioning(String),
    /// Stop the service
    Shutdown,
}

/// What a single dispatch cycle did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Records drained, in emission order
    pub dispatched: Vec<EventKind>,
    /// Records whose document could not be built
    pub failed: Vec<EventKind>,
    /// Drained documents the sink refused because it was not provisioned
    pub gated: Vec<EventKind>,
}

impl DispatchReport {
    pub fn is_empty(&self) -> bool {
        self.dispatched.is_empty() && self.failed.is_empty()
    }
}

/// Cumulative counters for a session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceStats {
    /// Observations handled
    pub observations: u64,
    /// Documents drained and forwarded
    pub documents_dispatched: u64,
    /// Documents that failed to build
    pub documents_failed: u64,
    /// Documents refused by an unprovisioned sink
    pub transport_gated: u64,
    /// Location samples rejected by the selector
    pub locations_rejected: u64,
    /// Data source reads that failed
    pub source_errors: u64,
}

/// The telemetry collector
pub struct TelemetryService {
    config: TelemetryConfig,
    registry: EventRegistry,
    device: Box<dyn DeviceSource + Send>,
    sink: Arc<dyn TransportSink>,
    observers: Observers,
    clock: Box<dyn TimeSource>,
    stats: ServiceStats,
    initialized: bool,
}

impl TelemetryService {
    /// Create a service; call [`initialize`](Self::initialize) before feeding observations
    pub fn new(
        config: TelemetryConfig,
        device: Box<dyn DeviceSource + Send>,
        sink: Arc<dyn TransportSink>,
        clock: Box<dyn TimeSource>,
    ) -> TelemetryResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            registry: EventRegistry::new(),
            device,
            sink,
            observers: Observers::new(),
            clock,
            stats: ServiceStats::default(),
            initialized: false,
        })
    }

    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }

    pub fn registry(&self) -> &EventRegistry {
        &self.registry
    }

    pub fn observers_mut(&mut self) -> &mut Observers {
        &mut self.observers
    }

    pub fn sink(&self) -> &Arc<dyn TransportSink> {
        &self.sink
    }

    pub fn stats(&self) -> &ServiceStats {
        &self.stats
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Create the records, seed the location from cached fixes and run the
    /// first refresh. Nothing is dispatched.
    pub fn initialize(&mut self, locations: &dyn LocationSource) {
        self.registry = EventRegistry::new();

        let mut seed: Option<Location> = None;
        for provider in &self.config.location_providers {
            if !locations.is_provider_enabled(provider) {
                continue;
            }
            match locations.last_known_location(provider) {
                Ok(Some(location)) => seed = Some(location),
                Ok(None) => {}
                Err(e) => {
                    self.stats.source_errors += 1;
                    log::warn!("No cached location from {}: {}", provider, e);
                }
            }
        }
        if let Some(location) = seed {
            self.registry.change_location_at_all(location);
        }

        self.refresh_all_info();
        self.initialized = true;
        log::info!(
            "Telemetry service initialized (location {})",
            if self.registry.location().is_some() { "known" } else { "pending" }
        );
    }

    /// Handle one observation; returns `false` once the service should stop
    pub fn handle(&mut self, observation: Observation) -> bool {
        self.stats.observations += 1;
        match observation {
            Observation::Location(location) => {
                self.on_location_changed(location);
            }
            Observation::RadioState { change, response } => {
                self.on_phone_response_change(change, response);
            }
            Observation::Refresh => {
                self.refresh_all_info();
                self.send_data_if_needed();
            }
            Observation::Provisioning(state) => self.on_provisioning_state(&state),
            Observation::Shutdown => {
                self.shutdown();
                return false;
            }
        }
        true
    }

    /// A location fix arrived. Returns the dispatch report when the fix was
    /// accepted, `None` when the selector kept the current location.
    pub fn on_location_changed(&mut self, location: Location) -> Option<DispatchReport> {
        let thresholds = self.config.thresholds();
        if !is_better_location_with(&location, self.registry.location(), &thresholds) {
            self.stats.locations_rejected += 1;
            log::debug!(
                "Keeping current location, rejected fix from {:?} at {}",
                location.provider,
                location.time
            );
            return None;
        }

        self.registry.change_location_at_all(location);
        self.refresh_all_info();
        Some(self.send_data_if_needed())
    }

    /// The radio reported a state change
    pub fn on_phone_response_change(
        &mut self,
        change: RadioChange,
        response: Option<PhoneResponse>,
    ) -> DispatchReport {
        if let Some(mut response) = response {
            response.set_tx(self.device.mobile_tx_bytes());
            response.set_rx(self.device.mobile_rx_bytes());
            self.registry.phone_mut().change_phone_response(response);
            self.registry.cell_mut().mark_radio_change();
        } else {
            log::debug!("Radio change {:?} without snapshot", change);
        }

        self.refresh_all_info();
        self.send_data_if_needed()
    }

    /// The provisioning client reported a new state
    pub fn on_provisioning_state(&mut self, state: &str) {
        let ready = is_identity_ready(state);
        if ready != self.sink.is_ready() {
            log::info!("Transport {}", if ready { "ready" } else { "not ready" });
        }
        self.sink.set_ready(ready);
    }

    /// Re-derive every refreshable field
    pub fn refresh_all_info(&mut self) {
        self.retrieve_basic_phone_information();
        self.refresh_advanced_phone_information();
    }

    fn retrieve_basic_phone_information(&mut self) {
        // A failed read keeps what an earlier refresh obtained
        let known = self.registry.basic().info().clone();
        let info = PhoneInfo {
            vendor: self.read_or_keep("vendor", known.vendor, |d| d.vendor()),
            model: self.read_or_keep("model", known.model, |d| d.model()),
            phone_type: self.read_or_keep("phone_type", known.phone_type, |d| d.phone_type()),
            subscriber_id: self.read_or_keep("subscriber_id", known.subscriber_id, |d| d.subscriber_id()),
            device_id: self.read_or_keep("device_id", known.device_id, |d| d.device_id()),
            line_number: self.read_or_keep("line_number", known.line_number, |d| d.line_number()),
            sim_serial: self.read_or_keep("sim_serial", known.sim_serial, |d| d.sim_serial()),
        };
        self.registry.change_phone_info_at_all(&info);
    }

    fn refresh_advanced_phone_information(&mut self) {
        // Network
        let operator = NetworkOperator::new(
            self.read("network_operator", |d| d.network_operator()),
            self.read("network_operator_name", |d| d.network_operator_name()),
        );
        self.registry.change_operator_at_all(&operator);

        // Connection
        let is_roaming = self.read_or("roaming", false, |d| d.is_network_roaming());
        let type_known = self.read_or("network_type", false, |d| d.is_network_type_known());
        let roaming = Roaming::from_radio(is_roaming, type_known);
        let has_mobile = self.read_or("mobile_connection", false, |d| d.has_mobile_connection());
        let data_state = self.read_or("data_state", DATA_STATE_UNKNOWN, |d| d.data_state());
        self.registry
            .connection_mut()
            .change_network(has_mobile, data_state, roaming);

        // Cell
        let phone_type = self.registry.cell().phone_type().map(str::to_owned);
        let cell_location = self.read("cell_location", |d| d.cell_location(phone_type.as_deref()));
        let cell_signal = self.read("cell_signal", |d| d.cell_signal());
        let cell_data = self
            .registry
            .cell()
            .cell_data()
            .with_location(cell_location.as_ref())
            .with_signal(cell_signal.as_ref());
        self.registry.cell_mut().change_cell(cell_data);
    }

    /// Drain every ready record into the sink and observers
    pub fn send_data_if_needed(&mut self) -> DispatchReport {
        let mut report = DispatchReport::default();
        let timestamp = self.clock.now();

        for record in self.registry.visible_mut() {
            if !record.is_ready() {
                continue;
            }
            let kind = record.kind();
            match record.drain(timestamp) {
                Ok(Some(document)) => {
                    Self::send_json(self.sink.as_ref(), &mut self.observers, kind, document, &mut report);
                }
                Ok(None) => {}
                Err(e) => {
                    log::warn!("Skipping {} event this cycle: {}", kind.name(), e);
                    report.failed.push(kind);
                }
            }
        }

        self.stats.documents_dispatched += report.dispatched.len() as u64;
        self.stats.documents_failed += report.failed.len() as u64;
        self.stats.transport_gated += report.gated.len() as u64;
        report
    }

    fn send_json(
        sink: &dyn TransportSink,
        observers: &mut Observers,
        kind: EventKind,
        document: Value,
        report: &mut DispatchReport,
    ) {
        // The sink owns its copy from here on
        match sink.send(document.clone()) {
            Ok(()) => {}
            Err(TelemetryError::TransportUnavailable) => {
                log::debug!("Transport not ready, {} event left to the connector", kind.name());
                report.gated.push(kind);
            }
            Err(e) => log::warn!("Transport refused {} event: {}", kind.name(), e),
        }
        observers.notify(&document);
        report.dispatched.push(kind);
    }

    /// Unregister listeners; no further dispatch is expected
    pub fn shutdown(&mut self) {
        self.observers.clear();
        log::info!(
            "Telemetry service stopped after {} observations, {} documents dispatched",
            self.stats.observations,
            self.stats.documents_dispatched
        );
    }

    fn read<T>(
        &mut self,
        field: &'static str,
        f: impl FnOnce(&dyn DeviceSource) -> TelemetryResult<Option<T>>,
    ) -> Option<T> {
        match f(self.device.as_ref()) {
            Ok(value) => value,
            Err(e) => {
                self.stats.source_errors += 1;
                log::warn!("Leaving {} empty: {}", field, e);
                None
            }
        }
    }

    fn read_or_keep<T>(
        &mut self,
        field: &'static str,
        known: Option<T>,
        f: impl FnOnce(&dyn DeviceSource) -> TelemetryResult<Option<T>>,
    ) -> Option<T> {
        match f(self.device.as_ref()) {
            Ok(value) => value,
            Err(e) => {
                self.stats.source_errors += 1;
                log::warn!("Keeping previous {}: {}", field, e);
                known
            }
        }
    }

    fn read_or<T>(
        &mut self,
        field: &'static str,
        default: T,
        f: impl FnOnce(&dyn DeviceSource) -> TelemetryResult<T>,
    ) -> T {
        self.read(field, |d| f(d).map(Some)).unwrap_or(default)
    }
}

impl std::fmt::Debug for TelemetryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryService")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("stats", &self.stats)
            .field("initialized", &self.initialized)
            .finish_non_exhaustive()
    }
}
