//! Common test utilities for integration tests
//!
//! This module provides:
//! - A scriptable device source whose answers can be changed mid-test
//! - A location source with per-provider cached fixes
//! - Location generators
//! - Service construction helpers

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use bsmtt_core::{
    cell::{CellLocation, CellSignal, NetworkGeneration},
    config::TelemetryConfig,
    errors::{TelemetryError, TelemetryResult},
    location::Location,
    service::TelemetryService,
    sink::MemorySink,
    sources::{DeviceSource, LocationSource},
    time::FixedTime,
};

/// Answers returned by [`FakeDevice`]
#[derive(Debug, Clone)]
pub struct DeviceState {
    pub vendor: Option<String>,
    pub model: Option<String>,
    pub phone_type: Option<String>,
    pub subscriber_id: Option<String>,
    pub device_id: Option<String>,
    pub line_number: Option<String>,
    pub sim_serial: Option<String>,
    pub operator_code: Option<String>,
    pub operator_name: Option<String>,
    pub roaming: bool,
    pub network_type_known: bool,
    pub data_state: i32,
    pub mobile_connection: bool,
    pub cell_location: Option<CellLocation>,
    pub cell_signal: Option<CellSignal>,
    pub tx_bytes: i64,
    pub rx_bytes: i64,
    /// Identity reads fail as if the phone-state permission was refused
    pub deny_identity: bool,
    /// Cell reads fail as if the location permission was refused
    pub deny_cell: bool,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            vendor: Some("Acme".into()),
            model: Some("Rocket 3".into()),
            phone_type: Some("GSM".into()),
            subscriber_id: Some("230011234567890".into()),
            device_id: Some("356938035643809".into()),
            line_number: Some("+420777123456".into()),
            sim_serial: Some("8942001234567890123".into()),
            operator_code: Some("23001".into()),
            operator_name: Some("T-Mobile CZ".into()),
            roaming: false,
            network_type_known: true,
            data_state: 2,
            mobile_connection: true,
            cell_location: Some(CellLocation {
                cell_id: Some(40211),
                area_code: Some(3100),
            }),
            cell_signal: Some(CellSignal {
                signal_strength: Some(-85),
                generation: NetworkGeneration::G4,
            }),
            tx_bytes: 10_240,
            rx_bytes: 99_000,
            deny_identity: false,
            deny_cell: false,
        }
    }
}

/// Device source backed by shared, mutable state
#[derive(Debug, Clone, Default)]
pub struct FakeDevice {
    pub state: Arc<Mutex<DeviceState>>,
}

impl FakeDevice {
    pub fn new(state: DeviceState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn update(&self, f: impl FnOnce(&mut DeviceState)) {
        f(&mut self.state.lock().unwrap());
    }

    fn identity(&self, f: impl FnOnce(&DeviceState) -> Option<String>) -> TelemetryResult<Option<String>> {
        let state = self.state.lock().unwrap();
        if state.deny_identity {
            return Err(TelemetryError::PermissionDenied {
                source_name: "telephony",
            });
        }
        Ok(f(&state))
    }
}

impl DeviceSource for FakeDevice {
    fn vendor(&self) -> TelemetryResult<Option<String>> {
        Ok(self.state.lock().unwrap().vendor.clone())
    }

    fn model(&self) -> TelemetryResult<Option<String>> {
        Ok(self.state.lock().unwrap().model.clone())
    }

    fn phone_type(&self) -> TelemetryResult<Option<String>> {
        Ok(self.state.lock().unwrap().phone_type.clone())
    }

    fn subscriber_id(&self) -> TelemetryResult<Option<String>> {
        self.identity(|s| s.subscriber_id.clone())
    }

    fn device_id(&self) -> TelemetryResult<Option<String>> {
        self.identity(|s| s.device_id.clone())
    }

    fn line_number(&self) -> TelemetryResult<Option<String>> {
        self.identity(|s| s.line_number.clone())
    }

    fn sim_serial(&self) -> TelemetryResult<Option<String>> {
        self.identity(|s| s.sim_serial.clone())
    }

    fn network_operator(&self) -> TelemetryResult<Option<String>> {
        Ok(self.state.lock().unwrap().operator_code.clone())
    }

    fn network_operator_name(&self) -> TelemetryResult<Option<String>> {
        Ok(self.state.lock().unwrap().operator_name.clone())
    }

    fn is_network_roaming(&self) -> TelemetryResult<bool> {
        Ok(self.state.lock().unwrap().roaming)
    }

    fn is_network_type_known(&self) -> TelemetryResult<bool> {
        Ok(self.state.lock().unwrap().network_type_known)
    }

    fn data_state(&self) -> TelemetryResult<i32> {
        Ok(self.state.lock().unwrap().data_state)
    }

    fn has_mobile_connection(&self) -> TelemetryResult<bool> {
        Ok(self.state.lock().unwrap().mobile_connection)
    }

    fn cell_location(&self, _phone_type: Option<&str>) -> TelemetryResult<Option<CellLocation>> {
        let state = self.state.lock().unwrap();
        if state.deny_cell {
            return Err(TelemetryError::PermissionDenied { source_name: "cell_location" });
        }
        Ok(state.cell_location.clone())
    }

    fn cell_signal(&self) -> TelemetryResult<Option<CellSignal>> {
        Ok(self.state.lock().unwrap().cell_signal.clone())
    }

    fn mobile_tx_bytes(&self) -> i64 {
        self.state.lock().unwrap().tx_bytes
    }

    fn mobile_rx_bytes(&self) -> i64 {
        self.state.lock().unwrap().rx_bytes
    }
}

/// Location source with cached fixes per provider
#[derive(Debug, Clone, Default)]
pub struct FakeLocations {
    pub cached: HashMap<String, Location>,
    pub disabled: Vec<String>,
    pub denied: bool,
}

impl FakeLocations {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_fix(mut self, provider: &str, location: Location) -> Self {
        self.cached.insert(provider.to_string(), location);
        self
    }

    pub fn disable(mut self, provider: &str) -> Self {
        self.disabled.push(provider.to_string());
        self
    }
}

impl LocationSource for FakeLocations {
    fn last_known_location(&self, provider: &str) -> TelemetryResult<Option<Location>> {
        if self.denied {
            return Err(TelemetryError::PermissionDenied { source_name: "location" });
        }
        Ok(self.cached.get(provider).cloned())
    }

    fn is_provider_enabled(&self, provider: &str) -> bool {
        !self.disabled.iter().any(|p| p == provider)
    }
}

/// Prague, with a given time and accuracy
pub fn fix(time: u64, accuracy: f32, provider: &str) -> Location {
    Location::new(50.0755, 14.4378, accuracy, time).with_provider(provider)
}

/// A walk north-east: one fix per `interval_ms`, constant accuracy
pub fn walk(start: u64, interval_ms: u64, count: usize, accuracy: f32) -> Vec<Location> {
    (0..count)
        .map(|i| {
            let step = i as f64 * 0.0005;
            Location::new(50.0755 + step, 14.4378 + step, accuracy, start + i as u64 * interval_ms)
                .with_provider("gps")
        })
        .collect()
}

/// Everything a test needs to poke at a service
pub struct Fixture {
    pub service: TelemetryService,
    pub device: FakeDevice,
    pub sink: Arc<MemorySink>,
}

/// Build a service over a fake device; not yet initialized
pub fn fixture(state: DeviceState, sink_ready: bool) -> Fixture {
    let device = FakeDevice::new(state);
    let sink = Arc::new(MemorySink::new(sink_ready));
    let service = TelemetryService::new(
        TelemetryConfig::default(),
        Box::new(device.clone()),
        sink.clone(),
        Box::new(FixedTime::new(1_700_000_000_000)),
    )
    .unwrap();
    Fixture { service, device, sink }
}

/// Fixture initialized with a cached network fix
pub fn located_fixture(state: DeviceState) -> Fixture {
    let mut f = fixture(state, true);
    f.service
        .initialize(&FakeLocations::empty().with_fix("network", fix(1_000, 500.0, "network")));
    f
}
