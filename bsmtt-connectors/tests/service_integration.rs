//! The telemetry service driving an HTTP connector as its sink

use std::sync::Arc;
use std::time::Duration;

use bsmtt_connectors::{Connector, HttpConfig, HttpConnector};
use bsmtt_core::{
    cell::{CellLocation, CellSignal},
    config::TelemetryConfig,
    events::EventKind,
    location::Location,
    service::{Observation, TelemetryService},
    sources::{DeviceSource, LocationSource},
    time::FixedTime,
    TelemetryError, TelemetryResult, TransportSink,
};

/// A device that knows its make and nothing else
struct BareDevice;

impl DeviceSource for BareDevice {
    fn vendor(&self) -> TelemetryResult<Option<String>> {
        Ok(Some("Acme".into()))
    }
    fn model(&self) -> TelemetryResult<Option<String>> {
        Ok(Some("Rocket 3".into()))
    }
    fn phone_type(&self) -> TelemetryResult<Option<String>> {
        Ok(None)
    }
    fn subscriber_id(&self) -> TelemetryResult<Option<String>> {
        Err(TelemetryError::PermissionDenied { source_name: "telephony" })
    }
    fn device_id(&self) -> TelemetryResult<Option<String>> {
        Err(TelemetryError::PermissionDenied { source_name: "telephony" })
    }
    fn line_number(&self) -> TelemetryResult<Option<String>> {
        Ok(None)
    }
    fn sim_serial(&self) -> TelemetryResult<Option<String>> {
        Ok(None)
    }
    fn network_operator(&self) -> TelemetryResult<Option<String>> {
        Ok(None)
    }
    fn network_operator_name(&self) -> TelemetryResult<Option<String>> {
        Ok(None)
    }
    fn is_network_roaming(&self) -> TelemetryResult<bool> {
        Ok(false)
    }
    fn is_network_type_known(&self) -> TelemetryResult<bool> {
        Ok(false)
    }
    fn data_state(&self) -> TelemetryResult<i32> {
        Ok(0)
    }
    fn has_mobile_connection(&self) -> TelemetryResult<bool> {
        Ok(false)
    }
    fn cell_location(&self, _phone_type: Option<&str>) -> TelemetryResult<Option<CellLocation>> {
        Ok(None)
    }
    fn cell_signal(&self) -> TelemetryResult<Option<CellSignal>> {
        Ok(None)
    }
}

struct OneFix;

impl LocationSource for OneFix {
    fn last_known_location(&self, provider: &str) -> TelemetryResult<Option<Location>> {
        Ok((provider == "network").then(|| Location::new(50.08, 14.42, 900.0, 1_000).with_provider("network")))
    }

    fn is_provider_enabled(&self, _provider: &str) -> bool {
        true
    }
}

fn service_with(connector: Arc<HttpConnector>) -> TelemetryService {
    let mut service = TelemetryService::new(
        TelemetryConfig::default(),
        Box::new(BareDevice),
        connector,
        Box::new(FixedTime::new(42)),
    )
    .unwrap();
    service.initialize(&OneFix);
    service
}

#[test]
fn documents_wait_for_provisioning_then_flow_to_worker() {
    // Nothing listens on the discard port; deliveries fail fast
    let config = HttpConfig::new("http://127.0.0.1:9").max_retries(0);
    let connector = Arc::new(HttpConnector::new(config).unwrap());
    let mut service = service_with(connector.clone());

    let report = service.send_data_if_needed();
    assert_eq!(report.gated, vec![EventKind::Basic, EventKind::Connection]);
    assert_eq!(connector.pending(), 2);
    assert_eq!(service.stats().transport_gated, 2);

    service.handle(Observation::Provisioning("C*>YN".into()));
    assert!(connector.is_ready());
    assert_eq!(connector.pending(), 0);

    service.handle(Observation::Refresh);
    connector.wait_idle(Duration::from_secs(10)).unwrap();

    let stats = connector.stats();
    assert_eq!(stats.messages_buffered, 2);
    assert_eq!(stats.messages_failed, 3);
    assert_eq!(stats.messages_dropped, 0);
}

#[test]
fn unprovisioning_holds_documents_again() {
    let config = HttpConfig::new("http://127.0.0.1:9").max_retries(0).buffer_capacity(1);
    let connector = Arc::new(HttpConnector::new(config).unwrap());
    let mut service = service_with(connector.clone());

    service.on_provisioning_state("f*>YN");
    service.handle(Observation::Refresh);
    service.handle(Observation::Refresh);

    // Capacity one: only the latest connection document survives
    assert_eq!(connector.pending(), 1);
    assert_eq!(connector.stats().messages_dropped, 2);
}
