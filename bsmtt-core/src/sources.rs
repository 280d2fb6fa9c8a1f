//! Data source traits
//!
//! These traits are the boundary to the host platform. The collector never
//! talks to radio or location drivers directly; a host adapter implements
//! `DeviceSource` and the orchestrator polls it on every observation.
//!
//! Every accessor may fail independently. A failure only affects the field it
//! concerns; identity fields keep their last successfully read value.

use crate::{
    cell::{CellLocation, CellSignal},
    errors::TelemetryResult,
    location::Location,
};

/// Device identity, network and radio accessors
pub trait DeviceSource {
    /// Manufacturer name
    fn vendor(&self) -> TelemetryResult<Option<String>>;

    /// Model name
    fn model(&self) -> TelemetryResult<Option<String>>;

    /// Phone type label (GSM, CDMA, SIP, NONE)
    fn phone_type(&self) -> TelemetryResult<Option<String>>;

    /// IMSI
    fn subscriber_id(&self) -> TelemetryResult<Option<String>>;

    /// IMEI / MEID
    fn device_id(&self) -> TelemetryResult<Option<String>>;

    /// MSISDN
    fn line_number(&self) -> TelemetryResult<Option<String>>;

    /// ICCID
    fn sim_serial(&self) -> TelemetryResult<Option<String>>;

    /// MCC+MNC of the registered network
    fn network_operator(&self) -> TelemetryResult<Option<String>>;

    /// Name of the registered network
    fn network_operator_name(&self) -> TelemetryResult<Option<String>>;

    /// Whether the device is roaming
    fn is_network_roaming(&self) -> TelemetryResult<bool>;

    /// Whether the radio knows the current network type
    fn is_network_type_known(&self) -> TelemetryResult<bool>;

    /// Data connection state code
    fn data_state(&self) -> TelemetryResult<i32>;

    /// Whether an active mobile data connection exists
    fn has_mobile_connection(&self) -> TelemetryResult<bool>;

    /// Serving cell identity, resolved according to the phone type
    fn cell_location(&self, phone_type: Option<&str>) -> TelemetryResult<Option<CellLocation>>;

    /// Serving cell signal
    fn cell_signal(&self) -> TelemetryResult<Option<CellSignal>>;

    /// Cumulative mobile bytes sent, non-positive when unsupported
    fn mobile_tx_bytes(&self) -> i64 {
        -1
    }

    /// Cumulative mobile bytes received, non-positive when unsupported
    fn mobile_rx_bytes(&self) -> i64 {
        -1
    }
}

/// Location provider accessors used at start-up
pub trait LocationSource {
    /// Last fix cached by a provider
    fn last_known_location(&self, provider: &str) -> TelemetryResult<Option<Location>>;

    /// Whether a provider is switched on
    fn is_provider_enabled(&self, provider: &str) -> bool;
}
