//! Device identity record
//!
//! Identity is static for the life of a session. The first population
//! attempt arms the record even when every field came back empty (missing
//! permissions), so the collector still announces the device with explicit
//! nulls. Later refreshes only re-arm it when a value actually changed.

use serde::Serialize;
use serde_json::Value;

use super::{envelope, EventKind, EventRecord};
use crate::{errors::TelemetryResult, time::Timestamp};

/// Device identity fields; any of them may be unavailable
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneInfo {
    pub vendor: Option<String>,
    pub model: Option<String>,
    /// GSM / CDMA / SIP / NONE
    pub phone_type: Option<String>,
    /// IMSI
    pub subscriber_id: Option<String>,
    /// IMEI / MEID
    pub device_id: Option<String>,
    /// MSISDN
    pub line_number: Option<String>,
    /// ICCID
    pub sim_serial: Option<String>,
}

/// Slot 0: device identity
#[derive(Debug, Clone, Default)]
pub struct BasicEvent {
    info: PhoneInfo,
    populated: bool,
    ready: bool,
}

impl BasicEvent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current identity
    pub fn info(&self) -> &PhoneInfo {
        &self.info
    }

    /// Whether the one-time population attempt has happened
    pub fn is_populated(&self) -> bool {
        self.populated
    }
}

impl EventRecord for BasicEvent {
    fn kind(&self) -> EventKind {
        EventKind::Basic
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn document(&self, timestamp: Timestamp) -> TelemetryResult<Value> {
        envelope(EventKind::Basic, timestamp, &self.info, None)
    }

    fn reset_ready(&mut self) {
        self.ready = false;
    }

    fn change_phone_info(&mut self, info: &PhoneInfo) {
        if self.populated && self.info == *info {
            return;
        }
        self.info = info.clone();
        self.populated = true;
        self.ready = true;
    }
}
