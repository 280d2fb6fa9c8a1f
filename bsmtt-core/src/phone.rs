//! Radio state notifications
//!
//! The radio collaborator reports each kind of state change independently.
//! A notification carries the full radio snapshot as the listener currently
//! knows it, plus which change triggered it.

use serde::{Deserialize, Serialize};

/// Kind of radio state change that triggered a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RadioChange {
    CallState,
    SignalStrength,
    CellLocation,
    CellInfo,
    DataConnection,
    DataActivity,
    ServiceState,
}

impl RadioChange {
    /// Every change kind, in listener registration order
    pub const ALL: [RadioChange; 7] = [
        RadioChange::SignalStrength,
        RadioChange::CellLocation,
        RadioChange::DataConnection,
        RadioChange::DataActivity,
        RadioChange::CallState,
        RadioChange::CellInfo,
        RadioChange::ServiceState,
    ];
}

/// Snapshot of radio state as reported by the phone listener
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneResponse {
    /// Signal strength in dBm
    pub signal_strength: Option<i32>,
    /// Signal strength in ASU
    pub signal_asu: Option<i32>,
    /// Bit error rate, radio specific scale
    pub bit_error_rate: Option<i32>,
    /// Idle / ringing / offhook
    pub call_state: Option<i32>,
    /// Data connection state
    pub data_state: Option<i32>,
    /// Radio network type of the data connection
    pub data_network_type: Option<String>,
    /// None / in / out / inout / dormant
    pub data_activity: Option<i32>,
    /// In service / out of service / emergency only / power off
    pub service_state: Option<i32>,
    /// Cumulative mobile bytes transmitted
    pub tx: Option<i64>,
    /// Cumulative mobile bytes received
    pub rx: Option<i64>,
}

impl PhoneResponse {
    /// Record transmitted bytes; non-positive counters mean "unsupported"
    pub fn set_tx(&mut self, bytes: i64) {
        if bytes > 0 {
            self.tx = Some(bytes);
        }
    }

    /// Record received bytes; non-positive counters mean "unsupported"
    pub fn set_rx(&mut self, bytes: i64) {
        if bytes > 0 {
            self.rx = Some(bytes);
        }
    }
}
