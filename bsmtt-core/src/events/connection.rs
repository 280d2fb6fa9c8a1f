//! Connectivity record
//!
//! Connectivity is reported on every dispatch cycle once warmed up: each
//! refresh calls `change_network`, which re-arms the record.

use serde::{Serialize, Serializer};
use serde_json::Value;

use super::{envelope, EventKind, EventRecord, NetworkOperator};
use crate::{errors::TelemetryResult, location::Location, time::Timestamp};

/// Roaming tri-state, serialized as `1`, `0` or `-1`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Roaming {
    Roaming,
    NotRoaming,
    /// Radio does not know the network type, roaming is meaningless
    Unknown,
}

impl Roaming {
    /// Derive from the radio flags; an unknown network type wins
    pub fn from_radio(is_roaming: bool, network_type_known: bool) -> Self {
        if !network_type_known {
            Roaming::Unknown
        } else if is_roaming {
            Roaming::Roaming
        } else {
            Roaming::NotRoaming
        }
    }

    pub const fn code(&self) -> i8 {
        match self {
            Roaming::Roaming => 1,
            Roaming::NotRoaming => 0,
            Roaming::Unknown => -1,
        }
    }
}

impl Serialize for Roaming {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i8(self.code())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConnectionBody<'a> {
    has_mobile_connection: Option<bool>,
    data_state: Option<i32>,
    roaming: Option<Roaming>,
    #[serde(flatten)]
    operator: &'a NetworkOperator,
}

/// Slot 1: connectivity
#[derive(Debug, Clone, Default)]
pub struct ConnectionEvent {
    has_mobile_connection: Option<bool>,
    data_state: Option<i32>,
    roaming: Option<Roaming>,
    operator: NetworkOperator,
    location: Option<Location>,
    ready: bool,
}

impl ConnectionEvent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the latest connectivity poll and arm the record
    pub fn change_network(&mut self, has_mobile_connection: bool, data_state: i32, roaming: Roaming) {
        self.has_mobile_connection = Some(has_mobile_connection);
        self.data_state = Some(data_state);
        self.roaming = Some(roaming);
        self.ready = true;
    }

    pub fn roaming(&self) -> Option<Roaming> {
        self.roaming
    }

    pub fn has_mobile_connection(&self) -> Option<bool> {
        self.has_mobile_connection
    }
}

impl EventRecord for ConnectionEvent {
    fn kind(&self) -> EventKind {
        EventKind::Connection
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn document(&self, timestamp: Timestamp) -> TelemetryResult<Value> {
        let body = ConnectionBody {
            has_mobile_connection: self.has_mobile_connection,
            data_state: self.data_state,
            roaming: self.roaming,
            operator: &self.operator,
        };
        envelope(EventKind::Connection, timestamp, &body, self.location.as_ref())
    }

    fn reset_ready(&mut self) {
        self.ready = false;
    }

    fn change_location(&mut self, location: &Location) {
        self.location = Some(location.clone());
    }

    fn change_operator(&mut self, operator: &NetworkOperator) {
        self.operator = operator.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roaming_tri_state() {
        assert_eq!(Roaming::from_radio(true, true).code(), 1);
        assert_eq!(Roaming::from_radio(false, true).code(), 0);
        assert_eq!(Roaming::from_radio(true, false).code(), -1);
        assert_eq!(Roaming::from_radio(false, false).code(), -1);
    }

    #[test]
    fn every_change_network_rearms() {
        let mut event = ConnectionEvent::new();
        assert!(!event.is_ready());

        event.change_network(true, 2, Roaming::NotRoaming);
        assert!(event.is_ready());
        let doc = event.drain(5).unwrap().unwrap();
        assert_eq!(doc["hasMobileConnection"], true);
        assert_eq!(doc["dataState"], 2);
        assert_eq!(doc["roaming"], 0);
        assert_eq!(event.drain(6).unwrap(), None);

        event.change_network(true, 2, Roaming::NotRoaming);
        assert!(event.is_ready());
    }

    #[test]
    fn carries_operator_and_location() {
        let mut event = ConnectionEvent::new();
        event.change_operator(&NetworkOperator::new(Some("23001".into()), Some("T-Mobile CZ".into())));
        event.change_location(&Location::new(50.0, 14.0, 20.0, 1));
        event.change_network(false, 0, Roaming::Unknown);

        let doc = event.drain(2).unwrap().unwrap();
        assert_eq!(doc["mccMnc"], "23001");
        assert_eq!(doc["operatorName"], "T-Mobile CZ");
        assert_eq!(doc["roaming"], -1);
        assert_eq!(doc["location"]["latitude"], 50.0);
    }
}
