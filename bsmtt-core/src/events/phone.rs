//! Radio state record
//!
//! Only a genuine radio state change arms this record. Routine polling may
//! update the operator or location but never triggers a send on its own.

use serde::Serialize;
use serde_json::Value;

use super::{envelope, EventKind, EventRecord, NetworkOperator};
use crate::{errors::TelemetryResult, location::Location, phone::PhoneResponse, time::Timestamp};

#[derive(Serialize)]
struct PhoneBody<'a> {
    #[serde(flatten)]
    response: &'a PhoneResponse,
    #[serde(flatten)]
    operator: &'a NetworkOperator,
}

/// Slot 2: radio snapshot and traffic counters
#[derive(Debug, Clone, Default)]
pub struct PhoneEvent {
    response: PhoneResponse,
    operator: NetworkOperator,
    location: Option<Location>,
    ready: bool,
}

impl PhoneEvent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the snapshot delivered by a radio state change and arm the record
    pub fn change_phone_response(&mut self, response: PhoneResponse) {
        self.response = response;
        self.ready = true;
    }

    pub fn phone_response(&self) -> &PhoneResponse {
        &self.response
    }
}

impl EventRecord for PhoneEvent {
    fn kind(&self) -> EventKind {
        EventKind::Phone
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn document(&self, timestamp: Timestamp) -> TelemetryResult<Value> {
        let body = PhoneBody {
            response: &self.response,
            operator: &self.operator,
        };
        envelope(EventKind::Phone, timestamp, &body, self.location.as_ref())
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
