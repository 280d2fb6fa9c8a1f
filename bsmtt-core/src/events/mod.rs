//! Telemetry Event Records
//!
//! ## Overview
//!
//! An event record is a small mutable aggregate. Independent data sources
//! write partial observations into it, and the record alone decides when it
//! has enough to be worth sending:
//!
//! ```text
//! location callback ──┐
//! radio callback ─────┼──→ set_*() ──→ [record] ──is_ready()?──→ drain() ──→ JSON
//! connectivity poll ──┘
//! ```
//!
//! ## Variants
//!
//! | slot | record       | fields                                  | ready when                 |
//! |------|--------------|-----------------------------------------|----------------------------|
//! | 0    | `basic`      | device identity                         | identity populated/changed |
//! | 1    | `connection` | mobile flag, data state, roaming        | every `change_network`     |
//! | 2    | `phone`      | radio snapshot, tx/rx counters          | radio state change         |
//! | 3    | `cell`       | serving cell identity and signal        | radio state change         |
//!
//! ## Drain Semantics
//!
//! `drain` is extract-and-reset. It returns the document and clears the ready
//! flag in one step, so a second call without new data yields `None`. When the
//! document cannot be built the flag is left alone and the error is returned.
//!
//! ## Document Envelope
//!
//! Every document is a JSON object carrying:
//! - `eventType`: record name
//! - `@timestamp`: drain time in milliseconds
//! - `location`: last pushed location (positional records only)

use serde::Serialize;
use serde_json::{Map, Value};

use crate::{
    errors::{TelemetryError, TelemetryResult},
    location::Location,
    time::Timestamp,
};

pub mod basic;
pub mod cell;
pub mod connection;
pub mod phone;

pub use basic::{BasicEvent, PhoneInfo};
pub use cell::CellEvent;
pub use connection::{ConnectionEvent, Roaming};
pub use phone::PhoneEvent;

/// Number of event slots in a session
pub const EVENT_SLOTS: usize = 4;

/// Event record identity, doubling as the fixed registry position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EventKind {
    Basic = 0,
    Connection = 1,
    Phone = 2,
    Cell = 3,
}

impl EventKind {
    /// Registry order
    pub const ORDER: [EventKind; EVENT_SLOTS] = [
        EventKind::Basic,
        EventKind::Connection,
        EventKind::Phone,
        EventKind::Cell,
    ];

    /// Slot index
    pub const fn index(&self) -> usize {
        *self as usize
    }

    /// Name used as `eventType` in documents
    pub const fn name(&self) -> &'static str {
        match self {
            EventKind::Basic => "basic",
            EventKind::Connection => "connection",
            EventKind::Phone => "phone",
            EventKind::Cell => "cell",
        }
    }
}

/// Mobile network operator as reported by the radio
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkOperator {
    /// MCC+MNC numeric code
    #[serde(rename = "mccMnc")]
    pub code: Option<String>,
    /// Human readable operator name
    #[serde(rename = "operatorName")]
    pub name: Option<String>,
}

impl NetworkOperator {
    pub fn new(code: Option<String>, name: Option<String>) -> Self {
        Self { code, name }
    }
}

/// Shared contract of the four event records
///
/// Mutators specific to a variant live on the variant. The broadcast hooks
/// default to no-ops so each record only reacts to the fields it owns.
pub trait EventRecord {
    /// Which record this is
    fn kind(&self) -> EventKind;

    /// Whether the record should be sent on the next dispatch
    fn is_ready(&self) -> bool;

    /// Build the document without touching readiness
    fn document(&self, timestamp: Timestamp) -> TelemetryResult<Value>;

    /// Clear the ready flag
    fn reset_ready(&mut self);

    /// Extract the document and reset readiness
    ///
    /// Returns `Ok(None)` when the record is not ready. On error the record
    /// stays ready so the next cycle tries again.
    fn drain(&mut self, timestamp: Timestamp) -> TelemetryResult<Option<Value>> {
        if !self.is_ready() {
            return Ok(None);
        }
        let document = self.document(timestamp)?;
        self.reset_ready();
        Ok(Some(document))
    }

    /// Receive a new best location
    fn change_location(&mut self, _location: &Location) {}

    /// Receive device identity
    fn change_phone_info(&mut self, _info: &PhoneInfo) {}

    /// Receive network operator
    fn change_operator(&mut self, _operator: &NetworkOperator) {}
}

/// Wrap a record body into the common document envelope
pub(crate) fn envelope<T: Serialize>(
    kind: EventKind,
    timestamp: Timestamp,
    body: &T,
    location: Option<&Location>,
) -> TelemetryResult<Value> {
    let event = kind.name();

    let mut document = match serde_json::to_value(body) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            return Err(TelemetryError::MalformedDocument {
                event,
                reason: "body is not a JSON object".into(),
            })
        }
        Err(e) => return Err(TelemetryError::malformed(event, &e)),
    };

    if let Some(location) = location {
        if !location.is_representable() {
            return Err(TelemetryError::MalformedDocument {
                event,
                reason: "location has non-finite coordinates".into(),
            });
        }
        let value = serde_json::to_value(location).map_err(|e| TelemetryError::malformed(event, &e))?;
        document.insert("location".into(), value);
    }

    let mut out = Map::with_capacity(document.len() + 2);
    out.insert("eventType".into(), Value::from(event));
    out.insert("@timestamp".into(), Value::from(timestamp));
    out.extend(document);
    Ok(Value::Object(out))
}
