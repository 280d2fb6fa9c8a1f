//! Event Registry
//!
//! Owns the four event records of a session at fixed positions and the
//! single best known location. Producers write through the broadcast helpers
//! (`*_at_all`), which push values into every record that holds the
//! corresponding fields. Records never share a live reference to the
//! location; each keeps its own copy.
//!
//! ## Location Gate
//!
//! Until a location has been obtained, the registry exposes no records to
//! the dispatch path at all, even records that are internally ready:
//!
//! ```text
//! location == None  →  visible_mut() == []
//! location == Some  →  visible_mut() == [basic, connection, phone, cell]
//! ```
//!
//! This couples connectivity and identity reporting to location
//! availability. The behaviour is kept as observed in the field.

use crate::{
    events::{
        BasicEvent, CellEvent, ConnectionEvent, EventKind, EventRecord, NetworkOperator, PhoneEvent,
        PhoneInfo, EVENT_SLOTS,
    },
    location::Location,
};

/// Fixed set of event records plus the current best location
#[derive(Debug, Clone, Default)]
pub struct EventRegistry {
    basic: BasicEvent,
    connection: ConnectionEvent,
    phone: PhoneEvent,
    cell: CellEvent,
    location: Option<Location>,
}

impl EventRegistry {
    /// Create all four records together
    pub fn new() -> Self {
        Self::default()
    }

    pub fn basic(&self) -> &BasicEvent {
        &self.basic
    }

    pub fn basic_mut(&mut self) -> &mut BasicEvent {
        &mut self.basic
    }

    pub fn connection(&self) -> &ConnectionEvent {
        &self.connection
    }

    pub fn connection_mut(&mut self) -> &mut ConnectionEvent {
        &mut self.connection
    }

    pub fn phone(&self) -> &PhoneEvent {
        &self.phone
    }

    pub fn phone_mut(&mut self) -> &mut PhoneEvent {
        &mut self.phone
    }

    pub fn cell(&self) -> &CellEvent {
        &self.cell
    }

    pub fn cell_mut(&mut self) -> &mut CellEvent {
        &mut self.cell
    }

    /// Record at a fixed slot
    pub fn get(&self, kind: EventKind) -> &dyn EventRecord {
        match kind {
            EventKind::Basic => &self.basic,
            EventKind::Connection => &self.connection,
            EventKind::Phone => &self.phone,
            EventKind::Cell => &self.cell,
        }
    }

    /// All records in slot order, regardless of the location gate
    pub fn slots_mut(&mut self) -> [&mut dyn EventRecord; EVENT_SLOTS] {
        [
            &mut self.basic,
            &mut self.connection,
            &mut self.phone,
            &mut self.cell,
        ]
    }

    /// Records visible to dispatch: none until a location is known
    pub fn visible_mut(&mut self) -> Vec<&mut dyn EventRecord> {
        if self.location.is_none() {
            return Vec::new();
        }
        self.slots_mut().into_iter().collect()
    }

    /// Current best location
    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    /// Replace the best location and push a copy into every record
    pub fn change_location_at_all(&mut self, location: Location) {
        for record in self.slots_mut() {
            record.change_location(&location);
        }
        self.location = Some(location);
    }

    /// Push device identity into every record
    pub fn change_phone_info_at_all(&mut self, info: &PhoneInfo) {
        for record in self.slots_mut() {
            record.change_phone_info(info);
        }
    }

    /// Push network operator into every record
    pub fn change_operator_at_all(&mut self, operator: &NetworkOperator) {
        for record in self.slots_mut() {
            record.change_operator(operator);
        }
    }
}
