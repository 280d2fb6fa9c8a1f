//! Serving cell record
//!
//! Holds the latest `CellData` snapshot. Refreshes replace the snapshot
//! freely; the record is armed by the same radio state change that arms the
//! phone record.

use serde::Serialize;
use serde_json::Value;

use super::{envelope, EventKind, EventRecord, NetworkOperator, PhoneInfo};
use crate::{cell::CellData, errors::TelemetryResult, location::Location, time::Timestamp};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CellBody<'a> {
    #[serde(flatten)]
    cell: &'a CellData,
    phone_type: Option<&'a str>,
    #[serde(flatten)]
    operator: &'a NetworkOperator,
}

/// Slot 3: serving cell
#[derive(Debug, Clone, Default)]
pub struct CellEvent {
    cell_data: CellData,
    phone_type: Option<String>,
    operator: NetworkOperator,
    location: Option<Location>,
    ready: bool,
}

impl CellEvent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot, the starting point for the next merge
    pub fn cell_data(&self) -> &CellData {
        &self.cell_data
    }

    /// Phone type learned from identity, needed to resolve the cell location
    pub fn phone_type(&self) -> Option<&str> {
        self.phone_type.as_deref()
    }

    /// Replace the snapshot without arming
    pub fn change_cell(&mut self, cell_data: CellData) {
        self.cell_data = cell_data;
    }

    /// A radio state change occurred
    pub fn mark_radio_change(&mut self) {
        self.ready = true;
    }
}

impl EventRecord for CellEvent {
    fn kind(&self) -> EventKind {
        EventKind::Cell
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn document(&self, timestamp: Timestamp) -> TelemetryResult<Value> {
        let body = CellBody {
            cell: &self.cell_data,
            phone_type: self.phone_type.as_deref(),
            operator: &self.operator,
        };
        envelope(EventKind::Cell, timestamp, &body, self.location.as_ref())
    }

    fn reset_ready(&mut self) {
        self.ready = false;
    }

    fn change_location(&mut self, location: &Location) {
        self.location = Some(location.clone());
    }

    fn change_phone_info(&mut self, info: &PhoneInfo) {
        self.phone_type = info.phone_type.clone();
    }

    fn change_operator(&mut self, operator: &NetworkOperator) {
        self.operator = operator.clone();
    }
}
