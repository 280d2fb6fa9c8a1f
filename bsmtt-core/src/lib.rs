//! Core telemetry engine for BSMTT
//!
//! Aggregates device, radio, connectivity and location observations into
//! four event records and dispatches each record exactly once per readiness
//! transition.
//!
//! Key properties:
//! - Fixed registry: basic, connection, phone, cell, in that order
//! - Nothing is dispatched before a location is known
//! - Failures stay local to the field or record they concern
//!
//! ```no_run
//! use std::sync::Arc;
//! use bsmtt_core::{
//!     config::TelemetryConfig,
//!     service::TelemetryService,
//!     sink::MemorySink,
//!     sources::{DeviceSource, LocationSource},
//!     time::SystemTime,
//! };
//!
//! # fn run(device: Box<dyn DeviceSource + Send>, locations: &dyn LocationSource) -> bsmtt_core::TelemetryResult<()> {
//! let sink = Arc::new(MemorySink::new(true));
//! let mut service = TelemetryService::new(TelemetryConfig::default(), device, sink, Box::new(SystemTime))?;
//! service.initialize(locations);
//! service.refresh_all_info();
//! let report = service.send_data_if_needed();
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod cell;
pub mod config;
pub mod errors;
pub mod events;
pub mod location;
pub mod observer;
pub mod phone;
pub mod provisioning;
pub mod registry;
pub mod runner;
pub mod service;
pub mod sink;
pub mod sources;
pub mod time;

// Public API
pub use errors::{TelemetryError, TelemetryResult};
pub use events::{EventKind, EventRecord};
pub use location::{is_better_location, Location};
pub use registry::EventRegistry;
pub use runner::{ObservationSender, ServiceRunner};
pub use service::{DispatchReport, Observation, TelemetryService};
pub use sink::TransportSink;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
