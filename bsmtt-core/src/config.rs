//! Collector configuration
//!
//! Loaded from JSON (every field optional, defaults below) or built in code
//! with the setters. `validate` is called by the service before use.
//!
//! ```rust
//! use bsmtt_core::config::TelemetryConfig;
//!
//! let config = TelemetryConfig::from_json_str(r#"{ "significantTimeMs": 60000 }"#).unwrap();
//! assert_eq!(config.significant_time_ms, 60_000);
//! assert_eq!(config.location_providers, vec!["network", "gps"]);
//! ```

use serde::Deserialize;

use crate::{
    errors::{TelemetryError, TelemetryResult},
    location::{SelectionThresholds, GPS_PROVIDER, NETWORK_PROVIDER, SIGNIFICANT_ACCURACY_M, SIGNIFICANT_TIME_MS},
};

/// Default capacity of the inbound observation channel
pub const DEFAULT_OBSERVATION_QUEUE: usize = 256;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct TelemetryConfig {
    /// Newer-by window after which a fix always wins (ms)
    pub significant_time_ms: i64,
    /// Accuracy loss above which a newer fix from the same provider loses (m)
    pub significant_accuracy_m: i32,
    /// Providers queried for a cached fix at start-up, later ones override
    pub location_providers: Vec<String>,
    /// Inbound observation channel capacity
    pub observation_queue_capacity: usize,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            significant_time_ms: SIGNIFICANT_TIME_MS,
            significant_accuracy_m: SIGNIFICANT_ACCURACY_M,
            location_providers: vec![NETWORK_PROVIDER.to_string(), GPS_PROVIDER.to_string()],
            observation_queue_capacity: DEFAULT_OBSERVATION_QUEUE,
        }
    }
}

impl TelemetryConfig {
    /// Parse from JSON
    pub fn from_json_str(json: &str) -> TelemetryResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| TelemetryError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Set the significant time window
    pub fn significant_time_ms(mut self, ms: i64) -> Self {
        self.significant_time_ms = ms;
        self
    }

    /// Set the significant accuracy margin
    pub fn significant_accuracy_m(mut self, metres: i32) -> Self {
        self.significant_accuracy_m = metres;
        self
    }

    /// Replace the provider list
    pub fn location_providers<I, S>(mut self, providers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.location_providers = providers.into_iter().map(Into::into).collect();
        self
    }

    /// Set the observation channel capacity
    pub fn observation_queue_capacity(mut self, capacity: usize) -> Self {
        self.observation_queue_capacity = capacity;
        self
    }

    /// Thresholds for the location selector
    pub fn thresholds(&self) -> SelectionThresholds {
        SelectionThresholds {
            significant_time_ms: self.significant_time_ms,
            significant_accuracy_m: self.significant_accuracy_m,
        }
    }

    /// Reject values the service cannot run with
    pub fn validate(&self) -> TelemetryResult<()> {
        if self.significant_time_ms <= 0 {
            return Err(TelemetryError::Config("significantTimeMs must be positive".into()));
        }
        if self.significant_accuracy_m < 0 {
            return Err(TelemetryError::Config("significantAccuracyM must not be negative".into()));
        }
        if self.observation_queue_capacity == 0 {
            return Err(TelemetryError::Config("observationQueueCapacity must be at least 1".into()));
        }
        if self.location_providers.iter().any(|p| p.is_empty()) {
            return Err(TelemetryError::Config("location provider names must not be empty".into()));
        }
        Ok(())
    }
}
