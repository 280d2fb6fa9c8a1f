//! Location samples and best-estimate selection
//!
//! Position fixes arrive from several providers (cell network, GPS) at
//! different rates and accuracies. The collector keeps a single best known
//! location and replaces it only when a new sample is judged better.
//!
//! ## Selection Policy
//!
//! Rules are evaluated in order, first decisive rule wins:
//!
//! ```text
//! current absent                          → candidate
//! candidate newer by > 2 min              → candidate
//! candidate older by > 2 min              → current
//! candidate more accurate                 → candidate
//! candidate newer, not less accurate      → candidate
//! candidate newer, ≤ 200 m worse,
//!   same provider                         → candidate
//! otherwise                               → current
//! ```

use serde::{Deserialize, Serialize};

use crate::time::{delta_ms, Timestamp};

/// Time window after which a sample is considered significantly newer (ms)
pub const SIGNIFICANT_TIME_MS: i64 = 2 * 60 * 1000;

/// Accuracy loss above which a sample is significantly worse (metres)
pub const SIGNIFICANT_ACCURACY_M: i32 = 200;

/// Network-based provider name
pub const NETWORK_PROVIDER: &str = "network";

/// Satellite provider name
pub const GPS_PROVIDER: &str = "gps";

/// A single position fix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// Degrees, WGS84
    pub latitude: f64,
    /// Degrees, WGS84
    pub longitude: f64,
    /// Metres above the ellipsoid
    #[serde(default)]
    pub altitude: Option<f64>,
    /// Estimated horizontal accuracy radius in metres (68% confidence)
    pub accuracy: f32,
    /// Fix time in milliseconds since epoch
    pub time: Timestamp,
    /// Provider that produced the fix, compared as an opaque string
    #[serde(default)]
    pub provider: Option<String>,
    /// Ground speed in m/s
    #[serde(default)]
    pub speed: Option<f32>,
    /// Bearing in degrees
    #[serde(default)]
    pub bearing: Option<f32>,
}

impl Location {
    /// Create a fix with the mandatory fields
    pub fn new(latitude: f64, longitude: f64, accuracy: f32, time: Timestamp) -> Self {
        Self {
            latitude,
            longitude,
            altitude: None,
            accuracy,
            time,
            provider: None,
            speed: None,
            bearing: None,
        }
    }

    /// Set the provider name
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Set the altitude
    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = Some(altitude);
        self
    }

    /// Set speed and bearing
    pub fn with_motion(mut self, speed: f32, bearing: f32) -> Self {
        self.speed = Some(speed);
        self.bearing = Some(bearing);
        self
    }

    /// JSON cannot carry NaN or infinity, so a fix with such coordinates
    /// cannot be put into a document.
    pub fn is_representable(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.accuracy.is_finite()
            && self.altitude.map_or(true, f64::is_finite)
    }
}

/// Thresholds used by [`is_better_location_with`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionThresholds {
    /// Significant time window in milliseconds
    pub significant_time_ms: i64,
    /// Significant accuracy loss in metres
    pub significant_accuracy_m: i32,
}

impl Default for SelectionThresholds {
    fn default() -> Self {
        Self {
            significant_time_ms: SIGNIFICANT_TIME_MS,
            significant_accuracy_m: SIGNIFICANT_ACCURACY_M,
        }
    }
}

/// Decide whether `candidate` should replace `current` using default thresholds
pub fn is_better_location(candidate: &Location, current: Option<&Location>) -> bool {
    is_better_location_with(candidate, current, &SelectionThresholds::default())
}

/// Decide whether `candidate` should replace `current`
pub fn is_better_location_with(
    candidate: &Location,
    current: Option<&Location>,
    thresholds: &SelectionThresholds,
) -> bool {
    let current = match current {
        Some(current) => current,
        None => return true,
    };

    let time_delta = delta_ms(current.time, candidate.time);
    if time_delta > thresholds.significant_time_ms {
        return true;
    }
    if time_delta < -thresholds.significant_time_ms {
        return false;
    }
    let is_newer = time_delta > 0;

    // Whole metres, truncated toward zero
    let accuracy_delta = (candidate.accuracy - current.accuracy) as i32;
    let is_less_accurate = accuracy_delta > 0;
    let is_more_accurate = accuracy_delta < 0;
    let is_significantly_less_accurate = accuracy_delta > thresholds.significant_accuracy_m;

    if is_more_accurate {
        return true;
    }
    if is_newer && !is_less_accurate {
        return true;
    }
    is_newer && !is_significantly_less_accurate && is_same_provider(candidate, current)
}

fn is_same_provider(a: &Location, b: &Location) -> bool {
    a.provider == b.provider
}
