//! Shared data structures for geotrace.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Rendered in place of any geolocation or hop field that was never populated.
pub const UNAVAILABLE: &str = "unavailable";

/// One parsed observation from a line of trace output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HopEvent {
    pub sequence: u64,
    pub address: Option<String>,
    pub latency_ms: Option<f64>,
}

/// Best-effort geolocation for one address. Missing fields are not errors.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LocationResult {
    pub country: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub org: Option<String>,
    /// Raw `"latitude,longitude"` string as reported by the lookup service.
    pub coordinate: Option<String>,
}

impl LocationResult {
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn is_unavailable(&self) -> bool {
        self == &Self::default()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Parses `"lat,lon"`. Anything else, including out-of-range degrees, is `None`.
    pub fn parse(text: &str) -> Option<Self> {
        let (lat, lon) = text.split_once(',')?;
        let latitude: f64 = lat.trim().parse().ok()?;
        let longitude: f64 = lon.trim().parse().ok()?;

        if !latitude.is_finite() || !longitude.is_finite() {
            return None;
        }
        if latitude.abs() > 90.0 || longitude.abs() > 180.0 {
            return None;
        }

        Some(Self::new(latitude, longitude))
    }
}

/// A hop event enriched with its location and the distance from the previous hop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HopRecord {
    pub sequence: u64,
    pub address: Option<String>,
    pub latency_ms: Option<f64>,
    pub location: LocationResult,
    pub coordinate: Option<Coordinate>,
    /// Only set when both this hop and the cursor before it had a coordinate.
    pub distance_from_prev_miles: Option<f64>,
    pub observed_at_utc: String,
}

/// Why a run stopped consuming hop events.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Completed,
    Interrupted,
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Completed => f.write_str("completed"),
            RunOutcome::Interrupted => f.write_str("interrupted"),
        }
    }
}

/// Receives records as the pipeline appends them.
///
/// `on_record` is called once per appended record with the full sequence so far
/// (the new record is last). `on_finish` is called exactly once per run.
pub trait RouteSink {
    fn on_record(&mut self, records: &[HopRecord]) -> anyhow::Result<()>;

    fn on_finish(&mut self, records: &[HopRecord], outcome: RunOutcome) -> anyhow::Result<()>;
}
