use geotrace_model::HopRecord;
use serde::Serialize;
use std::fmt;

/// Aggregate figures for a finished or interrupted run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteSummary {
    pub hops: usize,
    pub resolved_hops: usize,
    pub total_distance_miles: f64,
    pub avg_distance_miles: Option<f64>,
    pub avg_latency_ms: Option<f64>,
}

impl RouteSummary {
    pub fn from_records(records: &[HopRecord]) -> Self {
        let distances: Vec<f64> = records
            .iter()
            .filter_map(|record| record.distance_from_prev_miles)
            .collect();
        let latencies: Vec<f64> = records.iter().filter_map(|record| record.latency_ms).collect();

        let total_distance_miles = round2(distances.iter().sum());

        Self {
            hops: records.len(),
            resolved_hops: records.iter().filter(|r| r.coordinate.is_some()).count(),
            total_distance_miles,
            avg_distance_miles: mean(&distances),
            avg_latency_ms: mean(&latencies),
        }
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(round2(values.iter().sum::<f64>() / values.len() as f64))
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl fmt::Display for RouteSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "hops: {} ({} located)", self.hops, self.resolved_hops)?;
        writeln!(f, "total distance: {:.2} miles", self.total_distance_miles)?;
        match self.avg_distance_miles {
            Some(avg) => writeln!(f, "average distance per hop: {avg:.2} miles")?,
            None => writeln!(f, "average distance per hop: n/a")?,
        }
        match self.avg_latency_ms {
            Some(avg) => write!(f, "average latency: {avg:.2} ms"),
            None => write!(f, "average latency: n/a"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geotrace_model::{Coordinate, LocationResult};

    fn record(latency: Option<f64>, distance: Option<f64>, located: bool) -> HopRecord {
        HopRecord {
            sequence: 0,
            address: Some("10.0.0.1".to_string()),
            latency_ms: latency,
            location: LocationResult::unavailable(),
            coordinate: located.then(|| Coordinate::new(1.0, 1.0)),
            distance_from_prev_miles: distance,
            observed_at_utc: "2026-02-01T12:00:00.000Z".to_string(),
        }
    }

    #[test]
    fn averages_skip_missing_values() {
        let records = vec![
            record(Some(10.0), None, true),
            record(None, Some(100.0), true),
            record(Some(21.0), Some(50.5), true),
            record(Some(32.0), None, false),
        ];
        let summary = RouteSummary::from_records(&records);

        assert_eq!(summary.hops, 4);
        assert_eq!(summary.resolved_hops, 3);
        assert_eq!(summary.total_distance_miles, 150.5);
        assert_eq!(summary.avg_distance_miles, Some(75.25));
        assert_eq!(summary.avg_latency_ms, Some(21.0));
    }

    #[test]
    fn empty_run_has_no_averages() {
        let summary = RouteSummary::from_records(&[]);
        assert_eq!(summary.total_distance_miles, 0.0);
        assert!(summary.avg_distance_miles.is_none());
        assert!(summary.to_string().contains("n/a"));
    }
}
