use crate::output::atomic_write;
use anyhow::{Context, Result};
use geotrace_model::{HopRecord, RouteSink, RunOutcome, UNAVAILABLE};
use log::info;
use std::path::PathBuf;

pub const ROUTE_COLUMNS: [&str; 10] = [
    "sequence",
    "address",
    "country",
    "region",
    "city",
    "coordinate",
    "org",
    "latency_ms",
    "distance_from_prev_miles",
    "observed_at",
];

/// CSV of every hop, written once when the run ends.
pub struct RouteReport {
    path: PathBuf,
}

impl RouteReport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn write(&self, records: &[HopRecord]) -> Result<()> {
        let csv = render_csv(records);
        atomic_write(&self.path, csv.as_bytes())
            .with_context(|| format!("failed to write route report {:?}", self.path))?;
        info!("wrote {} hops to {:?}", records.len(), self.path);
        Ok(())
    }
}

impl RouteSink for RouteReport {
    fn on_record(&mut self, _records: &[HopRecord]) -> Result<()> {
        Ok(())
    }

    fn on_finish(&mut self, records: &[HopRecord], _outcome: RunOutcome) -> Result<()> {
        self.write(records)
    }
}

pub fn render_csv(records: &[HopRecord]) -> String {
    let mut out = ROUTE_COLUMNS.join(",");
    out.push('\n');

    for record in records {
        let text = |value: &Option<String>| {
            escape_csv(value.as_deref().unwrap_or(UNAVAILABLE))
        };
        let number = |value: Option<f64>| match value {
            Some(v) => v.to_string(),
            None => UNAVAILABLE.to_string(),
        };

        let row = [
            record.sequence.to_string(),
            text(&record.address),
            text(&record.location.country),
            text(&record.location.region),
            text(&record.location.city),
            text(&record.location.coordinate),
            text(&record.location.org),
            number(record.latency_ms),
            number(record.distance_from_prev_miles),
            escape_csv(&record.observed_at_utc),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }

    out
}

/// Quotes a field if it contains a comma, quote, or newline.
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("simple"), "simple");
        assert_eq!(escape_csv("37.4,-122.0"), "\"37.4,-122.0\"");
        assert_eq!(escape_csv("with\"quote"), "\"with\"\"quote\"");
    }

    #[test]
    fn empty_run_has_header_only() {
        assert_eq!(render_csv(&[]), format!("{}\n", ROUTE_COLUMNS.join(",")));
    }
}
