//! Leaflet map of the traced route, rewritten in full after every change.

use crate::output::{atomic_write, escape_html};
use crate::palette::{segment_color, ColorPolicy, LatencyBucket};
use anyhow::{Context, Result};
use geotrace_model::{Coordinate, HopRecord, RouteSink, RunOutcome, UNAVAILABLE};
use log::debug;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::PathBuf;

const INITIAL_ZOOM: u32 = 3;
const LINE_WEIGHT: f64 = 2.5;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MapMarker {
    pub lat: f64,
    pub lon: f64,
    pub title: String,
    pub popup: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MapSegment {
    pub from: [f64; 2],
    pub to: [f64; 2],
    pub color: String,
}

pub struct RouteMap {
    path: PathBuf,
    policy: ColorPolicy,
    markers: Vec<MapMarker>,
    segments: Vec<MapSegment>,
    last_resolved: Option<Coordinate>,
}

impl RouteMap {
    pub fn new(path: impl Into<PathBuf>, policy: ColorPolicy) -> Self {
        Self {
            path: path.into(),
            policy,
            markers: Vec::new(),
            segments: Vec::new(),
            last_resolved: None,
        }
    }

    pub fn markers(&self) -> &[MapMarker] {
        &self.markers
    }

    pub fn segments(&self) -> &[MapSegment] {
        &self.segments
    }

    /// Adds a marker for `record`, plus a segment from the previous located hop.
    /// Returns false when the record has no coordinate and nothing changed.
    pub fn add_record(&mut self, record: &HopRecord) -> bool {
        let Some(coord) = record.coordinate else {
            return false;
        };

        self.markers.push(MapMarker {
            lat: coord.latitude,
            lon: coord.longitude,
            title: record.address.clone().unwrap_or_else(|| UNAVAILABLE.to_string()),
            popup: popup_html(record),
        });

        if let Some(prev) = self.last_resolved {
            let color = segment_color(self.policy, self.segments.len(), record.latency_ms);
            self.segments.push(MapSegment {
                from: [prev.latitude, prev.longitude],
                to: [coord.latitude, coord.longitude],
                color,
            });
        }
        self.last_resolved = Some(coord);
        true
    }

    pub fn render_html(&self) -> Result<String> {
        let markers = script_json(&self.markers)?;
        let segments = script_json(&self.segments)?;

        let mut html = String::new();
        html.push_str(HEAD);
        html.push_str(&legend_html());
        html.push_str("<script>\n");
        writeln!(
            html,
            "var map = L.map('map').setView([0, 0], {INITIAL_ZOOM});"
        )
        .ok();
        html.push_str(TILE_LAYER);
        writeln!(html, "var markers = {markers};").ok();
        writeln!(html, "var segments = {segments};").ok();
        html.push_str("var bounds = [];\n");
        html.push_str("markers.forEach(function (m) {\n");
        html.push_str("  L.marker([m.lat, m.lon], {title: m.title}).bindPopup(m.popup).addTo(map);\n");
        html.push_str("  bounds.push([m.lat, m.lon]);\n");
        html.push_str("});\n");
        html.push_str("segments.forEach(function (s) {\n");
        writeln!(
            html,
            "  L.polyline([s.from, s.to], {{color: s.color, weight: {LINE_WEIGHT}}}).addTo(map);"
        )
        .ok();
        html.push_str("});\n");
        html.push_str("if (bounds.length > 1) { map.fitBounds(bounds, {padding: [20, 20]}); }\n");
        html.push_str("</script>\n</body>\n</html>\n");
        Ok(html)
    }

    pub fn save(&self) -> Result<()> {
        let html = self.render_html()?;
        atomic_write(&self.path, html.as_bytes())
            .with_context(|| format!("failed to save map {:?}", self.path))?;
        debug!(
            "saved map with {} markers and {} segments to {:?}",
            self.markers.len(),
            self.segments.len(),
            self.path
        );
        Ok(())
    }
}

impl RouteSink for RouteMap {
    fn on_record(&mut self, records: &[HopRecord]) -> Result<()> {
        let Some(record) = records.last() else {
            return Ok(());
        };
        if self.add_record(record) {
            self.save()
        } else {
            Ok(())
        }
    }

    fn on_finish(&mut self, _records: &[HopRecord], _outcome: RunOutcome) -> Result<()> {
        if self.markers.is_empty() {
            // nothing was drawn yet, still leave an empty map behind
            self.save()?;
        }
        Ok(())
    }
}

/// JSON that is safe to inline inside a `<script>` element.
fn script_json<T: Serialize>(value: &T) -> Result<String> {
    let json = serde_json::to_string(value).context("failed to encode map data")?;
    Ok(json.replace("</", "<\\/"))
}

fn popup_html(record: &HopRecord) -> String {
    let field = |value: &Option<String>| escape_html(value.as_deref().unwrap_or(UNAVAILABLE));

    let mut html = String::new();
    write!(
        html,
        "<b>Hop {}</b>: {}<br>",
        record.sequence,
        field(&record.address)
    )
    .ok();
    write!(
        html,
        "{}, {}, {}<br>",
        field(&record.location.city),
        field(&record.location.region),
        field(&record.location.country)
    )
    .ok();
    write!(html, "{}<br>", field(&record.location.org)).ok();
    match record.latency_ms {
        Some(ms) => write!(html, "latency: {ms} ms").ok(),
        None => write!(html, "latency: {UNAVAILABLE}").ok(),
    };
    if let Some(miles) = record.distance_from_prev_miles {
        write!(html, "<br>{miles} miles from previous hop").ok();
    }
    html
}

fn legend_html() -> String {
    let mut html = String::from(
        "<div id=\"legend\" style=\"position: fixed; bottom: 30px; left: 30px; z-index: 1000; \
         background: white; padding: 8px 12px; border: 1px solid #999; font: 13px sans-serif;\">\n\
         <b>Hop latency</b><br>\n",
    );
    for bucket in LatencyBucket::ALL {
        writeln!(
            html,
            "<span style=\"display: inline-block; width: 14px; height: 4px; background: {}; \
             vertical-align: middle;\"></span> {}<br>",
            bucket.color(),
            bucket.label()
        )
        .ok();
    }
    html.push_str("</div>\n");
    html
}

const HEAD: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>geotrace route</title>
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<style>html, body, #map { height: 100%; margin: 0; }</style>
</head>
<body>
<div id="map"></div>
"#;

const TILE_LAYER: &str = "L.tileLayer('https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png', {\n  \
    maxZoom: 18,\n  attribution: '&copy; OpenStreetMap contributors'\n}).addTo(map);\n";
