use geotrace_model::{Coordinate, HopRecord, LocationResult, RouteSink, RunOutcome};
use geotrace_render::{RouteReport, ROUTE_COLUMNS};
use std::fs;
use tempfile::tempdir;

fn located(sequence: u64) -> HopRecord {
    HopRecord {
        sequence,
        address: Some("8.8.8.8".to_string()),
        latency_ms: Some(12.5),
        location: LocationResult {
            country: Some("US".to_string()),
            region: Some("California".to_string()),
            city: Some("Mountain View".to_string()),
            org: Some("AS15169 Google LLC".to_string()),
            coordinate: Some("37.4056,-122.0775".to_string()),
        },
        coordinate: Some(Coordinate::new(37.4056, -122.0775)),
        distance_from_prev_miles: Some(2424.53),
        observed_at_utc: "2026-02-01T12:34:56.789Z".to_string(),
    }
}

fn unlocated(sequence: u64) -> HopRecord {
    HopRecord {
        sequence,
        address: Some("192.168.1.1".to_string()),
        latency_ms: None,
        location: LocationResult::unavailable(),
        coordinate: None,
        distance_from_prev_miles: None,
        observed_at_utc: "2026-02-01T12:34:57.000Z".to_string(),
    }
}

#[test]
fn report_has_stable_columns_and_placeholders() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("google_route.csv");
    let report = RouteReport::new(&path);

    report.write(&[unlocated(0), located(1)]).unwrap();
    let text = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], ROUTE_COLUMNS.join(","));
    assert_eq!(
        lines[1],
        "0,192.168.1.1,unavailable,unavailable,unavailable,unavailable,unavailable,unavailable,unavailable,2026-02-01T12:34:57.000Z"
    );
    assert_eq!(
        lines[2],
        "1,8.8.8.8,US,California,Mountain View,\"37.4056,-122.0775\",AS15169 Google LLC,12.5,2424.53,2026-02-01T12:34:56.789Z"
    );
}

#[test]
fn rewrite_of_unchanged_records_is_byte_identical() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("route.csv");
    let report = RouteReport::new(&path);
    let records = vec![located(0), unlocated(1), located(2)];

    report.write(&records).unwrap();
    let first = fs::read(&path).unwrap();
    report.write(&records).unwrap();
    let second = fs::read(&path).unwrap();

    assert_eq!(first, second);
}

#[test]
fn finish_overwrites_previous_report_with_current_rows() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("route.csv");
    fs::write(&path, "stale\nstale\nstale\nstale\nstale\n").unwrap();

    let mut report = RouteReport::new(&path);
    let records = vec![located(0), located(1)];
    report.on_record(&records[..1]).unwrap();
    assert!(fs::read_to_string(&path).unwrap().starts_with("stale"));

    report.on_finish(&records, RunOutcome::Interrupted).unwrap();
    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().count(), 3);
    assert!(!text.contains("stale"));
}
