//! Map and report outputs for a traced route.

pub mod map;
pub mod output;
pub mod palette;
pub mod report;

pub use map::{MapMarker, MapSegment, RouteMap};
pub use output::atomic_write;
pub use palette::{segment_color, sequence_color, ColorPolicy, LatencyBucket, HUE_STEP};
pub use report::{render_csv, RouteReport, ROUTE_COLUMNS};
