use crate::distance::haversine_miles;
use geotrace_model::{Coordinate, HopRecord};

/// The records of one run and the coordinate cursor used for distances.
///
/// The cursor always holds the coordinate of the most recently appended record,
/// so an unresolved hop breaks the distance chain until the next resolved one.
#[derive(Debug, Default)]
pub struct RouteState {
    records: Vec<HopRecord>,
    cursor: Option<Coordinate>,
}

impl RouteState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[HopRecord] {
        &self.records
    }

    pub fn cursor(&self) -> Option<Coordinate> {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distance from the cursor to `next`, when both are known.
    pub fn distance_to(&self, next: Option<Coordinate>) -> Option<f64> {
        match (self.cursor, next) {
            (Some(prev), Some(next)) => Some(haversine_miles(prev, next)),
            _ => None,
        }
    }

    /// Appends `record` and moves the cursor to its coordinate, resolved or not.
    pub fn push(&mut self, record: HopRecord) {
        self.cursor = record.coordinate;
        self.records.push(record);
    }
}
