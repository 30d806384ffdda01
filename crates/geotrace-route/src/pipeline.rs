use crate::cancel::CancelToken;
use crate::state::RouteState;
use chrono::{SecondsFormat, Utc};
use geotrace_geo::GeoLocator;
use geotrace_model::{Coordinate, HopEvent, HopRecord, LocationResult, RouteSink, RunOutcome};
use geotrace_trace::TraceEvent;
use log::{debug, info, warn};
use std::sync::mpsc::Receiver;

/// State left behind by one pipeline run.
#[derive(Debug)]
pub struct PipelineRun {
    pub state: RouteState,
    pub outcome: RunOutcome,
}

/// Consumes hop events, geolocates them and feeds the sinks.
pub struct EnrichmentPipeline<'a, L: GeoLocator> {
    locator: L,
    sinks: Vec<&'a mut dyn RouteSink>,
    cancel: CancelToken,
    state: RouteState,
}

impl<'a, L: GeoLocator> EnrichmentPipeline<'a, L> {
    pub fn new(locator: L, cancel: CancelToken) -> Self {
        Self {
            locator,
            sinks: Vec::new(),
            cancel,
            state: RouteState::new(),
        }
    }

    pub fn with_sink(mut self, sink: &'a mut dyn RouteSink) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Blocks on `receiver` until the producer's `Done` or cancellation, then
    /// finishes every sink with whatever has been appended.
    pub fn run(mut self, receiver: &Receiver<TraceEvent>) -> PipelineRun {
        let outcome = self.consume(receiver);

        match outcome {
            RunOutcome::Completed => info!("trace complete: {} hops recorded", self.state.len()),
            RunOutcome::Interrupted => info!(
                "interrupted: stopping with {} hops recorded",
                self.state.len()
            ),
        }

        for sink in self.sinks.iter_mut() {
            if let Err(err) = sink.on_finish(self.state.records(), outcome) {
                warn!("failed to finish output: {err:#}");
            }
        }

        PipelineRun {
            state: self.state,
            outcome,
        }
    }

    fn consume(&mut self, receiver: &Receiver<TraceEvent>) -> RunOutcome {
        loop {
            if self.cancel.is_cancelled() {
                return RunOutcome::Interrupted;
            }

            let event = match receiver.recv() {
                Ok(event) => event,
                Err(_) => {
                    warn!("hop channel closed without a completion signal");
                    return RunOutcome::Completed;
                }
            };

            if self.cancel.is_cancelled() {
                return RunOutcome::Interrupted;
            }

            match event {
                TraceEvent::Hop(hop) => self.process(hop),
                TraceEvent::Done => return RunOutcome::Completed,
                TraceEvent::Interrupted => {
                    debug!("ignoring wake-up without cancellation");
                }
            }
        }
    }

    fn process(&mut self, hop: HopEvent) {
        let Some(address) = hop.address.as_deref() else {
            debug!(
                "hop {} has no address (latency {:?}); skipping",
                hop.sequence, hop.latency_ms
            );
            return;
        };

        info!("locating hop {}: {address}", hop.sequence);
        let location = self.locator.locate(address);
        let record = enrich(&self.state, hop, location, now_utc());

        match record.distance_from_prev_miles {
            Some(miles) => info!(
                "hop {} at {} ({miles} miles from previous)",
                record.sequence,
                describe(&record.location)
            ),
            None => info!("hop {} at {}", record.sequence, describe(&record.location)),
        }

        self.state.push(record);
        for sink in self.sinks.iter_mut() {
            if let Err(err) = sink.on_record(self.state.records()) {
                warn!("failed to update output: {err:#}");
            }
        }
    }
}

/// Builds the record for `hop` against the current cursor. Does not touch `state`.
pub fn enrich(
    state: &RouteState,
    hop: HopEvent,
    location: LocationResult,
    observed_at_utc: String,
) -> HopRecord {
    let coordinate = location.coordinate.as_deref().and_then(Coordinate::parse);
    if coordinate.is_none() {
        if let Some(raw) = location.coordinate.as_deref() {
            debug!("unusable coordinate {raw:?} for hop {}", hop.sequence);
        }
    }

    HopRecord {
        sequence: hop.sequence,
        address: hop.address,
        latency_ms: hop.latency_ms,
        distance_from_prev_miles: state.distance_to(coordinate),
        coordinate,
        location,
        observed_at_utc,
    }
}

fn now_utc() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn describe(location: &LocationResult) -> String {
    let parts: Vec<&str> = [&location.city, &location.region, &location.country]
        .into_iter()
        .filter_map(|part| part.as_deref())
        .collect();
    if parts.is_empty() {
        "unknown location".to_string()
    } else {
        parts.join(", ")
    }
}
