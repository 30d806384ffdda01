//! Hop enrichment: geolocation, distance chaining and run state.

pub mod cancel;
pub mod distance;
pub mod pipeline;
pub mod state;
pub mod summary;

pub use cancel::CancelToken;
pub use distance::haversine_miles;
pub use pipeline::{enrich, EnrichmentPipeline, PipelineRun};
pub use state::RouteState;
pub use summary::RouteSummary;
