pub mod algorithm;
pub mod config;
pub mod geo;
pub mod model;
pub mod provider;
pub mod summary;

pub use algorithm::segment_route;
pub use config::SegmentationConfig;
pub use model::{CongestionLevel, LngLat, Route, RoutePoint, Zone, Zones};
pub use provider::{FileRouteProvider, RouteProvider, SyntheticRouteProvider};
pub use summary::{summarize, TrafficSummary};
