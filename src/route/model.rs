use std::ops::Range;

use geo::Point;
use serde::{Deserialize, Serialize};

/// A WGS84 coordinate, longitude first to match GeoJSON ordering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

impl From<LngLat> for Point {
    fn from(position: LngLat) -> Self {
        Point::new(position.lng, position.lat)
    }
}

impl From<Point> for LngLat {
    fn from(point: Point) -> Self {
        LngLat::new(point.x(), point.y())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePoint {
    pub position: LngLat,
    /// Congestion score in [0, 1] reported by the route provider, if any.
    pub congestion: Option<f64>,
}

impl RoutePoint {
    pub fn new(position: LngLat, congestion: Option<f64>) -> Self {
        Self {
            position,
            congestion,
        }
    }

    /// Congestion used for classification. Missing scores count as free flow.
    pub fn congestion_score(&self) -> f64 {
        self.congestion
            .filter(|score| score.is_finite())
            .unwrap_or(0.0)
            .clamp(0.0, 1.0)
    }
}

/// An ordered route as returned by a provider.
///
/// Immutable once built: a new request produces a new `Route`, the previous one
/// is dropped together with everything derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    points: Vec<RoutePoint>,
    /// Free-flow travel time reported by the provider.
    duration_secs: f64,
}

impl Route {
    pub fn new(points: Vec<RoutePoint>, duration_secs: f64) -> Self {
        Self {
            points,
            duration_secs: duration_secs.max(0.0),
        }
    }

    pub fn points(&self) -> &[RoutePoint] {
        &self.points
    }

    pub fn point(&self, index: usize) -> Option<&RoutePoint> {
        self.points.get(index)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last_index(&self) -> Option<usize> {
        self.points.len().checked_sub(1)
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    /// Coordinates of a sub-range, clamped to the route.
    pub fn polyline(&self, range: &Range<usize>) -> Vec<LngLat> {
        let end = range.end.min(self.points.len());
        let start = range.start.min(end);
        self.points[start..end].iter().map(|p| p.position).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CongestionLevel {
    Low,
    Medium,
    High,
}

impl CongestionLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            CongestionLevel::Low => "low",
            CongestionLevel::Medium => "medium",
            CongestionLevel::High => "high",
        }
    }
}

/// A classified contiguous window `[start, end)` over a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub range: Range<usize>,
    pub level: CongestionLevel,
}

impl Zone {
    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

/// The three windows derived from one route. `trigger` is always the middle
/// window; `level` is its classification and the only one that gates the
/// intervention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zones {
    pub approach: Zone,
    pub trigger: Zone,
    pub exit: Zone,
    pub average_congestion: f64,
}

impl Zones {
    pub fn level(&self) -> CongestionLevel {
        self.trigger.level
    }

    pub fn windows(&self) -> [&Zone; 3] {
        [&self.approach, &self.trigger, &self.exit]
    }

    /// Total number of route points covered by the three windows.
    pub fn covered_len(&self) -> usize {
        self.windows().iter().map(|zone| zone.len()).sum()
    }
}
