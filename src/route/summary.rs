use serde::Serialize;

use crate::route::config::SegmentationConfig;
use crate::route::model::{CongestionLevel, LngLat, Route, Zone, Zones};

/// What the traffic card shows after a route is checked.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficSummary {
    pub level: CongestionLevel,
    pub description: &'static str,
    pub advice: &'static str,
    pub base_minutes: u64,
    pub delay_minutes: u64,
    pub total_minutes: u64,
    pub zones: Zones,
    pub segments: Vec<SegmentLine>,
}

/// One coloured stretch of the route line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentLine {
    pub level: CongestionLevel,
    pub color: &'static str,
    pub coordinates: Vec<LngLat>,
}

pub fn summarize(route: &Route, zones: &Zones, config: &SegmentationConfig) -> TrafficSummary {
    let level = zones.level();
    let duration_secs = route.duration_secs();

    let delay_factor = match level {
        CongestionLevel::Low => 0.0,
        CongestionLevel::Medium => config.medium_delay_factor,
        CongestionLevel::High => config.high_delay_factor,
    };

    let base_minutes = whole_minutes(duration_secs);
    let delay_minutes = whole_minutes(duration_secs * delay_factor);

    TrafficSummary {
        level,
        description: description(level),
        advice: advice(level),
        base_minutes,
        delay_minutes,
        total_minutes: base_minutes + delay_minutes,
        zones: zones.clone(),
        segments: zones
            .windows()
            .iter()
            .map(|zone| segment_line(route, zone))
            .collect(),
    }
}

fn segment_line(route: &Route, zone: &Zone) -> SegmentLine {
    SegmentLine {
        level: zone.level,
        color: color(zone.level),
        coordinates: route.polyline(&zone.range),
    }
}

fn whole_minutes(secs: f64) -> u64 {
    if secs.is_finite() && secs > 0.0 {
        (secs / 60.0).round() as u64
    } else {
        0
    }
}

pub fn description(level: CongestionLevel) -> &'static str {
    match level {
        CongestionLevel::Low => "Light traffic, smooth flow",
        CongestionLevel::Medium => "Moderate traffic, expect some delays",
        CongestionLevel::High => "Heavy traffic, significant delays expected",
    }
}

pub fn advice(level: CongestionLevel) -> &'static str {
    match level {
        CongestionLevel::Low => "Current route is optimal",
        CongestionLevel::Medium => "Consider alternative routes",
        CongestionLevel::High => "Heavy traffic, consider delaying trip",
    }
}

pub fn color(level: CongestionLevel) -> &'static str {
    match level {
        CongestionLevel::Low => "#4caf50",
        CongestionLevel::Medium => "#ff9800",
        CongestionLevel::High => "#f44336",
    }
}
