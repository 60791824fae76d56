use std::ops::Range;

use log::debug;

use crate::route::config::SegmentationConfig;
use crate::route::model::{CongestionLevel, Route, Zone, Zones};

/// Split a route into approach / trigger / exit windows and classify the
/// trigger window by its average congestion.
///
/// Window boundaries only depend on the number of points, never on the
/// congestion values, so the same route always yields the same zones.
pub fn segment_route(route: &Route, config: &SegmentationConfig) -> Zones {
    let (approach, trigger, exit) = window_ranges(route.len(), config);

    let average_congestion = average_congestion(route, &trigger);
    let level = classify(average_congestion, config);

    debug!(
        "segmented {} points: approach {:?}, trigger {:?} ({}, avg {:.2}), exit {:?}",
        route.len(),
        approach,
        trigger,
        level.as_str(),
        average_congestion,
        exit
    );

    Zones {
        approach: Zone {
            range: approach,
            level: outer_level(level),
        },
        trigger: Zone {
            range: trigger,
            level,
        },
        exit: Zone {
            range: exit,
            level: outer_level(level),
        },
        average_congestion,
    }
}

/// Compute the three contiguous windows for a route of `len` points.
///
/// Integer percentages avoid float rounding at the boundaries; the ranges are
/// ordered, disjoint and together cover `0..len` exactly.
pub fn window_ranges(
    len: usize,
    config: &SegmentationConfig,
) -> (Range<usize>, Range<usize>, Range<usize>) {
    let approach_pct = config.approach_pct.min(100);
    let trigger_end_pct = (approach_pct + config.trigger_pct).min(100);

    let start = len * approach_pct / 100;
    let end = (len * trigger_end_pct / 100).max(start);

    (0..start, start..end, end..len)
}

/// Mean congestion over `range`; an empty window is free flow.
pub fn average_congestion(route: &Route, range: &Range<usize>) -> f64 {
    let end = range.end.min(route.len());
    let start = range.start.min(end);
    let window = &route.points()[start..end];

    if window.is_empty() {
        return 0.0;
    }

    let total: f64 = window.iter().map(|point| point.congestion_score()).sum();
    total / window.len() as f64
}

pub fn classify(average: f64, config: &SegmentationConfig) -> CongestionLevel {
    if average <= config.low_max {
        CongestionLevel::Low
    } else if average <= config.medium_max {
        CongestionLevel::Medium
    } else {
        CongestionLevel::High
    }
}

/// Classification shown for the approach and exit windows: free flow when the
/// jam is light, otherwise a warning level leading into and out of it.
fn outer_level(trigger_level: CongestionLevel) -> CongestionLevel {
    match trigger_level {
        CongestionLevel::Low => CongestionLevel::Low,
        CongestionLevel::Medium | CongestionLevel::High => CongestionLevel::Medium,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::model::{LngLat, RoutePoint};
    use proptest::prelude::*;

    fn route_with(congestion: impl Fn(usize) -> Option<f64>, len: usize) -> Route {
        let points = (0..len)
            .map(|i| RoutePoint::new(LngLat::new(4.0 + i as f64 * 0.001, 50.0), congestion(i)))
            .collect();
        Route::new(points, 600.0)
    }

    #[test]
    fn jam_in_the_middle_is_high() {
        let route = route_with(|i| Some(if (30..70).contains(&i) { 0.9 } else { 0.0 }), 100);
        let zones = segment_route(&route, &SegmentationConfig::default());

        assert_eq!(zones.approach.range, 0..30);
        assert_eq!(zones.trigger.range, 30..70);
        assert_eq!(zones.exit.range, 70..100);
        assert_eq!(zones.level(), CongestionLevel::High);
        assert!((zones.average_congestion - 0.9).abs() < 1e-9);
        assert_eq!(zones.approach.level, CongestionLevel::Medium);
    }

    #[test]
    fn thresholds_are_inclusive() {
        let config = SegmentationConfig::default();
        assert_eq!(classify(0.3, &config), CongestionLevel::Low);
        assert_eq!(classify(0.31, &config), CongestionLevel::Medium);
        assert_eq!(classify(0.7, &config), CongestionLevel::Medium);
        assert_eq!(classify(0.71, &config), CongestionLevel::High);
    }

    #[test]
    fn missing_scores_are_free_flow() {
        let route = route_with(|_| None, 20);
        let zones = segment_route(&route, &SegmentationConfig::default());

        assert_eq!(zones.level(), CongestionLevel::Low);
        assert_eq!(zones.trigger.range, 6..14);
    }

    #[test]
    fn tiny_routes_do_not_panic() {
        let config = SegmentationConfig::default();
        for len in 0..4 {
            let route = route_with(|_| Some(1.0), len);
            let zones = segment_route(&route, &config);
            assert_eq!(zones.covered_len(), len);
        }

        // A single point has an empty trigger window and therefore no congestion.
        let zones = segment_route(&route_with(|_| Some(1.0), 1), &config);
        assert!(zones.trigger.is_empty());
        assert_eq!(zones.level(), CongestionLevel::Low);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn windows_partition_the_route(len in 0usize..5_000) {
            let (approach, trigger, exit) = window_ranges(len, &SegmentationConfig::default());

            prop_assert_eq!(approach.start, 0);
            prop_assert_eq!(approach.end, trigger.start);
            prop_assert_eq!(trigger.end, exit.start);
            prop_assert_eq!(exit.end, len);
            prop_assert_eq!(approach.len() + trigger.len() + exit.len(), len);
        }

        #[test]
        fn average_stays_in_unit_interval(scores in proptest::collection::vec(proptest::option::of(-1.0f64..2.0), 0..200)) {
            let len = scores.len();
            let route = route_with(|i| scores[i], len);
            let zones = segment_route(&route, &SegmentationConfig::default());

            prop_assert!(zones.average_congestion >= 0.0);
            prop_assert!(zones.average_congestion <= 1.0);
        }
    }
}
