//! Geographic helpers for marker placement and orientation.
//!
//! All inputs are WGS84 degrees. Bearings are compass headings in `[0, 360)`,
//! clockwise from north, which is what the map marker rotation expects.

use geo::{Bearing, Haversine, InterpolatePoint, Point};

use crate::route::model::LngLat;

/// Initial great-circle bearing from `from` towards `to`.
///
/// Identical points have no defined direction and yield `0.0`.
pub fn initial_bearing(from: LngLat, to: LngLat) -> f64 {
    if from == to {
        return 0.0;
    }
    normalize_bearing(Haversine::bearing(Point::from(from), Point::from(to)))
}

/// Wrap any angle in degrees into `[0, 360)`.
pub fn normalize_bearing(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Point `fraction` of the way along the great circle from `from` to `to`,
/// `fraction` clamped to `[0, 1]`.
pub fn interpolate(from: LngLat, to: LngLat, fraction: f64) -> LngLat {
    let t = if fraction.is_finite() {
        fraction.clamp(0.0, 1.0)
    } else {
        0.0
    };
    if t == 0.0 || from == to {
        return from;
    }
    if t == 1.0 {
        return to;
    }
    Haversine::point_at_ratio_between(Point::from(from), Point::from(to), t).into()
}
