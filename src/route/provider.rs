use std::{future::Future, ops::Range, path::PathBuf};

use anyhow::{bail, Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

use crate::route::model::{LngLat, Route, RoutePoint};

/// Source of driving routes. Failures mean "no route available"; callers log
/// them and carry on without a route.
pub trait RouteProvider {
    fn fetch_route(&self) -> impl Future<Output = Result<Route>> + Send;
}

/// On-disk route in directions-API shape:
/// `{ "points": [[lng, lat], ...], "congestion": [..], "durationSecs": 900 }`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RouteFile {
    points: Vec<[f64; 2]>,
    #[serde(default)]
    congestion: Vec<Option<f64>>,
    #[serde(default)]
    duration_secs: f64,
}

impl RouteFile {
    fn into_route(self) -> Result<Route> {
        if self.points.is_empty() {
            bail!("route has no points");
        }

        let points = self
            .points
            .iter()
            .enumerate()
            .map(|(i, [lng, lat])| {
                let congestion = self.congestion.get(i).copied().flatten();
                RoutePoint::new(LngLat::new(*lng, *lat), congestion)
            })
            .collect();

        Ok(Route::new(points, self.duration_secs))
    }
}

pub fn parse_route(contents: &str) -> Result<Route> {
    let file: RouteFile = serde_json::from_str(contents).context("invalid route JSON")?;
    file.into_route()
}

/// Reads a previously fetched route from a JSON file.
pub struct FileRouteProvider {
    path: PathBuf,
}

impl FileRouteProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RouteProvider for FileRouteProvider {
    fn fetch_route(&self) -> impl Future<Output = Result<Route>> + Send {
        let path = self.path.clone();
        async move {
            let contents = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read route from {}", path.display()))?;
            parse_route(&contents)
                .with_context(|| format!("Failed to parse route in {}", path.display()))
        }
    }
}

/// Builds a straight-line route with a reproducible traffic jam, for demos and
/// for exercising the simulation without a directions service.
#[derive(Debug, Clone)]
pub struct SyntheticRouteProvider {
    pub from: LngLat,
    pub to: LngLat,
    pub point_count: usize,
    /// Fraction of the route, `0.0..=1.0`, where traffic is jammed.
    pub jam: Range<f64>,
    /// Congestion inside the jam; free-flow noise outside stays below 0.2.
    pub jam_congestion: f64,
    /// Free-flow travel time per point.
    pub secs_per_point: f64,
    pub seed: u64,
}

impl Default for SyntheticRouteProvider {
    fn default() -> Self {
        Self {
            // Thomas More Mechelen to Brussels centre
            from: LngLat::new(4.4792, 51.0170),
            to: LngLat::new(4.3517, 50.8503),
            point_count: 120,
            jam: 0.3..0.7,
            jam_congestion: 0.9,
            secs_per_point: 12.0,
            seed: 7,
        }
    }
}

impl SyntheticRouteProvider {
    pub fn build(&self) -> Route {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let count = self.point_count;
        let denominator = count.saturating_sub(1).max(1) as f64;

        let points = (0..count)
            .map(|i| {
                let t = i as f64 / denominator;
                let position = LngLat::new(
                    self.from.lng + (self.to.lng - self.from.lng) * t,
                    self.from.lat + (self.to.lat - self.from.lat) * t,
                );
                let congestion = if self.jam.contains(&t) {
                    self.jam_congestion + rng.gen_range(-0.05..0.05)
                } else {
                    rng.gen_range(0.0..0.2)
                };
                RoutePoint::new(position, Some(congestion.clamp(0.0, 1.0)))
            })
            .collect();

        Route::new(points, count as f64 * self.secs_per_point)
    }
}

impl RouteProvider for SyntheticRouteProvider {
    fn fetch_route(&self) -> impl Future<Output = Result<Route>> + Send {
        let route = self.build();
        async move {
            if route.is_empty() {
                bail!("synthetic route has no points");
            }
            Ok(route)
        }
    }
}
