use std::{ops::Range, sync::Arc, time::Duration};

use serde::Serialize;

use crate::route::geo::{initial_bearing, interpolate};
use crate::route::{LngLat, Route};

/// Tunables for the driving simulation.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// At or below this speed the car counts as stopped in traffic.
    pub stop_threshold: f64,
    pub min_speed: f64,
    pub max_speed: f64,
    /// Step latency at `max_speed`.
    pub min_interval: Duration,
    /// Step latency at the slowest moving speed (1 unit).
    pub max_interval: Duration,
    /// Interpolated marker frames emitted per route step, including the step itself.
    pub frames_per_step: u32,
    pub initial_speed: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            stop_threshold: 10.0,
            min_speed: 0.0,
            max_speed: 50.0,
            min_interval: Duration::from_millis(80),
            max_interval: Duration::from_millis(1200),
            frames_per_step: 1,
            initial_speed: 30.0,
        }
    }
}

/// Step latency for a given speed: linear from `max_interval` at 1 unit down to
/// `min_interval` at `max_speed`. Not physical; slow feels sluggish, fast brisk.
pub fn advance_interval(speed: f64, config: &SimulationConfig) -> Duration {
    let top = config.max_speed.max(1.0);
    let speed = if speed.is_finite() { speed } else { 1.0 };
    let speed = speed.clamp(1.0, top);

    let span = (top - 1.0).max(f64::EPSILON);
    let min_us = config.min_interval.as_micros() as f64;
    let max_us = config.max_interval.as_micros() as f64;
    let us = max_us - ((speed - 1.0) / span) * (max_us - min_us);

    Duration::from_micros(us.max(0.0).round() as u64)
}

/// Position along the route: a point index plus a fraction of the way to the next point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Cursor {
    pub index: usize,
    pub offset: f64,
}

impl Cursor {
    pub fn origin() -> Self {
        Self {
            index: 0,
            offset: 0.0,
        }
    }
}

/// Marker placement handed to the view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerFrame {
    pub index: usize,
    pub offset: f64,
    pub position: LngLat,
    /// Compass heading in degrees, `[0, 360)`.
    pub heading: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AdvanceOutcome {
    Moved { frame: MarkerFrame, arrived: bool },
    /// Cursor was snapped to the trigger zone start and advancement halted.
    HardStop { index: usize },
    /// Nothing to do: no route, already arrived, or torn down.
    Idle,
}

/// Cursor bookkeeping for one route at a time. Only the scheduler mutates it.
#[derive(Debug, Clone)]
pub struct SimulationState {
    epoch: u64,
    route: Option<Arc<Route>>,
    trigger: Range<usize>,
    cursor: Cursor,
    speed: f64,
    halted: bool,
    finished: bool,
    heading: f64,
}

impl SimulationState {
    pub fn new(initial_speed: f64) -> Self {
        Self {
            epoch: 0,
            route: None,
            trigger: 0..0,
            cursor: Cursor::origin(),
            speed: initial_speed,
            halted: false,
            finished: false,
            heading: 0.0,
        }
    }

    /// Replace the route, invalidating everything derived from the previous
    /// one. Returns the new route epoch.
    pub fn load(&mut self, route: Arc<Route>, trigger: Range<usize>) -> u64 {
        self.epoch = self.epoch.wrapping_add(1);
        self.finished = route.len() <= 1;
        self.route = if route.is_empty() { None } else { Some(route) };
        self.trigger = trigger;
        self.cursor = Cursor::origin();
        self.halted = false;
        self.heading = 0.0;
        self.heading = self.current_heading();
        self.epoch
    }

    pub fn clear(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
        self.route = None;
        self.trigger = 0..0;
        self.cursor = Cursor::origin();
        self.halted = false;
        self.finished = false;
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// A route is loaded and the cursor has somewhere left to go.
    pub fn is_active(&self) -> bool {
        self.route.is_some() && !self.finished
    }

    /// Out-of-range speeds are clamped; a NaN reading is dropped.
    pub fn set_speed(&mut self, speed: f64, config: &SimulationConfig) -> bool {
        if speed.is_nan() {
            return false;
        }
        self.speed = speed.clamp(config.min_speed, config.max_speed);
        true
    }

    pub fn interval(&self, config: &SimulationConfig) -> Duration {
        advance_interval(self.speed, config)
    }

    pub fn should_hard_stop(&self, config: &SimulationConfig) -> bool {
        self.is_active()
            && self.speed <= config.stop_threshold
            && self.cursor.index < self.trigger.end
    }

    /// Stop-condition half of a step. Snaps to the trigger zone start and halts
    /// when stopped in or before the zone; otherwise lifts any earlier halt.
    pub fn reevaluate(&mut self, config: &SimulationConfig) -> Option<usize> {
        if self.should_hard_stop(config) {
            self.cursor = Cursor {
                index: self.trigger.start,
                offset: 0.0,
            };
            self.heading = self.current_heading();
            self.halted = true;
            Some(self.trigger.start)
        } else {
            self.halted = false;
            None
        }
    }

    /// One scheduled step: hard stop, or move to the next point.
    pub fn advance(&mut self, config: &SimulationConfig) -> AdvanceOutcome {
        let Some(route) = self.route.clone() else {
            return AdvanceOutcome::Idle;
        };
        if self.finished {
            return AdvanceOutcome::Idle;
        }

        if let Some(index) = self.reevaluate(config) {
            return AdvanceOutcome::HardStop { index };
        }

        let last = route.len() - 1;
        if self.cursor.index >= last {
            self.finished = true;
            return AdvanceOutcome::Idle;
        }

        self.cursor = Cursor {
            index: self.cursor.index + 1,
            offset: 0.0,
        };
        self.heading = self.current_heading();
        let arrived = self.cursor.index >= last;
        if arrived {
            self.finished = true;
        }

        match self.frame() {
            Some(frame) => AdvanceOutcome::Moved { frame, arrived },
            None => AdvanceOutcome::Idle,
        }
    }

    /// Move the marker part of the way to the next point without changing the
    /// point index.
    pub fn set_offset(&mut self, offset: f64) -> Option<MarkerFrame> {
        if !self.is_active() || self.halted {
            return None;
        }
        self.cursor.offset = if offset.is_finite() {
            offset.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.frame()
    }

    pub fn frame(&self) -> Option<MarkerFrame> {
        let route = self.route.as_ref()?;
        let current = route.point(self.cursor.index)?.position;
        let position = match route.point(self.cursor.index + 1) {
            Some(next) => interpolate(current, next.position, self.cursor.offset),
            None => current,
        };

        Some(MarkerFrame {
            index: self.cursor.index,
            offset: self.cursor.offset,
            position,
            heading: self.heading,
        })
    }

    /// Heading towards the next point; keeps the previous heading at the end of
    /// the route or between duplicate points.
    fn current_heading(&self) -> f64 {
        let Some(route) = self.route.as_ref() else {
            return self.heading;
        };
        match (
            route.point(self.cursor.index),
            route.point(self.cursor.index + 1),
        ) {
            (Some(current), Some(next)) if current.position != next.position => {
                initial_bearing(current.position, next.position)
            }
            _ => self.heading,
        }
    }
}
