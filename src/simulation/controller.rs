use std::{ops::Range, sync::Arc};

use tokio::{
    sync::{mpsc::UnboundedSender, Mutex},
    task::JoinHandle,
    time,
};

use crate::events::{EventEmitter, ViewEvent};
use crate::route::Route;

use super::{AdvanceOutcome, Cursor, SimulationConfig, SimulationState};

// Set to true to enable per-step logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

/// Raised by the scheduler after it has halted itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerSignal {
    HardStop { epoch: u64, index: usize },
}

/// Holds the running ticker; the ticker dies with the last scheduler handle.
#[derive(Default)]
struct TickerSlot {
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for TickerSlot {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.get_mut().take() {
            handle.abort();
        }
    }
}

/// Drives the cursor along the current route on its own timer.
///
/// Exactly one ticker task exists at a time; it is aborted whenever the route,
/// the speed, or the scheduler itself is torn down, and every step re-checks
/// the route epoch it was spawned for.
#[derive(Clone)]
pub struct AnimationScheduler {
    state: Arc<Mutex<SimulationState>>,
    ticker: Arc<TickerSlot>,
    emitter: EventEmitter,
    signals: UnboundedSender<SchedulerSignal>,
    config: Arc<SimulationConfig>,
}

impl AnimationScheduler {
    pub fn new(
        config: SimulationConfig,
        emitter: EventEmitter,
        signals: UnboundedSender<SchedulerSignal>,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimulationState::new(config.initial_speed))),
            ticker: Arc::new(TickerSlot::default()),
            emitter,
            signals,
            config: Arc::new(config),
        }
    }

    /// Put the marker on the first point and begin advancing. An empty route
    /// schedules nothing and returns `None`.
    pub async fn start(&self, route: Arc<Route>, trigger: Range<usize>) -> Option<u64> {
        self.cancel_ticker().await;

        let (epoch, frame, active) = {
            let mut state = self.state.lock().await;
            let epoch = state.load(route, trigger);
            (epoch, state.frame(), state.is_active())
        };

        let Some(frame) = frame else {
            log_info!("route has no points, animation not started");
            return None;
        };

        log_info!("animation started for route epoch {}", epoch);
        self.emitter.emit(ViewEvent::MarkerMoved(frame));

        if active {
            self.spawn_ticker(epoch).await;
        } else {
            self.emitter.emit(ViewEvent::RouteCompleted);
        }
        Some(epoch)
    }

    /// Update SimSpeed. The pending step is dropped and the stop condition is
    /// evaluated right away, then stepping resumes at the new cadence.
    pub async fn set_speed(&self, speed: f64) {
        let (epoch, active) = {
            let mut state = self.state.lock().await;
            if !state.set_speed(speed, &self.config) {
                return;
            }
            (state.epoch(), state.is_active())
        };

        if active {
            self.spawn_ticker(epoch).await;
        }
    }

    /// Forget the current route and cancel any pending step.
    pub async fn stop(&self) {
        self.cancel_ticker().await;
        self.state.lock().await.clear();
    }

    pub async fn cursor(&self) -> Cursor {
        self.state.lock().await.cursor()
    }

    pub async fn speed(&self) -> f64 {
        self.state.lock().await.speed()
    }

    pub async fn is_halted(&self) -> bool {
        self.state.lock().await.is_halted()
    }

    pub async fn is_finished(&self) -> bool {
        self.state.lock().await.is_finished()
    }

    /// Replace the ticker with one for `epoch`. A caller holding an epoch
    /// that a newer `start` has already replaced leaves the current ticker alone.
    async fn spawn_ticker(&self, epoch: u64) {
        let mut ticker_guard = self.ticker.handle.lock().await;
        {
            let state = self.state.lock().await;
            if state.epoch() != epoch || !state.is_active() {
                log_debug!("not respawning ticker for stale route epoch {}", epoch);
                return;
            }
        }
        if let Some(handle) = ticker_guard.take() {
            handle.abort();
        }

        let handle = tokio::spawn(drive(
            self.state.clone(),
            self.emitter.clone(),
            self.signals.clone(),
            self.config.clone(),
            epoch,
        ));

        *ticker_guard = Some(handle);
    }

    async fn cancel_ticker(&self) {
        if let Some(handle) = self.ticker.handle.lock().await.take() {
            handle.abort();
        }
    }
}

async fn drive(
    state: Arc<Mutex<SimulationState>>,
    emitter: EventEmitter,
    signals: UnboundedSender<SchedulerSignal>,
    config: Arc<SimulationConfig>,
    epoch: u64,
) {
    let stopped_at = {
        let mut guard = state.lock().await;
        if guard.epoch() != epoch || !guard.is_active() {
            return;
        }
        guard.reevaluate(&config)
    };
    if let Some(index) = stopped_at {
        hard_stop(&emitter, &signals, epoch, index);
        return;
    }

    let frames = config.frames_per_step.max(1);

    loop {
        let interval = {
            let guard = state.lock().await;
            if guard.epoch() != epoch || !guard.is_active() {
                return;
            }
            guard.interval(&config)
        };
        let slice = interval / frames;

        for frame_no in 1..frames {
            time::sleep(slice).await;
            let frame = {
                let mut guard = state.lock().await;
                if guard.epoch() != epoch {
                    return;
                }
                guard.set_offset(frame_no as f64 / frames as f64)
            };
            if let Some(frame) = frame {
                emitter.emit(ViewEvent::MarkerMoved(frame));
            }
        }
        time::sleep(slice).await;

        let outcome = {
            let mut guard = state.lock().await;
            if guard.epoch() != epoch {
                return;
            }
            guard.advance(&config)
        };

        match outcome {
            AdvanceOutcome::Moved { frame, arrived } => {
                log_debug!("marker at point {} heading {:.1}", frame.index, frame.heading);
                emitter.emit(ViewEvent::MarkerMoved(frame));
                if arrived {
                    log_info!("route epoch {} completed", epoch);
                    emitter.emit(ViewEvent::RouteCompleted);
                    return;
                }
            }
            AdvanceOutcome::HardStop { index } => {
                hard_stop(&emitter, &signals, epoch, index);
                return;
            }
            AdvanceOutcome::Idle => return,
        }
    }
}

/// The ticker has already stopped stepping when this runs, so listeners see
/// the hard stop before any later step could happen.
fn hard_stop(
    emitter: &EventEmitter,
    signals: &UnboundedSender<SchedulerSignal>,
    epoch: u64,
    index: usize,
) {
    log_info!("stopped in traffic, cursor parked at point {}", index);
    emitter.emit(ViewEvent::HardStop { index });
    let _ = signals.send(SchedulerSignal::HardStop { epoch, index });
}
