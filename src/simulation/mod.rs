pub mod controller;
pub mod state;

pub use controller::{AnimationScheduler, SchedulerSignal};
pub use state::{
    advance_interval, AdvanceOutcome, Cursor, MarkerFrame, SimulationConfig, SimulationState,
};
