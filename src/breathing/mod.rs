//! Guided breathing: a fixed inhale, hold, exhale, rest cycle with a session
//! clock, pause, mute and volume.

pub mod controller;
pub mod phase;
pub mod state;

pub use controller::BreathingSession;
pub use phase::{BreathingPhase, PhaseClock, PhaseDurations};
pub use state::{format_clock, SessionSnapshot, SessionState, ViewMode};

/// Static settings for new breathing sessions.
#[derive(Debug, Clone)]
pub struct BreathingConfig {
    pub durations: PhaseDurations,
    /// Ambient loop volume a session starts at, `[0, 1]`.
    pub default_volume: f32,
}

impl Default for BreathingConfig {
    fn default() -> Self {
        Self {
            durations: PhaseDurations::default(),
            default_volume: 0.5,
        }
    }
}
