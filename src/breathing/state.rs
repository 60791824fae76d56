use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use super::phase::{BreathingPhase, PhaseClock, PhaseDurations};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ViewMode {
    Compact,
    Fullscreen,
}

impl Default for ViewMode {
    fn default() -> Self {
        ViewMode::Compact
    }
}

/// Everything the compact and fullscreen widgets render. Both read the same
/// snapshot; switching between them never rebuilds the session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub phase: BreathingPhase,
    pub paused: bool,
    pub muted: bool,
    pub volume: f32,
    pub elapsed_seconds: u64,
    pub view: ViewMode,
}

impl SessionSnapshot {
    /// Session clock as `mm:ss`.
    pub fn clock(&self) -> String {
        format_clock(self.elapsed_seconds)
    }
}

pub fn format_clock(elapsed_seconds: u64) -> String {
    format!("{:02}:{:02}", elapsed_seconds / 60, elapsed_seconds % 60)
}

/// Authoritative state of one breathing session.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub paused: bool,
    pub muted: bool,
    pub volume: f32,
    pub view: ViewMode,
    pub phase_clock: PhaseClock,
    /// Whole seconds of unpaused time, as last published by the clock tick.
    pub elapsed_seconds: u64,
    /// Unpaused time accumulated before the current running window; combines
    /// with `running_anchor` to give the true active duration.
    active_baseline: Duration,
    running_anchor: Option<Instant>,
}

impl SessionState {
    /// A running session at the start of `Inhale`.
    pub fn begin(
        id: String,
        durations: PhaseDurations,
        volume: f32,
        started_at: DateTime<Utc>,
        now: Instant,
    ) -> Self {
        let mut phase_clock = PhaseClock::new(durations);
        phase_clock.resume(now);

        Self {
            id,
            started_at,
            paused: false,
            muted: false,
            volume: clamp_volume(volume),
            view: ViewMode::Compact,
            phase_clock,
            elapsed_seconds: 0,
            active_baseline: Duration::ZERO,
            running_anchor: Some(now),
        }
    }

    pub fn phase(&self) -> BreathingPhase {
        self.phase_clock.phase()
    }

    pub fn active_duration(&self, now: Instant) -> Duration {
        match self.running_anchor {
            Some(anchor) => self
                .active_baseline
                .saturating_add(now.saturating_duration_since(anchor)),
            None => self.active_baseline,
        }
    }

    pub fn active_seconds(&self, now: Instant) -> u64 {
        self.active_duration(now).as_secs()
    }

    /// Time until the session clock crosses its next whole second.
    pub fn until_next_second(&self, now: Instant) -> Duration {
        let into_second = self.active_duration(now).subsec_nanos();
        Duration::from_secs(1) - Duration::from_nanos(u64::from(into_second))
    }

    /// Freeze the phase and the session clock together. Returns false when
    /// already paused.
    pub fn pause(&mut self, now: Instant) -> bool {
        if self.paused {
            return false;
        }
        self.active_baseline = self.active_duration(now);
        self.running_anchor = None;
        self.elapsed_seconds = self.active_baseline.as_secs();
        self.phase_clock.pause(now);
        self.paused = true;
        true
    }

    pub fn resume(&mut self, now: Instant) -> bool {
        if !self.paused {
            return false;
        }
        self.running_anchor = Some(now);
        self.phase_clock.resume(now);
        self.paused = false;
        true
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = clamp_volume(volume);
    }

    /// Volume the ambient loop should actually play at.
    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.volume
        }
    }

    pub fn snapshot(&self, now: Instant) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id.clone(),
            started_at: self.started_at,
            phase: self.phase(),
            paused: self.paused,
            muted: self.muted,
            volume: self.volume,
            elapsed_seconds: self.active_seconds(now),
            view: self.view,
        }
    }
}

fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}
