use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum BreathingPhase {
    Inhale,
    Hold,
    Exhale,
    Rest,
}

impl Default for BreathingPhase {
    fn default() -> Self {
        BreathingPhase::Inhale
    }
}

impl BreathingPhase {
    pub fn next(self) -> Self {
        match self {
            BreathingPhase::Inhale => BreathingPhase::Hold,
            BreathingPhase::Hold => BreathingPhase::Exhale,
            BreathingPhase::Exhale => BreathingPhase::Rest,
            BreathingPhase::Rest => BreathingPhase::Inhale,
        }
    }

    /// Text spoken by the narrator and shown on the widget.
    pub fn label(self) -> &'static str {
        match self {
            BreathingPhase::Inhale => "Inhale",
            BreathingPhase::Hold => "Hold",
            BreathingPhase::Exhale => "Exhale",
            BreathingPhase::Rest => "Rest",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhaseDurations {
    pub inhale: Duration,
    pub hold: Duration,
    pub exhale: Duration,
    pub rest: Duration,
}

impl Default for PhaseDurations {
    fn default() -> Self {
        Self {
            inhale: Duration::from_millis(4000),
            hold: Duration::from_millis(4000),
            exhale: Duration::from_millis(4000),
            rest: Duration::from_millis(2000),
        }
    }
}

impl PhaseDurations {
    pub fn of(&self, phase: BreathingPhase) -> Duration {
        match phase {
            BreathingPhase::Inhale => self.inhale,
            BreathingPhase::Hold => self.hold,
            BreathingPhase::Exhale => self.exhale,
            BreathingPhase::Rest => self.rest,
        }
    }

    pub fn cycle(&self) -> Duration {
        self.inhale + self.hold + self.exhale + self.rest
    }
}

/// Current phase and how much of it is left.
///
/// While running, the remaining time is measured from `running_since`; pausing
/// folds the elapsed part into `remaining` so resume continues the same phase
/// for exactly what was left of it.
#[derive(Debug, Clone)]
pub struct PhaseClock {
    phase: BreathingPhase,
    durations: PhaseDurations,
    remaining: Duration,
    running_since: Option<Instant>,
    cycles: u64,
}

impl PhaseClock {
    /// A clock sitting at the start of `Inhale`, not yet running.
    pub fn new(durations: PhaseDurations) -> Self {
        Self {
            phase: BreathingPhase::Inhale,
            remaining: durations.inhale,
            durations,
            running_since: None,
            cycles: 0,
        }
    }

    pub fn phase(&self) -> BreathingPhase {
        self.phase
    }

    /// Completed inhale-to-rest cycles.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn is_running(&self) -> bool {
        self.running_since.is_some()
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        match self.running_since {
            Some(since) => self
                .remaining
                .saturating_sub(now.saturating_duration_since(since)),
            None => self.remaining,
        }
    }

    /// When the current phase ends, if the clock is running.
    pub fn deadline(&self) -> Option<Instant> {
        self.running_since.map(|since| since + self.remaining)
    }

    pub fn pause(&mut self, now: Instant) {
        if self.running_since.is_some() {
            self.remaining = self.remaining(now);
            self.running_since = None;
        }
    }

    pub fn resume(&mut self, now: Instant) {
        if self.running_since.is_none() {
            self.running_since = Some(now);
        }
    }

    /// Enter the next phase with its full duration, measured from `now`.
    /// Pass the previous phase's deadline rather than the wake-up time so
    /// late timers do not push the whole cycle back.
    pub fn advance(&mut self, now: Instant) -> BreathingPhase {
        if self.phase == BreathingPhase::Rest {
            self.cycles += 1;
        }
        self.phase = self.phase.next();
        self.remaining = self.durations.of(self.phase);
        self.running_since = Some(now);
        self.phase
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn cycle_order_and_durations() {
        let durations = PhaseDurations::default();
        assert_eq!(durations.cycle(), ms(14_000));

        let mut phase = BreathingPhase::Inhale;
        let mut visited = vec![phase];
        for _ in 0..4 {
            phase = phase.next();
            visited.push(phase);
        }
        assert_eq!(
            visited,
            vec![
                BreathingPhase::Inhale,
                BreathingPhase::Hold,
                BreathingPhase::Exhale,
                BreathingPhase::Rest,
                BreathingPhase::Inhale,
            ]
        );
        assert_eq!(durations.of(BreathingPhase::Rest), ms(2000));
    }

    #[test]
    fn pause_keeps_what_was_left() {
        let start = Instant::now();
        let mut clock = PhaseClock::new(PhaseDurations::default());
        clock.resume(start);

        clock.pause(start + ms(1500));
        assert_eq!(clock.remaining(start + ms(9000)), ms(2500));

        let resumed_at = start + ms(9000);
        clock.resume(resumed_at);
        assert_eq!(clock.phase(), BreathingPhase::Inhale);
        assert_eq!(clock.remaining(resumed_at + ms(1000)), ms(1500));
        assert_eq!(clock.remaining(resumed_at + ms(5000)), Duration::ZERO);
    }

    #[test]
    fn double_pause_and_resume_are_harmless() {
        let start = Instant::now();
        let mut clock = PhaseClock::new(PhaseDurations::default());
        clock.resume(start);
        clock.resume(start + ms(1000));
        assert_eq!(clock.remaining(start + ms(1000)), ms(3000));

        clock.pause(start + ms(1000));
        clock.pause(start + ms(3000));
        assert_eq!(clock.remaining(start + ms(3000)), ms(3000));
    }

    #[test]
    fn advance_counts_full_cycles() {
        let start = Instant::now();
        let mut clock = PhaseClock::new(PhaseDurations::default());
        clock.resume(start);

        for _ in 0..4 {
            clock.advance(start);
        }
        assert_eq!(clock.phase(), BreathingPhase::Inhale);
        assert_eq!(clock.cycles(), 1);
        assert_eq!(clock.remaining(start), ms(4000));
    }

    #[test]
    fn advancing_from_the_deadline_keeps_the_schedule() {
        let start = Instant::now();
        let mut clock = PhaseClock::new(PhaseDurations::default());
        clock.resume(start);
        assert_eq!(clock.deadline(), Some(start + ms(4000)));

        // Woken 300ms late, but the next phase still ends 4s after the last one.
        let deadline = clock.deadline().unwrap();
        clock.advance(deadline);
        assert_eq!(clock.phase(), BreathingPhase::Hold);
        assert_eq!(clock.remaining(start + ms(4300)), ms(3700));
        assert_eq!(clock.deadline(), Some(start + ms(8000)));

        clock.pause(start + ms(5000));
        assert_eq!(clock.deadline(), None);
    }
}
