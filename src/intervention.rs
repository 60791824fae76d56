use serde::Serialize;

use crate::route::CongestionLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum InterventionDecision {
    /// First qualifying hard stop on this route: present the breathing exercise.
    Fire,
    /// Already fired for this route.
    AlreadyTriggered,
    /// Stopped, but the traffic is not heavy enough to intervene.
    NotCongested,
}

/// One-shot latch deciding when a hard stop becomes a breathing intervention.
///
/// Lives with the route it was created for; a new route gets a fresh latch,
/// nothing else ever resets it.
#[derive(Debug, Clone, Default)]
pub struct InterventionTrigger {
    triggered: bool,
}

impl InterventionTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered
    }

    pub fn on_hard_stop(&mut self, level: CongestionLevel) -> InterventionDecision {
        if self.triggered {
            return InterventionDecision::AlreadyTriggered;
        }
        if level != CongestionLevel::High {
            return InterventionDecision::NotCongested;
        }
        self.triggered = true;
        InterventionDecision::Fire
    }
}
