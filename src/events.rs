use serde::Serialize;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::breathing::{BreathingPhase, SessionSnapshot};
use crate::route::TrafficSummary;
use crate::simulation::MarkerFrame;

/// Notifications for the view layer. The view renders from these and never
/// owns a timer itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ViewEvent {
    RouteLoaded {
        summary: TrafficSummary,
    },
    RouteUnavailable {
        reason: String,
    },
    MarkerMoved(MarkerFrame),
    HardStop {
        index: usize,
    },
    RouteCompleted,
    BreathingPrompt {
        autoplay: bool,
    },
    SessionStarted(SessionSnapshot),
    PhaseChanged {
        phase: BreathingPhase,
        label: &'static str,
    },
    #[serde(rename_all = "camelCase")]
    SessionTick {
        elapsed_seconds: u64,
    },
    SessionStateChanged(SessionSnapshot),
    #[serde(rename_all = "camelCase")]
    SessionEnded {
        elapsed_seconds: u64,
    },
}

/// Fire-and-forget sender for [`ViewEvent`]s. A view that went away is not an
/// error for the simulation.
#[derive(Clone, Default)]
pub struct EventEmitter {
    tx: Option<UnboundedSender<ViewEvent>>,
}

impl EventEmitter {
    pub fn channel() -> (Self, UnboundedReceiver<ViewEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// An emitter with no listener, for headless use.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn emit(&self, event: ViewEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }
}
