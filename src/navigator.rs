use std::sync::{Arc, Weak};

use log::info;
use tokio::{
    sync::{mpsc, Mutex},
    task::JoinHandle,
};

use crate::audio::{MediaPlayback, NarrationSink};
use crate::breathing::{BreathingConfig, BreathingSession, SessionSnapshot, ViewMode};
use crate::events::{EventEmitter, ViewEvent};
use crate::intervention::{InterventionDecision, InterventionTrigger};
use crate::route::{
    segment_route, summarize, Route, RouteProvider, SegmentationConfig, TrafficSummary, Zones,
};
use crate::settings::SettingsStore;
use crate::simulation::{AnimationScheduler, Cursor, SchedulerSignal, SimulationConfig};

// Set to true to enable intervention logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info};

#[derive(Debug, Clone, Default)]
pub struct NavigatorConfig {
    pub segmentation: SegmentationConfig,
    pub simulation: SimulationConfig,
    pub breathing: BreathingConfig,
}

/// Everything derived from the current route. Replaced wholesale when a new
/// route arrives, which is also what resets the intervention latch.
struct RouteContext {
    epoch: Option<u64>,
    route: Arc<Route>,
    zones: Zones,
    summary: TrafficSummary,
    intervention: InterventionTrigger,
}

struct NavigatorInner {
    route: Option<RouteContext>,
    session: Option<BreathingSession>,
    prompt_pending: bool,
    signal_pump: Option<JoinHandle<()>>,
}

impl Drop for NavigatorInner {
    fn drop(&mut self) {
        if let Some(pump) = self.signal_pump.take() {
            pump.abort();
        }
        if let Some(session) = self.session.take() {
            session.abandon();
        }
    }
}

/// What the hard-stop listener needs to offer or start a session. Holds no
/// reference back to the navigator state.
#[derive(Clone)]
struct Handoff {
    emitter: EventEmitter,
    settings: Arc<SettingsStore>,
    narrator: Arc<dyn NarrationSink>,
    media: Arc<dyn MediaPlayback>,
    config: Arc<NavigatorConfig>,
}

impl Handoff {
    async fn begin_session(&self) -> BreathingSession {
        BreathingSession::start(
            self.config.breathing.clone(),
            self.emitter.clone(),
            self.narrator.clone(),
            self.media.clone(),
        )
        .await
    }
}

/// The map view's backend: owns the route, drives the marker, and hands off to
/// a breathing session when the car is stopped in heavy traffic.
#[derive(Clone)]
pub struct Navigator {
    inner: Arc<Mutex<NavigatorInner>>,
    scheduler: AnimationScheduler,
    handoff: Handoff,
}

impl Navigator {
    /// Must be called inside a tokio runtime; spawns the task that listens for
    /// hard stops. Dropping the last clone without `unmount` still stops that
    /// task, the ticker and any running session.
    pub fn new(
        config: NavigatorConfig,
        emitter: EventEmitter,
        settings: Arc<SettingsStore>,
        narrator: Arc<dyn NarrationSink>,
        media: Arc<dyn MediaPlayback>,
    ) -> Self {
        let (signal_tx, mut signal_rx) = mpsc::unbounded_channel();
        let scheduler =
            AnimationScheduler::new(config.simulation.clone(), emitter.clone(), signal_tx);

        let handoff = Handoff {
            emitter,
            settings,
            narrator,
            media,
            config: Arc::new(config),
        };

        let inner = Arc::new_cyclic(|weak: &Weak<Mutex<NavigatorInner>>| {
            let weak = weak.clone();
            let pump = handoff.clone();
            let handle = tokio::spawn(async move {
                while let Some(signal) = signal_rx.recv().await {
                    let Some(inner) = weak.upgrade() else {
                        return;
                    };
                    match signal {
                        SchedulerSignal::HardStop { epoch, index } => {
                            on_hard_stop(&inner, &pump, epoch, index).await;
                        }
                    }
                }
            });
            Mutex::new(NavigatorInner {
                route: None,
                session: None,
                prompt_pending: false,
                signal_pump: Some(handle),
            })
        });

        Self {
            inner,
            scheduler,
            handoff,
        }
    }

    /// Fetch a route and start driving it. A provider failure leaves the
    /// navigator without a route and only tells the view.
    pub async fn load_route<P: RouteProvider>(&self, provider: &P) -> bool {
        match provider.fetch_route().await {
            Ok(route) => {
                self.set_route(route).await;
                true
            }
            Err(err) => {
                log_error!("route unavailable: {err:#}");
                self.handoff.emitter.emit(ViewEvent::RouteUnavailable {
                    reason: format!("{err:#}"),
                });
                false
            }
        }
    }

    /// Replace the current route: segment it, publish the traffic summary and
    /// restart the marker from the first point with a fresh intervention latch.
    /// A running breathing session is left alone.
    pub async fn set_route(&self, route: Route) -> TrafficSummary {
        self.scheduler.stop().await;

        let route = Arc::new(route);
        let segmentation = &self.handoff.config.segmentation;
        let zones = segment_route(&route, segmentation);
        let summary = summarize(&route, &zones, segmentation);
        info!(
            "route loaded: {} points, {} traffic, windows {:?} {:?} {:?}",
            route.len(),
            zones.level().as_str(),
            zones.approach.range,
            zones.trigger.range,
            zones.exit.range
        );

        {
            let mut inner = self.inner.lock().await;
            inner.prompt_pending = false;
            inner.route = Some(RouteContext {
                epoch: None,
                route: route.clone(),
                zones: zones.clone(),
                summary: summary.clone(),
                intervention: InterventionTrigger::new(),
            });
        }
        self.handoff.emitter.emit(ViewEvent::RouteLoaded {
            summary: summary.clone(),
        });

        // The context must be in place before the first step can signal.
        let mut inner = self.inner.lock().await;
        let epoch = self.scheduler.start(route, zones.trigger.range).await;
        if let Some(context) = inner.route.as_mut() {
            context.epoch = epoch;
        }

        summary
    }

    /// SimSpeed from the speed slider; clamped to the configured range.
    pub async fn set_speed(&self, speed: f64) {
        self.scheduler.set_speed(speed).await;
    }

    pub async fn speed(&self) -> f64 {
        self.scheduler.speed().await
    }

    pub async fn cursor(&self) -> Cursor {
        self.scheduler.cursor().await
    }

    pub async fn is_halted(&self) -> bool {
        self.scheduler.is_halted().await
    }

    pub async fn summary(&self) -> Option<TrafficSummary> {
        let inner = self.inner.lock().await;
        inner.route.as_ref().map(|context| context.summary.clone())
    }

    /// Whether this route has already produced its intervention.
    pub async fn is_triggered(&self) -> bool {
        let inner = self.inner.lock().await;
        inner
            .route
            .as_ref()
            .is_some_and(|context| context.intervention.is_triggered())
    }

    pub async fn has_pending_prompt(&self) -> bool {
        self.inner.lock().await.prompt_pending
    }

    /// Start the offered breathing exercise. Returns false when nothing was
    /// offered.
    pub async fn accept_breathing_prompt(&self) -> bool {
        let mut inner = self.inner.lock().await;
        if !inner.prompt_pending {
            return false;
        }
        inner.prompt_pending = false;
        inner.session = Some(self.handoff.begin_session().await);
        true
    }

    /// Decline the offer. The route stays triggered.
    pub async fn dismiss_breathing_prompt(&self) {
        self.inner.lock().await.prompt_pending = false;
    }

    async fn session(&self) -> Option<BreathingSession> {
        self.inner.lock().await.session.clone()
    }

    pub async fn session_snapshot(&self) -> Option<SessionSnapshot> {
        match self.session().await {
            Some(session) => Some(session.snapshot().await),
            None => None,
        }
    }

    pub async fn pause_session(&self) -> bool {
        match self.session().await {
            Some(session) => session.pause().await,
            None => false,
        }
    }

    pub async fn resume_session(&self) -> bool {
        match self.session().await {
            Some(session) => session.resume().await,
            None => false,
        }
    }

    pub async fn toggle_session_pause(&self) -> Option<bool> {
        match self.session().await {
            Some(session) => Some(session.toggle_pause().await),
            None => None,
        }
    }

    pub async fn set_session_muted(&self, muted: bool) {
        if let Some(session) = self.session().await {
            session.set_muted(muted).await;
        }
    }

    pub async fn toggle_session_mute(&self) -> Option<bool> {
        match self.session().await {
            Some(session) => Some(session.toggle_mute().await),
            None => None,
        }
    }

    pub async fn set_session_volume(&self, volume: f32) {
        if let Some(session) = self.session().await {
            session.set_volume(volume).await;
        }
    }

    pub async fn set_view_mode(&self, view: ViewMode) {
        if let Some(session) = self.session().await {
            session.set_view_mode(view).await;
        }
    }

    /// End the breathing session, returning its final clock.
    pub async fn end_session(&self) -> Option<u64> {
        let session = self.inner.lock().await.session.take()?;
        session.end().await
    }

    pub fn autoplay_breathing(&self) -> bool {
        self.handoff.settings.autoplay_breathing()
    }

    pub fn set_autoplay_breathing(&self, enabled: bool) -> anyhow::Result<()> {
        self.handoff.settings.set_autoplay_breathing(enabled)
    }

    /// Tear down the view: the marker ticker, the hard-stop listener, the
    /// breathing session and the route itself.
    pub async fn unmount(&self) {
        self.scheduler.stop().await;

        let (session, pump) = {
            let mut inner = self.inner.lock().await;
            inner.route = None;
            inner.prompt_pending = false;
            (inner.session.take(), inner.signal_pump.take())
        };
        if let Some(session) = session {
            session.end().await;
        }
        if let Some(pump) = pump {
            pump.abort();
        }
        info!("navigator unmounted");
    }
}

async fn on_hard_stop(
    inner: &Mutex<NavigatorInner>,
    handoff: &Handoff,
    epoch: u64,
    index: usize,
) {
    let mut inner = inner.lock().await;
    let Some(context) = inner.route.as_mut() else {
        return;
    };
    if context.epoch != Some(epoch) {
        log_debug!("ignoring hard stop from superseded route epoch {}", epoch);
        return;
    }

    let level = context.zones.level();
    match context.intervention.on_hard_stop(level) {
        InterventionDecision::Fire => {
            log_info!(
                "stopped in {} traffic at point {} of {}, offering breathing exercise",
                level.as_str(),
                index,
                context.route.len()
            );
        }
        InterventionDecision::AlreadyTriggered => {
            log_debug!("intervention already fired for this route");
            return;
        }
        InterventionDecision::NotCongested => {
            log_info!("stopped in {} traffic, no intervention", level.as_str());
            return;
        }
    }

    if let Some(session) = inner.session.as_ref() {
        if !session.is_ended().await {
            log_info!("breathing session already running, intervention absorbed");
            return;
        }
    }

    let autoplay = handoff.settings.autoplay_breathing();
    handoff.emitter.emit(ViewEvent::BreathingPrompt { autoplay });
    if autoplay {
        inner.prompt_pending = false;
        inner.session = Some(handoff.begin_session().await);
    } else {
        inner.prompt_pending = true;
    }
}
