use std::sync::Arc;

use chrono::Utc;
use log::info;
use tokio::{sync::Mutex, task::JoinHandle, time, time::Instant};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::audio::{MediaPlayback, NarrationSink};
use crate::events::{EventEmitter, ViewEvent};

use super::{BreathingConfig, SessionSnapshot, SessionState, ViewMode};

// Set to true to enable per-phase logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

struct SessionInner {
    state: SessionState,
    ended: bool,
    /// Cancelled on end; parent of every run token.
    session_token: CancellationToken,
    /// Cancelled on pause; the phase and clock tasks of one running stretch
    /// listen to it.
    run_token: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

/// One breathing session: the phase cycle, the session clock, pause, mute and
/// volume, and the narration and ambient audio they drive.
///
/// Single owner of [`SessionState`]. The compact and fullscreen widgets hold
/// clones of this handle and only ever read snapshots or call the mutators.
#[derive(Clone)]
pub struct BreathingSession {
    inner: Arc<Mutex<SessionInner>>,
    /// Same token as `SessionInner::session_token`, reachable without the lock.
    session_token: CancellationToken,
    emitter: EventEmitter,
    narrator: Arc<dyn NarrationSink>,
    media: Arc<dyn MediaPlayback>,
}

impl BreathingSession {
    /// Begin a new session at `Inhale`, speak the first cue and start the
    /// ambient loop.
    pub async fn start(
        config: BreathingConfig,
        emitter: EventEmitter,
        narrator: Arc<dyn NarrationSink>,
        media: Arc<dyn MediaPlayback>,
    ) -> Self {
        let now = Instant::now();
        let state = SessionState::begin(
            Uuid::new_v4().to_string(),
            config.durations.clone(),
            config.default_volume,
            Utc::now(),
            now,
        );
        let session_token = CancellationToken::new();
        let run_token = session_token.child_token();

        let session = Self {
            inner: Arc::new(Mutex::new(SessionInner {
                state,
                ended: false,
                session_token: session_token.clone(),
                run_token,
                tasks: Vec::new(),
            })),
            session_token,
            emitter,
            narrator,
            media,
        };

        {
            let mut inner = session.inner.lock().await;
            info!("breathing session {} started", inner.state.id);

            degrade("start ambient audio", session.media.start());
            degrade(
                "set ambient volume",
                session.media.set_volume(inner.state.effective_volume()),
            );
            degrade("play ambient audio", session.media.play());

            session
                .emitter
                .emit(ViewEvent::SessionStarted(inner.state.snapshot(now)));
            session.announce_phase(&inner.state);
            session.spawn_run(&mut inner);
        }

        session
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.inner.lock().await.state.snapshot(Instant::now())
    }

    pub async fn is_ended(&self) -> bool {
        self.inner.lock().await.ended
    }

    /// Freeze the phase, the clock, narration and the ambient loop together.
    /// Returns false when there was nothing to pause.
    pub async fn pause(&self) -> bool {
        let mut inner = self.inner.lock().await;
        self.pause_locked(&mut inner)
    }

    /// Continue the current phase for whatever was left of it.
    pub async fn resume(&self) -> bool {
        let mut inner = self.inner.lock().await;
        self.resume_locked(&mut inner)
    }

    /// Returns the new paused flag.
    pub async fn toggle_pause(&self) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.state.paused {
            self.resume_locked(&mut inner);
        } else {
            self.pause_locked(&mut inner);
        }
        inner.state.paused
    }

    fn pause_locked(&self, inner: &mut SessionInner) -> bool {
        if inner.ended || !inner.state.pause(Instant::now()) {
            return false;
        }

        inner.run_token.cancel();
        for task in inner.tasks.drain(..) {
            task.abort();
        }
        degrade("cancel narration", self.narrator.cancel_all());
        degrade("pause ambient audio", self.media.pause());

        log_debug!(
            "session {} paused with {:?} of {:?} left",
            inner.state.id,
            inner.state.phase_clock.remaining(Instant::now()),
            inner.state.phase()
        );
        self.emit_state(&inner.state);
        true
    }

    fn resume_locked(&self, inner: &mut SessionInner) -> bool {
        if inner.ended || !inner.state.resume(Instant::now()) {
            return false;
        }

        self.spawn_run(inner);
        degrade("resume ambient audio", self.media.play());

        self.emit_state(&inner.state);
        true
    }

    fn set_muted_locked(&self, inner: &mut SessionInner, muted: bool) {
        if inner.ended || inner.state.muted == muted {
            return;
        }
        inner.state.muted = muted;
        if muted {
            degrade("cancel narration", self.narrator.cancel_all());
        }
        degrade(
            "set ambient volume",
            self.media.set_volume(inner.state.effective_volume()),
        );
        self.emit_state(&inner.state);
    }

    pub async fn set_muted(&self, muted: bool) {
        let mut inner = self.inner.lock().await;
        self.set_muted_locked(&mut inner, muted);
    }

    /// Returns the new muted flag.
    pub async fn toggle_mute(&self) -> bool {
        let mut inner = self.inner.lock().await;
        let muted = !inner.state.muted;
        self.set_muted_locked(&mut inner, muted);
        inner.state.muted
    }

    /// Volume is clamped to `[0, 1]`.
    pub async fn set_volume(&self, volume: f32) {
        let mut inner = self.inner.lock().await;
        if inner.ended {
            return;
        }
        inner.state.set_volume(volume);
        degrade(
            "set ambient volume",
            self.media.set_volume(inner.state.effective_volume()),
        );
        self.emit_state(&inner.state);
    }

    /// Presentation only: the same session keeps running untouched.
    pub async fn set_view_mode(&self, view: ViewMode) {
        let mut inner = self.inner.lock().await;
        if inner.ended || inner.state.view == view {
            return;
        }
        inner.state.view = view;
        self.emit_state(&inner.state);
    }

    /// Tear the session down: every timer, narration and the audio device.
    /// Returns the final session clock, or `None` if it had already ended.
    pub async fn end(&self) -> Option<u64> {
        let mut inner = self.inner.lock().await;
        if inner.ended {
            return None;
        }
        inner.ended = true;

        inner.session_token.cancel();
        for task in inner.tasks.drain(..) {
            task.abort();
        }
        degrade("cancel narration", self.narrator.cancel_all());
        degrade("stop ambient audio", self.media.stop());

        let elapsed_seconds = inner.state.active_seconds(Instant::now());
        inner.state.elapsed_seconds = elapsed_seconds;
        info!(
            "breathing session {} ended after {}",
            inner.state.id,
            super::format_clock(elapsed_seconds)
        );
        self.emitter
            .emit(ViewEvent::SessionEnded { elapsed_seconds });
        Some(elapsed_seconds)
    }

    /// Stop every timer and the audio without waiting for the lock, for an
    /// owner that goes away without ending the session.
    pub fn abandon(&self) {
        if self.session_token.is_cancelled() {
            return;
        }
        self.session_token.cancel();
        degrade("cancel narration", self.narrator.cancel_all());
        degrade("stop ambient audio", self.media.stop());
    }

    fn emit_state(&self, state: &SessionState) {
        self.emitter
            .emit(ViewEvent::SessionStateChanged(state.snapshot(Instant::now())));
    }

    /// Narration first, then the visual cue, so the two never disagree at a
    /// phase boundary.
    fn announce_phase(&self, state: &SessionState) {
        let phase = state.phase();
        if !state.muted {
            degrade("speak phase", self.narrator.speak(phase.label()));
        }
        self.emitter.emit(ViewEvent::PhaseChanged {
            phase,
            label: phase.label(),
        });
    }

    /// Spawn the phase and clock tasks for one unpaused stretch. Caller holds the lock.
    fn spawn_run(&self, inner: &mut SessionInner) {
        let run_token = inner.session_token.child_token();
        inner.run_token = run_token.clone();

        let session_id = inner.state.id.clone();
        inner.tasks.push(tokio::spawn(phase_loop(
            self.clone(),
            session_id.clone(),
            run_token.clone(),
        )));
        inner
            .tasks
            .push(tokio::spawn(clock_loop(self.clone(), session_id, run_token)));
    }
}

/// Sleeps until the current phase's deadline, then enters the next one.
async fn phase_loop(session: BreathingSession, session_id: String, token: CancellationToken) {
    loop {
        let deadline = {
            let inner = session.inner.lock().await;
            if !is_live(&inner, &session_id, &token) {
                return;
            }
            match inner.state.phase_clock.deadline() {
                Some(deadline) => deadline,
                None => return,
            }
        };

        tokio::select! {
            _ = token.cancelled() => return,
            _ = time::sleep_until(deadline) => {}
        }

        let mut inner = session.inner.lock().await;
        if !is_live(&inner, &session_id, &token) {
            return;
        }
        let phase = inner.state.phase_clock.advance(deadline);
        log_debug!("session {} entering {:?}", session_id, phase);
        session.announce_phase(&inner.state);
    }
}

/// Publishes the session clock each time it crosses a whole second.
async fn clock_loop(session: BreathingSession, session_id: String, token: CancellationToken) {
    loop {
        let wait = {
            let inner = session.inner.lock().await;
            if !is_live(&inner, &session_id, &token) {
                return;
            }
            inner.state.until_next_second(Instant::now())
        };

        tokio::select! {
            _ = token.cancelled() => return,
            _ = time::sleep(wait) => {}
        }

        let mut inner = session.inner.lock().await;
        if !is_live(&inner, &session_id, &token) {
            return;
        }
        let elapsed_seconds = inner.state.active_seconds(Instant::now());
        if elapsed_seconds != inner.state.elapsed_seconds {
            inner.state.elapsed_seconds = elapsed_seconds;
            session
                .emitter
                .emit(ViewEvent::SessionTick { elapsed_seconds });
        }
    }
}

fn is_live(inner: &SessionInner, session_id: &str, token: &CancellationToken) -> bool {
    !inner.ended && !inner.state.paused && !token.is_cancelled() && inner.state.id == session_id
}

/// Audio collaborators are optional; a failure only costs the audible cue.
fn degrade(what: &str, result: anyhow::Result<()>) {
    if let Err(err) = result {
        log_warn!("failed to {}: {err:#}", what);
    }
}
