#![allow(dead_code)]

use std::future::Future;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use sereno_lib::audio::{NarrationSink, NullMedia};
use sereno_lib::events::{EventEmitter, ViewEvent};
use sereno_lib::navigator::{Navigator, NavigatorConfig};
use sereno_lib::route::{LngLat, Route, RoutePoint, RouteProvider};
use sereno_lib::settings::SettingsStore;
use tempfile::TempDir;
use tokio::sync::mpsc::UnboundedReceiver;

/// 100 points heading east, congestion 0.9 on indices 30..70 and 0 elsewhere.
pub fn jammed_route() -> Route {
    route_with(100, |i| if (30..70).contains(&i) { 0.9 } else { 0.0 })
}

pub fn free_flowing_route() -> Route {
    route_with(100, |_| 0.1)
}

pub fn route_with(len: usize, congestion: impl Fn(usize) -> f64) -> Route {
    let points = (0..len)
        .map(|i| {
            RoutePoint::new(
                LngLat::new(4.40 + i as f64 * 0.001, 50.90),
                Some(congestion(i)),
            )
        })
        .collect();
    Route::new(points, 1200.0)
}

pub struct StaticProvider(pub Route);

impl RouteProvider for StaticProvider {
    fn fetch_route(&self) -> impl Future<Output = Result<Route>> + Send {
        let route = self.0.clone();
        async move { Ok(route) }
    }
}

pub struct FailingProvider;

impl RouteProvider for FailingProvider {
    fn fetch_route(&self) -> impl Future<Output = Result<Route>> + Send {
        async { Err(anyhow!("geocoding failed")) }
    }
}

#[derive(Default)]
pub struct RecordingNarrator {
    spoken: Mutex<Vec<String>>,
}

impl RecordingNarrator {
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }
}

impl NarrationSink for RecordingNarrator {
    fn speak(&self, label: &str) -> Result<()> {
        self.spoken.lock().unwrap().push(label.to_string());
        Ok(())
    }

    fn cancel_all(&self) -> Result<()> {
        Ok(())
    }
}

pub struct Harness {
    pub navigator: Navigator,
    pub events: UnboundedReceiver<ViewEvent>,
    pub narrator: Arc<RecordingNarrator>,
    pub settings: Arc<SettingsStore>,
    _dir: TempDir,
}

impl Harness {
    pub fn new(autoplay: bool) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let settings = Arc::new(SettingsStore::new(dir.path().join("settings.json")).unwrap());
        settings.set_autoplay_breathing(autoplay).unwrap();

        let (emitter, events) = EventEmitter::channel();
        let narrator = Arc::new(RecordingNarrator::default());
        let navigator = Navigator::new(
            NavigatorConfig::default(),
            emitter,
            settings.clone(),
            narrator.clone(),
            Arc::new(NullMedia),
        );

        Self {
            navigator,
            events,
            narrator,
            settings,
            _dir: dir,
        }
    }

    pub fn drain(&mut self) -> Vec<ViewEvent> {
        std::iter::from_fn(|| self.events.try_recv().ok()).collect()
    }
}

pub fn prompts(events: &[ViewEvent]) -> usize {
    events
        .iter()
        .filter(|event| matches!(event, ViewEvent::BreathingPrompt { .. }))
        .count()
}
