pub mod audio;
pub mod breathing;
pub mod events;
pub mod intervention;
pub mod navigator;
pub mod route;
pub mod settings;
pub mod simulation;
pub mod utils;

use std::{env, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use log::info;

use audio::{LogNarrator, MediaPlayback};
use events::{EventEmitter, ViewEvent};
use navigator::{Navigator, NavigatorConfig};
use route::{FileRouteProvider, SyntheticRouteProvider};
use settings::SettingsStore;

/// Seconds of breathing the demo run sits through before driving on.
const DEMO_SESSION_SECS: u64 = 28;

pub fn run() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("Sereno starting up...");

    let data_dir = env::args()
        .nth(1)
        .map(PathBuf::from)
        .map_or_else(env::current_dir, Ok)
        .context("Failed to resolve data directory")?;

    let settings = Arc::new(SettingsStore::new(data_dir.join("settings.json"))?);

    let mut config = NavigatorConfig::default();
    if let Some(speed) = env::var("SERENO_SPEED")
        .ok()
        .and_then(|raw| raw.trim().parse::<f64>().ok())
    {
        config.simulation.initial_speed = speed;
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    runtime.block_on(drive(data_dir, config, settings))
}

/// Headless stand-in for the map view: loads a route, prints every view event
/// as JSON, accepts the breathing prompt and ends the session after a while.
async fn drive(
    data_dir: PathBuf,
    config: NavigatorConfig,
    settings: Arc<SettingsStore>,
) -> Result<()> {
    let cruise_speed = NavigatorConfig::default().simulation.initial_speed;
    let (emitter, mut events) = EventEmitter::channel();
    let navigator = Navigator::new(
        config,
        emitter,
        settings,
        Arc::new(LogNarrator),
        ambient_media(),
    );

    let route_file = data_dir.join("route.json");
    if route_file.exists() {
        info!("loading route from {}", route_file.display());
        navigator.load_route(&FileRouteProvider::new(route_file)).await;
    } else {
        info!("no route.json in {}, using synthetic route", data_dir.display());
        navigator.load_route(&SyntheticRouteProvider::default()).await;
    }

    while let Some(event) = events.recv().await {
        println!("{}", serde_json::to_string(&event)?);

        match event {
            ViewEvent::BreathingPrompt { autoplay: false } => {
                navigator.accept_breathing_prompt().await;
            }
            ViewEvent::SessionTick { elapsed_seconds } if elapsed_seconds >= DEMO_SESSION_SECS => {
                navigator.end_session().await;
                navigator.set_speed(cruise_speed).await;
            }
            ViewEvent::RouteCompleted | ViewEvent::RouteUnavailable { .. } => break,
            _ => {}
        }
    }

    navigator.unmount().await;
    Ok(())
}

#[cfg(feature = "ambient-audio")]
fn ambient_media() -> Arc<dyn MediaPlayback> {
    Arc::new(audio::AudioEngineHandle::new())
}

#[cfg(not(feature = "ambient-audio"))]
fn ambient_media() -> Arc<dyn MediaPlayback> {
    Arc::new(audio::NullMedia)
}
