mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{free_flowing_route, jammed_route, prompts, FailingProvider, Harness, StaticProvider};
use sereno_lib::breathing::{BreathingPhase, ViewMode};
use sereno_lib::events::ViewEvent;
use sereno_lib::route::CongestionLevel;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::time;

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

#[tokio::test(start_paused = true)]
async fn stopping_in_heavy_traffic_parks_at_the_jam_and_offers_breathing() {
    let mut harness = Harness::new(false);
    let summary = harness.navigator.set_route(jammed_route()).await;
    assert_eq!(summary.level, CongestionLevel::High);
    assert_eq!(summary.zones.trigger.range, 30..70);

    time::sleep(ms(100)).await;
    harness.navigator.set_speed(5.0).await;
    time::sleep(ms(10)).await;

    assert_eq!(harness.navigator.cursor().await.index, 30);
    assert!(harness.navigator.is_halted().await);
    assert!(harness.navigator.is_triggered().await);
    assert!(harness.navigator.has_pending_prompt().await);

    let events = harness.drain();
    assert!(matches!(events.first(), Some(ViewEvent::RouteLoaded { .. })));
    assert!(events.contains(&ViewEvent::HardStop { index: 30 }));
    assert!(events.contains(&ViewEvent::BreathingPrompt { autoplay: false }));
    assert_eq!(prompts(&events), 1);
    assert!(harness.navigator.session_snapshot().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn repeated_slowdowns_fire_only_once() {
    let mut harness = Harness::new(false);
    harness.navigator.set_route(jammed_route()).await;

    for _ in 0..3 {
        harness.navigator.set_speed(5.0).await;
        time::sleep(ms(10)).await;
        harness.navigator.set_speed(50.0).await;
        time::sleep(ms(200)).await;
    }
    harness.navigator.set_speed(2.0).await;
    time::sleep(ms(10)).await;

    assert_eq!(harness.navigator.cursor().await.index, 30);
    assert!(harness.navigator.is_triggered().await);
    assert_eq!(prompts(&harness.drain()), 1);
}

#[tokio::test(start_paused = true)]
async fn a_new_route_rearms_the_intervention() {
    let mut harness = Harness::new(false);
    harness.navigator.set_speed(5.0).await;

    harness.navigator.set_route(jammed_route()).await;
    time::sleep(ms(10)).await;
    harness.navigator.dismiss_breathing_prompt().await;
    assert!(!harness.navigator.has_pending_prompt().await);
    assert_eq!(prompts(&harness.drain()), 1);

    harness.navigator.set_route(jammed_route()).await;
    time::sleep(ms(10)).await;

    assert!(harness.navigator.is_triggered().await);
    assert_eq!(prompts(&harness.drain()), 1);
}

#[tokio::test(start_paused = true)]
async fn light_traffic_stops_without_intervening() {
    let mut harness = Harness::new(true);
    harness.navigator.set_speed(0.0).await;
    harness.navigator.set_route(free_flowing_route()).await;
    time::sleep(ms(10)).await;

    assert_eq!(harness.navigator.cursor().await.index, 30);
    assert!(!harness.navigator.is_triggered().await);

    let events = harness.drain();
    assert!(events.contains(&ViewEvent::HardStop { index: 30 }));
    assert_eq!(prompts(&events), 0);
    assert!(harness.navigator.session_snapshot().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn failed_route_fetch_leaves_nothing_running() {
    let mut harness = Harness::new(false);

    assert!(!harness.navigator.load_route(&FailingProvider).await);
    time::sleep(ms(5_000)).await;

    let events = harness.drain();
    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0],
        ViewEvent::RouteUnavailable { reason } if reason.contains("geocoding failed")
    ));
    assert!(harness.navigator.summary().await.is_none());
    assert!(!harness.navigator.is_triggered().await);
}

#[tokio::test(start_paused = true)]
async fn loaded_route_drives_to_the_end() {
    let mut harness = Harness::new(false);
    harness.navigator.set_speed(50.0).await;
    assert!(
        harness
            .navigator
            .load_route(&StaticProvider(free_flowing_route()))
            .await
    );

    // 99 steps at 80ms
    time::sleep(ms(99 * 80 + 50)).await;

    assert_eq!(harness.navigator.cursor().await.index, 99);
    let events = harness.drain();
    assert_eq!(events.last(), Some(&ViewEvent::RouteCompleted));
    let moves = events
        .iter()
        .filter(|event| matches!(event, ViewEvent::MarkerMoved(_)))
        .count();
    assert_eq!(moves, 100);
}

#[tokio::test(start_paused = true)]
async fn autoplay_starts_the_session_and_pause_freezes_it() {
    let mut harness = Harness::new(true);
    harness.navigator.set_speed(5.0).await;
    harness.navigator.set_route(jammed_route()).await;
    time::sleep(ms(10)).await;

    let events = harness.drain();
    let prompt = events
        .iter()
        .position(|event| event == &ViewEvent::BreathingPrompt { autoplay: true })
        .unwrap();
    let started = events
        .iter()
        .position(|event| matches!(event, ViewEvent::SessionStarted(_)))
        .unwrap();
    assert!(prompt < started);
    assert!(!harness.navigator.has_pending_prompt().await);

    // 10 seconds on the wall clock, 3 of them paused
    time::sleep(ms(4_500)).await;
    assert!(harness.navigator.pause_session().await);
    time::sleep(ms(3_000)).await;
    assert!(harness.navigator.resume_session().await);
    time::sleep(ms(2_490)).await;

    let snapshot = harness.navigator.session_snapshot().await.unwrap();
    assert_eq!(snapshot.elapsed_seconds, 7);
    assert_eq!(snapshot.phase, BreathingPhase::Hold);
    assert_eq!(snapshot.clock(), "00:07");

    harness.navigator.set_view_mode(ViewMode::Fullscreen).await;
    let fullscreen = harness.navigator.session_snapshot().await.unwrap();
    assert_eq!(fullscreen.session_id, snapshot.session_id);
    assert_eq!(fullscreen.elapsed_seconds, 7);

    assert_eq!(harness.navigator.end_session().await, Some(7));
    assert!(harness.navigator.session_snapshot().await.is_none());
    assert_eq!(harness.narrator.spoken(), vec!["Inhale", "Hold"]);
}

#[tokio::test(start_paused = true)]
async fn accepting_the_prompt_starts_breathing_at_inhale() {
    let mut harness = Harness::new(false);
    assert!(!harness.navigator.accept_breathing_prompt().await);

    harness.navigator.set_speed(5.0).await;
    harness.navigator.set_route(jammed_route()).await;
    time::sleep(ms(10)).await;
    harness.drain();

    assert!(harness.navigator.accept_breathing_prompt().await);
    assert!(!harness.navigator.accept_breathing_prompt().await);

    let events = harness.drain();
    assert!(matches!(events.first(), Some(ViewEvent::SessionStarted(_))));
    assert!(events.contains(&ViewEvent::PhaseChanged {
        phase: BreathingPhase::Inhale,
        label: "Inhale",
    }));
    assert_eq!(harness.navigator.toggle_session_mute().await, Some(true));
    assert!(harness.navigator.session_snapshot().await.unwrap().muted);
}

#[tokio::test(start_paused = true)]
async fn session_controls_without_a_session_do_nothing() {
    let mut harness = Harness::new(false);

    assert!(!harness.navigator.pause_session().await);
    assert!(!harness.navigator.resume_session().await);
    assert_eq!(harness.navigator.toggle_session_pause().await, None);
    assert_eq!(harness.navigator.toggle_session_mute().await, None);
    harness.navigator.set_session_volume(0.2).await;
    harness.navigator.set_view_mode(ViewMode::Fullscreen).await;
    assert_eq!(harness.navigator.end_session().await, None);

    assert!(harness.drain().is_empty());
}

#[tokio::test(start_paused = true)]
async fn unmount_cancels_every_timer() {
    let mut harness = Harness::new(true);
    harness.navigator.set_speed(5.0).await;
    harness.navigator.set_route(jammed_route()).await;
    time::sleep(ms(2_000)).await;
    assert!(harness.navigator.session_snapshot().await.is_some());

    harness.navigator.unmount().await;
    let events = harness.drain();
    assert!(matches!(
        events.last(),
        Some(ViewEvent::SessionEnded { elapsed_seconds: 2 })
    ));

    harness.navigator.set_speed(50.0).await;
    time::sleep(ms(60_000)).await;
    assert!(harness.drain().is_empty());
    assert!(harness.navigator.summary().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn autoplay_preference_is_persisted() {
    let harness = Harness::new(false);
    assert!(!harness.navigator.autoplay_breathing());

    harness.navigator.set_autoplay_breathing(true).unwrap();
    assert!(harness.settings.autoplay_breathing());
    harness.settings.reload().unwrap();
    assert!(harness.navigator.autoplay_breathing());
}

#[tokio::test(start_paused = true)]
async fn dropping_the_navigator_releases_its_tasks() {
    let mut harness = Harness::new(true);
    harness.navigator.set_speed(5.0).await;
    harness.navigator.set_route(jammed_route()).await;
    time::sleep(ms(10)).await;
    assert!(harness.navigator.session_snapshot().await.is_some());

    drop(harness.navigator);
    time::sleep(Duration::from_secs(60)).await;

    assert_eq!(Arc::strong_count(&harness.settings), 1);
    assert_eq!(Arc::strong_count(&harness.narrator), 1);
    assert_eq!(harness.narrator.spoken(), vec!["Inhale"]);
    std::iter::from_fn(|| harness.events.try_recv().ok()).for_each(drop);
    assert!(matches!(
        harness.events.try_recv(),
        Err(TryRecvError::Disconnected)
    ));
}

#[tokio::test(start_paused = true)]
async fn dropping_a_moving_navigator_stops_the_marker() {
    let mut harness = Harness::new(false);
    harness.navigator.set_route(free_flowing_route()).await;
    time::sleep(ms(250)).await;

    drop(harness.navigator);
    time::sleep(Duration::from_secs(5)).await;

    assert_eq!(Arc::strong_count(&harness.settings), 1);
    std::iter::from_fn(|| harness.events.try_recv().ok()).for_each(drop);
    assert!(matches!(
        harness.events.try_recv(),
        Err(TryRecvError::Disconnected)
    ));
}
