//! Behavior tests for the session controller against fake host bridges.

mod support;

use core_playback::position_store::{position_key, PLAYBACK_SPEED_KEY};
use core_playback::{PlayRequest, PlaybackError, PositionStore, SessionConfig, SessionPhase};
use core_runtime::config::HostPlatform;
use core_runtime::events::{CoreEvent, PlaybackEvent};
use std::sync::Arc;
use std::time::Duration;
use support::*;

fn uri(id: &str) -> String {
    lesson(id).remote_url
}

async fn play_and_wait(harness: &Harness, request: PlayRequest) {
    let target = request.uri.clone();
    harness.session.play_track(request).await.unwrap();
    wait_for(&harness.session, |s| {
        s.current_uri.as_deref() == Some(target.as_str()) && s.phase == SessionPhase::Playing
    })
    .await;
}

// ============================================================================
// Loading and toggling
// ============================================================================

#[tokio::test]
async fn test_play_track_loads_and_starts() {
    let harness = HarnessBuilder::new().start().await;
    let mut events = harness.events.subscribe();

    harness
        .session
        .play_track(PlayRequest::new(uri("a")).with_queue(vec![lesson("a"), lesson("b")]))
        .await
        .unwrap();

    let loading = harness.session.snapshot();
    assert!(loading.is_loading || loading.phase == SessionPhase::Playing);
    assert!(loading.is_playing, "intent to play is shown immediately");

    let snapshot = wait_for(&harness.session, |s| s.phase == SessionPhase::Playing).await;
    assert!(!snapshot.is_loading);
    assert_eq!(snapshot.current_title.as_deref(), Some("Lesson a"));
    assert_eq!(snapshot.current_track_id.as_deref(), Some("a"));
    assert_eq!(snapshot.duration_ms, TRACK_LENGTH.as_millis() as u64);

    wait_for_event(&mut events, |e| {
        matches!(e, CoreEvent::Playback(PlaybackEvent::Started { .. }))
    })
    .await;
    assert_eq!(harness.player.rates(), vec![1.0]);
}

#[tokio::test]
async fn test_replaying_current_track_toggles_without_reloading() {
    let harness = HarnessBuilder::new().start().await;
    play_and_wait(&harness, PlayRequest::new(uri("a"))).await;

    harness.session.play_track(PlayRequest::new(uri("a"))).await.unwrap();
    let paused = harness.session.snapshot();
    assert_eq!(paused.phase, SessionPhase::Paused);
    assert!(!paused.is_playing);

    harness.session.play_track(PlayRequest::new(uri("a"))).await.unwrap();
    assert!(harness.session.snapshot().is_playing);

    assert_eq!(harness.player.load_count(), 1);
    assert_eq!(harness.player.play_count(), 2);
}

#[tokio::test]
async fn test_unknown_uri_plays_with_fallback_title() {
    let harness = HarnessBuilder::new().start().await;
    play_and_wait(&harness, PlayRequest::new("https://elsewhere.example.com/x.mp3")).await;

    let snapshot = harness.session.snapshot();
    assert_eq!(snapshot.current_title.as_deref(), Some("Audio"));
    assert_eq!(snapshot.current_track_id, None);
}

#[tokio::test]
async fn test_switching_tracks_releases_previous_handle() {
    let harness = HarnessBuilder::new().start().await;
    play_and_wait(&harness, PlayRequest::new(uri("a"))).await;
    harness.player.progress(&uri("a"), Duration::from_millis(7000));
    wait_for(&harness.session, |s| s.position_ms == 7000).await;

    play_and_wait(&harness, PlayRequest::new(uri("b"))).await;

    assert_eq!(harness.player.live_uris(), vec![uri("b")]);
    assert_eq!(
        harness.settings.get(&position_key(&uri("a"))).as_deref(),
        Some("7000")
    );
}

// ============================================================================
// Position persistence
// ============================================================================

#[tokio::test]
async fn test_position_round_trip_across_sessions() {
    let settings = MemorySettings::new();

    let first = HarnessBuilder::new().settings(settings.clone()).start().await;
    play_and_wait(&first, PlayRequest::new(uri("a"))).await;
    first.session.seek_to(5000.0).await.unwrap();
    first.session.shutdown().await;

    let second = HarnessBuilder::new().settings(settings).start().await;
    let mut events = second.events.subscribe();
    second.session.play_track(PlayRequest::new(uri("a"))).await.unwrap();

    let snapshot = wait_for(&second.session, |s| {
        s.phase == SessionPhase::Playing && s.position_ms == 5000
    })
    .await;
    assert!(snapshot.is_playing);
    assert_eq!(second.player.seeks_of(&uri("a")), vec![5000]);

    let restored = wait_for_event(&mut events, |e| {
        matches!(e, CoreEvent::Playback(PlaybackEvent::PositionRestored { .. }))
    })
    .await;
    assert_eq!(
        restored,
        CoreEvent::Playback(PlaybackEvent::PositionRestored {
            uri: uri("a"),
            position_ms: 5000
        })
    );
}

#[tokio::test]
async fn test_saved_position_past_duration_is_not_restored() {
    let settings = MemorySettings::new();
    let store = PositionStore::new(settings.clone());
    store.save(&uri("a"), 90_000).await;

    let harness = HarnessBuilder::new().settings(settings).start().await;
    play_and_wait(&harness, PlayRequest::new(uri("a"))).await;

    assert!(harness.player.seeks_of(&uri("a")).is_empty());
}

#[tokio::test]
async fn test_completion_clears_saved_position() {
    let settings = MemorySettings::new();
    let harness = HarnessBuilder::new().settings(settings.clone()).start().await;
    let mut events = harness.events.subscribe();

    play_and_wait(&harness, PlayRequest::new(uri("a"))).await;
    harness.session.seek_to(5000.0).await.unwrap();
    assert!(settings.get(&position_key(&uri("a"))).is_some());

    harness.player.finish(&uri("a"));
    wait_for_event(&mut events, |e| {
        matches!(e, CoreEvent::Playback(PlaybackEvent::Completed { .. }))
    })
    .await;

    let snapshot = harness.session.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Idle);
    assert!(!snapshot.is_playing);
    assert_eq!(snapshot.position_ms, 0);
    assert_eq!(harness.player.seeks_of(&uri("a")).last(), Some(&0));

    let fresh = PositionStore::new(settings);
    assert_eq!(fresh.load(&uri("a")).await, None);
}

#[tokio::test]
async fn test_finished_track_replays_from_start_without_reload() {
    let harness = HarnessBuilder::new().start().await;
    let mut events = harness.events.subscribe();
    play_and_wait(&harness, PlayRequest::new(uri("a"))).await;

    harness.player.finish(&uri("a"));
    wait_for_event(&mut events, |e| {
        matches!(e, CoreEvent::Playback(PlaybackEvent::Completed { .. }))
    })
    .await;

    harness.session.play_track(PlayRequest::new(uri("a"))).await.unwrap();
    wait_for(&harness.session, |s| s.phase == SessionPhase::Playing).await;
    assert_eq!(harness.player.load_count(), 1);
}

#[tokio::test]
async fn test_pause_persists_position() {
    let harness = HarnessBuilder::new().start().await;
    play_and_wait(&harness, PlayRequest::new(uri("a"))).await;
    harness.player.progress(&uri("a"), Duration::from_millis(4200));
    wait_for(&harness.session, |s| s.position_ms == 4200).await;

    harness.session.pause(true).await.unwrap();

    assert_eq!(
        harness.settings.get(&position_key(&uri("a"))).as_deref(),
        Some("4200")
    );
    assert!(!harness.session.snapshot().is_playing);
}

#[tokio::test]
async fn test_periodic_save_while_playing() {
    let config = SessionConfig {
        position_save_interval: Duration::from_millis(20),
        ..Default::default()
    };
    let harness = HarnessBuilder::new().config(config).start().await;
    play_and_wait(&harness, PlayRequest::new(uri("a"))).await;
    harness.player.progress(&uri("a"), Duration::from_millis(2500));

    let settings = harness.settings.clone();
    let key = position_key(&uri("a"));
    tokio::time::timeout(Duration::from_secs(2), async {
        while settings.get(&key).as_deref() != Some("2500") {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("position saved periodically");
}

/// Poll `condition` on the wall clock so interval timers keep firing.
async fn eventually(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition never held");
}

#[tokio::test]
async fn test_slow_periodic_save_cannot_outlive_completion() {
    let settings = MemorySettings::new();
    let gate = settings.hold_next_position_write();
    let config = SessionConfig {
        position_save_interval: Duration::from_millis(20),
        ..Default::default()
    };
    let harness = HarnessBuilder::new()
        .settings(settings.clone())
        .config(config)
        .start()
        .await;
    let mut events = harness.events.subscribe();

    play_and_wait(&harness, PlayRequest::new(uri("a"))).await;
    harness.player.progress(&uri("a"), Duration::from_millis(59_000));
    wait_for(&harness.session, |s| s.position_ms == 59_000).await;
    eventually(|| settings.position_write_held()).await;

    harness.player.finish(&uri("a"));
    wait_for(&harness.session, |s| s.phase == SessionPhase::Idle).await;
    gate.notify_one();
    wait_for_event(&mut events, |e| {
        matches!(e, CoreEvent::Playback(PlaybackEvent::Completed { .. }))
    })
    .await;

    assert_eq!(settings.get(&position_key(&uri("a"))), None);
    let fresh = PositionStore::new(settings);
    assert_eq!(fresh.load(&uri("a")).await, None);
}

#[tokio::test]
async fn test_switch_save_lands_after_pending_periodic_save() {
    let settings = MemorySettings::new();
    let gate = settings.hold_next_position_write();
    let config = SessionConfig {
        position_save_interval: Duration::from_millis(20),
        ..Default::default()
    };
    let harness = HarnessBuilder::new()
        .settings(settings.clone())
        .config(config)
        .start()
        .await;

    play_and_wait(&harness, PlayRequest::new(uri("a"))).await;
    harness.player.progress(&uri("a"), Duration::from_millis(30_000));
    wait_for(&harness.session, |s| s.position_ms == 30_000).await;
    eventually(|| settings.position_write_held()).await;

    harness.player.progress(&uri("a"), Duration::from_millis(31_000));
    wait_for(&harness.session, |s| s.position_ms == 31_000).await;

    let session = harness.session.clone();
    let switch = tokio::spawn(async move { session.play_track(PlayRequest::new(uri("b"))).await });
    wait_for(&harness.session, |s| s.current_uri.as_deref() == Some(uri("b").as_str())).await;

    gate.notify_one();
    switch.await.unwrap().unwrap();
    wait_for(&harness.session, |s| s.phase == SessionPhase::Playing).await;

    assert_eq!(
        settings.get(&position_key(&uri("a"))).as_deref(),
        Some("31000")
    );
}

#[tokio::test]
async fn test_trailing_status_after_completion_keeps_track_rewound() {
    let harness = HarnessBuilder::new().start().await;
    let mut events = harness.events.subscribe();
    play_and_wait(&harness, PlayRequest::new(uri("a"))).await;

    harness.player.finish(&uri("a"));
    wait_for_event(&mut events, |e| {
        matches!(e, CoreEvent::Playback(PlaybackEvent::Completed { .. }))
    })
    .await;

    harness.player.progress(&uri("a"), TRACK_LENGTH);
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert_eq!(harness.session.snapshot().position_ms, 0);

    harness.session.shutdown().await;
    assert_eq!(harness.settings.get(&position_key(&uri("a"))), None);
}

// ============================================================================
// Seeking
// ============================================================================

#[tokio::test]
async fn test_skip_back_clamps_at_zero() {
    let harness = HarnessBuilder::new().start().await;
    play_and_wait(&harness, PlayRequest::new(uri("a"))).await;
    harness.session.seek_to(3000.0).await.unwrap();

    harness.session.skip(-10.0).await.unwrap();

    let snapshot = wait_for(&harness.session, |s| s.position_ms == 0).await;
    assert_eq!(snapshot.position_ms, 0);
    assert_eq!(harness.player.seeks_of(&uri("a")), vec![3000, 0]);
    assert_eq!(
        harness.settings.get(&position_key(&uri("a"))).as_deref(),
        Some("0")
    );
}

#[tokio::test]
async fn test_skip_forward_clamps_at_duration() {
    let harness = HarnessBuilder::new().start().await;
    play_and_wait(&harness, PlayRequest::new(uri("a"))).await;

    harness.session.skip(3600.0).await.unwrap();

    assert_eq!(
        harness.player.seeks_of(&uri("a")),
        vec![TRACK_LENGTH.as_millis() as u64]
    );
}

#[tokio::test]
async fn test_invalid_seek_targets_are_ignored() {
    let harness = HarnessBuilder::new().start().await;
    play_and_wait(&harness, PlayRequest::new(uri("a"))).await;

    harness.session.seek_to(f64::NAN).await.unwrap();
    harness.session.seek_to(-1.0).await.unwrap();
    harness.session.seek_to(f64::INFINITY).await.unwrap();
    harness.session.skip(f64::NAN).await.unwrap();

    assert!(harness.player.seeks_of(&uri("a")).is_empty());
    assert!(harness.settings.get(&position_key(&uri("a"))).is_none());
}

#[tokio::test]
async fn test_seek_without_track_is_noop() {
    let harness = HarnessBuilder::new().start().await;
    harness.session.seek_to(1000.0).await.unwrap();
    harness.session.skip(10.0).await.unwrap();
    assert!(harness.player.calls().is_empty());
}

// ============================================================================
// Queue navigation
// ============================================================================

#[tokio::test]
async fn test_navigation_wraps_at_both_ends() {
    let harness = HarnessBuilder::new().start().await;
    let queue = vec![lesson("a"), lesson("b"), lesson("c")];
    play_and_wait(
        &harness,
        PlayRequest::new(uri("c")).with_queue(queue).with_track_id("c"),
    )
    .await;

    harness.session.next_track().await.unwrap();
    let snapshot = wait_for(&harness.session, |s| {
        s.current_track_id.as_deref() == Some("a") && s.phase == SessionPhase::Playing
    })
    .await;
    assert_eq!(snapshot.current_uri, Some(uri("a")));

    harness.session.previous_track().await.unwrap();
    wait_for(&harness.session, |s| {
        s.current_track_id.as_deref() == Some("c") && s.phase == SessionPhase::Playing
    })
    .await;
}

#[tokio::test]
async fn test_navigation_skips_documents() {
    let harness = HarnessBuilder::new().start().await;
    let queue = vec![
        lesson("a"),
        core_playback::TrackDescriptor::document("pdf", "Text", "https://cdn.example.com/t.pdf"),
        lesson("b"),
    ];
    play_and_wait(&harness, PlayRequest::new(uri("a")).with_queue(queue)).await;

    harness.session.next_track().await.unwrap();
    wait_for(&harness.session, |s| s.current_track_id.as_deref() == Some("b")).await;
}

#[tokio::test]
async fn test_navigation_prefers_local_copy() {
    let harness = HarnessBuilder::new()
        .downloads(FakeDownloads::with_files(&["b.mp3"]))
        .start()
        .await;
    play_and_wait(
        &harness,
        PlayRequest::new(uri("a")).with_queue(vec![lesson("a"), lesson("b")]),
    )
    .await;

    harness.session.next_track().await.unwrap();
    let snapshot = wait_for(&harness.session, |s| {
        s.phase == SessionPhase::Playing && s.current_track_id.as_deref() == Some("b")
    })
    .await;
    assert_eq!(snapshot.current_uri.as_deref(), Some("file:///files/b.mp3"));
    assert_eq!(snapshot.current_title.as_deref(), Some("Lesson b"));

    harness.session.previous_track().await.unwrap();
    wait_for(&harness.session, |s| s.current_track_id.as_deref() == Some("a")).await;
}

#[tokio::test]
async fn test_catalog_is_the_fallback_queue() {
    let harness = HarnessBuilder::new()
        .catalog(catalog(vec![lesson("a"), lesson("b")]))
        .start()
        .await;
    play_and_wait(&harness, PlayRequest::new(uri("b"))).await;

    harness.session.next_track().await.unwrap();
    wait_for(&harness.session, |s| s.current_track_id.as_deref() == Some("a")).await;
}

#[tokio::test]
async fn test_navigation_with_empty_queue_is_noop() {
    let harness = HarnessBuilder::new().start().await;
    harness.session.next_track().await.unwrap();
    harness.session.previous_track().await.unwrap();
    assert_eq!(harness.player.load_count(), 0);
    assert_eq!(harness.session.snapshot().phase, SessionPhase::Idle);
}

#[tokio::test]
async fn test_untracked_current_track_starts_queue_at_edges() {
    let harness = HarnessBuilder::new().start().await;
    let queue = vec![lesson("a"), lesson("b"), lesson("c")];
    play_and_wait(
        &harness,
        PlayRequest::new("https://elsewhere.example.com/x.mp3").with_queue(queue),
    )
    .await;

    harness.session.previous_track().await.unwrap();
    wait_for(&harness.session, |s| s.current_track_id.as_deref() == Some("c")).await;
}

// ============================================================================
// Races
// ============================================================================

#[tokio::test]
async fn test_stale_load_does_not_override_newer_track() {
    let harness = HarnessBuilder::new().start().await;
    let gate = harness.player.gate(&uri("a"));

    let slow = {
        let session = Arc::clone(&harness.session);
        tokio::spawn(async move { session.play_track(PlayRequest::new(uri("a"))).await })
    };
    let player = harness.player.clone();
    until(|| player.load_count() == 1).await;

    play_and_wait(&harness, PlayRequest::new(uri("b"))).await;

    gate.notify_one();
    slow.await.unwrap().unwrap();

    let snapshot = harness.session.snapshot();
    assert_eq!(snapshot.current_uri, Some(uri("b")));
    assert_eq!(snapshot.current_title.as_deref(), Some("Audio"));
    assert_eq!(snapshot.phase, SessionPhase::Playing);
    assert_eq!(harness.player.live_uris(), vec![uri("b")]);
}

#[tokio::test]
async fn test_same_track_while_loading_is_ignored() {
    let harness = HarnessBuilder::new().start().await;
    let gate = harness.player.gate(&uri("a"));

    let first = {
        let session = Arc::clone(&harness.session);
        tokio::spawn(async move { session.play_track(PlayRequest::new(uri("a"))).await })
    };
    let player = harness.player.clone();
    until(|| player.load_count() == 1).await;

    harness.session.play_track(PlayRequest::new(uri("a"))).await.unwrap();
    gate.notify_one();
    first.await.unwrap().unwrap();

    wait_for(&harness.session, |s| s.phase == SessionPhase::Playing).await;
    assert_eq!(harness.player.load_count(), 1);
}

#[tokio::test]
async fn test_pause_during_loading_prepares_without_playing() {
    let harness = HarnessBuilder::new().start().await;
    let gate = harness.player.gate(&uri("a"));

    let load = {
        let session = Arc::clone(&harness.session);
        tokio::spawn(async move { session.play_track(PlayRequest::new(uri("a"))).await })
    };
    let player = harness.player.clone();
    until(|| player.load_count() == 1).await;

    harness.session.pause(true).await.unwrap();
    gate.notify_one();
    load.await.unwrap().unwrap();

    let snapshot = wait_for(&harness.session, |s| s.phase == SessionPhase::Paused).await;
    assert!(!snapshot.is_loading);
    assert!(!snapshot.is_playing);
    assert_eq!(harness.player.play_count(), 0);
}

#[tokio::test]
async fn test_seek_during_loading_replaces_restore_offset() {
    let settings = MemorySettings::new();
    PositionStore::new(settings.clone()).save(&uri("a"), 5000).await;

    let harness = HarnessBuilder::new().settings(settings).start().await;
    let gate = harness.player.gate(&uri("a"));
    let load = {
        let session = Arc::clone(&harness.session);
        tokio::spawn(async move { session.play_track(PlayRequest::new(uri("a"))).await })
    };
    let player = harness.player.clone();
    until(|| player.load_count() == 1).await;

    harness.session.seek_to(12_000.0).await.unwrap();
    gate.notify_one();
    load.await.unwrap().unwrap();

    wait_for(&harness.session, |s| s.phase == SessionPhase::Playing).await;
    assert_eq!(harness.player.seeks_of(&uri("a")), vec![12_000]);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_load_failure_resets_to_idle() {
    let harness = HarnessBuilder::new().start().await;
    let mut events = harness.events.subscribe();
    harness.player.fail_loads_of(&uri("a"));

    let err = harness
        .session
        .play_track(PlayRequest::new(uri("a")))
        .await
        .unwrap_err();
    assert!(matches!(err, PlaybackError::Load { ref uri, .. } if uri.ends_with("/a")));

    let snapshot = harness.session.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Idle);
    assert!(!snapshot.is_loading);
    assert!(!snapshot.is_playing);
    assert_eq!(snapshot.current_uri, None);

    let event = wait_for_event(&mut events, |e| e.is_user_facing()).await;
    assert!(matches!(event, CoreEvent::Playback(PlaybackEvent::Error { .. })));

    // Retry is a fresh request.
    play_and_wait(&harness, PlayRequest::new(uri("b"))).await;
}

#[tokio::test]
async fn test_native_error_while_playing_resets_to_idle() {
    let harness = HarnessBuilder::new().start().await;
    let mut events = harness.events.subscribe();
    play_and_wait(&harness, PlayRequest::new(uri("a"))).await;

    harness.player.break_stream(&uri("a"), "connection reset");

    let snapshot = wait_for(&harness.session, |s| s.phase == SessionPhase::Idle).await;
    assert!(!snapshot.is_playing);
    wait_for_event(&mut events, |e| {
        matches!(e, CoreEvent::Playback(PlaybackEvent::Error { .. }))
    })
    .await;
    until(|| harness.player.live_uris().is_empty()).await;
}

#[tokio::test]
async fn test_restricted_host_on_web_offers_external_open() {
    let drive = "https://drive.google.com/uc?export=download&id=abc";
    let harness = HarnessBuilder::new().platform(HostPlatform::Web).start().await;
    let mut events = harness.events.subscribe();
    harness.player.fail_loads_of(drive);

    assert!(harness.session.play_track(PlayRequest::new(drive)).await.is_err());

    let event = wait_for_event(&mut events, |e| e.is_user_facing()).await;
    match event {
        CoreEvent::Playback(PlaybackEvent::OpenExternally { url, .. }) => assert_eq!(url, drive),
        other => panic!("expected open-externally, got {:?}", other),
    }
}

// ============================================================================
// Speed
// ============================================================================

#[tokio::test]
async fn test_speed_persists_across_sessions() {
    let settings = MemorySettings::new();
    let first = HarnessBuilder::new().settings(settings.clone()).start().await;
    first.session.set_playback_speed(1.5).await.unwrap();
    assert_eq!(settings.get(PLAYBACK_SPEED_KEY).as_deref(), Some("1.5"));

    let second = HarnessBuilder::new().settings(settings).start().await;
    assert_eq!(second.session.playback_rate().as_f32(), 1.5);
    assert_eq!(second.session.snapshot().playback_rate.as_f32(), 1.5);
    assert_eq!(second.player.load_count(), 0);
}

#[tokio::test]
async fn test_speed_applies_to_live_track_and_next_loads() {
    let harness = HarnessBuilder::new().start().await;
    play_and_wait(&harness, PlayRequest::new(uri("a"))).await;

    harness.session.set_playback_speed(1.75).await.unwrap();
    play_and_wait(&harness, PlayRequest::new(uri("b"))).await;

    assert_eq!(harness.player.rates(), vec![1.0, 1.75, 1.75]);
}

#[tokio::test]
async fn test_unsupported_speed_is_rejected() {
    let harness = HarnessBuilder::new().start().await;
    let err = harness.session.set_playback_speed(3.0).await.unwrap_err();
    assert!(matches!(err, PlaybackError::InvalidPlaybackRate(_)));
    assert_eq!(harness.session.playback_rate().as_f32(), 1.0);
    assert!(harness.settings.get(PLAYBACK_SPEED_KEY).is_none());
}

#[tokio::test]
async fn test_cycle_speed_wraps() {
    let harness = HarnessBuilder::new().start().await;
    let mut seen = Vec::new();
    for _ in 0..5 {
        seen.push(harness.session.cycle_playback_speed().await.as_f32());
    }
    assert_eq!(seen, vec![1.25, 1.5, 1.75, 2.0, 1.0]);
    assert_eq!(harness.settings.get(PLAYBACK_SPEED_KEY).as_deref(), Some("1"));
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test]
async fn test_shutdown_releases_engine_and_saves_position() {
    let harness = HarnessBuilder::new().start().await;
    play_and_wait(&harness, PlayRequest::new(uri("a"))).await;
    harness.player.progress(&uri("a"), Duration::from_millis(9000));
    wait_for(&harness.session, |s| s.position_ms == 9000).await;

    harness.session.shutdown().await;
    harness.session.shutdown().await;

    assert!(harness.player.live_uris().is_empty());
    assert_eq!(
        harness.settings.get(&position_key(&uri("a"))).as_deref(),
        Some("9000")
    );
    assert_eq!(harness.session.snapshot().phase, SessionPhase::Idle);
}
