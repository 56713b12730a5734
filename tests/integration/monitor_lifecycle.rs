//! End-to-end monitor behavior on a paused clock
//!
//! Default timings: 5s poll interval, 3 sub-probes spaced 2s apart, 25s
//! extra wait after a healthy tick, 120s removal timeout, 240s forced cap.

use std::net::IpAddr;
use std::time::Duration;

use hostwatch::{
    config::MonitorSettings,
    registry::{CANCEL_REASON, Trigger},
    tracker::CheckRequest,
};
use pretty_assertions::assert_eq;
use tokio::time::Instant;

use crate::helpers::{RecordingNotifier, ScriptedProber, origin, tracker};

fn request(address: &str) -> CheckRequest {
    CheckRequest {
        key: address.to_string(),
        address: address.parse::<IpAddr>().unwrap(),
        origin: origin("alice"),
        trigger: Trigger::Command,
        source: "via !check in ops".to_string(),
    }
}

#[tokio::test(start_paused = true)]
async fn test_offline_host_recovers_and_is_evicted() {
    // initial probe, one failed tick, then healthy
    let prober = ScriptedProber::new([false, false, false, false, true, true, true], true);
    let notifier = RecordingNotifier::new();
    let tracker = tracker(prober, notifier.clone(), MonitorSettings::default());

    let handle = tracker.track(request("10.0.0.1")).await.unwrap();
    handle.join().await.unwrap();

    // offline at t0 and t11, back at t22
    assert_eq!(notifier.texts(), vec!["10.0.0.1 now online (downtime: 22s)"]);
    assert!(tracker.registry().is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn test_notify_on_start_reports_first_probe() {
    let prober = ScriptedProber::new([false], true);
    let notifier = RecordingNotifier::new();
    let settings = MonitorSettings {
        notify_on_start: true,
        ..MonitorSettings::default()
    };
    let tracker = tracker(prober, notifier.clone(), settings);

    let handle = tracker.track(request("10.0.0.9")).await.unwrap();
    tokio::time::sleep(Duration::from_secs(12)).await;

    assert_eq!(
        notifier.texts(),
        vec!["10.0.0.9 offline", "10.0.0.9 now online (downtime: 11s)"]
    );

    tracker.registry().glob_remove("", "").await.unwrap();
    handle.join().await.unwrap();

    // a status was already sent, so the cancellation stays silent
    assert_eq!(notifier.texts().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_forced_timeout_evicts_host_that_never_recovers() {
    let prober = ScriptedProber::always(false);
    let notifier = RecordingNotifier::new();
    let tracker = tracker(prober, notifier.clone(), MonitorSettings::default());

    let started = Instant::now();
    let handle = tracker.track(request("10.0.0.2")).await.unwrap();
    handle.join().await.unwrap();

    assert!(started.elapsed() > Duration::from_secs(240));
    assert!(started.elapsed() < Duration::from_secs(260));
    assert_eq!(
        notifier.texts(),
        vec!["stopped monitoring 10.0.0.2: checks exceeded forced monitoring duration of 4m0s"]
    );
    assert!(tracker.registry().is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn test_forced_timeout_evicts_host_that_stays_online() {
    let prober = ScriptedProber::always(true);
    let notifier = RecordingNotifier::new();
    let settings = MonitorSettings {
        removal_timeout: Duration::from_secs(600),
        ..MonitorSettings::default()
    };
    let tracker = tracker(prober, notifier.clone(), settings);

    let started = Instant::now();
    let handle = tracker.track(request("10.0.0.12")).await.unwrap();
    handle.join().await.unwrap();

    // ticks start every 36s from 5s; the one at 257s is past the cap
    assert_eq!(started.elapsed(), Duration::from_secs(257));
    assert_eq!(
        notifier.texts(),
        vec!["stopped monitoring 10.0.0.12: checks exceeded forced monitoring duration of 4m0s"]
    );
    assert!(tracker.registry().is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn test_healthy_host_is_removed_after_removal_timeout() {
    let prober = ScriptedProber::always(true);
    let notifier = RecordingNotifier::new();
    let tracker = tracker(prober, notifier.clone(), MonitorSettings::default());

    let started = Instant::now();
    let handle = tracker.track(request("10.0.0.3")).await.unwrap();
    handle.join().await.unwrap();

    // healthy ticks end at 11s, 47s, 83s, 119s and 155s
    assert_eq!(started.elapsed(), Duration::from_secs(155));
    assert_eq!(
        notifier.texts(),
        vec!["stopped monitoring 10.0.0.3: time since last offline exceeds 2m0s"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_removal_timer_restarts_when_host_goes_offline() {
    // online, then offline on the first tick, then healthy
    let prober = ScriptedProber::new([true, false, false, false], true);
    let notifier = RecordingNotifier::new();
    let tracker = tracker(prober, notifier.clone(), MonitorSettings::default());

    let started = Instant::now();
    let handle = tracker.track(request("10.0.0.4")).await.unwrap();
    handle.join().await.unwrap();

    assert_eq!(
        notifier.texts(),
        vec!["10.0.0.4 now offline", "10.0.0.4 now online (downtime: 11s)"]
    );
    // last offline at 11s, so eviction waits for 131s past that
    assert!(started.elapsed() > Duration::from_secs(131));
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_stops_monitor_promptly() {
    let prober = ScriptedProber::always(true);
    let notifier = RecordingNotifier::new();
    let tracker = tracker(prober, notifier.clone(), MonitorSettings::default());

    let handle = tracker.track(request("10.0.0.5")).await.unwrap();
    tokio::time::sleep(Duration::from_secs(3)).await;

    let removed = tracker.registry().glob_remove("10.0.0.*", "").await.unwrap();
    assert_eq!(removed, 1);

    let cancelled_at = Instant::now();
    handle.join().await.unwrap();
    assert!(cancelled_at.elapsed() < Duration::from_secs(1));

    assert_eq!(notifier.texts(), vec![CANCEL_REASON]);
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_during_probe_stays_silent() {
    // each probe takes 3s; the tick's last probe runs from 20s to 23s
    let prober = ScriptedProber::slow([true], false, Duration::from_secs(3));
    let notifier = RecordingNotifier::new();
    let tracker = tracker(prober, notifier.clone(), MonitorSettings::default());

    let handle = tracker.track(request("10.0.0.42")).await.unwrap();
    tokio::time::sleep(Duration::from_secs(21)).await;

    tracker.registry().glob_remove("", "").await.unwrap();
    handle.join().await.unwrap();

    assert_eq!(notifier.texts(), vec![CANCEL_REASON]);
    assert!(tracker.registry().is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn test_single_failed_sub_probe_keeps_host_online() {
    let prober = ScriptedProber::new([true, true, false, true], true);
    let notifier = RecordingNotifier::new();
    let settings = MonitorSettings {
        notify_on_start: true,
        ..MonitorSettings::default()
    };
    let tracker = tracker(prober.clone(), notifier.clone(), settings);

    let handle = tracker.track(request("10.0.0.6")).await.unwrap();
    tokio::time::sleep(Duration::from_secs(12)).await;

    assert_eq!(prober.calls(), 4);
    assert!(handle.host().is_online());
    assert_eq!(notifier.texts(), vec!["10.0.0.6 online"]);

    tracker.registry().remove("10.0.0.6", "").await;
    handle.join().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_messages_go_to_origin_and_mention_watchers() {
    let prober = ScriptedProber::new([true, false, false, false], true);
    let notifier = RecordingNotifier::new();
    let tracker = tracker(prober, notifier.clone(), MonitorSettings::default());

    let handle = tracker.track(request("10.0.0.7")).await.unwrap();
    tracker
        .registry()
        .edit_watcher("1700000000.000100", "bob", true)
        .await;
    tokio::time::sleep(Duration::from_secs(12)).await;

    assert_eq!(notifier.texts(), vec!["@bob: 10.0.0.7 now offline"]);
    assert_eq!(notifier.origins()[0].user, "alice");

    tracker.registry().remove("10.0.0.7", "").await;
    handle.join().await.unwrap();
}
